// src/health/status.rs
use crate::registry::Host;
use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostStatus {
    Healthy,
    /// Suspected blocked or interfered with, not necessarily down.
    Filtered,
}

impl HostStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HostStatus::Healthy)
    }
}

impl fmt::Display for HostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostStatus::Healthy => write!(f, "healthy"),
            HostStatus::Filtered => write!(f, "filtered"),
        }
    }
}

/// Verdicts of one completed cycle, in registry snapshot order.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusTable {
    pub cycle_id: Uuid,
    pub completed_at: DateTime<Utc>,
    entries: Vec<(Host, HostStatus)>,
}

impl StatusTable {
    pub fn new(cycle_id: Uuid, entries: Vec<(Host, HostStatus)>) -> Self {
        Self {
            cycle_id,
            completed_at: Utc::now(),
            entries,
        }
    }

    /// Table shown before any cycle has completed.
    pub fn empty() -> Self {
        Self {
            cycle_id: Uuid::nil(),
            completed_at: DateTime::<Utc>::UNIX_EPOCH,
            entries: Vec::new(),
        }
    }

    pub fn get(&self, host: &Host) -> Option<HostStatus> {
        self.entries
            .iter()
            .find(|(h, _)| h == host)
            .map(|(_, status)| *status)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Host, HostStatus)> {
        self.entries.iter().map(|(host, status)| (host, *status))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn healthy_count(&self) -> usize {
        self.entries.iter().filter(|(_, s)| s.is_healthy()).count()
    }

    pub fn filtered_count(&self) -> usize {
        self.len() - self.healthy_count()
    }
}

impl Default for StatusTable {
    fn default() -> Self {
        Self::empty()
    }
}
