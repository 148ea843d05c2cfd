// src/probe/provider.rs
use crate::registry::Host;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

/// Opaque handle the external service hands back for a submitted probe.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parsed outcome of a finished remote ping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Reachable,
    Unreachable,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProbeError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("provider returned HTTP {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("result not ready")]
    Pending,

    #[error("probe timed out after {0:?}")]
    Timeout(Duration),
}

impl ProbeError {
    pub fn is_pending(&self) -> bool {
        matches!(self, ProbeError::Pending)
    }
}

impl From<reqwest::Error> for ProbeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProbeError::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            ProbeError::Status(status.as_u16())
        } else {
            ProbeError::Transport(err.to_string())
        }
    }
}

/// External ping service: submit a job, then fetch its result.
#[async_trait]
pub trait ProbeProvider: Send + Sync {
    async fn submit(&self, host: &Host) -> Result<JobId, ProbeError>;

    /// Returns `ProbeError::Pending` while the job is still running.
    async fn fetch(&self, job: &JobId) -> Result<Verdict, ProbeError>;

    fn name(&self) -> &'static str;
}
