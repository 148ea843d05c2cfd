// src/publisher/board.rs
use super::StatusPublisher;
use crate::health::StatusTable;
use anyhow::Result;
use arc_swap::ArcSwap;
use async_trait::async_trait;
use std::sync::Arc;

/// Holds the most recent table for operator queries. Each publish swaps the
/// whole table in one store.
pub struct StatusBoard {
    latest: ArcSwap<StatusTable>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self {
            latest: ArcSwap::from_pointee(StatusTable::empty()),
        }
    }

    pub fn latest(&self) -> Arc<StatusTable> {
        self.latest.load_full()
    }
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StatusPublisher for StatusBoard {
    async fn publish(&self, table: &StatusTable) -> Result<()> {
        self.latest.store(Arc::new(table.clone()));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "status_board"
    }
}
