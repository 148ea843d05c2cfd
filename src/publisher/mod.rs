// src/publisher/mod.rs
mod board;
mod log;

pub use board::StatusBoard;
pub use log::LogPublisher;

use crate::health::StatusTable;
use anyhow::Result;
use async_trait::async_trait;

/// Receives the status table once per completed cycle.
#[async_trait]
pub trait StatusPublisher: Send + Sync {
    async fn publish(&self, table: &StatusTable) -> Result<()>;

    fn name(&self) -> &'static str;
}
