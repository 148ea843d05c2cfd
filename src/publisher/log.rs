// src/publisher/log.rs
use super::StatusPublisher;
use crate::health::StatusTable;
use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

/// Writes every cycle's verdicts to the log.
pub struct LogPublisher;

#[async_trait]
impl StatusPublisher for LogPublisher {
    async fn publish(&self, table: &StatusTable) -> Result<()> {
        info!(
            cycle = %table.cycle_id,
            "Reachability results: {} healthy, {} filtered",
            table.healthy_count(),
            table.filtered_count()
        );

        for (host, status) in table.iter() {
            if status.is_healthy() {
                info!(cycle = %table.cycle_id, "{}: {}", host, status);
            } else {
                warn!(cycle = %table.cycle_id, "{}: {}", host, status);
            }
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
