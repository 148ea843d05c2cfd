// src/command/handler.rs
use crate::health::HostStatus;
use crate::publisher::StatusBoard;
use crate::registry::{Host, HostRegistry, RegistryError};
use std::sync::Arc;

/// Operator intents accepted by the monitor, independent of transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddHost(Host),
    RemoveHost(Host),
    ListStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResponse {
    Added(Host),
    Removed(Host),
    Status(Vec<HostView>),
}

/// One line of a status listing. `status` is `None` until a cycle has
/// covered the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostView {
    pub host: Host,
    pub status: Option<HostStatus>,
}

#[derive(Clone)]
pub struct CommandHandler {
    registry: Arc<HostRegistry>,
    board: Arc<StatusBoard>,
}

impl CommandHandler {
    pub fn new(registry: Arc<HostRegistry>, board: Arc<StatusBoard>) -> Self {
        Self { registry, board }
    }

    pub async fn execute(&self, command: Command) -> Result<CommandResponse, RegistryError> {
        match command {
            Command::AddHost(host) => {
                self.registry.add(host.clone()).await?;
                Ok(CommandResponse::Added(host))
            }
            Command::RemoveHost(host) => {
                self.registry.remove(&host).await?;
                Ok(CommandResponse::Removed(host))
            }
            Command::ListStatus => Ok(CommandResponse::Status(self.status().await)),
        }
    }

    /// Current hosts in registry order, joined with the last published table.
    pub async fn status(&self) -> Vec<HostView> {
        let hosts = self.registry.list().await;
        let table = self.board.latest();

        hosts
            .iter()
            .map(|host| HostView {
                host: host.clone(),
                status: table.get(host),
            })
            .collect()
    }
}
