// src/command/session.rs
//
// Per-user conversation state for menu-driven chat transports.

use super::handler::{Command, CommandHandler, CommandResponse, HostView};
use crate::health::HostStatus;
use crate::registry::{Host, RegistryError};
use dashmap::DashMap;
use std::fmt::Write as _;

pub const START_COMMAND: &str = "/start";
pub const ADD_HOST_BUTTON: &str = "Add IP";
pub const REMOVE_HOST_BUTTON: &str = "Remove IP";
pub const SHOW_STATUS_BUTTON: &str = "Show IP status";

const WELCOME: &str = "Welcome to the IP reachability monitor!";
const PRESS_START: &str = "Press /start to begin.";
const ASK_ADD: &str = "Send the IP address or hostname to add to the list:";
const ASK_REMOVE: &str = "Send the IP address or hostname to remove from the list:";
const UNKNOWN_COMMAND: &str = "Unknown command! Please use the provided buttons.";
const NO_HOSTS: &str = "No IP addresses found!";

pub type UserId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Choosing,
    AwaitingAdd,
    AwaitingRemove,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<String>>,
    pub one_time: bool,
}

impl Keyboard {
    pub fn main_menu() -> Self {
        Self {
            rows: vec![
                vec![ADD_HOST_BUTTON.to_string(), REMOVE_HOST_BUTTON.to_string()],
                vec![SHOW_STATUS_BUTTON.to_string()],
            ],
            one_time: true,
        }
    }

    pub fn start() -> Self {
        Self {
            rows: vec![vec![START_COMMAND.to_string()]],
            one_time: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    fn with_keyboard(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }
}

pub struct SessionManager {
    sessions: DashMap<UserId, SessionState>,
    handler: CommandHandler,
}

impl SessionManager {
    pub fn new(handler: CommandHandler) -> Self {
        Self {
            sessions: DashMap::new(),
            handler,
        }
    }

    pub fn state(&self, user: UserId) -> Option<SessionState> {
        self.sessions.get(&user).map(|state| *state)
    }

    pub async fn handle(&self, user: UserId, text: &str) -> Reply {
        if text == START_COMMAND {
            self.sessions.insert(user, SessionState::Choosing);
            return Reply::with_keyboard(WELCOME, Keyboard::main_menu());
        }

        // Copy the state out; the map guard must not live across an await.
        let Some(state) = self.state(user) else {
            return Reply::with_keyboard(PRESS_START, Keyboard::start());
        };

        match state {
            SessionState::Choosing => self.choose(user, text).await,
            SessionState::AwaitingAdd | SessionState::AwaitingRemove if text.starts_with('/') => {
                self.sessions.insert(user, SessionState::Choosing);
                Reply::with_keyboard(UNKNOWN_COMMAND, Keyboard::main_menu())
            }
            SessionState::AwaitingAdd => {
                let result = self.handler.execute(Command::AddHost(Host::new(text))).await;
                self.sessions.insert(user, SessionState::Choosing);
                Reply::with_keyboard(describe(result), Keyboard::main_menu())
            }
            SessionState::AwaitingRemove => {
                let result = self
                    .handler
                    .execute(Command::RemoveHost(Host::new(text)))
                    .await;
                self.sessions.insert(user, SessionState::Choosing);
                Reply::with_keyboard(describe(result), Keyboard::main_menu())
            }
        }
    }

    async fn choose(&self, user: UserId, text: &str) -> Reply {
        match text {
            ADD_HOST_BUTTON => {
                self.sessions.insert(user, SessionState::AwaitingAdd);
                Reply::text(ASK_ADD)
            }
            REMOVE_HOST_BUTTON => {
                self.sessions.insert(user, SessionState::AwaitingRemove);
                Reply::text(ASK_REMOVE)
            }
            SHOW_STATUS_BUTTON => {
                let result = self.handler.execute(Command::ListStatus).await;
                Reply::with_keyboard(describe(result), Keyboard::main_menu())
            }
            _ => Reply::with_keyboard(UNKNOWN_COMMAND, Keyboard::main_menu()),
        }
    }
}

fn describe(result: Result<CommandResponse, RegistryError>) -> String {
    match result {
        Ok(CommandResponse::Added(host)) => format!("{} was added successfully", host),
        Ok(CommandResponse::Removed(host)) => format!("{} was removed successfully", host),
        Ok(CommandResponse::Status(views)) => render_status(&views),
        Err(RegistryError::AlreadyMonitored(host)) => format!("{} is already in the list!", host),
        Err(RegistryError::NotFound(_)) => "No such IP in the list!".to_string(),
    }
}

pub fn render_status(views: &[HostView]) -> String {
    if views.is_empty() {
        return NO_HOSTS.to_string();
    }

    let mut text = String::from("IP addresses and their status:\n");
    for view in views {
        let status = match view.status {
            Some(HostStatus::Healthy) => "✅ healthy ✅",
            Some(HostStatus::Filtered) => "❌ filtered ❌",
            None => "⏳ pending",
        };
        let _ = writeln!(text, "IP: {}, Status: {}", view.host, status);
    }
    text
}
