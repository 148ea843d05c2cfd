// src/command/mod.rs
mod handler;
mod session;

pub use handler::{Command, CommandHandler, CommandResponse, HostView};
pub use session::{
    render_status, Keyboard, Reply, SessionManager, SessionState, UserId, ADD_HOST_BUTTON,
    REMOVE_HOST_BUTTON, SHOW_STATUS_BUTTON, START_COMMAND,
};
