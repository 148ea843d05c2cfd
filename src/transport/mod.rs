// src/transport/mod.rs
mod telegram;

pub use telegram::{TelegramError, TelegramTransport};
