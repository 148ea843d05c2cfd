// src/lib.rs
pub mod command;
pub mod config;
pub mod health;
pub mod metrics;
pub mod probe;
pub mod publisher;
pub mod registry;
pub mod retry;
pub mod transport;
