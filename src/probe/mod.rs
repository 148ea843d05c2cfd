// src/probe/mod.rs
mod check_host;
mod client;
mod provider;

pub use check_host::CheckHostProvider;
pub use client::{ProbeClient, ProbeResult};
pub use provider::{JobId, ProbeError, ProbeProvider, Verdict};
