// src/health/mod.rs
mod consensus;
mod scheduler;
mod status;

pub use consensus::{evaluate, evaluate_all, PROBES_PER_HOST};
pub use scheduler::{CycleOutcome, PollingScheduler, SchedulerState};
pub use status::{HostStatus, StatusTable};
