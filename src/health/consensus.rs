// src/health/consensus.rs
use super::status::HostStatus;
use crate::probe::ProbeResult;

/// Probes issued per host per cycle.
pub const PROBES_PER_HOST: usize = 2;

/// Double-check rule: only two clean `Reachable` results make a host healthy.
/// An unreachable or failed probe counts as a sign of interference.
pub fn evaluate(first: &ProbeResult, second: &ProbeResult) -> HostStatus {
    if first.is_reachable() && second.is_reachable() {
        HostStatus::Healthy
    } else {
        HostStatus::Filtered
    }
}

/// Apply [`evaluate`] to whatever a cycle collected for one host. Anything
/// other than exactly [`PROBES_PER_HOST`] results is `Filtered`.
pub fn evaluate_all(results: &[ProbeResult]) -> HostStatus {
    match results {
        [first, second] => evaluate(first, second),
        _ => HostStatus::Filtered,
    }
}
