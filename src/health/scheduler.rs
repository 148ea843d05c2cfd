// src/health/scheduler.rs
use super::consensus::{evaluate_all, PROBES_PER_HOST};
use super::status::StatusTable;
use crate::config::MonitorConfig;
use crate::metrics::MetricsCollector;
use crate::probe::{ProbeClient, ProbeResult};
use crate::publisher::StatusPublisher;
use crate::registry::{Host, HostRegistry};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinSet;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Probing,
    Evaluating,
    Publishing,
    Sleeping,
    Stopped,
}

#[derive(Debug)]
pub enum CycleOutcome {
    Completed(StatusTable),
    /// A cycle was already in flight; the trigger was dropped.
    Skipped,
    /// The registry was empty at snapshot time.
    Empty,
    /// Shutdown arrived mid-cycle. Nothing was published.
    Aborted,
}

impl CycleOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            CycleOutcome::Completed(_) => "completed",
            CycleOutcome::Skipped => "skipped",
            CycleOutcome::Empty => "empty",
            CycleOutcome::Aborted => "aborted",
        }
    }
}

pub struct PollingScheduler {
    config: MonitorConfig,
    registry: Arc<HostRegistry>,
    client: Arc<ProbeClient>,
    publishers: Vec<Arc<dyn StatusPublisher>>,
    metrics: Option<Arc<MetricsCollector>>,
    state_tx: watch::Sender<SchedulerState>,
    cycle_lock: Mutex<()>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl PollingScheduler {
    pub fn new(
        config: MonitorConfig,
        registry: Arc<HostRegistry>,
        client: Arc<ProbeClient>,
        publishers: Vec<Arc<dyn StatusPublisher>>,
        metrics: Option<Arc<MetricsCollector>>,
    ) -> Self {
        let (state_tx, _) = watch::channel(SchedulerState::Idle);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            config,
            registry,
            client,
            publishers,
            metrics,
            state_tx,
            cycle_lock: Mutex::new(()),
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Drive cycles until shutdown. Waits in `Idle` while the registry is
    /// empty and in `Sleeping` for the configured interval after each publish.
    pub async fn run(self: Arc<Self>) {
        let mut shutdown_rx = self.shutdown_rx.clone();
        let mut hosts_rx = self.registry.subscribe();

        info!(
            "Starting polling scheduler with interval: {:?}",
            self.config.interval()
        );

        loop {
            self.set_state(SchedulerState::Idle);

            if *hosts_rx.borrow_and_update() == 0 {
                debug!("No hosts registered, waiting for the first one");
                tokio::select! {
                    _ = wait_for_hosts(&mut hosts_rx) => {}
                    _ = wait_for_shutdown(&mut shutdown_rx) => break,
                }
            }

            match self.run_cycle().await {
                CycleOutcome::Aborted => break,
                CycleOutcome::Empty => continue,
                _ => {}
            }

            self.set_state(SchedulerState::Sleeping);
            tokio::select! {
                _ = sleep(self.config.interval()) => {}
                _ = wait_for_shutdown(&mut shutdown_rx) => break,
            }
        }

        self.set_state(SchedulerState::Stopped);
        info!("Polling scheduler shutting down");
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn state(&self) -> SchedulerState {
        *self.state_tx.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SchedulerState> {
        self.state_tx.subscribe()
    }

    /// Run one Probing → Evaluating → Publishing pass. Returns `Skipped`
    /// without doing anything if another pass holds the cycle lock.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let Ok(_guard) = self.cycle_lock.try_lock() else {
            debug!("Polling cycle already in flight, trigger coalesced");
            return CycleOutcome::Skipped;
        };

        let hosts = self.registry.list().await;
        if hosts.is_empty() {
            return CycleOutcome::Empty;
        }

        let cycle_id = Uuid::new_v4();
        let started = Instant::now();

        if let Some(metrics) = &self.metrics {
            metrics.cycle_started();
        }

        let outcome = self.execute_cycle(cycle_id, &hosts).await;

        if let Some(metrics) = &self.metrics {
            metrics.cycle_finished();
            metrics.record_cycle(outcome.label(), started.elapsed());
        }

        outcome
    }

    async fn execute_cycle(&self, cycle_id: Uuid, hosts: &[Host]) -> CycleOutcome {
        let mut shutdown_rx = self.shutdown_rx.clone();

        self.set_state(SchedulerState::Probing);
        info!(
            cycle = %cycle_id,
            "Probing {} hosts ({} probes)",
            hosts.len(),
            hosts.len() * PROBES_PER_HOST
        );

        let results = tokio::select! {
            results = self.probe_all(hosts) => results,
            _ = wait_for_shutdown(&mut shutdown_rx) => {
                warn!(cycle = %cycle_id, "Shutdown during probing, abandoning cycle");
                return CycleOutcome::Aborted;
            }
        };

        self.set_state(SchedulerState::Evaluating);
        let entries = hosts
            .iter()
            .zip(results)
            .map(|(host, results)| {
                self.record_results(cycle_id, host, &results);
                (host.clone(), evaluate_all(&results))
            })
            .collect();
        let table = StatusTable::new(cycle_id, entries);

        self.set_state(SchedulerState::Publishing);
        if let Some(metrics) = &self.metrics {
            metrics.update_host_statuses(
                table.iter().map(|(host, status)| (host.as_str(), status.is_healthy())),
            );
        }

        for publisher in &self.publishers {
            if let Err(e) = publisher.publish(&table).await {
                error!("Publisher {} failed: {}", publisher.name(), e);
            }
        }

        info!(
            cycle = %cycle_id,
            "Polling cycle complete: {} healthy, {} filtered",
            table.healthy_count(),
            table.filtered_count()
        );

        CycleOutcome::Completed(table)
    }

    /// Fan out two probes per host, then wait for every one of them.
    /// Results come back grouped by the host's index in `hosts`.
    async fn probe_all(&self, hosts: &[Host]) -> Vec<Vec<ProbeResult>> {
        let mut tasks = JoinSet::new();

        for (index, host) in hosts.iter().enumerate() {
            for _ in 0..PROBES_PER_HOST {
                let client = self.client.clone();
                let host = host.clone();
                tasks.spawn(async move { (index, client.probe(&host).await) });
            }
        }

        let mut grouped = vec![Vec::with_capacity(PROBES_PER_HOST); hosts.len()];

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => grouped[index].push(result),
                // The host ends up one result short and is marked filtered.
                Err(e) => error!("Probe task join error: {}", e),
            }
        }

        grouped
    }

    fn record_results(&self, cycle_id: Uuid, host: &Host, results: &[ProbeResult]) {
        for result in results {
            if let Some(metrics) = &self.metrics {
                metrics.record_probe(result.label());
            }

            if let ProbeResult::Failed(e) = result {
                warn!(cycle = %cycle_id, "Probe of {} failed: {}", host, e);
            }
        }
    }

    fn set_state(&self, state: SchedulerState) {
        let previous = self.state_tx.send_replace(state);
        if previous != state {
            debug!("Scheduler state {:?} -> {:?}", previous, state);
        }
    }
}

async fn wait_for_hosts(rx: &mut watch::Receiver<usize>) {
    // The registry owns the sender, so this only errors if it was dropped.
    let _ = rx.wait_for(|count| *count > 0).await;
}

async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    let _ = rx.wait_for(|stop| *stop).await;
}
