// src/probe/client.rs
use super::provider::{ProbeError, ProbeProvider, Verdict};
use crate::config::ProbeConfig;
use crate::registry::Host;
use crate::retry::{RetryDecision, RetryStrategy};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::debug;

/// Outcome of a single probe attempt for one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    Reachable,
    Unreachable,
    Failed(ProbeError),
}

impl ProbeResult {
    pub fn is_reachable(&self) -> bool {
        matches!(self, ProbeResult::Reachable)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProbeResult::Reachable => "reachable",
            ProbeResult::Unreachable => "unreachable",
            ProbeResult::Failed(_) => "failed",
        }
    }
}

impl From<Result<Verdict, ProbeError>> for ProbeResult {
    fn from(result: Result<Verdict, ProbeError>) -> Self {
        match result {
            Ok(Verdict::Reachable) => ProbeResult::Reachable,
            Ok(Verdict::Unreachable) => ProbeResult::Unreachable,
            Err(e) => ProbeResult::Failed(e),
        }
    }
}

/// Runs one submit → settle → fetch round against a provider, bounded by a
/// timeout that covers all three steps.
pub struct ProbeClient {
    provider: Arc<dyn ProbeProvider>,
    settle_delay: Duration,
    timeout: Duration,
    retry: RetryStrategy,
}

impl ProbeClient {
    pub fn new(provider: Arc<dyn ProbeProvider>, config: &ProbeConfig) -> Self {
        Self {
            provider,
            settle_delay: config.settle_delay(),
            timeout: config.timeout(),
            retry: RetryStrategy::new(config.retry.clone()),
        }
    }

    pub async fn probe(&self, host: &Host) -> ProbeResult {
        let result = match timeout(self.timeout, self.submit_and_fetch(host)).await {
            Ok(outcome) => ProbeResult::from(outcome),
            Err(_) => ProbeResult::Failed(ProbeError::Timeout(self.timeout)),
        };

        debug!(
            "Probe of {} via {}: {:?}",
            host,
            self.provider.name(),
            result
        );
        result
    }

    async fn submit_and_fetch(&self, host: &Host) -> Result<Verdict, ProbeError> {
        let job = self.provider.submit(host).await?;

        // The remote node needs a moment before the result exists.
        sleep(self.settle_delay).await;

        self.retry
            .execute_with_decision(
                || self.provider.fetch(&job),
                |e: &ProbeError| {
                    if e.is_pending() {
                        RetryDecision::Retry
                    } else {
                        RetryDecision::NoRetry
                    }
                },
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryConfig;
    use crate::probe::JobId;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    #[derive(Clone, Copy)]
    enum Behaviour {
        Reachable,
        Unreachable,
        RejectSubmit,
        PendingTwice,
        Hang,
    }

    struct FakeProvider {
        hosts: HashMap<String, Behaviour>,
        fetches: Mutex<HashMap<String, u32>>,
        submits: AtomicU32,
    }

    impl FakeProvider {
        fn new(hosts: &[(&str, Behaviour)]) -> Self {
            Self {
                hosts: hosts.iter().map(|(h, b)| (h.to_string(), *b)).collect(),
                fetches: Mutex::new(HashMap::new()),
                submits: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl ProbeProvider for FakeProvider {
        async fn submit(&self, host: &Host) -> Result<JobId, ProbeError> {
            self.submits.fetch_add(1, Ordering::SeqCst);
            match self.hosts.get(host.as_str()) {
                Some(Behaviour::RejectSubmit) => Err(ProbeError::Status(400)),
                Some(_) => Ok(JobId::new(host.as_str())),
                None => Err(ProbeError::Malformed("unknown host".into())),
            }
        }

        async fn fetch(&self, job: &JobId) -> Result<Verdict, ProbeError> {
            let calls = {
                let mut fetches = self.fetches.lock().unwrap();
                let calls = fetches.entry(job.as_str().to_string()).or_insert(0);
                *calls += 1;
                *calls
            };

            match self.hosts[job.as_str()] {
                Behaviour::Reachable => Ok(Verdict::Reachable),
                Behaviour::Unreachable => Ok(Verdict::Unreachable),
                Behaviour::PendingTwice if calls <= 2 => Err(ProbeError::Pending),
                Behaviour::PendingTwice => Ok(Verdict::Reachable),
                Behaviour::Hang => std::future::pending().await,
                Behaviour::RejectSubmit => unreachable!(),
            }
        }

        fn name(&self) -> &'static str {
            "fake"
        }
    }

    fn probe_config() -> ProbeConfig {
        ProbeConfig {
            timeout_secs: 10,
            settle_delay_ms: 1000,
            retry: RetryConfig {
                max_attempts: 3,
                backoff_base_ms: 100,
                backoff_max_ms: 400,
            },
            ..ProbeConfig::default()
        }
    }

    fn client(provider: Arc<FakeProvider>) -> ProbeClient {
        ProbeClient::new(provider, &probe_config())
    }

    #[tokio::test(start_paused = true)]
    async fn test_classifies_verdicts() {
        let provider = Arc::new(FakeProvider::new(&[
            ("1.1.1.1", Behaviour::Reachable),
            ("10.0.0.1", Behaviour::Unreachable),
        ]));
        let client = client(provider);

        assert_eq!(client.probe(&Host::from("1.1.1.1")).await, ProbeResult::Reachable);
        assert_eq!(
            client.probe(&Host::from("10.0.0.1")).await,
            ProbeResult::Unreachable
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_settle_delay_before_fetch() {
        let provider = Arc::new(FakeProvider::new(&[("1.1.1.1", Behaviour::Reachable)]));
        let client = client(provider);

        let start = Instant::now();
        client.probe(&Host::from("1.1.1.1")).await;

        assert!(start.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_result_is_polled_again() {
        let provider = Arc::new(FakeProvider::new(&[("1.1.1.1", Behaviour::PendingTwice)]));
        let client = client(provider.clone());

        assert_eq!(client.probe(&Host::from("1.1.1.1")).await, ProbeResult::Reachable);
        assert_eq!(provider.fetches.lock().unwrap()["1.1.1.1"], 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_failure_maps_to_failed() {
        let provider = Arc::new(FakeProvider::new(&[("bad host", Behaviour::RejectSubmit)]));
        let client = client(provider);

        assert_eq!(
            client.probe(&Host::from("bad host")).await,
            ProbeResult::Failed(ProbeError::Status(400))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_probe_times_out() {
        let provider = Arc::new(FakeProvider::new(&[("1.1.1.1", Behaviour::Hang)]));
        let client = client(provider);

        let start = Instant::now();
        let result = client.probe(&Host::from("1.1.1.1")).await;

        assert_eq!(
            result,
            ProbeResult::Failed(ProbeError::Timeout(Duration::from_secs(10)))
        );
        assert!(start.elapsed() < Duration::from_secs(11));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_host_does_not_slow_sibling() {
        let provider = Arc::new(FakeProvider::new(&[
            ("dead", Behaviour::Hang),
            ("alive", Behaviour::Reachable),
        ]));
        let client = Arc::new(client(provider));

        let start = Instant::now();
        let dead = {
            let client = client.clone();
            tokio::spawn(async move { client.probe(&Host::from("dead")).await })
        };
        let alive = {
            let client = client.clone();
            tokio::spawn(async move {
                let result = client.probe(&Host::from("alive")).await;
                (result, start.elapsed())
            })
        };

        let (alive_result, alive_elapsed) = alive.await.unwrap();
        assert_eq!(alive_result, ProbeResult::Reachable);
        assert!(alive_elapsed < Duration::from_secs(2));

        assert!(matches!(
            dead.await.unwrap(),
            ProbeResult::Failed(ProbeError::Timeout(_))
        ));
    }
}
