// src/config/models.rs
use anyhow::{bail, Result};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    /// Usually supplied through `REACHABILITY_TELEGRAM__TOKEN`.
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.monitor.interval_secs == 0 {
            bail!("monitor.interval_secs must be greater than zero");
        }

        match self.probe.base_url.scheme() {
            "http" | "https" => {}
            other => bail!("probe.base_url must be http or https, got '{}'", other),
        }

        if self.probe.node.trim().is_empty() {
            bail!("probe.node must not be empty");
        }

        if self.probe.timeout() <= self.probe.settle_delay() {
            bail!(
                "probe.timeout_secs ({}s) must exceed probe.settle_delay_ms ({}ms)",
                self.probe.timeout_secs,
                self.probe.settle_delay_ms
            );
        }

        if self.probe.retry.max_attempts == 0 {
            bail!("probe.retry.max_attempts must be at least 1");
        }

        if self.telegram.token.trim().is_empty() {
            bail!("telegram.token is required");
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl MonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    /// Vantage point the external service pings from.
    #[serde(default = "default_node")]
    pub node: String,
    #[serde(default = "default_probe_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub retry: RetryConfig,
}

impl ProbeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            node: default_node(),
            timeout_secs: default_probe_timeout_secs(),
            settle_delay_ms: default_settle_delay_ms(),
            user_agent: default_user_agent(),
            retry: RetryConfig::default(),
        }
    }
}

/// Backoff applied while the provider reports a result as not ready yet.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
}

impl RetryConfig {
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn backoff_max(&self) -> Duration {
        Duration::from_millis(self.backoff_max_ms)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_telegram_api_url")]
    pub api_url: Url,
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_url: default_telegram_api_url(),
            poll_timeout_secs: default_poll_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
            path: default_metrics_path(),
        }
    }
}

fn default_interval_secs() -> u64 {
    180
}

fn default_base_url() -> Url {
    Url::parse("https://check-host.net/").expect("static URL is valid")
}

fn default_node() -> String {
    "ir1.node.check-host.net".to_string()
}

fn default_probe_timeout_secs() -> u64 {
    30
}

fn default_settle_delay_ms() -> u64 {
    1000
}

fn default_user_agent() -> String {
    concat!("reachability-monitor/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    500
}

fn default_backoff_max_ms() -> u64 {
    2000
}

fn default_telegram_api_url() -> Url {
    Url::parse("https://api.telegram.org/").expect("static URL is valid")
}

fn default_poll_timeout_secs() -> u64 {
    30
}

fn default_metrics_port() -> u16 {
    9090
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            monitor: MonitorConfig::default(),
            probe: ProbeConfig::default(),
            telegram: TelegramConfig {
                token: "123:abc".to_string(),
                api_url: default_telegram_api_url(),
                poll_timeout_secs: 30,
            },
            metrics: MetricsConfig::default(),
        }
    }

    #[test]
    fn test_defaults_validate() {
        let config = valid_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.monitor.interval(), Duration::from_secs(180));
        assert_eq!(config.probe.settle_delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_missing_token_rejected() {
        let mut config = valid_config();
        config.telegram.token = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timeout_must_cover_settle_delay() {
        let mut config = valid_config();
        config.probe.timeout_secs = 1;
        config.probe.settle_delay_ms = 1000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_http_base_url_rejected() {
        let mut config = valid_config();
        config.probe.base_url = Url::parse("ftp://check-host.net/").unwrap();
        assert!(config.validate().is_err());
    }
}
