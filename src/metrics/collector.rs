// src/metrics/collector.rs
use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;

pub struct MetricsRegistry {
    registry: Registry,
    collector: Arc<MetricsCollector>,
}

impl MetricsRegistry {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let collector = Arc::new(MetricsCollector::new(&registry)?);

        Ok(Self {
            registry,
            collector,
        })
    }

    pub fn collector(&self) -> Arc<MetricsCollector> {
        self.collector.clone()
    }

    pub fn gather(&self) -> Result<Vec<u8>> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(buffer)
    }
}

pub struct MetricsCollector {
    // Cycle metrics
    pub cycles_total: IntCounterVec,
    pub cycle_duration_seconds: Histogram,
    pub active_cycles: IntGauge,

    // Probe metrics
    pub probes_total: IntCounterVec,

    // Host metrics
    pub host_status: IntGaugeVec,
    pub hosts_total: IntGauge,
}

impl MetricsCollector {
    pub fn new(registry: &Registry) -> Result<Self> {
        let cycles_total = IntCounterVec::new(
            Opts::new("monitor_cycles_total", "Polling cycles by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(cycles_total.clone()))?;

        let cycle_duration_seconds = Histogram::with_opts(HistogramOpts::new(
            "monitor_cycle_duration_seconds",
            "Time from registry snapshot to publication",
        ))?;
        registry.register(Box::new(cycle_duration_seconds.clone()))?;

        let active_cycles = IntGauge::new(
            "monitor_active_cycles",
            "Polling cycles currently in flight",
        )?;
        registry.register(Box::new(active_cycles.clone()))?;

        let probes_total = IntCounterVec::new(
            Opts::new("monitor_probes_total", "Probe results by kind"),
            &["result"],
        )?;
        registry.register(Box::new(probes_total.clone()))?;

        let host_status = IntGaugeVec::new(
            Opts::new(
                "monitor_host_status",
                "Host status from the last cycle (1=healthy, 0=filtered)",
            ),
            &["host"],
        )?;
        registry.register(Box::new(host_status.clone()))?;

        let hosts_total = IntGauge::new("monitor_hosts_total", "Hosts in the last cycle")?;
        registry.register(Box::new(hosts_total.clone()))?;

        Ok(Self {
            cycles_total,
            cycle_duration_seconds,
            active_cycles,
            probes_total,
            host_status,
            hosts_total,
        })
    }

    pub fn record_probe(&self, result: &str) {
        self.probes_total.with_label_values(&[result]).inc();
    }

    pub fn record_cycle(&self, outcome: &str, duration: Duration) {
        self.cycles_total.with_label_values(&[outcome]).inc();
        self.cycle_duration_seconds.observe(duration.as_secs_f64());
    }

    /// Replace the per-host gauges so removed hosts drop out.
    pub fn update_host_statuses<'a>(&self, statuses: impl Iterator<Item = (&'a str, bool)>) {
        self.host_status.reset();

        let mut total = 0;
        for (host, healthy) in statuses {
            let value = if healthy { 1 } else { 0 };
            self.host_status.with_label_values(&[host]).set(value);
            total += 1;
        }

        self.hosts_total.set(total);
    }

    pub fn cycle_started(&self) {
        self.active_cycles.inc();
    }

    pub fn cycle_finished(&self) {
        self.active_cycles.dec();
    }
}
