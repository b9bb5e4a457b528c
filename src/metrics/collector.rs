// src/metrics/collector.rs
use crate::health::{AggregateStatus, ProbeKind};
use anyhow::Result;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
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

    /// Prometheus text exposition of everything registered.
    pub fn gather(&self) -> Result<Vec<u8>> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(buffer)
    }
}

pub struct MetricsCollector {
    pub probe_runs_total: IntCounterVec,
    pub probe_duration_seconds: HistogramVec,
    pub aggregate_runs_total: IntCounterVec,
    pub last_status: IntGauge,
}

impl MetricsCollector {
    pub fn new(registry: &Registry) -> Result<Self> {
        let probe_runs_total = IntCounterVec::new(
            Opts::new("healthcheck_probe_runs_total", "Total probe executions"),
            &["kind", "result"],
        )?;
        registry.register(Box::new(probe_runs_total.clone()))?;

        let probe_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "healthcheck_probe_duration_seconds",
                "Probe duration in seconds",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(probe_duration_seconds.clone()))?;

        let aggregate_runs_total = IntCounterVec::new(
            Opts::new(
                "healthcheck_aggregate_runs_total",
                "Total aggregation rounds by verdict",
            ),
            &["status"],
        )?;
        registry.register(Box::new(aggregate_runs_total.clone()))?;

        let last_status = IntGauge::new(
            "healthcheck_last_status",
            "Verdict of the most recent round (1=ok, 0=error)",
        )?;
        registry.register(Box::new(last_status.clone()))?;

        Ok(Self {
            probe_runs_total,
            probe_duration_seconds,
            aggregate_runs_total,
            last_status,
        })
    }

    pub fn record_probe(&self, kind: ProbeKind, ok: bool, duration: Duration) {
        let result = if ok { "success" } else { "failure" };
        self.probe_runs_total
            .with_label_values(&[kind.as_str(), result])
            .inc();

        self.probe_duration_seconds
            .with_label_values(&[kind.as_str()])
            .observe(duration.as_secs_f64());
    }

    pub fn record_aggregate(&self, status: AggregateStatus) {
        self.aggregate_runs_total
            .with_label_values(&[status.as_str()])
            .inc();

        let value = match status {
            AggregateStatus::Ok => 1,
            AggregateStatus::Error => 0,
        };
        self.last_status.set(value);
    }
}
