// src/health/aggregator.rs
use super::database::DatabaseProbe;
use super::http::HttpProbe;
use super::probe::{ProbeError, ProbeOutcome, ProbeSet, ProbeSpec};
use super::report::{AggregateResult, AggregateStatus};
use crate::config::Config;
use crate::metrics::MetricsCollector;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{timeout, Duration, Instant};
use tracing::{debug, error, info, warn, Instrument};
use uuid::Uuid;

/// Extra time a probe gets past its own timeout before the aggregator gives up on it.
const DEADLINE_GRACE: Duration = Duration::from_secs(2);

#[derive(Clone)]
pub struct Aggregator {
    probes: ProbeSet,
    timeout: Duration,
    concurrent: bool,
    metrics: Option<Arc<MetricsCollector>>,
}

impl Aggregator {
    pub fn new(probes: ProbeSet, timeout: Duration) -> Self {
        Self {
            probes,
            timeout,
            concurrent: true,
            metrics: None,
        }
    }

    /// Aggregator backed by the HTTP and Postgres probes.
    pub fn from_config(config: &Config) -> Result<Self> {
        let timeout = config.timeout();
        let http = HttpProbe::new(timeout).context("Failed to create HTTP client")?;
        let probes = ProbeSet::new(Arc::new(http), Arc::new(DatabaseProbe::postgres(timeout)));

        Ok(Self::new(probes, timeout).with_concurrency(config.concurrent))
    }

    pub fn with_concurrency(mut self, concurrent: bool) -> Self {
        self.concurrent = concurrent;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Run every probe in `plan` exactly once and fold the outcomes.
    pub async fn run(&self, plan: &[ProbeSpec]) -> AggregateResult {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("health_checks", %run_id, probes = plan.len());

        async {
            let outcomes = if self.concurrent {
                self.run_concurrent(plan).await
            } else {
                self.run_sequential(plan).await
            };

            for outcome in &outcomes {
                match outcome.message() {
                    None => debug!("{} is healthy", outcome.label()),
                    Some(message) => warn!("{}", message),
                }
            }

            let result = reduce(outcomes);

            if let Some(metrics) = &self.metrics {
                metrics.record_aggregate(result.status);
            }

            info!(status = %result.status, "Health checks complete");
            result
        }
        .instrument(span)
        .await
    }

    async fn run_sequential(&self, plan: &[ProbeSpec]) -> Vec<ProbeOutcome> {
        let mut outcomes = Vec::with_capacity(plan.len());
        for spec in plan {
            let result = self.spawn_probe(spec).await;
            outcomes.push(settle(spec, result));
        }
        outcomes
    }

    async fn run_concurrent(&self, plan: &[ProbeSpec]) -> Vec<ProbeOutcome> {
        let tasks: Vec<_> = plan.iter().map(|spec| self.spawn_probe(spec)).collect();

        // join_all yields results in spawn order, which is plan order.
        let results = futures::future::join_all(tasks).await;

        results
            .into_iter()
            .zip(plan)
            .map(|(result, spec)| settle(spec, result))
            .collect()
    }

    fn spawn_probe(&self, spec: &ProbeSpec) -> JoinHandle<ProbeOutcome> {
        let aggregator = self.clone();
        let spec = spec.clone();
        tokio::spawn(async move { aggregator.run_probe(spec).await }.in_current_span())
    }

    async fn run_probe(self, spec: ProbeSpec) -> ProbeOutcome {
        let probe = self.probes.for_kind(spec.kind());
        let start = Instant::now();

        let result = match timeout(self.timeout + DEADLINE_GRACE, probe.check(&spec)).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout(self.timeout)),
        };

        if let Some(metrics) = &self.metrics {
            metrics.record_probe(spec.kind(), result.is_ok(), start.elapsed());
        }
        debug!(probe = probe.name(), label = spec.label(), ok = result.is_ok(), "Probe finished");

        ProbeOutcome::from_check(&spec, result)
    }
}

/// A probe task that panicked still yields an outcome for its plan slot.
fn settle(spec: &ProbeSpec, result: Result<ProbeOutcome, JoinError>) -> ProbeOutcome {
    match result {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Probe task for {} failed: {}", spec.label(), e);
            ProbeOutcome::from_check(spec, Err(ProbeError::TaskFailed(e.to_string())))
        }
    }
}

/// Monotonic fold: any failed outcome makes the aggregate an error, and the
/// failure messages are kept in the order the outcomes arrive.
pub fn reduce<I>(outcomes: I) -> AggregateResult
where
    I: IntoIterator<Item = ProbeOutcome>,
{
    let mut status = AggregateStatus::Ok;
    let mut failures = Vec::new();

    for outcome in outcomes {
        if !outcome.is_ok() {
            status = AggregateStatus::Error;
            if let Some(message) = outcome.into_message() {
                failures.push(message);
            }
        }
    }

    AggregateResult::new(status, failures)
}
