// src/health/mod.rs
mod aggregator;
mod database;
mod http;
mod plan;
mod probe;
mod report;

pub use aggregator::{reduce, Aggregator};
pub use database::{DatabaseConnector, DatabaseProbe, DatabaseSession, PgConnector};
pub use http::HttpProbe;
pub use plan::{build_plan, parse_extra_endpoints};
pub use probe::{
    redact_credentials, Probe, ProbeError, ProbeKind, ProbeOutcome, ProbeRole, ProbeSet, ProbeSpec,
};
pub use report::{AggregateResult, AggregateStatus, ALL_CHECKS_PASSED};

use crate::config::Config;
use anyhow::Result;

/// One full round of checks for `config`: plan, run, reduce.
pub async fn run_health_checks(config: &Config) -> Result<AggregateResult> {
    let aggregator = Aggregator::from_config(config)?;
    let plan = build_plan(config);
    Ok(aggregator.run(&plan).await)
}
