// src/lib.rs
pub mod config;
pub mod health;
pub mod metrics;
pub mod server;

pub use config::Config;
pub use health::{run_health_checks, AggregateResult, AggregateStatus};
