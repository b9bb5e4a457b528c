// src/health/report.rs
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Details text reported when no probe failed.
pub const ALL_CHECKS_PASSED: &str = "All checks passed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateStatus {
    Ok,
    Error,
}

impl AggregateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateStatus::Ok => "ok",
            AggregateStatus::Error => "error",
        }
    }
}

impl fmt::Display for AggregateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateResult {
    pub status: AggregateStatus,
    pub details: String,
}

impl AggregateResult {
    pub(crate) fn new(status: AggregateStatus, failures: Vec<String>) -> Self {
        let details = if failures.is_empty() {
            ALL_CHECKS_PASSED.to_string()
        } else {
            failures.join("; ")
        };
        Self { status, details }
    }

    pub fn is_ok(&self) -> bool {
        self.status == AggregateStatus::Ok
    }

    /// The externally visible mapping: exactly `status` and `details`.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::with_capacity(2);
        map.insert("status".to_string(), Value::from(self.status.as_str()));
        map.insert("details".to_string(), Value::from(self.details.as_str()));
        map
    }

    pub fn to_json(&self) -> String {
        Value::Object(self.to_map()).to_string()
    }
}
