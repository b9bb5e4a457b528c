// src/config/models.rs
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_PRIMARY_ENDPOINT: &str = "http://localhost:5000/health";
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Service health endpoint that is always checked first.
    #[serde(default = "default_primary_endpoint", alias = "health_url")]
    pub primary_endpoint: String,

    /// Postgres connection string. Absent or blank skips the database probe.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Comma-separated list of additional endpoints.
    #[serde(default, alias = "extra_health_urls")]
    pub extra_endpoints: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Run probes concurrently; `false` runs them one after another.
    #[serde(default = "default_true")]
    pub concurrent: bool,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    #[serde(default = "default_health_path")]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("primary_endpoint must not be empty")]
    EmptyPrimaryEndpoint,

    #[error("timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("{field} must start with '/', got {value:?}")]
    InvalidPath { field: &'static str, value: String },

    #[error("metrics path {0:?} collides with the health check path")]
    PathCollision(String),
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Database target, with blank values treated as not configured.
    pub fn database_target(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.primary_endpoint.trim().is_empty() {
            return Err(ConfigError::EmptyPrimaryEndpoint);
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if !self.server.path.starts_with('/') {
            return Err(ConfigError::InvalidPath {
                field: "server.path",
                value: self.server.path.clone(),
            });
        }
        if self.metrics.enabled {
            if !self.metrics.path.starts_with('/') {
                return Err(ConfigError::InvalidPath {
                    field: "metrics.path",
                    value: self.metrics.path.clone(),
                });
            }
            if self.metrics.path == self.server.path {
                return Err(ConfigError::PathCollision(self.metrics.path.clone()));
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            primary_endpoint: default_primary_endpoint(),
            database_url: None,
            extra_endpoints: None,
            timeout_secs: default_timeout_secs(),
            concurrent: true,
            server: ServerConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            path: default_health_path(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_metrics_path(),
        }
    }
}

fn default_primary_endpoint() -> String {
    DEFAULT_PRIMARY_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_true() -> bool {
    true
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 5001))
}

fn default_health_path() -> String {
    "/health-checks".to_string()
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}
