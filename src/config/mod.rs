// src/config/mod.rs
mod models;

pub use models::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a file (YAML or JSON)
pub async fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let config = parse_config(&contents, is_yaml(path))?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Build configuration from process environment variables.
    ///
    /// `HEALTH_URL`, `DATABASE_URL` and `EXTRA_HEALTH_URLS` map onto the
    /// probe targets; every other field uses its own upper-cased name
    /// (`TIMEOUT_SECS`, `CONCURRENT`, `SERVER__LISTEN`, ...).
    pub fn from_env() -> Result<Self> {
        let config: Config = ::config::Config::builder()
            .add_source(::config::Environment::default().separator("__"))
            .build()
            .context("Failed to read environment configuration")?
            .try_deserialize()
            .context("Failed to parse environment configuration")?;

        config.validate()?;
        Ok(config)
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    )
}

fn parse_config(contents: &str, yaml: bool) -> Result<Config> {
    let config = if yaml {
        serde_yaml::from_str(contents).context("Failed to parse YAML config")?
    } else {
        serde_json::from_str(contents).context("Failed to parse JSON config")?
    };
    Ok(config)
}
