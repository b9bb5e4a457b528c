// src/main.rs
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

use healthcheck_aggregator::{
    config::{self, Config},
    health::{build_plan, Aggregator},
    metrics::MetricsRegistry,
    server::{RequestHandler, ServerBuilder},
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Aggregated liveness checks for a service and its dependencies")]
struct Args {
    /// Run one round of checks, print the JSON report and exit
    #[arg(long)]
    once: bool,

    /// YAML or JSON config file; the environment is used when omitted
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so `--once` keeps stdout for the report.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("healthcheck_aggregator=debug".parse()?)
                .add_directive("hyper=info".parse()?),
        )
        .init();

    let config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            config::load_config(path).await?
        }
        None => {
            info!("Loading configuration from environment");
            Config::from_env()?
        }
    };

    let metrics_registry = Arc::new(MetricsRegistry::new()?);
    let aggregator = Aggregator::from_config(&config)?.with_metrics(metrics_registry.collector());

    if args.once {
        let result = aggregator.run(&build_plan(&config)).await;
        println!("{}", result.to_json());
        if !result.is_ok() {
            std::process::exit(1);
        }
        return Ok(());
    }

    let metrics = config.metrics.enabled.then(|| metrics_registry.clone());
    let handler = RequestHandler::new(config.clone(), aggregator, metrics);

    info!(
        "Serving health checks on http://{}{}",
        config.server.listen, config.server.path
    );

    ServerBuilder::new(config.server.listen)
        .with_handler(handler)
        .serve(shutdown_signal())
        .await?;

    Ok(())
}

// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_once_with_config_file() {
        let args = Args::try_parse_from(["healthcheck-aggregator", "--once", "checks.yaml"]).unwrap();
        assert!(args.once);
        assert_eq!(args.config, Some(PathBuf::from("checks.yaml")));
    }

    #[test]
    fn test_args_default_to_server_mode_from_env() {
        let args = Args::try_parse_from(["healthcheck-aggregator"]).unwrap();
        assert!(!args.once);
        assert!(args.config.is_none());
    }

    #[test]
    fn test_args_reject_extra_positional() {
        assert!(Args::try_parse_from(["healthcheck-aggregator", "a.yaml", "b.yaml"]).is_err());
        assert!(Args::try_parse_from(["healthcheck-aggregator", "--verbose"]).is_err());
    }
}
