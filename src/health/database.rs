// src/health/database.rs
use super::probe::{Probe, ProbeError, ProbeSpec};
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use sqlx::{Connection, PgConnection};
use std::sync::Arc;
use tokio::time::{timeout, timeout_at, Duration, Instant};
use tracing::{debug, warn};

/// Upper bound for closing a connection once the check is done.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// Opens sessions against a database target.
#[async_trait]
pub trait DatabaseConnector: Send + Sync {
    async fn connect(&self, target: &str) -> Result<Box<dyn DatabaseSession>, ProbeError>;
}

/// One open connection used for a single liveness query.
#[async_trait]
pub trait DatabaseSession: Send {
    async fn ping(&mut self) -> Result<(), ProbeError>;

    async fn close(self: Box<Self>) -> Result<(), ProbeError>;
}

/// Connects with a fresh `SELECT 1` round trip and always closes afterwards.
pub struct DatabaseProbe {
    connector: Arc<dyn DatabaseConnector>,
    timeout: Duration,
}

impl DatabaseProbe {
    pub fn new(connector: Arc<dyn DatabaseConnector>, timeout: Duration) -> Self {
        Self { connector, timeout }
    }

    pub fn postgres(timeout: Duration) -> Self {
        Self::new(Arc::new(PgConnector), timeout)
    }
}

#[async_trait]
impl Probe for DatabaseProbe {
    async fn check(&self, spec: &ProbeSpec) -> Result<(), ProbeError> {
        let deadline = Instant::now() + self.timeout;

        let mut session = match timeout_at(deadline, self.connector.connect(spec.target())).await {
            Ok(Ok(session)) => session,
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(ProbeError::Timeout(self.timeout)),
        };

        let result = match timeout_at(deadline, session.ping()).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout(self.timeout)),
        };

        // Released on every path; a failed close never masks the query result.
        match timeout(CLOSE_TIMEOUT, session.close()).await {
            Ok(Ok(())) => debug!(database = spec.label(), "Database connection closed"),
            Ok(Err(e)) => warn!(database = spec.label(), error = %e, "Failed to close database connection"),
            Err(_) => warn!(database = spec.label(), "Closing database connection timed out"),
        }

        result
    }

    fn name(&self) -> &'static str {
        "database"
    }
}

pub struct PgConnector;

struct PgSession {
    conn: PgConnection,
}

#[async_trait]
impl DatabaseConnector for PgConnector {
    async fn connect(&self, target: &str) -> Result<Box<dyn DatabaseSession>, ProbeError> {
        let options = connect_options(target)?;
        let conn = PgConnection::connect_with(&options).await.map_err(classify)?;
        Ok(Box::new(PgSession { conn }))
    }
}

#[async_trait]
impl DatabaseSession for PgSession {
    async fn ping(&mut self) -> Result<(), ProbeError> {
        sqlx::query("SELECT 1")
            .execute(&mut self.conn)
            .await
            .map(|_| ())
            .map_err(classify)
    }

    async fn close(self: Box<Self>) -> Result<(), ProbeError> {
        let PgSession { conn } = *self;
        conn.close().await.map_err(classify)
    }
}

/// Accepts both `postgres://` URLs and libpq `key=value` strings.
fn connect_options(target: &str) -> Result<PgConnectOptions, ProbeError> {
    if target.contains("://") {
        return target.parse().map_err(classify);
    }

    let mut options = PgConnectOptions::new();
    for pair in target.split_whitespace() {
        let (key, value) = pair.split_once('=').ok_or_else(|| {
            ProbeError::Dependency(format!("missing \"=\" after {:?} in connection string", pair))
        })?;
        let value = value.trim_matches('\'');

        options = match key {
            "host" | "hostaddr" => options.host(value),
            "port" => options.port(value.parse().map_err(|_| {
                ProbeError::Dependency(format!("invalid port {:?} in connection string", value))
            })?),
            "user" => options.username(value),
            "password" => options.password(value),
            "dbname" => options.database(value),
            "application_name" => options.application_name(value),
            "sslmode" => options.ssl_mode(value.parse::<PgSslMode>().map_err(classify)?),
            // Timeouts are enforced by the probe itself.
            "connect_timeout" => options,
            other => {
                return Err(ProbeError::Dependency(format!(
                    "invalid connection option {:?}",
                    other
                )))
            }
        };
    }
    Ok(options)
}

fn classify(error: sqlx::Error) -> ProbeError {
    match error {
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) => ProbeError::Transport(error.to_string()),
        other => ProbeError::Dependency(other.to_string()),
    }
}
