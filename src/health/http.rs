// src/health/http.rs
use super::probe::{Probe, ProbeError, ProbeSpec};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tokio::time::{timeout, Duration};
use tracing::debug;

/// GET-based reachability check. Only an exact 200 counts as healthy.
pub struct HttpProbe {
    client: Client,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, timeout })
    }

    fn classify(&self, error: reqwest::Error) -> ProbeError {
        if error.is_timeout() {
            ProbeError::Timeout(self.timeout)
        } else {
            ProbeError::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn check(&self, spec: &ProbeSpec) -> Result<(), ProbeError> {
        let start = std::time::Instant::now();

        let result = timeout(self.timeout, self.client.get(spec.target()).send()).await;

        let outcome = match result {
            Ok(Ok(response)) => {
                let status = response.status();
                if status == StatusCode::OK {
                    Ok(())
                } else {
                    Err(ProbeError::Status(status.as_u16()))
                }
            }
            Ok(Err(e)) => Err(self.classify(e)),
            Err(_) => Err(ProbeError::Timeout(self.timeout)),
        };

        debug!(
            target_url = spec.label(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            ok = outcome.is_ok(),
            "HTTP probe finished"
        );

        outcome
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    fn probe(timeout: Duration) -> HttpProbe {
        HttpProbe::new(timeout).unwrap()
    }

    #[tokio::test]
    async fn test_status_200_passes() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/health")
            .with_status(200)
            .with_body("OK")
            .create_async()
            .await;

        let spec = ProbeSpec::primary(format!("{}/health", server.url()));
        let result = probe(Duration::from_secs(5)).check(&spec).await;

        assert_eq!(result, Ok(()));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_other_success_codes_fail() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/health")
            .with_status(204)
            .create_async()
            .await;

        let spec = ProbeSpec::primary(format!("{}/health", server.url()));
        let result = probe(Duration::from_secs(5)).check(&spec).await;

        assert_eq!(result, Err(ProbeError::Status(204)));
    }

    #[tokio::test]
    async fn test_server_error_reports_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/health")
            .with_status(503)
            .create_async()
            .await;

        let spec = ProbeSpec::extra(format!("{}/health", server.url()));
        let result = probe(Duration::from_secs(5)).check(&spec).await;

        assert_eq!(result, Err(ProbeError::Status(503)));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let spec = ProbeSpec::primary(format!("http://{}/health", addr));
        let result = probe(Duration::from_secs(5)).check(&spec).await;

        assert!(matches!(result, Err(ProbeError::Transport(_))));
    }

    #[tokio::test]
    async fn test_malformed_url_is_probe_failure() {
        let spec = ProbeSpec::extra("not a url");
        let result = probe(Duration::from_secs(5)).check(&spec).await;

        assert!(matches!(result, Err(ProbeError::Transport(_))));
    }

    #[tokio::test]
    async fn test_unresponsive_target_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept and hold connections without ever answering.
        let holder = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let timeout = Duration::from_millis(200);
        let spec = ProbeSpec::extra(format!("http://{}/health", addr));
        let result = probe(timeout).check(&spec).await;

        assert_eq!(result, Err(ProbeError::Timeout(timeout)));
        holder.abort();
    }
}
