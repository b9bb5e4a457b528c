// src/server/handler.rs
use hyper::header::{ALLOW, CONTENT_TYPE};
use hyper::{Body, Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::sync::Arc;
use tower::Service;

use crate::config::Config;
use crate::health::{build_plan, AggregateResult, Aggregator};
use crate::metrics::MetricsRegistry;

/// Routes the health-check and metrics paths; everything else is 404.
#[derive(Clone)]
pub struct RequestHandler {
    state: Arc<HandlerState>,
}

struct HandlerState {
    config: Config,
    aggregator: Aggregator,
    metrics: Option<Arc<MetricsRegistry>>,
}

impl RequestHandler {
    pub fn new(config: Config, aggregator: Aggregator, metrics: Option<Arc<MetricsRegistry>>) -> Self {
        Self {
            state: Arc::new(HandlerState {
                config,
                aggregator,
                metrics,
            }),
        }
    }
}

impl HandlerState {
    async fn handle(&self, req: Request<Body>) -> Response<Body> {
        let path = req.uri().path().to_string();

        if path == self.config.server.path {
            if req.method() != Method::GET {
                return Response::builder()
                    .status(StatusCode::METHOD_NOT_ALLOWED)
                    .header(ALLOW, "GET")
                    .body(Body::from("Method Not Allowed"))
                    .unwrap_or_else(|_| internal_error());
            }
            let plan = build_plan(&self.config);
            let result = self.aggregator.run(&plan).await;
            return report_response(&result);
        }

        if let Some(registry) = &self.metrics {
            if path == self.config.metrics.path {
                return match registry.gather() {
                    Ok(body) => Response::builder()
                        .status(StatusCode::OK)
                        .header(CONTENT_TYPE, "text/plain; version=0.0.4")
                        .body(Body::from(body))
                        .unwrap_or_else(|_| internal_error()),
                    Err(e) => {
                        tracing::error!(%e, "failed to encode metrics");
                        internal_error()
                    }
                };
            }
        }

        let mut response = Response::new(Body::from("Not Found"));
        *response.status_mut() = StatusCode::NOT_FOUND;
        response
    }
}

/// 200 for an `ok` verdict, 503 for `error`; the body is the JSON report.
pub fn report_response(result: &AggregateResult) -> Response<Body> {
    let status = if result.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(result.to_json()))
        .unwrap_or_else(|_| internal_error())
}

fn internal_error() -> Response<Body> {
    let mut response = Response::new(Body::from("Internal Server Error"));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

impl Service<Request<Body>> for RequestHandler {
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = futures::future::BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let state = self.state.clone();
        Box::pin(async move { Ok(state.handle(req).await) })
    }
}
