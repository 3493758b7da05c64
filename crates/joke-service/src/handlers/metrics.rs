//! Prometheus metrics endpoint handler.
//!
//! The endpoint is unauthenticated so Prometheus can scrape it. Labels are
//! bounded and carry no token contents.

use axum::{extract::State, response::IntoResponse};
use metrics_exporter_prometheus::PrometheusHandle;

/// Handler for GET /metrics
///
/// Returns Prometheus text format:
/// ```text
/// # TYPE jokes_http_requests_total counter
/// jokes_http_requests_total{method="GET",endpoint="/api/jokes",status_code="200"} 42
/// ```
#[tracing::instrument(skip_all, name = "jokes.metrics.scrape")]
pub async fn metrics_handler(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}
