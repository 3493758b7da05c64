//! Prometheus metrics emitted by the Jokes API.
//!
//! Names carry a `jokes_` prefix. Counters end in `_total` and latency
//! histograms in `_seconds`.
//!
//! Every label value comes from a fixed set. Request paths are mapped onto
//! the route table (anything unrecognised becomes `/other`), statuses onto
//! an outcome class, and validation results onto `AuthError::kind`.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Install the process-wide Prometheus recorder.
///
/// The returned handle renders the `/metrics` body. Anything recorded
/// before installation is lost.
///
/// # Errors
///
/// Fails if bucket configuration is rejected or a recorder is already set.
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("jokes_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.150, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("invalid HTTP latency buckets: {e}"))?
        // JWKS fetches are bounded by the client timeout (max 60s)
        .set_buckets_for_metric(
            Matcher::Prefix("jokes_jwks_fetch".to_string()),
            &[
                0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.000,
            ],
        )
        .map_err(|e| format!("invalid JWKS latency buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("cannot install metrics recorder: {e}"))
}

/// `jokes_http_requests_total` (by status code) and
/// `jokes_http_request_duration_seconds` (by outcome class).
pub fn record_http_request(method: &str, path: &str, status_code: u16, duration: Duration) {
    let route = normalize_endpoint(path);

    histogram!("jokes_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => route,
        "status" => outcome(status_code)
    )
    .record(duration.as_secs_f64());

    counter!("jokes_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => route,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

fn outcome(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Map a request path onto its route template.
fn normalize_endpoint(path: &str) -> &'static str {
    match path {
        "/api" | "/api/" => "/api/",
        "/api/jokes" => "/api/jokes",
        "/metrics" => "/metrics",
        _ if path.starts_with("/api/jokes/like/") => "/api/jokes/like/{id}",
        _ => "/other",
    }
}

/// `jokes_jwks_fetch_total` and `jokes_jwks_fetch_duration_seconds`.
pub fn record_jwks_fetch(success: bool, duration: Duration) {
    let status = if success { "success" } else { "error" };

    histogram!("jokes_jwks_fetch_duration_seconds", "status" => status)
        .record(duration.as_secs_f64());
    counter!("jokes_jwks_fetch_total", "status" => status).increment(1);
}

/// `jokes_token_validations_total{result}`, where `result` is `success`
/// or an `AuthError::kind`.
pub fn record_token_validation(result: &'static str) {
    counter!("jokes_token_validations_total", "result" => result).increment(1);
}

pub fn record_like() {
    counter!("jokes_likes_total").increment(1);
}
