//! HTTP metrics middleware.
//!
//! Records every response, including those produced before a handler runs:
//! 401 from the auth layer, 404 for unknown routes, 405 for wrong methods.

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::observability::metrics::record_http_request;

/// Middleware that records method, normalized path, status, and duration.
///
/// Applied as the outermost layer so rejected requests are counted too.
pub async fn http_metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    record_http_request(&method, &path, response.status().as_u16(), start.elapsed());

    response
}
