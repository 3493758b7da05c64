//! Unauthenticated liveness endpoint.

use crate::models::PingResponse;
use axum::Json;

/// Handler for GET /api/
///
/// Returns `{"message":"pong"}` without touching auth or the store.
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse::pong())
}
