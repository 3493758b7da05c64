//! HTTP routes for the Jokes API.
//!
//! Defines the Axum router and application state.

use crate::auth::{JwksClient, JwtValidator};
use crate::config::Config;
use crate::handlers;
use crate::middleware::{http_metrics_middleware, require_auth, AuthState};
use crate::services::JokeStore;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Overall per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Joke list shared by every request.
    pub jokes: Arc<JokeStore>,
}

impl AppState {
    /// State with the built-in jokes.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            jokes: Arc::new(JokeStore::seeded()),
        }
    }
}

/// Assemble the router.
///
/// `/api/`, `/api` and `/metrics` are open. `/api/jokes` and
/// `POST /api/jokes/like/:jokeID` sit behind [`require_auth`], which shares
/// one JWKS client (and so one key cache) across all requests.
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let jwks_client = Arc::new(JwksClient::for_issuer(
        &state.config.issuer,
        state.config.jwks_fetch_timeout,
        state.config.jwks_cache_ttl,
    ));
    tracing::info!(target: "jokes.auth.jwks", url = %jwks_client.jwks_url(), "JWKS endpoint configured");

    let jwt_validator = Arc::new(JwtValidator::new(
        jwks_client,
        state.config.audience.clone(),
        state.config.issuer.clone(),
        state.config.jwt_clock_skew_seconds,
    ));
    let auth_state = Arc::new(AuthState { jwt_validator });

    let public_routes = Router::new()
        .route("/api/", get(handlers::ping))
        .route("/api", get(handlers::ping));

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    let protected_routes = Router::new()
        .route("/api/jokes", get(handlers::list_jokes))
        .route("/api/jokes/like/:jokeID", post(handlers::like_joke))
        .route_layer(middleware::from_fn_with_state(auth_state, require_auth))
        .with_state(state);

    // Metrics wrap everything, so 401/404/405 and timeouts are counted.
    public_routes
        .merge(metrics_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(middleware::from_fn(http_metrics_middleware))
}
