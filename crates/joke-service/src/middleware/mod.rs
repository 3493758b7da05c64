//! HTTP middleware for the Jokes API.
//!
//! # Components
//!
//! - `auth` - Bearer token authentication for protected routes
//! - `http_metrics` - Request metrics for every response

pub mod auth;
pub mod http_metrics;

pub use auth::{require_auth, AuthState, ClaimsExt};
pub use http_metrics::http_metrics_middleware;
