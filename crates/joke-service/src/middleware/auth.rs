//! Authentication middleware for protected routes.
//!
//! Extracts the bearer token from the Authorization header, validates it,
//! and injects the claims into request extensions.

use crate::auth::{Claims, JwtValidator};
use crate::errors::{ApiError, AuthError};
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::instrument;

/// State for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    /// Token validator with its JWKS client.
    pub jwt_validator: Arc<JwtValidator>,
}

/// Authentication middleware that validates bearer tokens.
///
/// # Authorization Header Format
///
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// The scheme is matched case-insensitively.
///
/// # Response
///
/// - 401 `Unauthorized` with `WWW-Authenticate` if the token is missing or invalid
/// - Otherwise continues with `Claims` in the request extensions
#[instrument(skip(state, req, next), name = "jokes.middleware.auth")]
pub async fn require_auth(
    State(state): State<Arc<AuthState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let token = bearer_token(&req).ok_or_else(|| {
        tracing::debug!(target: "jokes.middleware.auth", "Missing or malformed Authorization header");
        AuthError::MissingToken
    })?;

    let claims = state.jwt_validator.validate(token).await?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Extract the token from an `Authorization: Bearer <token>` header.
fn bearer_token<B>(req: &axum::extract::Request<B>) -> Option<&str> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() || token.contains(' ') {
        return None;
    }
    Some(token)
}

/// Extension trait for extracting claims from a request.
pub trait ClaimsExt {
    /// Get the authenticated claims from request extensions.
    ///
    /// Returns `None` if the auth middleware was not applied to this request.
    fn claims(&self) -> Option<&Claims>;
}

impl<B> ClaimsExt for axum::extract::Request<B> {
    fn claims(&self) -> Option<&Claims> {
        self.extensions().get::<Claims>()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    // Full middleware flows need a mock JWKS endpoint and live in the
    // integration tests.

    use super::*;
    use axum::body::Body;
    use axum::http;

    fn request_with(auth: Option<&str>) -> Request<Body> {
        let mut builder = http::Request::builder().uri("/api/jokes");
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_auth_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AuthState>();
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&request_with(Some("Bearer abc.def.ghi"))), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&request_with(Some("bearer abc.def.ghi"))), Some("abc.def.ghi"));
    }

    #[test]
    fn test_bearer_token_rejects_bad_headers() {
        assert_eq!(bearer_token(&request_with(None)), None);
        assert_eq!(bearer_token(&request_with(Some(""))), None);
        assert_eq!(bearer_token(&request_with(Some("Bearer"))), None);
        assert_eq!(bearer_token(&request_with(Some("Bearer "))), None);
        assert_eq!(bearer_token(&request_with(Some("Basic dXNlcjpwYXNz"))), None);
        assert_eq!(bearer_token(&request_with(Some("Bearer a b"))), None);
    }

    #[test]
    fn test_claims_ext_without_middleware() {
        assert!(request_with(None).claims().is_none());
    }
}
