//! Jokes API error types.
//!
//! `AuthError` describes why a bearer token was rejected; `ApiError` is the
//! HTTP boundary type. Authentication failures are surfaced to clients as a
//! uniform 401 with a generic body; the specific reason is logged
//! server-side only.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Body returned for every authentication failure.
pub const UNAUTHORIZED_BODY: &str = "Unauthorized";

/// `WWW-Authenticate` challenge attached to 401 responses.
pub const WWW_AUTHENTICATE_CHALLENGE: &str = "Bearer realm=\"jokes-api\", error=\"invalid_token\"";

/// Reasons a bearer token can be rejected.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing or malformed Authorization header")]
    MissingToken,

    #[error("Token is not a well-formed JWT")]
    MalformedToken,

    #[error("Token signed with unsupported algorithm '{0}'")]
    UnsupportedAlgorithm(String),

    #[error("Invalid audience")]
    InvalidAudience,

    #[error("Invalid issuer")]
    InvalidIssuer,

    #[error("Token header has no key id")]
    MissingKeyId,

    #[error("Failed to fetch key set: {0}")]
    KeyFetch(String),

    #[error("Unable to find appropriate key for kid '{0}'")]
    KeyNotFound(String),

    #[error("Failed to parse key material for kid '{kid}': {reason}")]
    KeyParse { kid: String, reason: String },

    #[error("Token signature is invalid")]
    SignatureInvalid,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token issued-at is in the future")]
    IssuedInFuture,
}

impl AuthError {
    /// Bounded label for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing_token",
            AuthError::MalformedToken => "malformed_token",
            AuthError::UnsupportedAlgorithm(_) => "unsupported_algorithm",
            AuthError::InvalidAudience => "invalid_audience",
            AuthError::InvalidIssuer => "invalid_issuer",
            AuthError::MissingKeyId => "missing_kid",
            AuthError::KeyFetch(_) => "key_fetch",
            AuthError::KeyNotFound(_) => "key_not_found",
            AuthError::KeyParse { .. } => "key_parse",
            AuthError::SignatureInvalid => "signature_invalid",
            AuthError::TokenExpired => "token_expired",
            AuthError::IssuedInFuture => "iat_in_future",
        }
    }
}

/// Errors from the in-memory joke store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum JokeError {
    #[error("No joke with id {0}")]
    NotFound(i64),

    #[error("Duplicate joke id {0}")]
    DuplicateId(i64),
}

/// HTTP boundary error.
///
/// Maps to status codes:
/// - Unauthorized: 401 with `Unauthorized` text body and `WWW-Authenticate`
/// - NotFound: 404 with an empty body
/// - Internal: 500
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(#[from] AuthError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Unauthorized(_) => 401,
            ApiError::NotFound(_) => 404,
            ApiError::Internal => 500,
        }
    }
}

impl From<JokeError> for ApiError {
    fn from(err: JokeError) -> Self {
        match err {
            JokeError::NotFound(id) => ApiError::NotFound(format!("joke {id}")),
            JokeError::DuplicateId(id) => {
                tracing::error!(target: "jokes.store", joke_id = id, "Joke store invariant violated");
                ApiError::Internal
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized(reason) => {
                // Remote key set outages are operational problems, not client mistakes
                match &reason {
                    AuthError::KeyFetch(_) | AuthError::KeyParse { .. } => {
                        tracing::warn!(target: "jokes.auth", kind = reason.kind(), error = %reason, "Request rejected");
                    }
                    _ => {
                        tracing::debug!(target: "jokes.auth", kind = reason.kind(), error = %reason, "Request rejected");
                    }
                }
                (
                    StatusCode::UNAUTHORIZED,
                    [(header::WWW_AUTHENTICATE, WWW_AUTHENTICATE_CHALLENGE)],
                    UNAUTHORIZED_BODY,
                )
                    .into_response()
            }
            ApiError::NotFound(resource) => {
                tracing::debug!(target: "jokes.api", resource = %resource, "Resource not found");
                StatusCode::NOT_FOUND.into_response()
            }
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: ErrorDetail {
                        code: "INTERNAL_ERROR",
                        message: "An internal error occurred",
                    },
                }),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;

    async fn read_body(body: Body) -> Vec<u8> {
        body.collect().await.unwrap().to_bytes().to_vec()
    }

    #[test]
    fn test_display_auth_errors() {
        assert_eq!(AuthError::InvalidAudience.to_string(), "Invalid audience");
        assert_eq!(AuthError::InvalidIssuer.to_string(), "Invalid issuer");
        assert_eq!(
            AuthError::KeyNotFound("k1".to_string()).to_string(),
            "Unable to find appropriate key for kid 'k1'"
        );
    }

    #[test]
    fn test_auth_error_kinds_are_distinct() {
        let kinds = [
            AuthError::MissingToken.kind(),
            AuthError::MalformedToken.kind(),
            AuthError::UnsupportedAlgorithm("HS256".to_string()).kind(),
            AuthError::InvalidAudience.kind(),
            AuthError::InvalidIssuer.kind(),
            AuthError::MissingKeyId.kind(),
            AuthError::KeyFetch("down".to_string()).kind(),
            AuthError::KeyNotFound("k".to_string()).kind(),
            AuthError::KeyParse {
                kid: "k".to_string(),
                reason: "bad".to_string(),
            }
            .kind(),
            AuthError::SignatureInvalid.kind(),
            AuthError::TokenExpired.kind(),
            AuthError::IssuedInFuture.kind(),
        ];
        let unique: std::collections::HashSet<_> = kinds.iter().collect();
        assert_eq!(unique.len(), kinds.len());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::Unauthorized(AuthError::MissingToken).status_code(),
            401
        );
        assert_eq!(ApiError::NotFound("joke 9".to_string()).status_code(), 404);
        assert_eq!(ApiError::Internal.status_code(), 500);
    }

    #[test]
    fn test_joke_error_conversion() {
        assert!(matches!(
            ApiError::from(JokeError::NotFound(9)),
            ApiError::NotFound(msg) if msg == "joke 9"
        ));
        assert!(matches!(
            ApiError::from(JokeError::DuplicateId(1)),
            ApiError::Internal
        ));
    }

    #[tokio::test]
    async fn test_unauthorized_hides_reason() {
        let error = ApiError::from(AuthError::KeyFetch("connection refused".to_string()));
        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let www_auth = response
            .headers()
            .get("WWW-Authenticate")
            .unwrap()
            .to_str()
            .unwrap();
        assert!(www_auth.contains("Bearer realm=\"jokes-api\""));

        let body = read_body(response.into_body()).await;
        assert_eq!(body, b"Unauthorized");
    }

    #[tokio::test]
    async fn test_not_found_has_empty_body() {
        let response = ApiError::NotFound("joke 999".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(read_body(response.into_body()).await.is_empty());
    }

    #[tokio::test]
    async fn test_internal_is_generic_json() {
        let response = ApiError::Internal.into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value =
            serde_json::from_slice(&read_body(response.into_body()).await).unwrap();
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
    }
}
