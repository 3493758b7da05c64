//! Bearer token validation.
//!
//! Validates Auth0 access tokens using RSA keys resolved from the issuer's
//! JWKS endpoint.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - A foreign audience is reported as such whatever else is wrong with the
//!   token: `aud` and `iss` are read from the unverified payload first, and
//!   checked again on the verified claims
//! - Only RS256 is accepted; `none` and HMAC tokens never reach key lookup
//! - Expiration and issued-at claims are validated with clock skew tolerance

use crate::auth::claims::{Claims, UnverifiedClaims};
use crate::auth::jwks::JwksClient;
use crate::errors::AuthError;
use crate::observability::metrics::record_token_validation;
use common::jwt::{extract_kid, peek_claims, validate_iat, JwtValidationError};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// JWT validator bound to one audience and issuer.
pub struct JwtValidator {
    jwks_client: Arc<JwksClient>,
    audience: String,
    issuer: String,
    /// Clock skew tolerance in seconds for exp/iat validation.
    clock_skew_seconds: i64,
}

impl JwtValidator {
    /// Create a new JWT validator.
    ///
    /// # Arguments
    ///
    /// * `jwks_client` - Resolves signing keys by kid
    /// * `audience` - Value that must appear in the `aud` claim
    /// * `issuer` - Exact value required in the `iss` claim
    /// * `clock_skew_seconds` - Clock skew tolerance for exp/iat validation
    pub fn new(
        jwks_client: Arc<JwksClient>,
        audience: impl Into<String>,
        issuer: impl Into<String>,
        clock_skew_seconds: i64,
    ) -> Self {
        Self {
            jwks_client,
            audience: audience.into(),
            issuer: issuer.into(),
            clock_skew_seconds,
        }
    }

    /// Validate a bearer token and return its claims.
    ///
    /// # Checks, in order
    ///
    /// 1. Size and compact structure (three segments, JSON payload)
    /// 2. Audience contains the configured audience
    /// 3. Issuer equals the configured issuer
    /// 4. Header decodes and names RS256
    /// 5. Header carries a kid
    /// 6. Key for that kid resolves from the JWKS
    /// 7. Signature and expiry verify against that key
    /// 8. `iat` is not beyond the clock skew
    ///
    /// # Errors
    ///
    /// The first failing check's `AuthError`.
    #[instrument(skip_all)]
    pub async fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let result = self.validate_inner(token).await;
        match &result {
            Ok(_) => {
                tracing::debug!(target: "jokes.auth.jwt", "Token validated successfully");
                record_token_validation("success");
            }
            Err(e) => {
                tracing::debug!(target: "jokes.auth.jwt", kind = e.kind(), error = %e, "Token validation failed");
                record_token_validation(e.kind());
            }
        }
        result
    }

    async fn validate_inner(&self, token: &str) -> Result<Claims, AuthError> {
        // 1. Structure (includes the size check via common::jwt)
        let unverified: UnverifiedClaims =
            peek_claims(token).map_err(|_| AuthError::MalformedToken)?;

        // 2-3. Audience and issuer, ahead of every other check
        if !unverified.has_audience(&self.audience) {
            return Err(AuthError::InvalidAudience);
        }
        if !unverified.has_issuer(&self.issuer) {
            return Err(AuthError::InvalidIssuer);
        }

        // 4. Algorithm. `none` is not an `Algorithm`, so it fails to decode.
        let header = decode_header(token).map_err(|_| AuthError::MalformedToken)?;
        if header.alg != Algorithm::RS256 {
            return Err(AuthError::UnsupportedAlgorithm(format!("{:?}", header.alg)));
        }

        // 5. Key id
        let kid = extract_kid(token).map_err(|e| match e {
            JwtValidationError::MissingKid => AuthError::MissingKeyId,
            _ => AuthError::MalformedToken,
        })?;

        // 6. Key resolution
        let key = self.jwks_client.resolve_key(&kid).await?;

        // 7. Signature, expiry, and the verified aud/iss
        let claims = decode::<Claims>(token, &key, &self.validation())
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidAudience => AuthError::InvalidAudience,
                ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
                // Signed, but without `exp` or with claims of the wrong shape
                ErrorKind::MissingRequiredClaim(_) | ErrorKind::Json(_) => AuthError::MalformedToken,
                _ => {
                    tracing::debug!(target: "jokes.auth.jwt", kid = %kid, error = %e, "Token verification failed");
                    AuthError::SignatureInvalid
                }
            })?
            .claims;

        // 8. Issued-at
        if let Some(iat) = claims.iat {
            validate_iat(iat, self.clock_skew())
                .map_err(|_| AuthError::IssuedInFuture)?;
        }

        Ok(claims)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = true;
        validation.leeway = self.clock_skew().as_secs();
        validation.set_audience(&[self.audience.as_str()]);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation
    }

    fn clock_skew(&self) -> Duration {
        Duration::from_secs(self.clock_skew_seconds.max(0).unsigned_abs())
    }
}
