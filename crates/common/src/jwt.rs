//! JWT utilities shared across the Jokes API crates.
//!
//! Everything here works on the compact token text alone, without key
//! material: the size cap, header `kid` lookup, unverified claim peeking,
//! `iat` skew checks, and turning a JWKS `x5c` value into a PEM certificate.
//!
//! Every entry point enforces [`MAX_JWT_SIZE_BYTES`] before decoding
//! anything. Claims returned by [`peek_claims`] are unverified; use them to
//! turn tokens away early, never to let one in.
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::jwt::{extract_kid, peek_claims, validate_iat, DEFAULT_CLOCK_SKEW};
//!
//! let unverified: MyClaims = peek_claims(token)?;
//! let kid = extract_kid(token)?;
//!
//! // once the signature checks out:
//! validate_iat(verified.iat, DEFAULT_CLOCK_SKEW)?;
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

/// Upper bound on compact token length, in bytes.
///
/// Auth0 RS256 access tokens run 600-1200 bytes; anything past 8 KiB is
/// refused without being decoded.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// Default tolerance between our clock and the issuer's (5 minutes).
///
/// Applies to `iat` in the future and, as leeway, to `exp`.
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(300);

/// Largest tolerance configuration may ask for (10 minutes).
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(600);

/// Column width used when wrapping certificate bodies into PEM.
const PEM_LINE_WIDTH: usize = 64;

/// Reasons a token fails the key-independent checks.
///
/// Callers map these onto their own rejection type; details go to the
/// `common.jwt` debug log.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    #[error("token exceeds {MAX_JWT_SIZE_BYTES} bytes")]
    TokenTooLarge,

    /// Not three dot-separated base64url JSON segments.
    #[error("token is not a well-formed compact JWT")]
    MalformedToken,

    /// Header has no usable `kid` (absent, not a string, or empty).
    #[error("token header has no kid")]
    MissingKid,

    #[error("token iat is beyond the allowed clock skew")]
    IatTooFarInFuture,
}

/// Split a compact JWT into its three segments after the size check.
fn split_token(token: &str) -> Result<(&str, &str, &str), JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Oversized token refused"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }

    let mut parts = token.split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(header), Some(payload), Some(signature), None) => Ok((header, payload, signature)),
        _ => {
            tracing::debug!(target: "common.jwt", "Token does not have three segments");
            Err(JwtValidationError::MalformedToken)
        }
    }
}

/// Decode one base64url JWT segment as JSON.
fn decode_segment<T: DeserializeOwned>(segment: &str, what: &str) -> Result<T, JwtValidationError> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, segment = what, "Failed to decode JWT base64");
        JwtValidationError::MalformedToken
    })?;

    serde_json::from_slice(&bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, segment = what, "Failed to parse JWT JSON");
        JwtValidationError::MalformedToken
    })
}

/// Read the header `kid` of an unverified token.
///
/// The value only selects a key from the issuer's JWKS; it says nothing
/// about whether the token is genuine.
///
/// # Errors
///
/// `TokenTooLarge` or `MalformedToken` for unusable input, `MissingKid` when
/// the header lacks a non-empty string `kid`.
pub fn extract_kid(token: &str) -> Result<String, JwtValidationError> {
    let (header_part, _, _) = split_token(token)?;
    let header: serde_json::Value = decode_segment(header_part, "header")?;

    header
        .get("kid")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or(JwtValidationError::MissingKid)
}

/// Decode the claim set of a JWT WITHOUT verifying its signature.
///
/// Used to reject tokens with the wrong audience or issuer before any key is
/// fetched. Never authorize a request from these claims alone.
///
/// # Errors
///
/// - `TokenTooLarge` - Token exceeds size limit
/// - `MalformedToken` - Token format invalid or payload does not match `T`
pub fn peek_claims<T: DeserializeOwned>(token: &str) -> Result<T, JwtValidationError> {
    let (_, payload_part, _) = split_token(token)?;
    decode_segment(payload_part, "payload")
}

/// Reject an `iat` more than `clock_skew` ahead of the local clock.
///
/// # Errors
///
/// `JwtValidationError::IatTooFarInFuture`.
pub fn validate_iat(iat: i64, clock_skew: Duration) -> Result<(), JwtValidationError> {
    let now = chrono::Utc::now().timestamp();
    validate_iat_at(iat, clock_skew, now)
}

/// Deterministic `iat` validation against an explicit `now` timestamp.
pub(crate) fn validate_iat_at(
    iat: i64,
    clock_skew: Duration,
    now: i64,
) -> Result<(), JwtValidationError> {
    let clock_skew_secs = i64::try_from(clock_skew.as_secs()).unwrap_or(i64::MAX);
    let max_iat = now.saturating_add(clock_skew_secs);

    if iat > max_iat {
        tracing::debug!(
            target: "common.jwt",
            iat = iat,
            now = now,
            max_allowed = max_iat,
            clock_skew_secs = clock_skew_secs,
            "Token issued too far ahead of local clock"
        );
        return Err(JwtValidationError::IatTooFarInFuture);
    }

    Ok(())
}

/// Wrap a JWKS `x5c` entry (standard base64 DER certificate) in PEM armor.
///
/// Whitespace in the input is dropped and the body is re-wrapped at 64
/// columns, so values copied from pretty-printed key sets still parse.
///
/// # Example
///
/// ```rust
/// use common::jwt::certificate_pem_from_x5c;
///
/// let pem = certificate_pem_from_x5c("MIIC");
/// assert_eq!(pem, "-----BEGIN CERTIFICATE-----\nMIIC\n-----END CERTIFICATE-----\n");
/// ```
#[must_use]
pub fn certificate_pem_from_x5c(x5c: &str) -> String {
    let mut pem = String::with_capacity(x5c.len() + x5c.len() / PEM_LINE_WIDTH + 64);
    pem.push_str("-----BEGIN CERTIFICATE-----\n");
    for (i, c) in x5c.chars().filter(|c| !c.is_whitespace()).enumerate() {
        if i > 0 && i % PEM_LINE_WIDTH == 0 {
            pem.push('\n');
        }
        pem.push(c);
    }
    pem.push_str("\n-----END CERTIFICATE-----\n");
    pem
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct PeekedClaims {
        iss: String,
        aud: serde_json::Value,
    }

    /// Token with the given JSON header and junk payload/signature segments.
    fn token_with_header(header: &str) -> String {
        format!("{}.e30.c2ln", URL_SAFE_NO_PAD.encode(header))
    }

    #[test]
    fn skew_limits_are_ordered() {
        assert!(DEFAULT_CLOCK_SKEW <= MAX_CLOCK_SKEW);
        assert_eq!(DEFAULT_CLOCK_SKEW.as_secs(), 300);
    }

    #[test]
    fn kid_is_read_from_header() {
        let token = token_with_header(r#"{"alg":"RS256","kid":"auth0-signing-2024"}"#);
        assert_eq!(extract_kid(&token).unwrap(), "auth0-signing-2024");
    }

    #[test]
    fn unusable_kid_values_are_missing() {
        for header in [
            r#"{"alg":"RS256"}"#,
            r#"{"alg":"RS256","kid":""}"#,
            r#"{"alg":"RS256","kid":42}"#,
            r#"{"alg":"RS256","kid":null}"#,
        ] {
            assert_eq!(
                extract_kid(&token_with_header(header)),
                Err(JwtValidationError::MissingKid),
                "header {header}"
            );
        }
    }

    #[test]
    fn garbage_is_malformed() {
        let not_json = format!("{}.e30.c2ln", URL_SAFE_NO_PAD.encode("plain text"));
        for token in ["", "abc", "a.b", "a.b.c.d", "%%%.e30.c2ln", not_json.as_str()] {
            assert_eq!(
                extract_kid(token),
                Err(JwtValidationError::MalformedToken),
                "token {token:?}"
            );
        }
    }

    #[test]
    fn size_cap_is_inclusive() {
        let header = URL_SAFE_NO_PAD.encode(r#"{"kid":"k"}"#);
        let filler = MAX_JWT_SIZE_BYTES - header.len() - 2;
        let exact = format!("{header}.{}.", "x".repeat(filler));
        assert_eq!(exact.len(), MAX_JWT_SIZE_BYTES);
        assert_eq!(extract_kid(&exact).unwrap(), "k");

        let over = format!("{exact}y");
        assert_eq!(extract_kid(&over), Err(JwtValidationError::TokenTooLarge));
        let peeked: Result<serde_json::Value, _> = peek_claims(&over);
        assert_eq!(peeked.unwrap_err(), JwtValidationError::TokenTooLarge);
    }

    #[test]
    fn peek_claims_ignores_signature() {
        let header_b64 = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","kid":"k"}"#);
        let payload_b64 = URL_SAFE_NO_PAD
            .encode(r#"{"iss":"https://tenant.example.com/","aud":["api","userinfo"]}"#);
        let token = format!("{header_b64}.{payload_b64}.not-a-real-signature");

        let claims: PeekedClaims = peek_claims(&token).unwrap();
        assert_eq!(claims.iss, "https://tenant.example.com/");
        assert_eq!(claims.aud, serde_json::json!(["api", "userinfo"]));
    }

    #[test]
    fn peek_claims_requires_expected_shape() {
        let header_b64 = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256"}"#);
        let payload_b64 = URL_SAFE_NO_PAD.encode(r#"{"sub":"user"}"#);
        let token = format!("{header_b64}.{payload_b64}.sig");

        let result: Result<PeekedClaims, _> = peek_claims(&token);
        assert_eq!(result.unwrap_err(), JwtValidationError::MalformedToken);
    }

    #[test]
    fn iat_window() {
        let now = 1_700_000_000_i64;
        let skew = DEFAULT_CLOCK_SKEW;

        assert!(validate_iat_at(now - 86_400, skew, now).is_ok());
        assert!(validate_iat_at(now, skew, now).is_ok());
        assert!(validate_iat_at(now + 300, skew, now).is_ok());
        assert_eq!(
            validate_iat_at(now + 301, skew, now),
            Err(JwtValidationError::IatTooFarInFuture)
        );
        assert!(validate_iat_at(now + 301, Duration::ZERO, now).is_err());
    }

    #[test]
    fn iat_uses_wall_clock() {
        let now = chrono::Utc::now().timestamp();
        assert!(validate_iat(now, DEFAULT_CLOCK_SKEW).is_ok());
        assert!(validate_iat(now + 3_600, DEFAULT_CLOCK_SKEW).is_err());
    }

    #[test]
    fn x5c_is_wrapped_at_64_columns() {
        let pem = certificate_pem_from_x5c(&"A".repeat(150));
        let lines: Vec<&str> = pem.lines().collect();

        assert_eq!(
            lines.iter().map(|l| l.len()).collect::<Vec<_>>(),
            vec![27, 64, 64, 22, 25]
        );
        assert_eq!(lines.first().copied(), Some("-----BEGIN CERTIFICATE-----"));
        assert_eq!(lines.last().copied(), Some("-----END CERTIFICATE-----"));
    }

    #[test]
    fn x5c_whitespace_is_dropped() {
        assert_eq!(
            certificate_pem_from_x5c("MII\nBIj AN\tBg"),
            "-----BEGIN CERTIFICATE-----\nMIIBIjANBg\n-----END CERTIFICATE-----\n"
        );
    }
}
