//! JWT claims structure.
//!
//! Contains the claims extracted from validated access tokens. The `sub`
//! field is redacted in Debug output to prevent exposure in logs.

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The `aud` claim, which identity providers emit either as a single string
/// or as an array (Auth0 adds its userinfo audience when `openid` is requested).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    Single(String),
    Multiple(Vec<String>),
}

impl Audience {
    /// Returns true when `expected` is one of the token's audiences.
    pub fn contains(&self, expected: &str) -> bool {
        match self {
            Audience::Single(aud) => aud == expected,
            Audience::Multiple(auds) => auds.iter().any(|aud| aud == expected),
        }
    }
}

/// Access token claims.
#[derive(Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id) - redacted in Debug output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Issuer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Audience(s).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,

    /// Expiration timestamp (Unix epoch seconds).
    pub exp: i64,

    /// Issued-at timestamp (Unix epoch seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Space-separated scopes granted to this token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Authorized party (the client the token was issued to).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azp: Option<String>,
}

impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("sub", &self.sub.as_ref().map(|_| "[REDACTED]"))
            .field("iss", &self.iss)
            .field("aud", &self.aud)
            .field("exp", &self.exp)
            .field("iat", &self.iat)
            .field("scope", &self.scope)
            .field("azp", &self.azp)
            .finish()
    }
}

impl Claims {
    /// Check the audience claim against the expected audience.
    pub fn has_audience(&self, expected: &str) -> bool {
        self.aud.as_ref().is_some_and(|aud| aud.contains(expected))
    }

    /// Check the issuer claim against the expected issuer.
    ///
    /// Exact comparison: Auth0 issuers carry a trailing slash and tokens from
    /// a differently spelled issuer are not ours.
    pub fn has_issuer(&self, expected: &str) -> bool {
        self.iss.as_deref() == Some(expected)
    }

    /// Get all scopes as a vector.
    pub fn scopes(&self) -> Vec<&str> {
        self.scope
            .as_deref()
            .map(|scope| scope.split_whitespace().collect())
            .unwrap_or_default()
    }
}

/// The `aud` and `iss` of a token whose signature has not been checked.
///
/// Only these two claims are read. A value of the wrong JSON type counts as
/// not matching rather than failing the parse, and no other claim (`exp`
/// included) is required.
#[derive(Debug, Default, Deserialize)]
pub struct UnverifiedClaims {
    #[serde(default)]
    iss: Option<Lenient<String>>,

    #[serde(default)]
    aud: Option<Lenient<Audience>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Lenient<T> {
    Known(T),
    Unusable(IgnoredAny),
}

impl<T> Lenient<T> {
    fn known(&self) -> Option<&T> {
        match self {
            Lenient::Known(value) => Some(value),
            Lenient::Unusable(_) => None,
        }
    }
}

impl UnverifiedClaims {
    pub fn has_audience(&self, expected: &str) -> bool {
        self.aud
            .as_ref()
            .and_then(Lenient::known)
            .is_some_and(|aud| aud.contains(expected))
    }

    /// Exact match, as for [`Claims::has_issuer`].
    pub fn has_issuer(&self, expected: &str) -> bool {
        self.iss
            .as_ref()
            .and_then(Lenient::known)
            .is_some_and(|iss| iss == expected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn claims_with(aud: Option<Audience>, iss: Option<&str>) -> Claims {
        Claims {
            sub: Some("auth0|secret-user-id".to_string()),
            iss: iss.map(str::to_string),
            aud,
            exp: 1_234_567_890,
            iat: Some(1_234_567_800),
            scope: Some("read:jokes like:jokes".to_string()),
            azp: None,
        }
    }

    #[test]
    fn test_claims_debug_redacts_sub() {
        let claims = claims_with(None, None);
        let debug_str = format!("{:?}", claims);

        assert!(!debug_str.contains("secret-user-id"));
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[test]
    fn test_audience_deserializes_from_string_or_array() {
        let single: Claims = serde_json::from_str(r#"{"aud":"api","exp":1}"#).unwrap();
        assert_eq!(single.aud, Some(Audience::Single("api".to_string())));

        let multiple: Claims =
            serde_json::from_str(r#"{"aud":["api","https://tenant/userinfo"],"exp":1}"#).unwrap();
        assert!(multiple.has_audience("api"));
        assert!(multiple.has_audience("https://tenant/userinfo"));
        assert!(!multiple.has_audience("other"));
    }

    #[test]
    fn test_missing_audience_never_matches() {
        let claims = claims_with(None, Some("https://tenant/"));
        assert!(!claims.has_audience("api"));
        assert!(!claims.has_audience(""));
    }

    #[test]
    fn test_issuer_check_uses_issuer_claim() {
        // Audience equal to the expected issuer must not satisfy the issuer check
        let claims = claims_with(
            Some(Audience::Single("https://tenant/".to_string())),
            Some("https://evil/"),
        );
        assert!(!claims.has_issuer("https://tenant/"));

        let claims = claims_with(None, Some("https://tenant/"));
        assert!(claims.has_issuer("https://tenant/"));
        assert!(!claims.has_issuer("https://tenant"));
    }

    #[test]
    fn test_claims_scopes() {
        let claims = claims_with(None, None);
        assert_eq!(claims.scopes(), vec!["read:jokes", "like:jokes"]);

        let mut no_scope = claims;
        no_scope.scope = None;
        assert!(no_scope.scopes().is_empty());
    }

    #[test]
    fn test_claims_without_optional_fields_omits_them() {
        let claims = Claims {
            sub: None,
            iss: None,
            aud: None,
            exp: 1,
            iat: None,
            scope: None,
            azp: None,
        };

        let json = serde_json::to_string(&claims).unwrap();
        assert_eq!(json, r#"{"exp":1}"#);
    }

    #[test]
    fn test_unverified_claims_need_no_exp() {
        let peeked: UnverifiedClaims =
            serde_json::from_str(r#"{"iss":"https://tenant/","aud":["api","x"]}"#).unwrap();
        assert!(peeked.has_audience("api"));
        assert!(peeked.has_issuer("https://tenant/"));
        assert!(!peeked.has_issuer("https://tenant"));
    }

    #[test]
    fn test_unverified_claims_tolerate_odd_types() {
        let peeked: UnverifiedClaims =
            serde_json::from_str(r#"{"iss":42,"aud":{"nested":true},"exp":"soon"}"#).unwrap();
        assert!(!peeked.has_audience("api"));
        assert!(!peeked.has_issuer("42"));

        let empty: UnverifiedClaims = serde_json::from_str("{}").unwrap();
        assert!(!empty.has_audience(""));
    }
}
