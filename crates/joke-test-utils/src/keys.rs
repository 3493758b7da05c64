//! Fixture RSA signing keys and token claims.
//!
//! Two 2048-bit RSA keys ship with self-signed certificates so tests can
//! publish them the way Auth0 does (`x5c`) or as bare `n`/`e` components.

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;

/// Audience every test server expects.
pub const TEST_AUDIENCE: &str = "https://jokes.test/api";

/// Kid of `TestSigningKey::primary()`.
pub const PRIMARY_KID: &str = "jokes-test-primary";

/// Kid of `TestSigningKey::secondary()`.
pub const SECONDARY_KID: &str = "jokes-test-secondary";

const PRIMARY_KEY_PEM: &str = include_str!("../fixtures/primary-key.pem");
const PRIMARY_X5C: &str = include_str!("../fixtures/primary-x5c.txt");
const PRIMARY_MODULUS: &str = include_str!("../fixtures/primary-modulus.txt");

const SECONDARY_KEY_PEM: &str = include_str!("../fixtures/secondary-key.pem");
const SECONDARY_X5C: &str = include_str!("../fixtures/secondary-x5c.txt");
const SECONDARY_MODULUS: &str = include_str!("../fixtures/secondary-modulus.txt");

/// Both fixture keys use the standard public exponent 65537.
const RSA_EXPONENT: &str = "AQAB";

/// An RSA signing key with its published forms.
#[derive(Debug, Clone)]
pub struct TestSigningKey {
    pub kid: String,
    private_key_pem: &'static str,
    x5c: &'static str,
    modulus: &'static str,
}

impl TestSigningKey {
    /// First fixture key, kid `PRIMARY_KID`.
    pub fn primary() -> Self {
        Self {
            kid: PRIMARY_KID.to_string(),
            private_key_pem: PRIMARY_KEY_PEM,
            x5c: PRIMARY_X5C.trim(),
            modulus: PRIMARY_MODULUS.trim(),
        }
    }

    /// Second fixture key, kid `SECONDARY_KID`.
    pub fn secondary() -> Self {
        Self {
            kid: SECONDARY_KID.to_string(),
            private_key_pem: SECONDARY_KEY_PEM,
            x5c: SECONDARY_X5C.trim(),
            modulus: SECONDARY_MODULUS.trim(),
        }
    }

    /// Same key material published under a different kid.
    pub fn with_kid(mut self, kid: &str) -> Self {
        self.kid = kid.to_string();
        self
    }

    /// Certificate as it appears in a JWKS `x5c` array.
    pub fn x5c(&self) -> &str {
        self.x5c
    }

    /// Sign `claims` with RS256 under this key's kid.
    pub fn sign<T: Serialize>(&self, claims: &T) -> String {
        self.sign_with_kid(claims, Some(&self.kid))
    }

    /// Sign `claims` with RS256 and an arbitrary (or no) kid header.
    pub fn sign_with_kid<T: Serialize>(&self, claims: &T, kid: Option<&str>) -> String {
        let encoding_key = EncodingKey::from_rsa_pem(self.private_key_pem.as_bytes())
            .expect("fixture RSA key must parse");
        let mut header = Header::new(Algorithm::RS256);
        header.typ = Some("JWT".to_string());
        header.kid = kid.map(str::to_string);

        encode(&header, claims, &encoding_key).expect("Failed to sign test token")
    }

    /// JWKS record carrying both the certificate and the RSA components.
    pub fn jwk_json(&self) -> serde_json::Value {
        serde_json::json!({
            "alg": "RS256",
            "kty": "RSA",
            "use": "sig",
            "kid": self.kid,
            "n": self.modulus,
            "e": RSA_EXPONENT,
            "x5c": [self.x5c],
        })
    }

    /// JWKS record with only `n`/`e` (no certificate chain).
    pub fn jwk_json_components_only(&self) -> serde_json::Value {
        serde_json::json!({
            "kty": "RSA",
            "use": "sig",
            "kid": self.kid,
            "n": self.modulus,
            "e": RSA_EXPONENT,
        })
    }
}

/// Claims of an Auth0 access token, with builder-style overrides.
#[derive(Debug, Clone, Serialize)]
pub struct TestClaims {
    pub sub: String,
    pub iss: String,
    pub aud: serde_json::Value,
    pub iat: i64,
    pub exp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub azp: Option<String>,
}

impl TestClaims {
    /// Claims valid for one hour, issued now, for `TEST_AUDIENCE`.
    pub fn valid(issuer: &str) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: "auth0|test-user".to_string(),
            iss: issuer.to_string(),
            aud: serde_json::json!(TEST_AUDIENCE),
            iat: now,
            exp: now + 3600,
            scope: Some("openid profile".to_string()),
            azp: Some("test-client".to_string()),
        }
    }

    pub fn with_audience(mut self, aud: serde_json::Value) -> Self {
        self.aud = aud;
        self
    }

    pub fn with_issuer(mut self, iss: &str) -> Self {
        self.iss = iss.to_string();
        self
    }

    /// Expired `seconds_ago` seconds ago.
    pub fn expired(mut self, seconds_ago: i64) -> Self {
        let now = Utc::now().timestamp();
        self.iat = now - seconds_ago - 3600;
        self.exp = now - seconds_ago;
        self
    }

    /// Issued `seconds_ahead` seconds in the future.
    pub fn issued_in_future(mut self, seconds_ahead: i64) -> Self {
        let now = Utc::now().timestamp();
        self.iat = now + seconds_ahead;
        self.exp = now + seconds_ahead + 3600;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};

    #[test]
    fn test_fixture_keys_are_distinct() {
        assert_ne!(TestSigningKey::primary().x5c(), TestSigningKey::secondary().x5c());
    }

    #[test]
    fn test_signed_token_verifies_with_certificate() {
        let key = TestSigningKey::primary();
        let token = key.sign(&TestClaims::valid("https://issuer.test/"));

        let header = decode_header(&token).unwrap();
        assert_eq!(header.alg, Algorithm::RS256);
        assert_eq!(header.kid.as_deref(), Some(PRIMARY_KID));

        let pem = format!(
            "-----BEGIN CERTIFICATE-----\n{}\n-----END CERTIFICATE-----\n",
            key.x5c()
        );
        let decoding_key = DecodingKey::from_rsa_pem(pem.as_bytes()).unwrap();
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[TEST_AUDIENCE]);

        let data = decode::<serde_json::Value>(&token, &decoding_key, &validation).unwrap();
        assert_eq!(data.claims["iss"], "https://issuer.test/");
    }

    #[test]
    fn test_signed_token_verifies_with_components() {
        let key = TestSigningKey::secondary();
        let token = key.sign(&TestClaims::valid("https://issuer.test/"));

        let decoding_key = DecodingKey::from_rsa_components(key.modulus, RSA_EXPONENT).unwrap();
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[TEST_AUDIENCE]);

        assert!(decode::<serde_json::Value>(&token, &decoding_key, &validation).is_ok());
    }

    #[test]
    fn test_sign_without_kid() {
        let token = TestSigningKey::primary()
            .sign_with_kid(&TestClaims::valid("https://issuer.test/"), None);
        assert!(decode_header(&token).unwrap().kid.is_none());
    }
}
