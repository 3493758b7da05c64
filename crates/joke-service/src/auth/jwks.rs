//! JWKS client for resolving token signing keys from the identity provider.
//!
//! The client fetches `{issuer}/.well-known/jwks.json`, selects the first key
//! record whose `kid` matches the token, and turns it into RSA verification
//! key material. Keys are published as X.509 certificates (`x5c`); records
//! without a certificate fall back to the raw RSA components (`n`, `e`).
//!
//! # Caching
//!
//! - A fetched key set is reused for `cache_ttl`; a zero TTL fetches on
//!   every lookup
//! - A kid missing from a cached set triggers one refetch (key rotation),
//!   unless the cached set is younger than the minimum refetch interval
//! - Concurrent lookups that find the cache stale share one fetch
//! - Every request is bounded by the HTTP client timeout, and the response
//!   body by [`MAX_JWKS_BODY_BYTES`]

use crate::errors::AuthError;
use crate::observability::metrics::record_jwks_fetch;
use common::jwt::certificate_pem_from_x5c;
use jsonwebtoken::DecodingKey;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::instrument;

/// Path of the key set document relative to the issuer.
pub const JWKS_PATH: &str = ".well-known/jwks.json";

/// Largest key set document accepted from the provider.
pub const MAX_JWKS_BODY_BYTES: usize = 256 * 1024;

/// Default bound on refetches triggered by unknown kids.
pub const DEFAULT_MIN_REFETCH_INTERVAL: Duration = Duration::from_secs(10);

/// JSON Web Key as published by the identity provider.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    /// Key type ("RSA" for Auth0 signing keys).
    #[serde(default)]
    pub kty: String,

    /// Key ID - used to select the correct key for verification.
    #[serde(default)]
    pub kid: Option<String>,

    /// Key use (should be "sig" for signing).
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,

    /// Algorithm, when the provider advertises one.
    #[serde(default)]
    pub alg: Option<String>,

    /// RSA modulus (base64url).
    #[serde(default)]
    pub n: Option<String>,

    /// RSA public exponent (base64url).
    #[serde(default)]
    pub e: Option<String>,

    /// X.509 certificate chain (standard base64 DER), leaf first.
    #[serde(default)]
    pub x5c: Vec<String>,
}

impl Jwk {
    /// Build RSA verification key material from this record.
    ///
    /// The first `x5c` certificate wins; `n`/`e` are used only when the
    /// record carries no certificate.
    pub fn decoding_key(&self) -> Result<DecodingKey, AuthError> {
        let kid = self.kid.clone().unwrap_or_default();

        if !self.kty.is_empty() && self.kty != "RSA" {
            return Err(AuthError::KeyParse {
                kid,
                reason: format!("unsupported key type '{}'", self.kty),
            });
        }

        if let Some(cert) = self.x5c.first() {
            let pem = certificate_pem_from_x5c(cert);
            return DecodingKey::from_rsa_pem(pem.as_bytes()).map_err(|e| AuthError::KeyParse {
                kid,
                reason: e.to_string(),
            });
        }

        match (&self.n, &self.e) {
            (Some(n), Some(e)) => {
                DecodingKey::from_rsa_components(n, e).map_err(|err| AuthError::KeyParse {
                    kid,
                    reason: err.to_string(),
                })
            }
            _ => Err(AuthError::KeyParse {
                kid,
                reason: "record has neither x5c certificate nor RSA components".to_string(),
            }),
        }
    }
}

/// Key set document.
#[derive(Debug, Clone, Deserialize)]
pub struct JwksResponse {
    /// Published keys, in document order.
    pub keys: Vec<Jwk>,
}

impl JwksResponse {
    /// First record whose own `kid` equals `kid`.
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|key| key.kid.as_deref() == Some(kid))
    }
}

struct CachedJwks {
    jwks: JwksResponse,
    fetched_at: Instant,
}

/// Resolves signing keys from a remote JWKS endpoint.
pub struct JwksClient {
    jwks_url: String,
    http_client: reqwest::Client,
    cache: RwLock<Option<CachedJwks>>,
    /// Held while refreshing, so a stale cache is refetched once.
    refresh_lock: Mutex<()>,
    cache_ttl: Duration,
    min_refetch_interval: Duration,
}

impl JwksClient {
    /// Create a client for an explicit JWKS URL.
    ///
    /// # Arguments
    ///
    /// * `jwks_url` - Full URL of the key set document
    /// * `fetch_timeout` - Upper bound for one JWKS request
    /// * `cache_ttl` - How long a fetched key set is reused (zero disables)
    pub fn new(jwks_url: String, fetch_timeout: Duration, cache_ttl: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(fetch_timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "jokes.auth.jwks", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            jwks_url,
            http_client,
            cache: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            cache_ttl,
            min_refetch_interval: DEFAULT_MIN_REFETCH_INTERVAL,
        }
    }

    /// Override how soon an unknown kid may trigger another fetch.
    pub fn with_min_refetch_interval(mut self, interval: Duration) -> Self {
        self.min_refetch_interval = interval;
        self
    }

    /// Create a client for the issuer's well-known key set.
    pub fn for_issuer(issuer_base_url: &str, fetch_timeout: Duration, cache_ttl: Duration) -> Self {
        Self::new(jwks_url_for_issuer(issuer_base_url), fetch_timeout, cache_ttl)
    }

    /// URL this client fetches from.
    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Resolve the RSA verification key for `kid`.
    ///
    /// # Errors
    ///
    /// - `AuthError::KeyFetch` if the key set cannot be fetched or decoded
    /// - `AuthError::KeyNotFound` if no record carries this kid
    /// - `AuthError::KeyParse` if the matched record holds unusable key material
    #[instrument(skip(self), fields(kid = %kid))]
    pub async fn resolve_key(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        let jwk = self.get_key(kid).await?;
        jwk.decoding_key()
    }

    /// Look up the key record for `kid`, fetching the key set as needed.
    pub async fn get_key(&self, kid: &str) -> Result<Jwk, AuthError> {
        if self.cache_ttl.is_zero() {
            let jwks = self.fetch().await?;
            return jwks
                .find(kid)
                .cloned()
                .ok_or_else(|| key_not_found(kid));
        }

        let seen = {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref() {
                let age = cached.fetched_at.elapsed();
                if age < self.cache_ttl {
                    if let Some(key) = cached.jwks.find(kid) {
                        tracing::debug!(target: "jokes.auth.jwks", kid = %kid, "JWKS cache hit");
                        return Ok(key.clone());
                    }
                    if age < self.min_refetch_interval {
                        return Err(key_not_found(kid));
                    }
                    tracing::debug!(target: "jokes.auth.jwks", kid = %kid, "Key not in cached JWKS, refetching");
                }
            }
            cache.as_ref().map(|cached| cached.fetched_at)
        };

        let _refreshing = self.refresh_lock.lock().await;
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.as_ref().filter(|c| Some(c.fetched_at) != seen) {
                // Another lookup refreshed while we waited
                return cached.jwks.find(kid).cloned().ok_or_else(|| key_not_found(kid));
            }
        }

        self.refresh_cache().await?;

        let cache = self.cache.read().await;
        cache
            .as_ref()
            .and_then(|cached| cached.jwks.find(kid))
            .cloned()
            .ok_or_else(|| key_not_found(kid))
    }

    /// Fetch the key set and replace the cache.
    pub async fn refresh_cache(&self) -> Result<(), AuthError> {
        let jwks = self.fetch().await?;
        let mut cache = self.cache.write().await;
        *cache = Some(CachedJwks {
            jwks,
            fetched_at: Instant::now(),
        });
        Ok(())
    }

    /// Drop the cached key set; the next lookup fetches.
    pub async fn clear_cache(&self) {
        let mut cache = self.cache.write().await;
        *cache = None;
    }

    #[instrument(skip(self), fields(url = %self.jwks_url))]
    async fn fetch(&self) -> Result<JwksResponse, AuthError> {
        let start = Instant::now();
        let result = self.fetch_inner().await;
        record_jwks_fetch(result.is_ok(), start.elapsed());
        result
    }

    async fn fetch_inner(&self) -> Result<JwksResponse, AuthError> {
        tracing::debug!(target: "jokes.auth.jwks", url = %self.jwks_url, "Fetching JWKS");

        let mut response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(target: "jokes.auth.jwks", error = %e, "Failed to fetch JWKS");
                AuthError::KeyFetch(e.to_string())
            })?;

        if !response.status().is_success() {
            tracing::error!(
                target: "jokes.auth.jwks",
                status = %response.status(),
                "JWKS endpoint returned error"
            );
            return Err(AuthError::KeyFetch(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        let too_large = || {
            tracing::error!(target: "jokes.auth.jwks", limit = MAX_JWKS_BODY_BYTES, "JWKS response too large");
            AuthError::KeyFetch(format!("JWKS response exceeds {MAX_JWKS_BODY_BYTES} bytes"))
        };
        if response
            .content_length()
            .is_some_and(|len| len > MAX_JWKS_BODY_BYTES as u64)
        {
            return Err(too_large());
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| {
            tracing::error!(target: "jokes.auth.jwks", error = %e, "Failed to read JWKS response");
            AuthError::KeyFetch(e.to_string())
        })? {
            if body.len() + chunk.len() > MAX_JWKS_BODY_BYTES {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }

        let jwks: JwksResponse = serde_json::from_slice(&body).map_err(|e| {
            tracing::error!(target: "jokes.auth.jwks", error = %e, "Failed to parse JWKS response");
            AuthError::KeyFetch(e.to_string())
        })?;

        tracing::info!(target: "jokes.auth.jwks", key_count = jwks.keys.len(), "JWKS fetched");
        Ok(jwks)
    }
}

/// Build the well-known JWKS URL for an issuer base URL.
///
/// The issuer may or may not end with a slash (Auth0 issuers do).
pub fn jwks_url_for_issuer(issuer_base_url: &str) -> String {
    format!("{}/{}", issuer_base_url.trim_end_matches('/'), JWKS_PATH)
}

fn key_not_found(kid: &str) -> AuthError {
    tracing::warn!(target: "jokes.auth.jwks", kid = %kid, "Unable to find appropriate key");
    AuthError::KeyNotFound(kid.to_string())
}
