//! Jokes API configuration.
//!
//! Configuration is loaded from environment variables. The Auth0 variable
//! names are kept so existing deployments keep working.

use common::jwt::{DEFAULT_CLOCK_SKEW, MAX_CLOCK_SKEW};
use std::collections::HashMap;
use std::env;
use std::ops::RangeInclusive;
use std::time::Duration;
use thiserror::Error;

/// Default HTTP bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

/// Default JWKS cache TTL in seconds (5 minutes).
pub const DEFAULT_JWKS_CACHE_TTL_SECONDS: u64 = 300;

/// Default JWKS fetch timeout in seconds.
pub const DEFAULT_JWKS_FETCH_TIMEOUT_SECONDS: u64 = 10;

/// Upper bound for the JWKS fetch timeout.
pub const MAX_JWKS_FETCH_TIMEOUT_SECONDS: u64 = 60;

/// Jokes API configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Expected `aud` claim (`AUTH0_API_AUDIENCE`).
    pub audience: String,

    /// Expected `iss` claim and base URL of the JWKS endpoint (`AUTH0_DOMAIN`).
    pub issuer: String,

    /// Server bind address (default: "0.0.0.0:3000").
    pub bind_address: String,

    /// How long a fetched key set is reused. Zero fetches on every validation.
    pub jwks_cache_ttl: Duration,

    /// Timeout for a single JWKS request.
    pub jwks_fetch_timeout: Duration,

    /// JWT clock skew tolerance in seconds for exp/iat validation.
    pub jwt_clock_skew_seconds: i64,

    /// Graceful shutdown drain period.
    pub drain_seconds: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    MissingEnvVar(String),

    #[error("Invalid issuer configuration: {0}")]
    InvalidIssuer(String),

    #[error("Invalid JWKS configuration: {0}")]
    InvalidJwks(String),

    #[error("Invalid clock skew: {0}")]
    InvalidJwtClockSkew(String),

    #[error("Invalid drain configuration: {0}")]
    InvalidDrain(String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Build from an explicit variable map; `from_env` delegates here.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let audience = required(vars, "AUTH0_API_AUDIENCE")?;
        let issuer = required(vars, "AUTH0_DOMAIN")?;

        if !(issuer.starts_with("https://") || issuer.starts_with("http://")) {
            return Err(ConfigError::InvalidIssuer(format!(
                "AUTH0_DOMAIN must be an absolute http(s) URL, got '{issuer}'"
            )));
        }

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let cache_ttl = seconds(vars, "JWKS_CACHE_TTL_SECONDS", 0..=u64::MAX)
            .map_err(ConfigError::InvalidJwks)?
            .unwrap_or(DEFAULT_JWKS_CACHE_TTL_SECONDS);

        let fetch_timeout = seconds(
            vars,
            "JWKS_FETCH_TIMEOUT_SECONDS",
            1..=MAX_JWKS_FETCH_TIMEOUT_SECONDS,
        )
        .map_err(ConfigError::InvalidJwks)?
        .unwrap_or(DEFAULT_JWKS_FETCH_TIMEOUT_SECONDS);

        let clock_skew = seconds(vars, "JWT_CLOCK_SKEW_SECONDS", 1..=MAX_CLOCK_SKEW.as_secs())
            .map_err(ConfigError::InvalidJwtClockSkew)?
            .unwrap_or(DEFAULT_CLOCK_SKEW.as_secs());

        let drain_seconds = seconds(vars, "DRAIN_SECONDS", 0..=u64::MAX)
            .map_err(ConfigError::InvalidDrain)?
            .unwrap_or(0);

        Ok(Config {
            audience,
            issuer,
            bind_address,
            jwks_cache_ttl: Duration::from_secs(cache_ttl),
            jwks_fetch_timeout: Duration::from_secs(fetch_timeout),
            // Bounded by MAX_CLOCK_SKEW above.
            jwt_clock_skew_seconds: i64::try_from(clock_skew).unwrap_or(i64::MAX),
            drain_seconds,
        })
    }
}

fn required(vars: &HashMap<String, String>, name: &str) -> Result<String, ConfigError> {
    vars.get(name)
        .filter(|value| !value.trim().is_empty())
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

/// Parse an optional whole-seconds variable and check it against `range`.
fn seconds(
    vars: &HashMap<String, String>,
    name: &str,
    range: RangeInclusive<u64>,
) -> Result<Option<u64>, String> {
    let Some(raw) = vars.get(name) else {
        return Ok(None);
    };

    let value: u64 = raw
        .trim()
        .parse()
        .map_err(|e| format!("{name} must be a whole number of seconds, got '{raw}': {e}"))?;

    if !range.contains(&value) {
        return Err(if *range.end() == u64::MAX {
            format!("{name} must be at least {}, got {value}", range.start())
        } else {
            format!(
                "{name} must be between {} and {}, got {value}",
                range.start(),
                range.end()
            )
        });
    }

    Ok(Some(value))
}
