//! # Jokes API Test Utilities
//!
//! Shared test utilities for the Jokes API service.
//!
//! This crate provides:
//! - Fixture RSA signing keys with matching X.509 certificates (`TestSigningKey`)
//! - Token claims builder (`TestClaims`)
//! - Mock identity provider serving a JWKS document (`MockJwks`)
//! - Server test harness (`TestJokeServer`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use joke_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> anyhow::Result<()> {
//!     let key = TestSigningKey::primary();
//!     let jwks = MockJwks::start(vec![key.jwk_json()]).await;
//!     let server = TestJokeServer::spawn(&jwks).await?;
//!
//!     let token = key.sign(&TestClaims::valid(&jwks.issuer()));
//!     let response = reqwest::Client::new()
//!         .get(format!("{}/api/jokes", server.url()))
//!         .bearer_auth(token)
//!         .send()
//!         .await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod jwks_mock;
pub mod keys;
pub mod server_harness;

// Re-export commonly used items
pub use jwks_mock::*;
pub use keys::*;
pub use server_harness::*;
