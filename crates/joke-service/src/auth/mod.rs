//! Authentication for the Jokes API.
//!
//! Bearer tokens are Auth0 access tokens signed with RS256. Signing keys are
//! resolved from the issuer's JWKS endpoint.
//!
//! # Components
//!
//! - `jwks` - JWKS client for fetching and caching signing keys
//! - `jwt` - Token validation against the configured audience and issuer
//! - `claims` - Claims of validated tokens

pub mod claims;
pub mod jwks;
pub mod jwt;

pub use claims::{Audience, Claims};
pub use jwks::JwksClient;
pub use jwt::JwtValidator;
