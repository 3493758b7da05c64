//! Jokes API Service Library
//!
//! A small HTTP API serving a fixed list of jokes with like counters. The
//! joke endpoints require an Auth0 access token, validated against the
//! issuer's JWKS endpoint.
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> middleware/auth.rs -> handlers/*.rs -> services/joke_store.rs
//!                        |
//!                  auth/jwt.rs -> auth/jwks.rs -> {issuer}/.well-known/jwks.json
//! ```
//!
//! # Modules
//!
//! - `auth` - JWKS key resolution and token validation
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - Bearer auth and HTTP metrics middleware
//! - `models` - Wire types
//! - `observability` - Prometheus metrics
//! - `routes` - Axum router setup
//! - `services` - In-memory joke store

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod routes;
pub mod services;
