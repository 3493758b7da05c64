//! Common utilities and types shared across the Jokes API crates.

#![warn(clippy::pedantic)]

/// Module for JWT utilities (size limits, header/claim peeking, iat checks)
pub mod jwt;
