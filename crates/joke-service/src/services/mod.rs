//! Service layer for the Jokes API.
//!
//! # Components
//!
//! - `joke_store` - In-memory joke list with likes

pub mod joke_store;

pub use joke_store::JokeStore;
