//! Jokes API models.

use serde::{Deserialize, Serialize};

/// A joke and its like counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Joke {
    pub id: i64,
    pub likes: u64,
    pub joke: String,
}

impl Joke {
    /// A joke with no likes yet.
    pub fn new(id: i64, joke: impl Into<String>) -> Self {
        Self {
            id,
            likes: 0,
            joke: joke.into(),
        }
    }
}

/// Response body of the unauthenticated ping endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingResponse {
    pub message: String,
}

impl PingResponse {
    pub fn pong() -> Self {
        Self {
            message: "pong".to_string(),
        }
    }
}
