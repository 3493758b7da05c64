//! In-memory joke store.
//!
//! The store owns the joke list behind an async `RwLock`. Reads take a
//! snapshot; likes mutate under the write lock so concurrent likes on the
//! same joke are never lost.

use crate::errors::JokeError;
use crate::models::Joke;
use crate::observability::metrics::record_like;
use std::collections::HashSet;
use tokio::sync::RwLock;
use tracing::instrument;

const SEED_JOKES: [&str; 7] = [
    "Did you hear about the restaurant on the moon? Great food, no atmosphere.",
    "What do you call a fake noodle? An Impasta.",
    "How many apples grow on a tree? All of them.",
    "Want to hear a joke about paper? Nevermind it's tearable.",
    "I just watched a program about beavers. It was the best dam program I've ever seen.",
    "Why did the coffee file a police report? It got mugged.",
    "How does a penguin build it's house? Igloos it together.",
];

/// Lock-guarded, insertion-ordered joke list.
#[derive(Debug)]
pub struct JokeStore {
    jokes: RwLock<Vec<Joke>>,
}

impl JokeStore {
    /// Create a store from an initial list.
    ///
    /// # Errors
    ///
    /// `JokeError::DuplicateId` if two jokes share an id.
    pub fn new(jokes: Vec<Joke>) -> Result<Self, JokeError> {
        let mut seen = HashSet::with_capacity(jokes.len());
        if let Some(dup) = jokes.iter().find(|joke| !seen.insert(joke.id)) {
            return Err(JokeError::DuplicateId(dup.id));
        }

        Ok(Self {
            jokes: RwLock::new(jokes),
        })
    }

    /// The seven built-in jokes, ids 1 through 7, with no likes.
    pub fn seeded() -> Self {
        let jokes = (1_i64..)
            .zip(SEED_JOKES)
            .map(|(id, text)| Joke::new(id, text))
            .collect();

        Self {
            jokes: RwLock::new(jokes),
        }
    }

    /// Snapshot of all jokes in insertion order.
    pub async fn list(&self) -> Vec<Joke> {
        self.jokes.read().await.clone()
    }

    /// Increment the likes of joke `id` by one and return the updated list.
    ///
    /// # Errors
    ///
    /// `JokeError::NotFound` if no joke has this id; nothing is modified.
    #[instrument(skip(self))]
    pub async fn like(&self, id: i64) -> Result<Vec<Joke>, JokeError> {
        let mut jokes = self.jokes.write().await;

        let joke = jokes
            .iter_mut()
            .find(|joke| joke.id == id)
            .ok_or(JokeError::NotFound(id))?;
        joke.likes = joke.likes.saturating_add(1);

        tracing::debug!(target: "jokes.handlers.jokes", joke_id = id, likes = joke.likes, "Joke liked");
        record_like();

        Ok(jokes.clone())
    }
}

impl Default for JokeStore {
    fn default() -> Self {
        Self::seeded()
    }
}
