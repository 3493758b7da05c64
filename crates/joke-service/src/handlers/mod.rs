//! HTTP request handlers for the Jokes API.

pub mod jokes;
pub mod metrics;
pub mod ping;

pub use jokes::{like_joke, list_jokes};
pub use metrics::metrics_handler;
pub use ping::ping;
