//! Joke handlers.
//!
//! - `GET /api/jokes` - List all jokes
//! - `POST /api/jokes/like/:jokeID` - Like a joke, returning the updated list
//!
//! Both routes sit behind the auth middleware.

use crate::auth::Claims;
use crate::errors::ApiError;
use crate::models::Joke;
use crate::routes::AppState;
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use std::sync::Arc;
use tracing::instrument;

/// Handler for GET /api/jokes
#[instrument(skip_all, name = "jokes.handlers.list")]
pub async fn list_jokes(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Json<Vec<Joke>> {
    tracing::debug!(target: "jokes.handlers.jokes", client = ?claims.azp, "Listing jokes");
    Json(state.jokes.list().await)
}

/// Handler for POST /api/jokes/like/:jokeID
///
/// A path segment that is not an integer is treated like an unknown id: 404
/// with an empty body.
#[instrument(skip_all, name = "jokes.handlers.like", fields(joke_id = %joke_id))]
pub async fn like_joke(
    State(state): State<Arc<AppState>>,
    Path(joke_id): Path<String>,
) -> Result<Json<Vec<Joke>>, ApiError> {
    let id = parse_joke_id(&joke_id)?;
    let jokes = state.jokes.like(id).await?;
    Ok(Json(jokes))
}

fn parse_joke_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>().map_err(|_| {
        tracing::debug!(target: "jokes.handlers.jokes", joke_id = %raw, "Non-numeric joke id");
        ApiError::NotFound(format!("joke {raw}"))
    })
}
