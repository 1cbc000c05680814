//! Routes for collectible progress.

use axum::extract::{Path, State};
use axum::{Json, Router, routing::get};
use serde::Serialize;
use tracing::{info, instrument};

use ageshift_core::error::DomainError;

use crate::error::ApiError;
use crate::state::AppState;

/// Collection state of one item.
#[derive(Debug, Serialize)]
pub struct CollectedResponse {
    /// The collectible id.
    pub id: String,
    /// Whether the item has been collected.
    pub collected: bool,
}

fn validate_id(id: &str) -> Result<(), DomainError> {
    if id.trim().is_empty() {
        return Err(DomainError::Validation("collectible id must not be empty".into()));
    }
    Ok(())
}

/// GET /collected/{id}
#[instrument(skip(state))]
async fn has_collected(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CollectedResponse>, ApiError> {
    validate_id(&id)?;
    let collected = state.progress.has_collected(&id).await?;
    Ok(Json(CollectedResponse { id, collected }))
}

/// POST /collected/{id}
#[instrument(skip(state))]
async fn mark_collected(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CollectedResponse>, ApiError> {
    validate_id(&id)?;
    state.progress.mark_collected(&id).await?;
    info!("collectible marked");
    Ok(Json(CollectedResponse {
        id,
        collected: true,
    }))
}

/// Returns the router for the progress endpoints.
pub fn router() -> Router<AppState> {
    Router::new().route("/collected/{id}", get(has_collected).post(mark_collected))
}
