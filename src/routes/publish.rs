//! Publish routes: draft, preview and publish.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde::Serialize;
use tracing::info;

use super::ApiError;
use crate::services::publish::{self as publication, Block, Draft, PublishError, Published};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub title: String,
    pub blocks: Vec<Block>,
}

pub(crate) fn publish_error_to_status(err: &PublishError) -> StatusCode {
    match err {
        PublishError::EmptyContent => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

/// `POST /api/publish/draft` — a fresh draft of the current whiteboard.
pub async fn create_draft(State(state): State<AppState>) -> Json<Draft> {
    let draft = Draft::from_entries(&state.document.snapshot());
    info!(bytes = draft.content.len(), "publish: draft created");
    Json(draft)
}

/// `POST /api/publish/preview` — how the draft will read once published.
pub async fn preview(Json(draft): Json<Draft>) -> Json<PreviewResponse> {
    Json(PreviewResponse { blocks: publication::preview(&draft.content), title: draft.title })
}

/// `POST /api/publish` — publish a draft and return its reference.
pub async fn publish(
    State(state): State<AppState>,
    Json(draft): Json<Draft>,
) -> Result<(StatusCode, Json<Published>), ApiError> {
    let published = state
        .publisher
        .publish(&draft)
        .await
        .map_err(|e| ApiError::new(publish_error_to_status(&e), &e))?;
    Ok((StatusCode::CREATED, Json(published)))
}

#[cfg(test)]
#[path = "publish_test.rs"]
mod tests;
