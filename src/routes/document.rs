//! Whiteboard routes: observe, submit, insert, edit and remove entries.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};

use super::ApiError;
use super::panes::pane_error_to_status;
use crate::document::DocumentError;
use crate::entry::{Entry, EntryKind, Mode};
use crate::services::router::Submission;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub entries: Vec<Entry>,
    pub revision: u64,
}

#[derive(Debug, Deserialize)]
pub struct SubmitBody {
    pub input: String,
    #[serde(default)]
    pub mode: Mode,
}

/// Submission outcome as returned to input surfaces.
#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub ignored: bool,
    pub failed: bool,
    pub entries: Vec<Entry>,
}

impl From<Submission> for SubmissionResponse {
    fn from(outcome: Submission) -> Self {
        match outcome {
            Submission::Ignored => Self { ignored: true, failed: false, entries: Vec::new() },
            Submission::Appended { entries, failed } => Self { ignored: false, failed, entries },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct InsertBody {
    pub content: String,
    pub kind: Option<EntryKind>,
}

#[derive(Debug, Serialize)]
pub struct InsertResponse {
    pub position: usize,
}

pub(crate) fn document_error_to_status(err: &DocumentError) -> StatusCode {
    match err {
        DocumentError::OutOfRange { .. } => StatusCode::NOT_FOUND,
    }
}

/// `GET /api/document` — current entries; seeds the greeting on first view.
pub async fn get_document(State(state): State<AppState>) -> Json<DocumentResponse> {
    let entries = state.observe_document();
    Json(DocumentResponse { entries, revision: state.document.revision() })
}

/// `POST /api/document/submit` — route input straight at the whiteboard.
pub async fn submit(
    State(state): State<AppState>,
    Json(body): Json<SubmitBody>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let outcome = state
        .submit_to_document(&body.input, body.mode)
        .await
        .map_err(|e| ApiError::new(pane_error_to_status(&e), &e))?;
    Ok(Json(outcome.into()))
}

/// `POST /api/document/entries` — the insertion callback.
pub async fn insert_entry(
    State(state): State<AppState>,
    Json(body): Json<InsertBody>,
) -> (StatusCode, Json<InsertResponse>) {
    let position = state.document.insert(body.content, body.kind);
    (StatusCode::CREATED, Json(InsertResponse { position }))
}

/// `PUT /api/document/entries/{position}` — replace in place, returning the
/// previous entry.
pub async fn replace_entry(
    State(state): State<AppState>,
    Path(position): Path<usize>,
    Json(entry): Json<Entry>,
) -> Result<Json<Entry>, ApiError> {
    state
        .document
        .replace_at(position, entry)
        .map(Json)
        .map_err(|e| ApiError::new(document_error_to_status(&e), &e))
}

/// `DELETE /api/document/entries/{position}` — remove, returning the entry.
pub async fn remove_entry(
    State(state): State<AppState>,
    Path(position): Path<usize>,
) -> Result<Json<Entry>, ApiError> {
    state
        .document
        .remove_at(position)
        .map(Json)
        .map_err(|e| ApiError::new(document_error_to_status(&e), &e))
}

#[cfg(test)]
#[path = "document_test.rs"]
mod tests;
