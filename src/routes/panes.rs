//! Conversation pane routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ApiError;
use super::document::{SubmissionResponse, SubmitBody, document_error_to_status};
use crate::entry::Entry;
use crate::services::pane::{ForwardPolicy, Pane, PaneError, PaneKind, PaneState, Resolution};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MountBody {
    pub kind: PaneKind,
    /// Overrides the kind's default forwarding.
    #[serde(default)]
    pub forward: Option<ForwardPolicy>,
}

#[derive(Debug, Serialize)]
pub struct PaneResponse {
    pub id: Uuid,
    pub kind: PaneKind,
    pub state: PaneState,
    pub last_resolution: Option<Resolution>,
    pub forward: ForwardPolicy,
    pub transcript: Vec<Entry>,
}

impl From<&Pane> for PaneResponse {
    fn from(pane: &Pane) -> Self {
        Self {
            id: pane.id(),
            kind: pane.kind(),
            state: pane.state(),
            last_resolution: pane.last_resolution(),
            forward: pane.profile().forward,
            transcript: pane.transcript(),
        }
    }
}

pub(crate) fn pane_error_to_status(err: &PaneError) -> StatusCode {
    match err {
        PaneError::Busy | PaneError::NoSink => StatusCode::CONFLICT,
        PaneError::NotMountable(_) => StatusCode::BAD_REQUEST,
        PaneError::NotMounted(_) => StatusCode::NOT_FOUND,
        PaneError::TaskFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        PaneError::Position(e) => document_error_to_status(e),
    }
}

fn pane_error(err: PaneError) -> ApiError {
    ApiError::new(pane_error_to_status(&err), &err)
}

async fn mounted(state: &AppState, id: Uuid) -> Result<std::sync::Arc<Pane>, ApiError> {
    state
        .pane(id)
        .await
        .ok_or_else(|| pane_error(PaneError::NotMounted(id)))
}

/// `POST /api/panes` — mount a pane with a fresh transcript.
pub async fn mount_pane(
    State(state): State<AppState>,
    Json(body): Json<MountBody>,
) -> Result<(StatusCode, Json<PaneResponse>), ApiError> {
    let pane = state
        .mount_pane(body.kind, body.forward)
        .await
        .map_err(pane_error)?;
    Ok((StatusCode::CREATED, Json(PaneResponse::from(pane.as_ref()))))
}

/// `GET /api/panes/{id}` — state and transcript.
pub async fn get_pane(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<PaneResponse>, ApiError> {
    let pane = mounted(&state, id).await?;
    Ok(Json(PaneResponse::from(pane.as_ref())))
}

/// `DELETE /api/panes/{id}` — unmount and drop the transcript.
pub async fn unmount_pane(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode, ApiError> {
    if state.unmount_pane(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(pane_error(PaneError::NotMounted(id)))
    }
}

/// `POST /api/panes/{id}/submit` — submit input to one pane.
pub async fn submit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<SubmitBody>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let pane = mounted(&state, id).await?;
    let outcome = pane
        .submit(&body.input, body.mode)
        .await
        .map_err(pane_error)?;
    Ok(Json(outcome.into()))
}

/// `POST /api/panes/{id}/entries/{position}/send` — copy an entry to the
/// whiteboard.
pub async fn send_entry(
    State(state): State<AppState>,
    Path((id, position)): Path<(Uuid, usize)>,
) -> Result<Json<Entry>, ApiError> {
    let pane = mounted(&state, id).await?;
    pane.send_to_document(position)
        .map(Json)
        .map_err(pane_error)
}

#[cfg(test)]
#[path = "panes_test.rs"]
mod tests;
