//! Credential routes. Secrets are write-only: reads report presence only.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::ApiError;
use crate::credentials::{CredentialStore, Provider};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CredentialStatus {
    pub provider: Provider,
    pub label: &'static str,
    pub storage_key: &'static str,
    pub configured: bool,
}

impl CredentialStatus {
    fn of(store: &CredentialStore, provider: Provider) -> Self {
        Self {
            provider,
            label: provider.label(),
            storage_key: provider.storage_key(),
            configured: store.is_set(provider),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SetCredentialBody {
    /// Blank clears the credential.
    pub key: String,
}

/// `GET /api/credentials`
pub async fn list_credentials(State(state): State<AppState>) -> Json<Vec<CredentialStatus>> {
    Json(
        Provider::ALL
            .into_iter()
            .map(|provider| CredentialStatus::of(&state.credentials, provider))
            .collect(),
    )
}

/// `PUT /api/credentials/{provider}`
pub async fn set_credential(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Json(body): Json<SetCredentialBody>,
) -> Result<Json<CredentialStatus>, ApiError> {
    let provider: Provider = provider
        .parse()
        .map_err(|e| ApiError::new(StatusCode::NOT_FOUND, &e))?;
    state.credentials.set(provider, body.key);
    let status = CredentialStatus::of(&state.credentials, provider);
    info!(%provider, configured = status.configured, "credential updated");
    Ok(Json(status))
}

#[cfg(test)]
#[path = "credentials_test.rs"]
mod tests;
