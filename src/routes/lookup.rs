//! Property lookup route.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Serialize;

use super::ApiError;
use crate::credentials::Provider;
use crate::llm::ClientError;
use crate::services::lookup::{Listing, Snippet};
use crate::state::AppState;

/// Ready-to-insert text for each part of a listing.
#[derive(Debug, Serialize)]
pub struct Snippets {
    pub title: Option<String>,
    pub price: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub all: Option<String>,
}

impl From<&Listing> for Snippets {
    fn from(listing: &Listing) -> Self {
        Self {
            title: listing.snippet(Snippet::Title),
            price: listing.snippet(Snippet::Price),
            description: listing.snippet(Snippet::Description),
            image: listing.snippet(Snippet::Image),
            all: listing.snippet(Snippet::All),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LookupResponse {
    pub listing: Listing,
    pub snippets: Snippets,
}

pub(crate) fn client_error_to_status(err: &ClientError) -> StatusCode {
    match err {
        ClientError::MissingCredential { .. } => StatusCode::PRECONDITION_FAILED,
        ClientError::EmptyInput => StatusCode::BAD_REQUEST,
        ClientError::Provider { status: Some(404), .. } | ClientError::UnexpectedResponse(_) => StatusCode::NOT_FOUND,
        ClientError::Provider { .. } => StatusCode::BAD_GATEWAY,
        ClientError::HttpClientBuild(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// `GET /api/lookup/property/{mls_id}`
pub async fn get_property(
    State(state): State<AppState>,
    Path(mls_id): Path<String>,
) -> Result<Json<LookupResponse>, ApiError> {
    let key = state.credentials.get(Provider::Lookup);
    let listing = state
        .lookup
        .lookup(key.as_deref(), &mls_id)
        .await
        .map_err(|e| ApiError::new(client_error_to_status(&e), &e))?;
    let snippets = Snippets::from(&listing);
    Ok(Json(LookupResponse { listing, snippets }))
}

#[cfg(test)]
#[path = "lookup_test.rs"]
mod tests;
