//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the workspace's HTTP endpoints under a single Axum
//! router. Handlers translate between JSON and the services; every failure
//! leaves as an [`ApiError`] carrying the error's grepable code.

pub mod credentials;
pub mod document;
pub mod lookup;
pub mod panes;
pub mod publish;

use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::{ErrorBody, ErrorCode};
use crate::state::AppState;

/// Error response: status plus `{code, message, retryable}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, err: &impl ErrorCode) -> Self {
        Self { status, body: ErrorBody::from_error(err) }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        self.body.code
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/document", get(document::get_document))
        .route("/api/document/submit", post(document::submit))
        .route("/api/document/entries", post(document::insert_entry))
        .route(
            "/api/document/entries/{position}",
            put(document::replace_entry).delete(document::remove_entry),
        )
        .route("/api/panes", post(panes::mount_pane))
        .route("/api/panes/{id}", get(panes::get_pane).delete(panes::unmount_pane))
        .route("/api/panes/{id}/submit", post(panes::submit))
        .route("/api/panes/{id}/entries/{position}/send", post(panes::send_entry))
        .route("/api/publish/draft", post(publish::create_draft))
        .route("/api/publish", post(publish::publish))
        .route("/api/publish/preview", post(publish::preview))
        .route("/api/credentials", get(credentials::list_credentials))
        .route("/api/credentials/{provider}", put(credentials::set_credential))
        .route("/api/lookup/property/{mls_id}", get(lookup::get_property))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
