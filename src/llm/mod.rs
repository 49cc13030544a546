//! LLM — stateless provider clients for chat completion and image generation.
//!
//! DESIGN
//! ======
//! Both providers speak the OpenAI wire format: a single bearer-authenticated
//! JSON POST per call, no retries. Keys are passed per call rather than held
//! by the client, so the same client serves whatever the credential store
//! holds at the moment of the request. Timeouts are enforced by the shared
//! `reqwest` client so a hung provider surfaces as a `Provider` error.

pub mod completion;
pub mod image;
pub mod types;

use std::time::Duration;

pub use completion::CompletionClient;
pub use image::ImageClient;
pub use types::{ChatCompletion, ChatMessage, ClientError, ImageGeneration};

use crate::config::HttpTimeouts;

/// Build the HTTP client shared by provider wrappers.
///
/// # Errors
///
/// Returns [`ClientError::HttpClientBuild`] if the TLS backend fails to start.
pub fn build_http(timeouts: HttpTimeouts) -> Result<reqwest::Client, ClientError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeouts.request_secs))
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .build()
        .map_err(|e| ClientError::HttpClientBuild(e.to_string()))
}

/// Map a transport failure to a `Provider` error: the caller's fallback text
/// plus what went wrong on the wire.
pub(crate) fn transport_error(err: &reqwest::Error, fallback: &str) -> ClientError {
    let message = if err.is_timeout() {
        "request timed out".to_string()
    } else {
        format!("{fallback} ({})", transport_kind(err))
    };
    ClientError::Provider { status: None, message }
}

fn transport_kind(err: &reqwest::Error) -> &'static str {
    if err.is_connect() {
        "connection failed"
    } else if err.is_redirect() {
        "redirect loop"
    } else if err.is_decode() {
        "response could not be decoded"
    } else if err.is_body() {
        "response body could not be read"
    } else if err.is_request() {
        "request could not be sent"
    } else {
        "transport error"
    }
}
