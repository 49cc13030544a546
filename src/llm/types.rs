//! Provider-neutral request types, client errors and the client seams.

use serde::Serialize;
use serde_json::Value;

use crate::credentials::Provider;
use crate::entry::Role;

// =============================================================================
// ERROR
// =============================================================================

/// Failures produced by outbound provider clients.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// No usable key for the provider. Raised before any network attempt.
    #[error("{} API key is not set. Please set it in the Admin Settings.", .provider.label())]
    MissingCredential { provider: Provider },

    /// Transport failure or a provider-reported error.
    #[error("{message}")]
    Provider { status: Option<u16>, message: String },

    /// The provider's success envelope lacked the expected field.
    #[error("Unexpected response format from {0}")]
    UnexpectedResponse(String),

    /// Blank input reached a client directly.
    #[error("input is empty")]
    EmptyInput,

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl crate::error::ErrorCode for ClientError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingCredential { .. } => "E_MISSING_CREDENTIAL",
            Self::Provider { .. } => "E_PROVIDER",
            Self::UnexpectedResponse(_) => "E_UNEXPECTED_RESPONSE",
            Self::EmptyInput => "E_EMPTY_INPUT",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Provider { status: None | Some(429 | 500..=599), .. })
    }
}

/// Return the key or fail with [`ClientError::MissingCredential`].
///
/// # Errors
///
/// Fails when the key is absent or blank.
pub fn require_key(api_key: Option<&str>, provider: Provider) -> Result<&str, ClientError> {
    match api_key {
        Some(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(ClientError::MissingCredential { provider }),
    }
}

/// Pull the provider's own error text out of an error body.
///
/// Handles both `{"error": {"message": "..."}}` and `{"error": "..."}`.
#[must_use]
pub fn provider_error_text(body: &str) -> Option<String> {
    let root: Value = serde_json::from_str(body).ok()?;
    let error = root.get("error")?;
    let text = error
        .get("message")
        .and_then(Value::as_str)
        .or_else(|| error.as_str())?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

// =============================================================================
// MESSAGES
// =============================================================================

/// One message of chat context sent to the completion provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }
}

// =============================================================================
// CLIENT SEAMS
// =============================================================================

/// Single-shot chat completion. Implementations keep no memory between calls.
#[async_trait::async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Send `history` followed by `new_message` as a user turn.
    ///
    /// # Errors
    ///
    /// [`ClientError::MissingCredential`] when `api_key` is absent,
    /// [`ClientError::Provider`] on transport or provider errors,
    /// [`ClientError::UnexpectedResponse`] when no reply text comes back.
    async fn complete(
        &self,
        api_key: Option<&str>,
        history: &[ChatMessage],
        new_message: &str,
    ) -> Result<String, ClientError>;
}

/// Single-image generation returning the image URL.
#[async_trait::async_trait]
pub trait ImageGeneration: Send + Sync {
    /// # Errors
    ///
    /// [`ClientError::MissingCredential`] when `api_key` is absent,
    /// [`ClientError::Provider`] on transport or provider errors,
    /// [`ClientError::UnexpectedResponse`] when the envelope has no URL.
    async fn generate(&self, api_key: Option<&str>, prompt: &str) -> Result<String, ClientError>;
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
