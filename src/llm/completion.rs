//! OpenAI-compatible `/chat/completions` client.
//!
//! Thin HTTP wrapper; response parsing lives in pure functions for testing.

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use super::types::{ChatCompletion, ChatMessage, ClientError, provider_error_text, require_key};
use crate::config::{CompletionConfig, HttpTimeouts};
use crate::credentials::Provider;
use crate::entry::Role;

/// Used when the provider gives no error text of its own.
pub const COMPLETION_FALLBACK_ERROR: &str = "An unexpected error occurred. Please try again.";

// =============================================================================
// CLIENT
// =============================================================================

pub struct CompletionClient {
    http: reqwest::Client,
    config: CompletionConfig,
}

impl CompletionClient {
    /// # Errors
    ///
    /// Returns [`ClientError::HttpClientBuild`] if the HTTP client fails to build.
    pub fn new(config: CompletionConfig, timeouts: HttpTimeouts) -> Result<Self, ClientError> {
        let http = super::build_http(timeouts)?;
        Ok(Self { http, config })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.config.model
    }

    async fn send(&self, api_key: &str, messages: &[ChatMessage]) -> Result<String, ClientError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let body = CcRequest { model: &self.config.model, messages, max_tokens: self.config.max_tokens };

        let response = self
            .http
            .post(url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "completion: transport error");
                super::transport_error(&e, COMPLETION_FALLBACK_ERROR)
            })?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| super::transport_error(&e, COMPLETION_FALLBACK_ERROR))?;

        if !(200..300).contains(&status) {
            warn!(status, "completion: provider error");
            return Err(completion_error(status, &text));
        }

        parse_completion_response(&text)
    }
}

#[async_trait::async_trait]
impl ChatCompletion for CompletionClient {
    async fn complete(
        &self,
        api_key: Option<&str>,
        history: &[ChatMessage],
        new_message: &str,
    ) -> Result<String, ClientError> {
        let api_key = require_key(api_key, Provider::Llm)?;
        let messages = build_messages(history, new_message);
        info!(model = %self.config.model, messages = messages.len(), "completion: request");
        let reply = self.send(api_key, &messages).await?;
        info!(reply_len = reply.len(), "completion: reply");
        Ok(reply)
    }
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
struct CcRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
}

pub(crate) fn build_messages(history: &[ChatMessage], new_message: &str) -> Vec<ChatMessage> {
    let mut out = Vec::with_capacity(history.len() + 1);
    out.extend_from_slice(history);
    out.push(ChatMessage::new(Role::User, new_message));
    out
}

// =============================================================================
// RESPONSE PARSING
// =============================================================================

pub(crate) fn completion_error(status: u16, body: &str) -> ClientError {
    let detail = provider_error_text(body).unwrap_or_else(|| COMPLETION_FALLBACK_ERROR.to_string());
    ClientError::Provider { status: Some(status), message: format!("Failed to send message: {detail}") }
}

pub(crate) fn parse_completion_response(json_text: &str) -> Result<String, ClientError> {
    let root: Value = serde_json::from_str(json_text)
        .map_err(|e| ClientError::UnexpectedResponse(format!("chat completion: {e}")))?;

    root.get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| ClientError::UnexpectedResponse("chat completion: missing choices[0].message.content".into()))
}

#[cfg(test)]
#[path = "completion_test.rs"]
mod tests;
