//! Image generation client (`/images/generations`).
//!
//! One image per call. The provider returns a hosted URL, which is what ends
//! up in the document; no pixel data passes through.

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use super::types::{ClientError, ImageGeneration, provider_error_text, require_key};
use crate::config::{HttpTimeouts, ImageConfig};
use crate::credentials::Provider;

/// Used when the provider gives no error text of its own.
pub const IMAGE_FALLBACK_ERROR: &str = "Failed to generate image. Please try again.";

pub struct ImageClient {
    http: reqwest::Client,
    config: ImageConfig,
}

impl ImageClient {
    /// # Errors
    ///
    /// Returns [`ClientError::HttpClientBuild`] if the HTTP client fails to build.
    pub fn new(config: ImageConfig, timeouts: HttpTimeouts) -> Result<Self, ClientError> {
        let http = super::build_http(timeouts)?;
        Ok(Self { http, config })
    }
}

#[async_trait::async_trait]
impl ImageGeneration for ImageClient {
    async fn generate(&self, api_key: Option<&str>, prompt: &str) -> Result<String, ClientError> {
        let api_key = require_key(api_key, Provider::Image)?;
        let url = format!("{}/images/generations", self.config.base_url);
        let body = ImageRequest { model: self.config.model.as_deref(), prompt, n: 1, size: &self.config.size };

        info!(size = %self.config.size, prompt_len = prompt.len(), "image: request");
        let response = self
            .http
            .post(url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "image: transport error");
                super::transport_error(&e, IMAGE_FALLBACK_ERROR)
            })?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| super::transport_error(&e, IMAGE_FALLBACK_ERROR))?;

        if !(200..300).contains(&status) {
            warn!(status, "image: provider error");
            return Err(image_error(status, &text));
        }

        let image_url = parse_image_response(&text)?;
        info!("image: generated");
        Ok(image_url)
    }
}

#[derive(Serialize)]
struct ImageRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    prompt: &'a str,
    n: u8,
    size: &'a str,
}

pub(crate) fn image_error(status: u16, body: &str) -> ClientError {
    match provider_error_text(body) {
        Some(detail) => {
            ClientError::Provider { status: Some(status), message: format!("Failed to generate image: {detail}") }
        }
        None => ClientError::Provider { status: Some(status), message: IMAGE_FALLBACK_ERROR.to_string() },
    }
}

pub(crate) fn parse_image_response(json_text: &str) -> Result<String, ClientError> {
    let root: Value = serde_json::from_str(json_text)
        .map_err(|e| ClientError::UnexpectedResponse(format!("image generation: {e}")))?;

    root.get("data")
        .and_then(Value::as_array)
        .and_then(|data| data.first())
        .and_then(|image| image.get("url"))
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| ClientError::UnexpectedResponse("image generation: missing data[0].url".into()))
}

#[cfg(test)]
#[path = "image_test.rs"]
mod tests;
