//! Property lookup — fetch a listing by MLS id and cut it into snippets
//! ready to drop onto the whiteboard.
//!
//! The HTTP call is a thin wrapper; everything that inspects the response
//! body is a pure function so it can be tested without a server.

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::{HttpTimeouts, LookupConfig};
use crate::credentials::Provider;
use crate::llm::ClientError;
use crate::llm::types::require_key;

pub const NO_ADDRESS: &str = "No address available";
pub const NO_PRICE: &str = "Price not available";
pub const NO_DESCRIPTION: &str = "No description available";
pub const LOOKUP_FALLBACK_ERROR: &str = "An unknown error occurred";

// =============================================================================
// TYPES
// =============================================================================

/// The fields of a listing the workspace shows and inserts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listing {
    pub title: String,
    pub price: String,
    pub description: String,
    pub image_url: Option<String>,
}

/// Which part of a listing to insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Snippet {
    Title,
    Price,
    Description,
    Image,
    All,
}

impl Listing {
    /// Text for one snippet. `Image` is `None` when the listing has no photo.
    #[must_use]
    pub fn snippet(&self, which: Snippet) -> Option<String> {
        match which {
            Snippet::Title => Some(format!("Title: {}", self.title)),
            Snippet::Price => Some(format!("Price: {}", self.price)),
            Snippet::Description => Some(format!("Description: {}", self.description)),
            Snippet::Image => self
                .image_url
                .as_ref()
                .map(|url| format!("Image: ![Property Image]({url})")),
            Snippet::All => {
                let lines: Vec<String> = [Snippet::Title, Snippet::Price, Snippet::Description, Snippet::Image]
                    .into_iter()
                    .filter_map(|part| self.snippet(part))
                    .collect();
                Some(lines.join("\n"))
            }
        }
    }
}

#[async_trait::async_trait]
pub trait PropertyLookup: Send + Sync {
    async fn lookup(&self, api_key: Option<&str>, mls_id: &str) -> Result<Listing, ClientError>;
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct LookupClient {
    http: reqwest::Client,
    config: LookupConfig,
}

impl LookupClient {
    /// # Errors
    ///
    /// Returns [`ClientError::HttpClientBuild`] if the HTTP client fails to build.
    pub fn new(config: LookupConfig, timeouts: HttpTimeouts) -> Result<Self, ClientError> {
        let http = crate::llm::build_http(timeouts)?;
        Ok(Self { http, config })
    }
}

#[async_trait::async_trait]
impl PropertyLookup for LookupClient {
    async fn lookup(&self, api_key: Option<&str>, mls_id: &str) -> Result<Listing, ClientError> {
        let api_key = require_key(api_key, Provider::Lookup)?;
        let mls_id = mls_id.trim();
        if mls_id.is_empty() {
            return Err(ClientError::EmptyInput);
        }
        info!(mls_id, "lookup: request");

        let url = format!("{}/v2/property-by-mls", self.config.base_url);
        let response = self
            .http
            .get(url)
            .query(&[("mlsId", mls_id)])
            .header("x-rapidapi-key", api_key)
            .header("x-rapidapi-host", &self.config.host)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "lookup: transport error");
                crate::llm::transport_error(&e, LOOKUP_FALLBACK_ERROR)
            })?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| crate::llm::transport_error(&e, LOOKUP_FALLBACK_ERROR))?;

        if !(200..300).contains(&status) {
            warn!(status, "lookup: provider error");
            return Err(ClientError::Provider { status: Some(status), message: format!("Error {status}: {text}") });
        }

        let listing = parse_listing(&text)?;
        info!(title = %listing.title, "lookup: listing found");
        Ok(listing)
    }
}

// =============================================================================
// RESPONSE PARSING
// =============================================================================

/// Pull the first search result out of a lookup response.
pub(crate) fn parse_listing(json_text: &str) -> Result<Listing, ClientError> {
    let root: Value = serde_json::from_str(json_text)
        .map_err(|e| ClientError::UnexpectedResponse(format!("property lookup: {e}")))?;

    let property = root
        .get("search")
        .and_then(|search| search.get("results"))
        .and_then(Value::as_array)
        .and_then(|results| results.first())
        .ok_or_else(|| ClientError::UnexpectedResponse("property lookup: no properties found".into()))?;

    let address = property
        .get("location")
        .and_then(|location| location.get("address"));
    let text_at = |value: Option<&Value>, key: &str| {
        value
            .and_then(|v| v.get(key))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    };

    let description = text_at(property.get("description"), "text").unwrap_or_else(|| NO_DESCRIPTION.to_string());
    let image_url = text_at(property.get("primary_photo"), "href");
    let price = property
        .get("list_price")
        .and_then(format_price)
        .unwrap_or_else(|| NO_PRICE.to_string());

    Ok(Listing { title: format_address(address), price, description, image_url })
}

/// `"<number> <suffix>, <city>, <state>"`, skipping missing parts.
pub(crate) fn format_address(address: Option<&Value>) -> String {
    fn part<'a>(address: Option<&'a Value>, key: &str) -> &'a str {
        address
            .and_then(|a| a.get(key))
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default()
    }
    let street = [part(address, "street_number"), part(address, "street_suffix")]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let parts: Vec<&str> = [street.as_str(), part(address, "city"), part(address, "state_code")]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect();
    if parts.is_empty() { NO_ADDRESS.to_string() } else { parts.join(", ") }
}

/// `$` plus the amount with thousands separators. Fractions keep up to
/// three digits.
pub(crate) fn format_price(value: &Value) -> Option<String> {
    if let Some(whole) = value.as_u64() {
        return Some(format!("${}", group_thousands(&whole.to_string())));
    }
    let amount = value.as_f64()?;
    if !amount.is_finite() || amount < 0.0 {
        return None;
    }
    let fixed = format!("{amount:.3}");
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let fraction = fraction.trim_end_matches('0');
    let grouped = group_thousands(whole);
    Some(if fraction.is_empty() { format!("${grouped}") } else { format!("${grouped}.{fraction}") })
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
#[path = "lookup_test.rs"]
mod tests;
