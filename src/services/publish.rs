//! Publication — render the whiteboard, edit a draft, publish a link.
//!
//! DESIGN
//! ======
//! [`render`] is pure and deterministic: the same entries always produce the
//! same text. A [`Draft`] is an owned copy; editing it never touches the
//! whiteboard. Publishing is the only side effect and sits behind the
//! [`Publisher`] seam.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::PublishConfig;
use crate::entry::{Entry, EntryKind};

pub const DEFAULT_DRAFT_TITLE: &str = "Whiteboard Content";
pub const ENTRY_SEPARATOR: &str = "\n\n";
pub const IMAGE_ALT: &str = "Generated";

const REFERENCE_SUFFIX_LEN: usize = 6;
const SUFFIX_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

// =============================================================================
// RENDER
// =============================================================================

/// Render entries in order, separated by a blank line.
#[must_use]
pub fn render(entries: &[Entry]) -> String {
    entries
        .iter()
        .map(render_entry)
        .collect::<Vec<_>>()
        .join(ENTRY_SEPARATOR)
}

fn render_entry(entry: &Entry) -> String {
    match entry.kind {
        EntryKind::Image => format!("![{IMAGE_ALT}]({})", entry.content),
        EntryKind::Text | EntryKind::Url | EntryKind::AssistantRequest => entry.content.clone(),
    }
}

// =============================================================================
// DRAFT + PREVIEW
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Draft {
    pub title: String,
    pub content: String,
}

impl Draft {
    /// Draft of the given entries under the default title.
    #[must_use]
    pub fn from_entries(entries: &[Entry]) -> Self {
        Self { title: DEFAULT_DRAFT_TITLE.to_string(), content: render(entries) }
    }
}

/// One line of a draft as the preview shows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Image { alt: String, src: String },
    Paragraph { text: String },
}

/// Split draft content into preview blocks. Blank lines produce nothing.
#[must_use]
pub fn preview(content: &str) -> Vec<Block> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            parse_image_line(line).unwrap_or_else(|| Block::Paragraph { text: line.to_string() })
        })
        .collect()
}

/// `![alt](src)` occupying the whole line.
fn parse_image_line(line: &str) -> Option<Block> {
    let rest = line.strip_prefix("![")?;
    let (alt, rest) = rest.split_once("](")?;
    let src = rest.strip_suffix(')')?;
    if src.is_empty() || src.contains(char::is_whitespace) {
        return None;
    }
    Some(Block::Image { alt: alt.to_string(), src: src.to_string() })
}

// =============================================================================
// PUBLISHER
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PublishError {
    #[error("nothing to publish: draft content is empty")]
    EmptyContent,
}

impl crate::error::ErrorCode for PublishError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyContent => "E_PUBLISH_EMPTY",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Published {
    pub url: String,
    pub title: String,
    pub published_at_ms: u128,
}

#[async_trait::async_trait]
pub trait Publisher: Send + Sync {
    /// Publish `draft` and return its shareable reference.
    async fn publish(&self, draft: &Draft) -> Result<Published, PublishError>;
}

/// Mints links under a base URL. With `dedupe` on, an identical draft gets
/// its earlier link back.
pub struct LinkPublisher {
    config: PublishConfig,
    issued: Mutex<HashMap<Draft, Published>>,
}

impl LinkPublisher {
    #[must_use]
    pub fn new(config: PublishConfig) -> Self {
        Self { config, issued: Mutex::new(HashMap::new()) }
    }

    fn mint(&self, title: &str) -> Published {
        let published_at_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis());
        let url = format!("{}/published-content-{published_at_ms}-{}", self.config.base_url, reference_suffix());
        Published { url, title: title.to_string(), published_at_ms }
    }
}

fn reference_suffix() -> String {
    let mut rng = rand::rng();
    (0..REFERENCE_SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.random_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect()
}

#[async_trait::async_trait]
impl Publisher for LinkPublisher {
    async fn publish(&self, draft: &Draft) -> Result<Published, PublishError> {
        if draft.content.trim().is_empty() {
            return Err(PublishError::EmptyContent);
        }
        let draft = Draft {
            title: if draft.title.trim().is_empty() { DEFAULT_DRAFT_TITLE.to_string() } else { draft.title.clone() },
            content: draft.content.clone(),
        };

        let mut issued = self.issued.lock().unwrap_or_else(PoisonError::into_inner);
        if self.config.dedupe {
            if let Some(existing) = issued.get(&draft) {
                info!(url = %existing.url, "publish: returning existing reference");
                return Ok(existing.clone());
            }
        }
        let published = self.mint(&draft.title);
        info!(url = %published.url, title = %published.title, bytes = draft.content.len(), "publish: minted reference");
        issued.insert(draft, published.clone());
        Ok(published)
    }
}

#[cfg(test)]
#[path = "publish_test.rs"]
mod tests;
