//! Entry — one unit of content in a transcript or in the whiteboard.
//!
//! DESIGN
//! ======
//! Entries carry no position of their own: position is the index in the
//! owning sequence and is renumbered on removal. Image entries hold an image
//! URL in `content`, never pixel data.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// =============================================================================
// ROLE
// =============================================================================

/// Provenance of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

// =============================================================================
// KIND
// =============================================================================

/// How an entry renders and how the router reads it on re-submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntryKind {
    #[default]
    Text,
    Image,
    Url,
    #[serde(alias = "assistant")]
    AssistantRequest,
}

impl EntryKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Url => "url",
            Self::AssistantRequest => "assistant-request",
        }
    }
}

/// Unknown kind string supplied by an external producer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown entry kind: {0}")]
pub struct UnknownKind(pub String);

impl FromStr for EntryKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "image" => Ok(Self::Image),
            "url" => Ok(Self::Url),
            "assistant-request" | "assistant" => Ok(Self::AssistantRequest),
            other => Err(UnknownKind(other.to_owned())),
        }
    }
}

// =============================================================================
// MODE
// =============================================================================

/// Submission intent selected by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Text,
    Image,
    Url,
    #[default]
    Assistant,
}

impl From<EntryKind> for Mode {
    fn from(kind: EntryKind) -> Self {
        match kind {
            EntryKind::Text => Self::Text,
            EntryKind::Image => Self::Image,
            EntryKind::Url => Self::Url,
            EntryKind::AssistantRequest => Self::Assistant,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Url => "url",
            Self::Assistant => "assistant",
        };
        f.write_str(s)
    }
}

// =============================================================================
// ENTRY
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub kind: EntryKind,
}

impl Entry {
    pub fn new(role: Role, kind: EntryKind, content: impl Into<String>) -> Self {
        Self { role, content: content.into(), kind }
    }

    pub fn user_text(content: impl Into<String>) -> Self {
        Self::new(Role::User, EntryKind::Text, content)
    }

    pub fn assistant_text(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, EntryKind::Text, content)
    }

    pub fn system_text(content: impl Into<String>) -> Self {
        Self::new(Role::System, EntryKind::Text, content)
    }

    pub fn image(role: Role, url: impl Into<String>) -> Self {
        Self::new(role, EntryKind::Image, url)
    }
}

#[cfg(test)]
#[path = "entry_test.rs"]
mod tests;
