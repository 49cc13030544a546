//! Credential store — per-provider API keys.
//!
//! Pure get/set. Clients never hold a key: callers read the store at the
//! moment of each outbound request and pass the key in.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

/// Provider whose secret authorizes an outbound request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Chat-completion provider.
    Llm,
    /// Image-generation provider.
    Image,
    /// Property lookup provider.
    Lookup,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::Llm, Provider::Image, Provider::Lookup];

    /// Storage key, matching the names the settings screen writes.
    #[must_use]
    pub fn storage_key(self) -> &'static str {
        match self {
            Self::Llm => "groq_api_key",
            Self::Image => "openai_api_key",
            Self::Lookup => "rapidapi_key",
        }
    }

    /// Human-facing vendor name used in error messages.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Llm => "Groq",
            Self::Image => "OpenAI",
            Self::Lookup => "RapidAPI",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Llm => "llm",
            Self::Image => "image",
            Self::Lookup => "lookup",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown credential provider: {0}")]
pub struct UnknownProvider(pub String);

impl crate::error::ErrorCode for UnknownProvider {
    fn error_code(&self) -> &'static str {
        "E_UNKNOWN_PROVIDER"
    }
}

impl FromStr for Provider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "llm" | "groq" | "groq_api_key" => Ok(Self::Llm),
            "image" | "openai" | "openai_api_key" => Ok(Self::Image),
            "lookup" | "rapidapi" | "rapidapi_key" => Ok(Self::Lookup),
            other => Err(UnknownProvider(other.to_owned())),
        }
    }
}

/// Process-wide credential map. Cloning shares the map.
#[derive(Clone, Default)]
pub struct CredentialStore {
    secrets: Arc<RwLock<HashMap<Provider, String>>>,
}

impl CredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current secret for `provider`. Blank secrets read as absent.
    #[must_use]
    pub fn get(&self, provider: Provider) -> Option<String> {
        let secrets = self
            .secrets
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        secrets
            .get(&provider)
            .filter(|s| !s.trim().is_empty())
            .cloned()
    }

    /// Overwrite the secret for `provider`. A blank value clears it.
    pub fn set(&self, provider: Provider, secret: impl Into<String>) {
        let secret = secret.into();
        let mut secrets = self
            .secrets
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if secret.trim().is_empty() {
            secrets.remove(&provider);
        } else {
            secrets.insert(provider, secret);
        }
    }

    #[must_use]
    pub fn is_set(&self, provider: Provider) -> bool {
        self.get(provider).is_some()
    }
}

#[cfg(test)]
#[path = "credentials_test.rs"]
mod tests;
