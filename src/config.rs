//! Workspace configuration parsed from environment variables.
//!
//! DESIGN
//! ======
//! Every knob has a named default so the binary starts with nothing but a
//! `.env` file (or nothing at all). Provider keys found in the environment
//! only seed the credential store; they can be overwritten at runtime.

use crate::credentials::Provider;

pub const DEFAULT_PORT: u16 = 3000;

pub const DEFAULT_LLM_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_LLM_MODEL: &str = "mixtral-8x7b-32768";
pub const DEFAULT_LLM_MAX_TOKENS: u32 = 1024;

pub const DEFAULT_IMAGE_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_IMAGE_SIZE: &str = "512x512";

pub const DEFAULT_LOOKUP_BASE_URL: &str = "https://us-real-estate-listings.p.rapidapi.com";
pub const DEFAULT_LOOKUP_HOST: &str = "us-real-estate-listings.p.rapidapi.com";

pub const DEFAULT_PUBLISH_BASE_URL: &str = "https://example.com";

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse failed: {0}")]
    Parse(String),
}

impl crate::error::ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Parse(_) => "E_CONFIG_PARSE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionConfig {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            model: DEFAULT_LLM_MODEL.to_string(),
            max_tokens: DEFAULT_LLM_MAX_TOKENS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageConfig {
    pub base_url: String,
    /// Sent only when set; the provider picks its default model otherwise.
    pub model: Option<String>,
    pub size: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_IMAGE_BASE_URL.to_string(), model: None, size: DEFAULT_IMAGE_SIZE.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupConfig {
    pub base_url: String,
    pub host: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_LOOKUP_BASE_URL.to_string(), host: DEFAULT_LOOKUP_HOST.to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishConfig {
    pub base_url: String,
    /// Reuse the reference of an identical earlier publication.
    pub dedupe: bool,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_PUBLISH_BASE_URL.to_string(), dedupe: false }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceConfig {
    pub port: u16,
    pub completion: CompletionConfig,
    pub image: ImageConfig,
    pub lookup: LookupConfig,
    pub publish: PublishConfig,
    pub timeouts: HttpTimeouts,
    /// Keys found in the environment, used to seed the credential store.
    pub credentials: Vec<(Provider, String)>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            completion: CompletionConfig::default(),
            image: ImageConfig::default(),
            lookup: LookupConfig::default(),
            publish: PublishConfig::default(),
            timeouts: HttpTimeouts::default(),
            credentials: Vec::new(),
        }
    }
}

impl WorkspaceConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `LLM_BASE_URL`, `LLM_MODEL`, `LLM_MAX_TOKENS`
    /// - `IMAGE_BASE_URL`, `IMAGE_MODEL`, `IMAGE_SIZE`
    /// - `LOOKUP_BASE_URL`, `LOOKUP_HOST`
    /// - `PUBLISH_BASE_URL`, `PUBLISH_DEDUPE` (`true`/`false`)
    /// - `LLM_REQUEST_TIMEOUT_SECS` (default 120), `LLM_CONNECT_TIMEOUT_SECS` (default 10)
    /// - `GROQ_API_KEY`, `OPENAI_API_KEY`, `RAPIDAPI_KEY`: initial credentials
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for a malformed port or boolean flag.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match get("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| ConfigError::Parse(format!("invalid PORT: {raw}")))?,
            None => DEFAULT_PORT,
        };

        let completion = CompletionConfig {
            base_url: base_url(get("LLM_BASE_URL"), DEFAULT_LLM_BASE_URL),
            model: get("LLM_MODEL").unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
            max_tokens: parse_or(get("LLM_MAX_TOKENS"), DEFAULT_LLM_MAX_TOKENS),
        };
        let image = ImageConfig {
            base_url: base_url(get("IMAGE_BASE_URL"), DEFAULT_IMAGE_BASE_URL),
            model: get("IMAGE_MODEL").filter(|m| !m.trim().is_empty()),
            size: get("IMAGE_SIZE").unwrap_or_else(|| DEFAULT_IMAGE_SIZE.to_string()),
        };
        let lookup = LookupConfig {
            base_url: base_url(get("LOOKUP_BASE_URL"), DEFAULT_LOOKUP_BASE_URL),
            host: get("LOOKUP_HOST").unwrap_or_else(|| DEFAULT_LOOKUP_HOST.to_string()),
        };
        let publish = PublishConfig {
            base_url: base_url(get("PUBLISH_BASE_URL"), DEFAULT_PUBLISH_BASE_URL),
            dedupe: parse_flag("PUBLISH_DEDUPE", get("PUBLISH_DEDUPE").as_deref())?,
        };
        let timeouts = HttpTimeouts {
            request_secs: parse_or(get("LLM_REQUEST_TIMEOUT_SECS"), DEFAULT_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_or(get("LLM_CONNECT_TIMEOUT_SECS"), DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        let credentials = [
            (Provider::Llm, "GROQ_API_KEY"),
            (Provider::Image, "OPENAI_API_KEY"),
            (Provider::Lookup, "RAPIDAPI_KEY"),
        ]
        .into_iter()
        .filter_map(|(provider, var)| get(var).map(|key| (provider, key)))
        .filter(|(_, key)| !key.trim().is_empty())
        .collect();

        Ok(Self { port, completion, image, lookup, publish, timeouts, credentials })
    }
}

fn base_url(raw: Option<String>, default: &str) -> String {
    raw.as_deref()
        .unwrap_or(default)
        .trim_end_matches('/')
        .to_string()
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn parse_flag(key: &str, raw: Option<&str>) -> Result<bool, ConfigError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(false),
        Some("true" | "1" | "yes") => Ok(true),
        Some("false" | "0" | "no") => Ok(false),
        Some(other) => Err(ConfigError::Parse(format!("invalid {key}: {other} (expected true or false)"))),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
