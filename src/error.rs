//! Error codes shared by every error surface.
//!
//! DESIGN
//! ======
//! Each error enum in the crate implements [`ErrorCode`] so that HTTP
//! responses and log lines carry a grepable code plus a retryable hint,
//! independent of the human-readable `Display` text.

use serde::Serialize;

/// Grepable error code and retryable flag for structured error bodies.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

/// JSON body returned by API routes on failure.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    pub retryable: bool,
}

impl ErrorBody {
    pub fn from_error(err: &impl ErrorCode) -> Self {
        Self { code: err.error_code(), message: err.to_string(), retryable: err.retryable() }
    }
}
