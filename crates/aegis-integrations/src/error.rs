//! Typed error enum shared by every integration client.

use thiserror::Error;

/// Errors from ITSM, chat, and remediation-executor HTTP calls.
#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl IntegrationError {
    /// Whether this error is transient and worth retrying.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Request(_) => true,
            Self::Status { status, .. } => matches!(status, 429 | 500 | 502 | 503),
            Self::Decode(_) => false,
        }
    }
}
