//! Typed error enum for the embeddings crate.

use thiserror::Error;

/// Errors from embedding generation and vector index operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("embedding service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("embedding response did not match the expected shape: {0}")]
    Decode(String),
}

impl EmbeddingError {
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Request(e) if e.is_timeout() || e.is_connect())
    }
}

impl From<reqwest::Error> for EmbeddingError {
    fn from(err: reqwest::Error) -> Self {
        Self::Request(err)
    }
}
