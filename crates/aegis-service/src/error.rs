//! Typed error enum for the service layer.
//!
//! Unifies storage, LLM, embedding, and integration failures into a single
//! error type so callers match on specific failure modes instead of
//! downcasting opaque errors.

use aegis_embeddings::EmbeddingError;
use aegis_integrations::IntegrationError;
use aegis_llm::LlmError;
use aegis_storage::StorageError;
use thiserror::Error;

/// Service-layer error unifying storage, LLM, embedding, and integration failures.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    #[error("llm: {0}")]
    Llm(#[from] LlmError),

    #[error("embedding: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("integration: {0}")]
    Integration(#[from] IntegrationError),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A governance decision blocked the requested action (not a failure).
    #[error("governance halt: {0}")]
    GovernanceHalt(String),

    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ServiceError {
    /// Whether this error is likely transient (worth retrying).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_transient(),
            Self::Llm(e) => e.is_transient(),
            Self::Embedding(e) => e.is_transient(),
            Self::Integration(e) => e.is_transient(),
            _ => false,
        }
    }

    /// Whether this error represents a not-found condition.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Storage(StorageError::NotFound { .. }))
    }
}
