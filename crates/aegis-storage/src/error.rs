//! Typed error enum for the storage layer.
//!
//! Replaces opaque `anyhow::Result` in the storage traits so callers can
//! match on specific failure modes instead of downcasting.

use thiserror::Error;

/// Storage-layer error with variants covering every expected failure mode.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Key not found for an expected-present entity.
    #[error("not found: {entity} with key {key}")]
    NotFound { entity: &'static str, key: String },

    /// Redis connection / command failure.
    #[error("redis error: {0}")]
    Redis(#[source] redis::RedisError),

    /// Stored value could not be deserialized into the expected domain type.
    #[error("data corruption: {context}")]
    DataCorruption {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    /// Whether this error is likely transient and worth retrying.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Redis(e) if e.is_timeout() || e.is_io_error())
    }
}

impl From<redis::RedisError> for StorageError {
    fn from(err: redis::RedisError) -> Self {
        Self::Redis(err)
    }
}
