//! Domain types, error taxonomy, and PII redaction shared across AEGIS crates.

/// Shared numeric defaults for governance, queue, and vector-index behavior.
mod constants;
/// Incident/TriageJob/PipelineState/Classification/GovernanceState/FeedbackRecord types.
mod domain;
/// Environment variable parsing with warn-level logging for invalid values.
mod env_config;
/// Error types for core domain parsing and validation.
mod error;
/// JSON utility functions shared across crates.
mod json_utils;
/// PII redaction: analyzer trait plus regex fallback.
mod redactor;
/// Cosine similarity for embedding vectors.
mod similarity;

pub use constants::*;
pub use domain::*;
pub use env_config::*;
pub use error::*;
pub use json_utils::*;
pub use redactor::*;
pub use similarity::*;
