//! Typed error enum for the core crate.

use thiserror::Error;

/// Errors originating from core domain type parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid governance mode: {0}")]
    InvalidGovernanceMode(String),
    #[error("invalid remediation tool: {0}")]
    InvalidRemediationTool(String),
    #[error("invalid pipeline status transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },
    #[error("classification schema violation: {0}")]
    ClassificationInvalid(String),
}
