#![allow(
    clippy::multiple_inherent_impl,
    reason = "impl blocks split across files for organization"
)]

pub mod ai_types;
pub mod classifier;
pub mod client;
pub mod error;

pub use ai_types::{ChatRequest, ChatResponse, ClassificationJson, Message, ResponseFormat};
pub use classifier::ClassifyRequest;
pub use client::{DEFAULT_MODEL, LlmClient, truncate};
pub use error::LlmError;
