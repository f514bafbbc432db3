//! Business logic layer: Storm Shield, enrichment, executor, and the
//! pipeline orchestrator that drives a job through all of them.

#![allow(clippy::missing_errors_doc, reason = "Errors are self-explanatory from Result types")]
#![allow(clippy::ref_patterns, reason = "Ref patterns are clearer in some contexts")]
#![allow(missing_debug_implementations, reason = "Internal types")]
#![allow(clippy::manual_let_else, reason = "if let is clearer")]

mod enrichment;
mod error;
mod executor;
mod pipeline;
mod storm_shield;

pub use enrichment::EnrichmentAggregator;
pub use error::ServiceError;
pub use executor::Executor;
pub use pipeline::PipelineOrchestrator;
pub use storm_shield::{DuplicateCheck, StormShield};
