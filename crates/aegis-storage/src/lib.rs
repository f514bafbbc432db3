//! Shared key-value store for AEGIS: queue lanes, governance state,
//! approvals, audit logs, and daily counters.
//!
//! All mutations are single-key atomic; the only compound primitive is the
//! blocking pop-and-push the queue driver's `reserve()` relies on.

mod audit;
mod error;
mod governance;
mod kv;
mod memory_store;
mod queue;
mod redis_store;
mod results;
mod stats;

pub use audit::{ActivityLogEntry, AuditLog};
pub use error::StorageError;
pub use governance::GovernanceStore;
pub use kv::KvStore;
pub use memory_store::InMemoryKvStore;
pub use queue::{DEAD_LETTER_LANE, PENDING_LANE, PROCESSING_LANE, QueueDriver, QueueEnvelope};
pub use redis_store::RedisKvStore;
pub use results::ResultStore;
pub use stats::StatsStore;
