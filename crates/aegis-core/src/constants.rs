//! Shared constants for AEGIS.
//!
//! Centralizes the numeric defaults named in the governance and queue contracts
//! so they are defined once and overridden only through `env_config`.

/// Embedding vector dimension for the shared vector index (FLOAT32\[1024\], cosine distance).
pub const EMBEDDING_DIMENSION: usize = 1024;

/// Default governance thresholds (percent confidence, 0-100).
pub const DEFAULT_THRESHOLD_ASSIGN: u8 = 85;
pub const DEFAULT_THRESHOLD_CATEGORIZE: u8 = 80;
pub const DEFAULT_THRESHOLD_REMEDIATE: u8 = 95;

/// Storm Shield defaults.
pub const DEFAULT_DEDUP_WINDOW_MINUTES: i64 = 15;
pub const DEFAULT_DEDUP_THRESHOLD: f32 = 0.90;

/// Queue driver retry policy: after this many failures the job is dead-lettered.
pub const MAX_RETRY_COUNT: u32 = 3;

/// `reserve()` blocking-pop timeout in seconds.
pub const RESERVE_TIMEOUT_SECS: u64 = 5;

/// Approval record TTL in seconds (1 hour).
pub const APPROVAL_TTL_SECS: u64 = 3600;

/// Triage result record TTL in seconds (24 hours).
pub const RESULT_TTL_SECS: u64 = 86400;

/// Feedback record TTL in seconds (90 days).
pub const FEEDBACK_TTL_SECS: u64 = 90 * 24 * 3600;

/// Ticket embedding TTL in the vector index (90 days); KB/SOP embeddings never expire.
pub const TICKET_EMBEDDING_TTL_SECS: u64 = 90 * 24 * 3600;

/// Bounded-list caps.
pub const ACTIVITY_LOG_MAX_ENTRIES: isize = 1000;
pub const FEEDBACK_HISTORY_MAX_ENTRIES: isize = 1000;

/// Enrichment fan-out budget.
pub const ENRICHMENT_TOTAL_BUDGET_SECS: u64 = 10;
pub const ENRICHMENT_PER_CALL_TIMEOUT_SECS: u64 = 6;
