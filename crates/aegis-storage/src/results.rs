//! Terminal `PipelineState` records and per-triage feedback (spec §3, §6).

use std::sync::Arc;

use aegis_core::{FEEDBACK_HISTORY_MAX_ENTRIES, FEEDBACK_TTL_SECS, FeedbackRecord, PipelineState, RESULT_TTL_SECS};

use crate::error::StorageError;
use crate::kv::KvStore;

fn result_key(triage_id: &str) -> String {
    format!("triage:result:{triage_id}")
}

fn feedback_key(triage_id: &str) -> String {
    format!("feedback:{triage_id}")
}

const FEEDBACK_HISTORY_KEY: &str = "feedback:history";

/// Persists and retrieves terminal pipeline states and feedback.
pub struct ResultStore {
    store: Arc<dyn KvStore>,
}

impl ResultStore {
    #[must_use]
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Serializes the terminal state with a 24-hour retention.
    ///
    /// # Errors
    /// Propagates the underlying `KvStore` failure.
    pub async fn save(&self, state: &PipelineState) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(state).unwrap_or_default();
        self.store.set_ex(&result_key(&state.triage_id), &encoded, RESULT_TTL_SECS).await
    }

    /// # Errors
    /// Propagates the underlying `KvStore` failure.
    pub async fn get(&self, triage_id: &str) -> Result<Option<PipelineState>, StorageError> {
        let Some(raw) = self.store.get(&result_key(triage_id)).await? else {
            return Ok(None);
        };
        let state = serde_json::from_str(&raw)
            .map_err(|e| StorageError::DataCorruption { context: "pipeline result".to_owned(), source: e })?;
        Ok(Some(state))
    }

    /// Records feedback with a 90-day TTL and appends to the bounded history list.
    ///
    /// # Errors
    /// Propagates the underlying `KvStore` failure.
    pub async fn save_feedback(&self, record: &FeedbackRecord) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(record).unwrap_or_default();
        self.store.set_ex(&feedback_key(&record.triage_id), &encoded, FEEDBACK_TTL_SECS).await?;
        self.store.lpush(FEEDBACK_HISTORY_KEY, &encoded).await?;
        self.store.ltrim(FEEDBACK_HISTORY_KEY, 0, FEEDBACK_HISTORY_MAX_ENTRIES.saturating_sub(1)).await
    }

    /// # Errors
    /// Propagates the underlying `KvStore` failure.
    pub async fn feedback_stats(&self) -> Result<(u64, u64), StorageError> {
        let raw = self.store.lrange(FEEDBACK_HISTORY_KEY, 0, -1).await?;
        let records: Vec<FeedbackRecord> = raw.iter().filter_map(|r| serde_json::from_str(r).ok()).collect();
        let positive = records.iter().filter(|r| r.thumbs_up).count() as u64;
        let negative = records.len() as u64 - positive;
        Ok((positive, negative))
    }
}
