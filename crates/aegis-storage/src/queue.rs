//! Queue Driver: the reliable three-lane queue over a `KvStore` (spec §4.3).

use std::sync::Arc;

use aegis_core::{MAX_RETRY_COUNT, RESERVE_TIMEOUT_SECS, TriageJob};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::kv::KvStore;

pub const PENDING_LANE: &str = "aegis:queue:triage";
pub const PROCESSING_LANE: &str = "aegis:queue:processing";
pub const DEAD_LETTER_LANE: &str = "aegis:queue:dead_letter";

/// Wraps a `TriageJob` with queue-only bookkeeping. Kept separate from the
/// domain type so retry metadata never leaks into pipeline business logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEnvelope {
    pub job: TriageJob,
    #[serde(default)]
    pub retry_count: u32,
    pub last_retry: Option<String>,
    pub error: Option<String>,
    pub failed_at: Option<String>,
}

impl QueueEnvelope {
    #[must_use]
    pub fn new(job: TriageJob) -> Self {
        Self { job, retry_count: 0, last_retry: None, error: None, failed_at: None }
    }

    fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    fn decode(raw: &str) -> Result<Self, StorageError> {
        serde_json::from_str(raw)
            .map_err(|e| StorageError::DataCorruption { context: "queue envelope".to_owned(), source: e })
    }
}

/// At-least-once delivery over `pending`/`processing`/`dead_letter` lanes.
/// Grounded on the `BRPOPLPUSH`-style reserve and the 3-strike dead-letter
/// policy of the original triage worker.
pub struct QueueDriver {
    store: Arc<dyn KvStore>,
}

impl QueueDriver {
    #[must_use]
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Atomic push to the pending lane.
    ///
    /// # Errors
    /// Propagates the underlying `KvStore` failure.
    pub async fn enqueue(&self, job: TriageJob) -> Result<(), StorageError> {
        let envelope = QueueEnvelope::new(job);
        self.store.rpush(PENDING_LANE, &envelope.encode()).await
    }

    /// Blocking pop-and-push from pending to processing. Returns `None` on
    /// a 5-second timeout (no work available), never an error for that case.
    ///
    /// # Errors
    /// Propagates the underlying `KvStore` failure, or a decode failure if
    /// the stored payload is not a valid envelope (the payload is left in
    /// the processing lane for a reaper or manual inspection).
    pub async fn reserve(&self) -> Result<Option<QueueEnvelope>, StorageError> {
        let raw = self
            .store
            .blmove_head_to_tail(PENDING_LANE, PROCESSING_LANE, RESERVE_TIMEOUT_SECS)
            .await?;
        match raw {
            Some(raw) => Ok(Some(QueueEnvelope::decode(&raw)?)),
            None => Ok(None),
        }
    }

    /// Removes the exact payload from processing (one occurrence).
    ///
    /// # Errors
    /// Propagates the underlying `KvStore` failure.
    pub async fn ack(&self, envelope: &QueueEnvelope) -> Result<(), StorageError> {
        self.store.lrem(PROCESSING_LANE, 1, &envelope.encode()).await?;
        Ok(())
    }

    /// Increments `retry_count`, stamps `last_retry`, and moves the payload
    /// from processing back to pending — unless the retry cap (3) has
    /// already been reached, in which case it is dead-lettered instead.
    ///
    /// # Errors
    /// Propagates the underlying `KvStore` failure.
    pub async fn retry_or_dead_letter(
        &self,
        mut envelope: QueueEnvelope,
        error: &str,
    ) -> Result<bool, StorageError> {
        self.store.lrem(PROCESSING_LANE, 1, &envelope.encode()).await?;
        if envelope.retry_count >= MAX_RETRY_COUNT {
            envelope.error = Some(error.to_owned());
            envelope.failed_at = Some(chrono::Utc::now().to_rfc3339());
            self.store.rpush(DEAD_LETTER_LANE, &envelope.encode()).await?;
            return Ok(true);
        }
        envelope.retry_count = envelope.retry_count.saturating_add(1);
        envelope.last_retry = Some(chrono::Utc::now().to_rfc3339());
        envelope.error = Some(error.to_owned());
        self.store.rpush(PENDING_LANE, &envelope.encode()).await?;
        Ok(false)
    }

    /// Unconditionally dead-letters the payload, bypassing the retry cap.
    ///
    /// # Errors
    /// Propagates the underlying `KvStore` failure.
    pub async fn dead_letter(&self, mut envelope: QueueEnvelope, error: &str) -> Result<(), StorageError> {
        self.store.lrem(PROCESSING_LANE, 1, &envelope.encode()).await?;
        envelope.error = Some(error.to_owned());
        envelope.failed_at = Some(chrono::Utc::now().to_rfc3339());
        self.store.rpush(DEAD_LETTER_LANE, &envelope.encode()).await
    }

    pub async fn pending_len(&self) -> Result<usize, StorageError> {
        self.store.llen(PENDING_LANE).await
    }

    pub async fn processing_len(&self) -> Result<usize, StorageError> {
        self.store.llen(PROCESSING_LANE).await
    }

    pub async fn dead_letter_len(&self) -> Result<usize, StorageError> {
        self.store.llen(DEAD_LETTER_LANE).await
    }

    /// Reaper (open question in spec §9, resolved as opt-in): moves
    /// processing-lane entries claimed before the visibility timeout back to
    /// pending. A naive list-based store has no per-entry claim timestamp,
    /// so this is implemented as "anything left in processing after a full
    /// sweep interval is assumed stuck" — callers schedule this on a timer
    /// much coarser than any legitimate single-job processing time.
    ///
    /// # Errors
    /// Propagates the underlying `KvStore` failure.
    pub async fn reap_stale(&self) -> Result<usize, StorageError> {
        let stuck = self.store.lrange(PROCESSING_LANE, 0, -1).await?;
        let mut reaped = 0usize;
        for raw in stuck {
            if self.store.lrem(PROCESSING_LANE, 1, &raw).await? > 0 {
                self.store.rpush(PENDING_LANE, &raw).await?;
                reaped = reaped.saturating_add(1);
            }
        }
        Ok(reaped)
    }
}

#[cfg(test)]
mod tests {
    use aegis_core::Incident;

    use super::*;
    use crate::memory_store::InMemoryKvStore;

    fn sample_job() -> TriageJob {
        TriageJob::new(Incident {
            number: "INC0000001".to_owned(),
            short_description: "test".to_owned(),
            description: "test incident".to_owned(),
            caller_id: None,
            category: None,
            subcategory: None,
            priority: "3".to_owned(),
            cmdb_ci: None,
            assignment_group: None,
        })
    }

    #[tokio::test]
    async fn enqueue_then_reserve_moves_lanes() {
        let store = Arc::new(InMemoryKvStore::new());
        let driver = QueueDriver::new(store);
        driver.enqueue(sample_job()).await.unwrap();
        assert_eq!(driver.pending_len().await.unwrap(), 1);

        let envelope = driver.reserve().await.unwrap().unwrap();
        assert_eq!(driver.pending_len().await.unwrap(), 0);
        assert_eq!(driver.processing_len().await.unwrap(), 1);

        driver.ack(&envelope).await.unwrap();
        assert_eq!(driver.processing_len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn dead_letter_after_three_retries() {
        let store = Arc::new(InMemoryKvStore::new());
        let driver = QueueDriver::new(store);
        driver.enqueue(sample_job()).await.unwrap();

        let mut envelope = driver.reserve().await.unwrap().unwrap();
        for _ in 0..3 {
            driver.retry_or_dead_letter(envelope.clone(), "boom").await.unwrap();
            envelope = driver.reserve().await.unwrap().unwrap();
        }
        let dead_lettered = driver.retry_or_dead_letter(envelope, "boom").await.unwrap();
        assert!(dead_lettered);
        assert_eq!(driver.dead_letter_len().await.unwrap(), 1);
        assert_eq!(driver.pending_len().await.unwrap(), 0);
    }
}
