//! Daily processed/blocked counters (spec §4.8, §6).

use std::sync::Arc;

use crate::error::StorageError;
use crate::kv::KvStore;

fn today_key(prefix: &str) -> String {
    let day = chrono::Utc::now().format("%Y%m%d");
    format!("stats:{prefix}:{day}")
}

pub struct StatsStore {
    store: Arc<dyn KvStore>,
}

impl StatsStore {
    #[must_use]
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// # Errors
    /// Propagates the underlying `KvStore` failure.
    pub async fn incr_processed(&self) -> Result<i64, StorageError> {
        self.store.incr(&today_key("processed")).await
    }

    /// # Errors
    /// Propagates the underlying `KvStore` failure.
    pub async fn incr_blocked(&self) -> Result<i64, StorageError> {
        self.store.incr(&today_key("blocked")).await
    }

    /// # Errors
    /// Propagates the underlying `KvStore` failure.
    pub async fn processed_today(&self) -> Result<i64, StorageError> {
        Ok(self.store.get(&today_key("processed")).await?.and_then(|v| v.parse().ok()).unwrap_or(0))
    }

    /// # Errors
    /// Propagates the underlying `KvStore` failure.
    pub async fn blocked_today(&self) -> Result<i64, StorageError> {
        Ok(self.store.get(&today_key("blocked")).await?.and_then(|v| v.parse().ok()).unwrap_or(0))
    }
}
