//! Bounded audit logs: per-incident trail, killswitch/approval history, and
//! the pipeline-wide activity log (spec §4.8, §6).

use std::sync::Arc;

use aegis_core::{ActivitySeverity, Stage};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::kv::KvStore;

const KEY_KILLSWITCH_AUDIT: &str = "audit:killswitch";
const KEY_APPROVALS_AUDIT: &str = "audit:approvals";
const KEY_ACTIVITY_LOG: &str = "logs:activity";
const ACTIVITY_LOG_MAX: isize = aegis_core::ACTIVITY_LOG_MAX_ENTRIES;

fn incident_audit_key(incident: &str) -> String {
    format!("audit:{incident}")
}

/// One line in the bounded, stage-tagged activity log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub triage_id: String,
    pub stage: Stage,
    pub severity: ActivitySeverity,
    pub message: String,
    pub timestamp: String,
}

pub struct AuditLog {
    store: Arc<dyn KvStore>,
}

impl AuditLog {
    #[must_use]
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Appends a line to the per-incident audit trail.
    ///
    /// # Errors
    /// Propagates the underlying `KvStore` failure.
    pub async fn push_incident(&self, incident: &str, line: &str) -> Result<(), StorageError> {
        self.store.rpush(&incident_audit_key(incident), line).await
    }

    /// # Errors
    /// Propagates the underlying `KvStore` failure.
    pub async fn get_incident(&self, incident: &str) -> Result<Vec<String>, StorageError> {
        self.store.lrange(&incident_audit_key(incident), 0, -1).await
    }

    /// # Errors
    /// Propagates the underlying `KvStore` failure.
    pub async fn push_killswitch(&self, line: &str) -> Result<(), StorageError> {
        self.store.rpush(KEY_KILLSWITCH_AUDIT, line).await
    }

    /// # Errors
    /// Propagates the underlying `KvStore` failure.
    pub async fn push_approval(&self, line: &str) -> Result<(), StorageError> {
        self.store.rpush(KEY_APPROVALS_AUDIT, line).await
    }

    /// Pushes a stage-tagged line newest-first into the 1000-entry activity log.
    ///
    /// # Errors
    /// Propagates the underlying `KvStore` failure.
    pub async fn push_activity(&self, entry: &ActivityLogEntry) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(entry).unwrap_or_default();
        self.store.lpush(KEY_ACTIVITY_LOG, &encoded).await?;
        self.store.ltrim(KEY_ACTIVITY_LOG, 0, ACTIVITY_LOG_MAX.saturating_sub(1)).await
    }
}
