//! Governance Store: process-wide killswitch/mode/thresholds and approvals (spec §4.2).

use std::sync::Arc;

use aegis_core::{
    APPROVAL_TTL_SECS, ApprovalDecision, ApprovalRecord, DEFAULT_THRESHOLD_ASSIGN,
    DEFAULT_THRESHOLD_CATEGORIZE, DEFAULT_THRESHOLD_REMEDIATE, GovernanceMode, GovernanceState,
};

use crate::error::StorageError;
use crate::kv::KvStore;

const KEY_KILLSWITCH: &str = "gov:killswitch";
const KEY_MODE: &str = "gov:mode";
const KEY_THRESHOLD_ASSIGN: &str = "gov:threshold:assign";
const KEY_THRESHOLD_CATEGORIZE: &str = "gov:threshold:categorize";
const KEY_THRESHOLD_REMEDIATE: &str = "gov:threshold:remediate";

fn approval_key(incident: &str) -> String {
    format!("approval:{incident}")
}

/// Every read goes straight to the store — no in-process cache, matching the
/// "every governance read is point-in-time" invariant.
pub struct GovernanceStore {
    store: Arc<dyn KvStore>,
}

impl GovernanceStore {
    #[must_use]
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Reads the full governance state, falling back to defaults for any unset key.
    ///
    /// # Errors
    /// Propagates the underlying `KvStore` failure.
    pub async fn read(&self) -> Result<GovernanceState, StorageError> {
        let enabled = match self.store.get(KEY_KILLSWITCH).await? {
            Some(v) => v != "false",
            None => true,
        };
        let mode = match self.store.get(KEY_MODE).await? {
            Some(v) => v.parse().unwrap_or(GovernanceMode::Assist),
            None => GovernanceMode::Assist,
        };
        let threshold_assign = self.read_threshold(KEY_THRESHOLD_ASSIGN, DEFAULT_THRESHOLD_ASSIGN).await?;
        let threshold_categorize =
            self.read_threshold(KEY_THRESHOLD_CATEGORIZE, DEFAULT_THRESHOLD_CATEGORIZE).await?;
        let threshold_remediate =
            self.read_threshold(KEY_THRESHOLD_REMEDIATE, DEFAULT_THRESHOLD_REMEDIATE).await?;

        Ok(GovernanceState { enabled, mode, threshold_assign, threshold_categorize, threshold_remediate })
    }

    async fn read_threshold(&self, key: &str, default: u8) -> Result<u8, StorageError> {
        Ok(self.store.get(key).await?.and_then(|v| v.parse().ok()).unwrap_or(default))
    }

    /// # Errors
    /// Propagates the underlying `KvStore` failure.
    pub async fn set_killswitch(&self, enabled: bool) -> Result<(), StorageError> {
        self.store.set(KEY_KILLSWITCH, if enabled { "true" } else { "false" }).await
    }

    /// # Errors
    /// Propagates the underlying `KvStore` failure.
    pub async fn set_mode(&self, mode: GovernanceMode) -> Result<(), StorageError> {
        self.store.set(KEY_MODE, mode.as_str()).await
    }

    /// # Errors
    /// Propagates the underlying `KvStore` failure.
    pub async fn set_threshold_assign(&self, value: u8) -> Result<(), StorageError> {
        self.store.set(KEY_THRESHOLD_ASSIGN, &value.to_string()).await
    }

    /// # Errors
    /// Propagates the underlying `KvStore` failure.
    pub async fn set_threshold_categorize(&self, value: u8) -> Result<(), StorageError> {
        self.store.set(KEY_THRESHOLD_CATEGORIZE, &value.to_string()).await
    }

    /// # Errors
    /// Propagates the underlying `KvStore` failure.
    pub async fn set_threshold_remediate(&self, value: u8) -> Result<(), StorageError> {
        self.store.set(KEY_THRESHOLD_REMEDIATE, &value.to_string()).await
    }

    /// Records an approval/rejection decision, 1-hour TTL.
    ///
    /// # Errors
    /// Propagates the underlying `KvStore` failure.
    pub async fn record_approval(
        &self,
        incident: &str,
        decision: ApprovalDecision,
        approver: &str,
        reason: Option<String>,
    ) -> Result<(), StorageError> {
        let record = ApprovalRecord {
            incident: incident.to_owned(),
            decision,
            approver: approver.to_owned(),
            reason,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        let encoded = serde_json::to_string(&record).unwrap_or_default();
        self.store.set_ex(&approval_key(incident), &encoded, APPROVAL_TTL_SECS).await
    }

    /// Looks up a pending approval record for an incident, if any (and not expired).
    ///
    /// # Errors
    /// Propagates the underlying `KvStore` failure.
    pub async fn get_approval(&self, incident: &str) -> Result<Option<ApprovalRecord>, StorageError> {
        let Some(raw) = self.store.get(&approval_key(incident)).await? else {
            return Ok(None);
        };
        let record = serde_json::from_str(&raw)
            .map_err(|e| StorageError::DataCorruption { context: "approval record".to_owned(), source: e })?;
        Ok(Some(record))
    }

    /// Whether a pre-existing APPROVE decision exists for the incident.
    ///
    /// # Errors
    /// Propagates the underlying `KvStore` failure.
    pub async fn is_approved(&self, incident: &str) -> Result<bool, StorageError> {
        Ok(matches!(self.get_approval(incident).await?, Some(r) if r.decision == ApprovalDecision::Approve))
    }
}
