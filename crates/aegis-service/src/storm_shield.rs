//! Semantic near-duplicate suppression over a sliding time window (spec §4.4).
//!
//! Fail-open throughout: an embedding or vector-index failure is logged and
//! treated as "no duplicate found", matching the teacher's
//! `try_dedup_merge` — never block a legitimate ticket on a degraded dependency.

use std::sync::Arc;

use aegis_embeddings::{Collection, EmbeddingClient, VectorDocument, VectorIndexClient};
use chrono::{DateTime, Utc};

use crate::ServiceError;

/// Outcome of a Storm Shield check: whether the ticket is a near-duplicate
/// and, if so, which prior incident it matches.
#[derive(Debug, Clone)]
pub struct DuplicateCheck {
    pub is_duplicate: bool,
    pub duplicate_of: Option<String>,
}

pub struct StormShield {
    embeddings: Arc<dyn EmbeddingClient>,
    vector_index: Arc<dyn VectorIndexClient>,
    window_minutes: i64,
    threshold: f32,
}

impl StormShield {
    #[must_use]
    pub fn new(
        embeddings: Arc<dyn EmbeddingClient>,
        vector_index: Arc<dyn VectorIndexClient>,
        window_minutes: i64,
        threshold: f32,
    ) -> Self {
        Self { embeddings, vector_index, window_minutes, threshold }
    }

    /// Checks `scrubbed_short_description` against tickets recorded within
    /// the sliding window. `self_incident` is never matched against itself.
    pub async fn check_duplicate(&self, self_incident: &str, scrubbed_short_description: &str) -> DuplicateCheck {
        let embedding = match self.embeddings.embed(scrubbed_short_description).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "storm shield embedding failed, proceeding without dedup check");
                return DuplicateCheck { is_duplicate: false, duplicate_of: None };
            },
        };

        if aegis_core::is_zero_vector(&embedding) {
            return DuplicateCheck { is_duplicate: false, duplicate_of: None };
        }

        let matches = match self.vector_index.query(Collection::Ticket, &embedding, 5).await {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(error = %e, "storm shield vector lookup failed, proceeding without dedup check");
                return DuplicateCheck { is_duplicate: false, duplicate_of: None };
            },
        };

        let cutoff = Utc::now() - chrono::Duration::minutes(self.window_minutes);
        let hit = matches.into_iter().filter(|m| m.doc_id != self_incident).find(|m| {
            m.score >= self.threshold
                && m.created_at
                    .as_deref()
                    .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
                    .is_none_or(|recorded_at| recorded_at.with_timezone(&Utc) >= cutoff)
        });

        match hit {
            Some(m) => DuplicateCheck { is_duplicate: true, duplicate_of: Some(m.doc_id) },
            None => DuplicateCheck { is_duplicate: false, duplicate_of: None },
        }
    }

    /// Records a ticket's embedding after it has passed the duplicate check,
    /// with a 90-day TTL (ticket embeddings expire; KB/SOP embeddings do not).
    pub async fn record(&self, incident_number: &str, scrubbed_short_description: &str) -> Result<(), ServiceError> {
        let embedding = self.embeddings.embed(scrubbed_short_description).await?;
        let doc = VectorDocument {
            collection: Collection::Ticket,
            doc_id: incident_number.to_owned(),
            title: incident_number.to_owned(),
            content: scrubbed_short_description.to_owned(),
            category: None,
            created_at: Utc::now().to_rfc3339(),
            ttl_secs: Some(aegis_core::TICKET_EMBEDDING_TTL_SECS),
        };
        self.vector_index.upsert(doc, &embedding).await?;
        Ok(())
    }
}
