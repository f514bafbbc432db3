//! Enrichment Aggregator (spec §4.5): KB search, caller lookup, and CI
//! lookup run concurrently; any failure is absorbed and leaves its field
//! empty rather than aborting the stage.

use std::sync::Arc;
use std::time::Duration;

use aegis_core::{CiInfo, KbArticle, PipelineState, UserInfo};
use aegis_integrations::ItsmClient;

const KB_TOP_K: usize = 3;

pub struct EnrichmentAggregator {
    itsm: Arc<dyn ItsmClient>,
    per_call_timeout: Duration,
}

impl EnrichmentAggregator {
    #[must_use]
    pub fn new(itsm: Arc<dyn ItsmClient>, per_call_timeout_secs: u64) -> Self {
        Self { itsm, per_call_timeout: Duration::from_secs(per_call_timeout_secs) }
    }

    /// Populates `kb_articles`, `user_info`, and `ci_info` on `state`
    /// concurrently. Never returns an error — a timed-out or failed lookup
    /// simply leaves its field at its zero value.
    pub async fn enrich(&self, state: &mut PipelineState) {
        let kb_query = state.scrubbed_short_description.clone();
        let caller_id = state.incident.caller_id.clone();
        let cmdb_ci = state.incident.cmdb_ci.clone();

        let kb_fut = self.timed(self.itsm.search_kb(&kb_query, KB_TOP_K));
        let user_fut = self.timed(self.lookup_user(caller_id));
        let ci_fut = self.timed(self.lookup_ci(cmdb_ci));

        let (kb_result, user_result, ci_result) = tokio::join!(kb_fut, user_fut, ci_fut);

        state.kb_articles = match kb_result {
            Ok(Ok(articles)) => articles,
            Ok(Err(e)) => {
                tracing::warn!(triage_id = %state.triage_id, error = %e, "kb search failed, continuing without");
                Vec::<KbArticle>::new()
            },
            Err(_) => {
                tracing::warn!(triage_id = %state.triage_id, "kb search timed out, continuing without");
                Vec::new()
            },
        };

        state.user_info = match user_result {
            Ok(Ok(user)) => user,
            Ok(Err(e)) => {
                tracing::warn!(triage_id = %state.triage_id, error = %e, "user lookup failed, continuing without");
                None
            },
            Err(_) => {
                tracing::warn!(triage_id = %state.triage_id, "user lookup timed out, continuing without");
                None
            },
        };

        state.ci_info = match ci_result {
            Ok(Ok(ci)) => ci,
            Ok(Err(e)) => {
                tracing::warn!(triage_id = %state.triage_id, error = %e, "ci lookup failed, continuing without");
                None
            },
            Err(_) => {
                tracing::warn!(triage_id = %state.triage_id, "ci lookup timed out, continuing without");
                None
            },
        };
    }

    async fn lookup_user(&self, caller_id: Option<String>) -> Result<Option<UserInfo>, aegis_integrations::IntegrationError> {
        match caller_id {
            Some(id) => self.itsm.get_user(&id).await,
            None => Ok(None),
        }
    }

    async fn lookup_ci(&self, cmdb_ci: Option<String>) -> Result<Option<CiInfo>, aegis_integrations::IntegrationError> {
        match cmdb_ci {
            Some(id) => self.itsm.get_ci(&id).await,
            None => Ok(None),
        }
    }

    fn timed<F: std::future::Future>(&self, fut: F) -> tokio::time::Timeout<F> {
        tokio::time::timeout(self.per_call_timeout, fut)
    }
}
