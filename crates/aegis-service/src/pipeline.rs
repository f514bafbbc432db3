//! Pipeline Orchestrator (spec §4.8): drives a single `PipelineState`
//! through the finite-state machine `pending -> guardrails -> (blocked |
//! enrichment) -> classified -> (failed | executed)`.

use std::sync::Arc;

use aegis_core::{ActivitySeverity, PipelineState, PipelineStatus, Redactor, Stage, TriageJob};
use aegis_storage::{ActivityLogEntry, AuditLog, ResultStore, StatsStore};
use aegis_llm::{ClassifyRequest, LlmClient};

use crate::enrichment::EnrichmentAggregator;
use crate::executor::Executor;
use crate::storm_shield::StormShield;

/// Holds every injected collaborator the orchestrator drives a job through.
/// Constructed once per worker process (spec §9: explicit dependency
/// injection, never a module-level singleton).
pub struct PipelineOrchestrator {
    redactor: Arc<Redactor>,
    storm_shield: Arc<StormShield>,
    enrichment: Arc<EnrichmentAggregator>,
    llm: Arc<LlmClient>,
    executor: Arc<Executor>,
    audit: Arc<AuditLog>,
    results: Arc<ResultStore>,
    stats: Arc<StatsStore>,
}

impl PipelineOrchestrator {
    #[must_use]
    pub fn new(
        redactor: Arc<Redactor>,
        storm_shield: Arc<StormShield>,
        enrichment: Arc<EnrichmentAggregator>,
        llm: Arc<LlmClient>,
        executor: Arc<Executor>,
        audit: Arc<AuditLog>,
        results: Arc<ResultStore>,
        stats: Arc<StatsStore>,
    ) -> Self {
        Self { redactor, storm_shield, enrichment, llm, executor, audit, results, stats }
    }

    /// Runs a single job end-to-end, persisting the terminal state and
    /// incrementing the daily counter. Never returns an error — any
    /// unexpected failure is folded into the `failed` terminal status so the
    /// caller (the worker loop) can still `ack` the job.
    pub async fn run(&self, job: TriageJob) -> PipelineState {
        let mut scrubbed = self
            .redactor
            .scrub_record(vec![
                ("short_description".to_owned(), job.incident.short_description.clone()),
                ("description".to_owned(), job.incident.description.clone()),
            ])
            .into_iter();
        let short = scrubbed.next().expect("scrub_record preserves field order").1;
        let long = scrubbed.next().expect("scrub_record preserves field order").1;
        let mut state = PipelineState::new(job.triage_id.clone(), job.incident.clone(), short, long);

        self.log(&state, Stage::Guardrails, ActivitySeverity::Info, "scrubbed incident text").await;

        let dup = self
            .storm_shield
            .check_duplicate(&state.incident.number, &state.scrubbed_short_description)
            .await;

        if dup.is_duplicate {
            state.is_duplicate = true;
            state.duplicate_of = dup.duplicate_of.clone();
            state.record_action(format!("blocked: semantic duplicate of {}", dup.duplicate_of.unwrap_or_default()));
            let _ = state.transition_to(PipelineStatus::Blocked);
            self.log(&state, Stage::Guardrails, ActivitySeverity::Warning, "duplicate detected, blocked").await;
            self.finish(&mut state, false).await;
            return state;
        }

        let _ = state.transition_to(PipelineStatus::Enrichment);
        self.enrichment.enrich(&mut state).await;
        self.log(&state, Stage::Enrichment, ActivitySeverity::Info, "enrichment complete").await;

        if let Err(e) = self.storm_shield.record(&state.incident.number, &state.scrubbed_short_description).await {
            tracing::warn!(triage_id = %state.triage_id, error = %e, "storm shield record failed, continuing");
        }

        match self.classify(&state).await {
            Ok(classification) => {
                state.confidence = Some(classification.confidence);
                state.classification = Some(classification);
                let _ = state.transition_to(PipelineStatus::Classified);
                self.log(&state, Stage::TriageLlm, ActivitySeverity::Success, "classification succeeded").await;
            },
            Err(e) => {
                state.error = Some(e.to_string());
                let _ = state.transition_to(PipelineStatus::Failed);
                self.log(&state, Stage::TriageLlm, ActivitySeverity::Error, &format!("classification failed: {e}"))
                    .await;
                self.finish(&mut state, false).await;
                return state;
            },
        }

        self.executor.execute(&mut state).await;
        self.log(
            &state,
            Stage::Executor,
            if state.status == PipelineStatus::Blocked { ActivitySeverity::Warning } else { ActivitySeverity::Success },
            "executor stage complete",
        )
        .await;

        self.finish(&mut state, state.status == PipelineStatus::Blocked).await;
        state
    }

    async fn classify(&self, state: &PipelineState) -> Result<aegis_core::Classification, aegis_llm::LlmError> {
        let request = ClassifyRequest {
            scrubbed_short_description: &state.scrubbed_short_description,
            scrubbed_description: &state.scrubbed_description,
            priority: &state.incident.priority,
            kb_articles: &state.kb_articles,
            user_info: state.user_info.as_ref(),
            ci_info: state.ci_info.as_ref(),
        };
        self.llm.classify(&request).await
    }

    async fn log(&self, state: &PipelineState, stage: Stage, severity: ActivitySeverity, message: &str) {
        if let Err(e) = self.audit.push_incident(&state.incident.number, message).await {
            tracing::warn!(error = %e, "failed to push incident audit line");
        }
        let entry = ActivityLogEntry {
            triage_id: state.triage_id.clone(),
            stage,
            severity,
            message: message.to_owned(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        if let Err(e) = self.audit.push_activity(&entry).await {
            tracing::warn!(error = %e, "failed to push activity log entry");
        }
    }

    async fn finish(&self, state: &mut PipelineState, blocked: bool) {
        if let Err(e) = self.results.save(state).await {
            tracing::error!(triage_id = %state.triage_id, error = %e, "failed to persist terminal state");
        }
        let counter_result = if blocked { self.stats.incr_blocked().await } else { self.stats.incr_processed().await };
        if let Err(e) = counter_result {
            tracing::warn!(error = %e, "failed to increment daily counter");
        }
    }
}

/// Orchestrator-level tests: a full `PipelineOrchestrator` wired to an
/// `InMemoryKvStore` and mock ITSM/chat/remediation/embedding/vector-index
/// clients, exercising properties 2, 5, 6, 7 and scenarios S1-S6.
#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use aegis_core::{ClassificationAction, GovernanceMode, Incident, KbArticle};
    use aegis_embeddings::{Collection, EmbeddingClient, EmbeddingError, VectorDocument, VectorIndexClient, VectorMatch};
    use aegis_integrations::{
        ChatClient, DispatchResult, IncidentUpdate, IntegrationError, ItsmClient, RemediationClient,
        RemediationRequest, TriageNotification,
    };
    use aegis_llm::LlmClient;
    use aegis_storage::{GovernanceStore, InMemoryKvStore};
    use async_trait::async_trait;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    /// ITSM double: canned KB/user/CI lookups, and a counter on `update_incident`.
    #[derive(Default)]
    struct MockItsm {
        update_calls: AtomicUsize,
        kb_articles: Vec<KbArticle>,
    }

    #[async_trait]
    impl ItsmClient for MockItsm {
        async fn search_kb(&self, _query: &str, _top_k: usize) -> Result<Vec<KbArticle>, IntegrationError> {
            Ok(self.kb_articles.clone())
        }

        async fn get_user(&self, _caller_id: &str) -> Result<Option<aegis_core::UserInfo>, IntegrationError> {
            Ok(None)
        }

        async fn get_ci(&self, _cmdb_ci: &str) -> Result<Option<aegis_core::CiInfo>, IntegrationError> {
            Ok(None)
        }

        async fn update_incident(&self, _number: &str, _update: IncidentUpdate<'_>) -> Result<(), IntegrationError> {
            self.update_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn fetch_closed_incidents(
            &self,
            _since: chrono::DateTime<chrono::Utc>,
        ) -> Result<Vec<aegis_integrations::ClosedIncident>, IntegrationError> {
            Ok(Vec::new())
        }

        async fn fetch_published_kb_articles(
            &self,
            _since: chrono::DateTime<chrono::Utc>,
        ) -> Result<Vec<aegis_integrations::KbDocument>, IntegrationError> {
            Ok(Vec::new())
        }
    }

    /// Chat double: counts `notify` calls, never actually sends anything.
    #[derive(Default)]
    struct MockChat {
        notify_calls: AtomicUsize,
    }

    #[async_trait]
    impl ChatClient for MockChat {
        async fn notify(&self, _notification: TriageNotification<'_>) -> Result<(), IntegrationError> {
            self.notify_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Remediation double: counts `dispatch` calls.
    #[derive(Default)]
    struct MockRemediation {
        dispatch_calls: AtomicUsize,
    }

    #[async_trait]
    impl RemediationClient for MockRemediation {
        async fn dispatch(&self, _request: RemediationRequest<'_>) -> Result<DispatchResult, IntegrationError> {
            self.dispatch_calls.fetch_add(1, Ordering::SeqCst);
            Ok(DispatchResult { command_id: "cmd-1".to_owned(), status: "accepted".to_owned() })
        }
    }

    /// Embedding double: returns a fixed non-zero vector, or fails if `fail` is set.
    struct MockEmbedding {
        fail: bool,
    }

    #[async_trait]
    impl EmbeddingClient for MockEmbedding {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            if self.fail {
                return Err(EmbeddingError::Status { status: 503, body: "embedding service down".to_owned() });
            }
            Ok(vec![0.1, 0.2, 0.3])
        }
    }

    /// Vector index double: returns canned `query` matches, records `upsert` calls.
    #[derive(Default)]
    struct MockVectorIndex {
        matches: Mutex<Vec<VectorMatch>>,
        upsert_calls: AtomicUsize,
    }

    #[async_trait]
    impl VectorIndexClient for MockVectorIndex {
        async fn upsert(&self, _doc: VectorDocument, _embedding: &[f32]) -> Result<(), EmbeddingError> {
            self.upsert_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn query(
            &self,
            _collection: Collection,
            _embedding: &[f32],
            _top_k: usize,
        ) -> Result<Vec<VectorMatch>, EmbeddingError> {
            Ok(self.matches.lock().expect("lock poisoned").clone())
        }
    }

    fn sample_incident() -> Incident {
        Incident {
            number: "INC0012345".to_owned(),
            short_description: "Unable to login to Opera PMS".to_owned(),
            description: "User cannot authenticate against the Opera PMS portal".to_owned(),
            caller_id: None,
            category: None,
            subcategory: None,
            priority: "3".to_owned(),
            cmdb_ci: None,
            assignment_group: None,
        }
    }

    fn chat_response_body(content: &str) -> serde_json::Value {
        serde_json::json!({ "choices": [ { "message": { "content": content } } ] })
    }

    const ROUTE_RESPONSE: &str = r#"{"category":"Software","subcategory":null,"priority":"3","assignment_group":"L2-Apps","resolution_notes":"reset session","action":"route","tool":null,"target":null,"confidence":0.88}"#;

    /// Wires a fresh orchestrator against an `InMemoryKvStore`, a wiremock LLM
    /// server answering with `llm_response_body`, and the given governance
    /// mode/threshold/killswitch. Returns the orchestrator plus handles to
    /// the mocks so tests can assert on call counts.
    async fn build_harness(
        mode: GovernanceMode,
        enabled: bool,
        threshold_remediate: u8,
        dedup_matches: Vec<VectorMatch>,
        embedding_fails: bool,
        llm_response_body: serde_json::Value,
    ) -> (PipelineOrchestrator, MockServer, std::sync::Arc<MockItsm>, std::sync::Arc<MockChat>, std::sync::Arc<MockRemediation>, std::sync::Arc<MockVectorIndex>)
    {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(llm_response_body))
            .mount(&server)
            .await;

        let kv = std::sync::Arc::new(InMemoryKvStore::new());
        let governance_store = std::sync::Arc::new(GovernanceStore::new(kv.clone()));
        governance_store.set_killswitch(enabled).await.unwrap();
        governance_store.set_mode(mode).await.unwrap();
        governance_store.set_threshold_remediate(threshold_remediate).await.unwrap();

        let itsm = std::sync::Arc::new(MockItsm::default());
        let chat = std::sync::Arc::new(MockChat::default());
        let remediation = std::sync::Arc::new(MockRemediation::default());
        let embeddings = std::sync::Arc::new(MockEmbedding { fail: embedding_fails });
        let vector_index =
            std::sync::Arc::new(MockVectorIndex { matches: Mutex::new(dedup_matches), upsert_calls: AtomicUsize::new(0) });

        let storm_shield = std::sync::Arc::new(StormShield::new(embeddings, vector_index.clone(), 15, 0.90));
        let enrichment = std::sync::Arc::new(EnrichmentAggregator::new(itsm.clone(), 5));
        let executor = std::sync::Arc::new(Executor::new(
            governance_store,
            itsm.clone(),
            chat.clone(),
            remediation.clone(),
            Some("https://aegis.example.com".to_owned()),
        ));
        let llm = std::sync::Arc::new(LlmClient::new("test-key".to_owned(), server.uri()));
        let audit = std::sync::Arc::new(AuditLog::new(kv.clone()));
        let results = std::sync::Arc::new(ResultStore::new(kv.clone()));
        let stats = std::sync::Arc::new(StatsStore::new(kv));

        let orchestrator = PipelineOrchestrator::new(
            std::sync::Arc::new(Redactor::default()),
            storm_shield,
            enrichment,
            llm,
            executor,
            audit,
            results,
            stats,
        );

        (orchestrator, server, itsm, chat, remediation, vector_index)
    }

    /// S1: happy path. Terminal status `executed`, one ticket update, one chat notification.
    #[tokio::test]
    async fn s1_happy_path_routes_and_notifies() {
        let (orchestrator, _server, itsm, chat, remediation, _vindex) =
            build_harness(GovernanceMode::Assist, true, 95, Vec::new(), false, chat_response_body(ROUTE_RESPONSE)).await;

        let job = aegis_core::TriageJob::new(sample_incident());
        let state = orchestrator.run(job).await;

        assert_eq!(state.status, PipelineStatus::Executed);
        assert_eq!(itsm.update_calls.load(Ordering::SeqCst), 1);
        assert_eq!(chat.notify_calls.load(Ordering::SeqCst), 1);
        assert_eq!(remediation.dispatch_calls.load(Ordering::SeqCst), 0);
    }

    /// S2: a near-duplicate (cosine >= threshold, same window) is blocked
    /// before classification, with no classifier call and `duplicate_of` set.
    #[tokio::test]
    async fn s2_duplicate_blocks_before_classification() {
        let prior_match = VectorMatch {
            doc_id: "INC-A".to_owned(),
            title: "prior ticket".to_owned(),
            content: "paraphrased".to_owned(),
            score: 0.95,
            created_at: Some(chrono::Utc::now().to_rfc3339()),
        };
        let (orchestrator, server, itsm, chat, _remediation, _vindex) = build_harness(
            GovernanceMode::Assist,
            true,
            95,
            vec![prior_match],
            false,
            chat_response_body(ROUTE_RESPONSE),
        )
        .await;

        let mut incident = sample_incident();
        incident.number = "INC-B".to_owned();
        let job = aegis_core::TriageJob::new(incident);
        let state = orchestrator.run(job).await;

        assert_eq!(state.status, PipelineStatus::Blocked);
        assert_eq!(state.duplicate_of.as_deref(), Some("INC-A"));
        assert_eq!(server.received_requests().await.unwrap().len(), 0, "classifier must not be called");
        assert_eq!(itsm.update_calls.load(Ordering::SeqCst), 0);
        assert_eq!(chat.notify_calls.load(Ordering::SeqCst), 0);
    }

    /// S3: `auto_heal` below the remediate threshold is downgraded to
    /// `route` and never dispatched.
    #[tokio::test]
    async fn s3_auto_heal_below_threshold_is_downgraded() {
        let auto_heal_low_confidence = r#"{"category":"Software","subcategory":null,"priority":"2","assignment_group":"L2-Apps","resolution_notes":null,"action":"auto_heal","tool":"restart_iis","target":"i-0abc123","confidence":0.80}"#;
        let (orchestrator, _server, _itsm, _chat, remediation, _vindex) = build_harness(
            GovernanceMode::Auto,
            true,
            95,
            Vec::new(),
            false,
            chat_response_body(auto_heal_low_confidence),
        )
        .await;

        let job = aegis_core::TriageJob::new(sample_incident());
        let state = orchestrator.run(job).await;

        assert_eq!(state.status, PipelineStatus::Executed);
        assert_eq!(remediation.dispatch_calls.load(Ordering::SeqCst), 0);
        let classification = state.classification.expect("classification recorded");
        assert_eq!(classification.action, ClassificationAction::Route);
        assert!(state.actions_taken.iter().any(|a| a.contains("downgraded to route")));
    }

    /// S4 / property 6: `mode == monitor` produces zero ticketing, chat, or
    /// remediation calls, while the classification is still recorded.
    #[tokio::test]
    async fn s4_monitor_mode_has_zero_side_effects() {
        let auto_heal_high_confidence = r#"{"category":"Software","subcategory":null,"priority":"1","assignment_group":"L2-Apps","resolution_notes":null,"action":"auto_heal","tool":"restart_iis","target":"i-0abc123","confidence":0.99}"#;
        let (orchestrator, _server, itsm, chat, remediation, _vindex) = build_harness(
            GovernanceMode::Monitor,
            true,
            95,
            Vec::new(),
            false,
            chat_response_body(auto_heal_high_confidence),
        )
        .await;

        let job = aegis_core::TriageJob::new(sample_incident());
        let state = orchestrator.run(job).await;

        assert_eq!(state.status, PipelineStatus::Executed);
        assert!(state.classification.is_some(), "classification must still be recorded");
        assert_eq!(itsm.update_calls.load(Ordering::SeqCst), 0);
        assert_eq!(chat.notify_calls.load(Ordering::SeqCst), 0);
        assert_eq!(remediation.dispatch_calls.load(Ordering::SeqCst), 0);
    }

    /// S5 (orchestrator slice): a classifier that never returns valid JSON
    /// yields terminal status `failed` with the error recorded, rather than
    /// `executed`. Redelivery/dead-lettering after 3 such failures is the
    /// queue driver's concern, covered by `aegis_storage::queue`'s own tests.
    #[tokio::test]
    async fn s5_classifier_failure_yields_failed_status() {
        let (orchestrator, _server, itsm, chat, _remediation, _vindex) =
            build_harness(GovernanceMode::Assist, true, 95, Vec::new(), false, chat_response_body("not json")).await;

        let job = aegis_core::TriageJob::new(sample_incident());
        let state = orchestrator.run(job).await;

        assert_eq!(state.status, PipelineStatus::Failed);
        assert!(state.error.is_some());
        assert_eq!(itsm.update_calls.load(Ordering::SeqCst), 0);
        assert_eq!(chat.notify_calls.load(Ordering::SeqCst), 0);
    }

    /// S6: killswitch disabled mid-flight (before execution) blocks with no
    /// ticketing or chat side effects, even though classification succeeded.
    #[tokio::test]
    async fn s6_killswitch_disabled_blocks_without_side_effects() {
        let (orchestrator, _server, itsm, chat, remediation, _vindex) =
            build_harness(GovernanceMode::Assist, false, 95, Vec::new(), false, chat_response_body(ROUTE_RESPONSE)).await;

        let job = aegis_core::TriageJob::new(sample_incident());
        let state = orchestrator.run(job).await;

        assert_eq!(state.status, PipelineStatus::Blocked);
        assert!(state.classification.is_some(), "classification still ran before the executor's killswitch check");
        assert_eq!(itsm.update_calls.load(Ordering::SeqCst), 0);
        assert_eq!(chat.notify_calls.load(Ordering::SeqCst), 0);
        assert_eq!(remediation.dispatch_calls.load(Ordering::SeqCst), 0);
    }

    /// Property 2: status only ever advances forward; re-transitioning a
    /// terminal state is rejected rather than silently accepted.
    #[tokio::test]
    async fn property2_status_is_monotonic() {
        let (orchestrator, _server, _itsm, _chat, _remediation, _vindex) =
            build_harness(GovernanceMode::Assist, true, 95, Vec::new(), false, chat_response_body(ROUTE_RESPONSE)).await;

        let job = aegis_core::TriageJob::new(sample_incident());
        let mut state = orchestrator.run(job).await;

        assert!(state.status.is_terminal());
        assert!(state.transition_to(PipelineStatus::Pending).is_err());
    }

    /// Property 5: Storm Shield fails open. An embedding failure must not
    /// block the pipeline; it proceeds past guardrails into enrichment and
    /// classification as if no duplicate was found.
    #[tokio::test]
    async fn property5_storm_shield_fails_open_on_embedding_error() {
        let (orchestrator, server, _itsm, _chat, _remediation, vindex) =
            build_harness(GovernanceMode::Assist, true, 95, Vec::new(), true, chat_response_body(ROUTE_RESPONSE)).await;

        let job = aegis_core::TriageJob::new(sample_incident());
        let state = orchestrator.run(job).await;

        assert_eq!(state.status, PipelineStatus::Executed);
        assert!(!state.is_duplicate);
        assert_eq!(server.received_requests().await.unwrap().len(), 1, "classifier was still reached");
        assert_eq!(vindex.upsert_calls.load(Ordering::SeqCst), 0, "record() also fails open, no upsert attempted");
    }

    /// Property 7: threshold gating records the downgrade and never
    /// dispatches, mirroring S3 with a different confidence/threshold pair.
    #[tokio::test]
    async fn property7_auto_heal_confidence_below_threshold_never_dispatches() {
        let auto_heal_borderline = r#"{"category":"Infrastructure","subcategory":null,"priority":"2","assignment_group":"NOC","resolution_notes":null,"action":"auto_heal","tool":"clear_cache","target":"i-0def456","confidence":0.94}"#;
        let (orchestrator, _server, _itsm, _chat, remediation, _vindex) = build_harness(
            GovernanceMode::Auto,
            true,
            95,
            Vec::new(),
            false,
            chat_response_body(auto_heal_borderline),
        )
        .await;

        let job = aegis_core::TriageJob::new(sample_incident());
        let state = orchestrator.run(job).await;

        assert_eq!(remediation.dispatch_calls.load(Ordering::SeqCst), 0);
        let classification = state.classification.expect("classification recorded");
        assert_eq!(classification.action, ClassificationAction::Route);
    }
}
