use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use aegis_core::{DEFAULT_DEDUP_THRESHOLD, DEFAULT_DEDUP_WINDOW_MINUTES, ENRICHMENT_PER_CALL_TIMEOUT_SECS, Redactor};
use aegis_embeddings::{HttpEmbeddingClient, HttpVectorIndexClient};
use aegis_integrations::{HttpItsmClient, HttpRemediationClient, WebhookChatClient};
use aegis_llm::LlmClient;
use aegis_service::{EnrichmentAggregator, Executor, PipelineOrchestrator, StormShield};
use aegis_storage::{AuditLog, GovernanceStore, QueueDriver, RedisKvStore, ResultStore, StatsStore};
use anyhow::Result;
use tokio::sync::Notify;

use crate::{env_var, redis_config};

/// Resolves once SIGINT or SIGTERM arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            },
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler, falling back to SIGINT only");
                std::future::pending::<()>().await;
            },
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}

fn build_llm_client() -> Result<LlmClient> {
    let provider = std::env::var("LLM_PROVIDER").unwrap_or_else(|_| "anthropic".to_owned());
    let (api_key, base_url) = match provider.as_str() {
        "openai" => (
            env_var("OPENAI_API_KEY")?,
            std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_owned()),
        ),
        other => {
            if other != "anthropic" {
                tracing::warn!(provider = other, "unrecognized LLM_PROVIDER, defaulting to anthropic shape");
            }
            (
                env_var("ANTHROPIC_API_KEY")?,
                std::env::var("ANTHROPIC_BASE_URL").unwrap_or_else(|_| "https://api.anthropic.com/v1".to_owned()),
            )
        },
    };
    let client = LlmClient::new(api_key, base_url);
    Ok(match std::env::var("LLM_MODEL") {
        Ok(model) => client.with_model(model),
        Err(_) => client,
    })
}

pub(crate) async fn run() -> Result<()> {
    let (redis_host, redis_port, redis_password) = redis_config();
    let store =
        Arc::new(RedisKvStore::connect(&redis_host, redis_port, redis_password.as_deref()).await?);

    let queue = Arc::new(QueueDriver::new(store.clone()));
    let governance = Arc::new(GovernanceStore::new(store.clone()));
    let results = Arc::new(ResultStore::new(store.clone()));
    let audit = Arc::new(AuditLog::new(store.clone()));
    let stats = Arc::new(StatsStore::new(store));

    let http = reqwest::Client::new();
    let rag_url = env_var("RAG_SERVICE_URL")?;
    let embeddings = Arc::new(HttpEmbeddingClient::new(http.clone(), rag_url.clone()));
    let vector_index = Arc::new(HttpVectorIndexClient::new(http.clone(), rag_url));

    let itsm = Arc::new(HttpItsmClient::new(
        http.clone(),
        env_var("SERVICENOW_INSTANCE")?,
        env_var("SERVICENOW_USER")?,
        env_var("SERVICENOW_PASSWORD")?,
    ));
    let chat = Arc::new(WebhookChatClient::new(http.clone(), env_var("TEAMS_WEBHOOK_URL")?));
    let remediation = Arc::new(HttpRemediationClient::new(http, env_var("REMEDIATION_SERVICE_URL")?));

    // Base URL AEGIS's own HTTP front-end is reachable at, so chat cards can
    // link their thumbs-up/down buttons back to `/feedback/{triage_id}`.
    let public_url = std::env::var("AEGIS_PUBLIC_URL").ok();

    let storm_shield =
        Arc::new(StormShield::new(embeddings, vector_index, DEFAULT_DEDUP_WINDOW_MINUTES, DEFAULT_DEDUP_THRESHOLD));
    let enrichment = Arc::new(EnrichmentAggregator::new(itsm.clone(), ENRICHMENT_PER_CALL_TIMEOUT_SECS));
    let executor = Arc::new(Executor::new(governance, itsm, chat, remediation, public_url));
    let llm = Arc::new(build_llm_client()?);

    let orchestrator =
        Arc::new(PipelineOrchestrator::new(Arc::new(Redactor::default()), storm_shield, enrichment, llm, executor, audit, results, stats));

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_notify = Arc::new(Notify::new());
    {
        let shutdown = shutdown.clone();
        let shutdown_notify = shutdown_notify.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            tracing::info!("shutdown signal received, finishing in-flight job and refusing new reservations");
            shutdown.store(true, Ordering::SeqCst);
            shutdown_notify.notify_waiters();
        });
    }

    tracing::info!("worker loop started, reserving from the pending lane");
    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        let reserved = tokio::select! {
            reserved = queue.reserve() => reserved,
            () = shutdown_notify.notified() => continue,
        };

        match reserved {
            Ok(Some(envelope)) => {
                let orchestrator = orchestrator.clone();
                let queue = queue.clone();
                let job = envelope.job.clone();
                let run = tokio::spawn(async move { orchestrator.run(job).await });
                match run.await {
                    Ok(state) => {
                        tracing::info!(triage_id = %state.triage_id, status = ?state.status, "triage run complete");
                        if let Err(e) = queue.ack(&envelope).await {
                            tracing::error!(error = %e, "failed to ack completed job");
                        }
                    },
                    Err(join_err) => {
                        tracing::error!(error = %join_err, "worker task panicked, retrying or dead-lettering");
                        if let Err(e) = queue.retry_or_dead_letter(envelope, &join_err.to_string()).await {
                            tracing::error!(error = %e, "failed to requeue after panic");
                        }
                    },
                }
            },
            Ok(None) => {},
            Err(e) => {
                tracing::error!(error = %e, "queue reserve failed, backing off");
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            },
        }
    }

    tracing::info!("worker loop exited cleanly after shutdown signal");
    Ok(())
}
