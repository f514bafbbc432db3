//! `sync` subcommand (spec §6 scheduled back-sync): ingests closed incidents
//! and published KB articles from the last 7 days into the vector index so
//! future Storm Shield checks and knowledge-base lookups see them.

use std::sync::Arc;

use aegis_core::TICKET_EMBEDDING_TTL_SECS;
use aegis_embeddings::{Collection, EmbeddingClient, HttpEmbeddingClient, HttpVectorIndexClient, VectorDocument, VectorIndexClient};
use aegis_integrations::{HttpItsmClient, ItsmClient};
use anyhow::Result;
use chrono::{Duration, Utc};

use crate::env_var;

const BACK_SYNC_WINDOW_DAYS: i64 = 7;

pub(crate) async fn run(loop_forever: bool, interval_hours: u64) -> Result<()> {
    let http = reqwest::Client::new();
    let rag_url = env_var("RAG_SERVICE_URL")?;
    let embeddings = HttpEmbeddingClient::new(http.clone(), rag_url.clone());
    let vector_index = HttpVectorIndexClient::new(http.clone(), rag_url);
    let itsm = HttpItsmClient::new(
        http,
        env_var("SERVICENOW_INSTANCE")?,
        env_var("SERVICENOW_USER")?,
        env_var("SERVICENOW_PASSWORD")?,
    );

    loop {
        if let Err(e) = sync_once(&itsm, &embeddings, &vector_index).await {
            tracing::error!(error = %e, "back-sync pass failed");
        }
        if !loop_forever {
            return Ok(());
        }
        tracing::info!(interval_hours, "back-sync pass complete, sleeping until next run");
        tokio::time::sleep(std::time::Duration::from_secs(interval_hours.saturating_mul(3600))).await;
    }
}

async fn sync_once(
    itsm: &HttpItsmClient,
    embeddings: &HttpEmbeddingClient,
    vector_index: &HttpVectorIndexClient,
) -> Result<()> {
    let since = Utc::now() - Duration::days(BACK_SYNC_WINDOW_DAYS);

    let closed = itsm.fetch_closed_incidents(since).await?;
    tracing::info!(count = closed.len(), "fetched closed incidents for back-sync");
    for incident in closed {
        let content = match incident.resolution_notes {
            Some(ref notes) if !notes.is_empty() => format!("{}\n\n{}", incident.description, notes),
            _ => incident.description.clone(),
        };
        let embedding = match embeddings.embed(&content).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(number = %incident.number, error = %e, "embedding failed, skipping incident");
                continue;
            },
        };
        let doc = VectorDocument {
            collection: Collection::Ticket,
            doc_id: incident.number.clone(),
            title: incident.short_description,
            content,
            category: None,
            created_at: incident.closed_at.to_rfc3339(),
            ttl_secs: Some(TICKET_EMBEDDING_TTL_SECS),
        };
        if let Err(e) = vector_index.upsert(doc, &embedding).await {
            tracing::warn!(number = %incident.number, error = %e, "vector index upsert failed");
        }
    }

    let kb_articles = itsm.fetch_published_kb_articles(since).await?;
    tracing::info!(count = kb_articles.len(), "fetched published KB articles for back-sync");
    for article in kb_articles {
        let embedding = match embeddings.embed(&article.content).await {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(doc_id = %article.doc_id, error = %e, "embedding failed, skipping article");
                continue;
            },
        };
        let doc = VectorDocument {
            collection: Collection::Knowledge,
            doc_id: article.doc_id.clone(),
            title: article.title,
            content: article.content,
            category: article.category,
            created_at: article.published_at.to_rfc3339(),
            ttl_secs: None,
        };
        if let Err(e) = vector_index.upsert(doc, &embedding).await {
            tracing::warn!(doc_id = %article.doc_id, error = %e, "vector index upsert failed");
        }
    }

    Ok(())
}
