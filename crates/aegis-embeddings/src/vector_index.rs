//! Vector index client over the RAG service: three logical collections
//! (knowledge articles, historical tickets, SOPs) with cosine-distance HNSW
//! search (spec §6).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EmbeddingError;

/// Which logical collection a document belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Knowledge,
    Ticket,
    Sop,
}

impl Collection {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Knowledge => "knowledge",
            Self::Ticket => "ticket",
            Self::Sop => "sop",
        }
    }
}

/// A document to upsert into the vector index.
#[derive(Debug, Clone, Serialize)]
pub struct VectorDocument {
    pub collection: Collection,
    pub doc_id: String,
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub created_at: String,
    /// Seconds until this entry expires; `None` means it never expires
    /// (knowledge/SOP entries); tickets are upserted with a 90-day TTL.
    pub ttl_secs: Option<u64>,
}

/// A single nearest-neighbor hit.
#[derive(Debug, Clone, Deserialize)]
pub struct VectorMatch {
    pub doc_id: String,
    pub title: String,
    pub content: String,
    pub score: f32,
    pub created_at: Option<String>,
}

/// Upsert and k-nearest-neighbor query over the shared vector index.
#[async_trait]
pub trait VectorIndexClient: Send + Sync {
    async fn upsert(&self, doc: VectorDocument, embedding: &[f32]) -> Result<(), EmbeddingError>;

    async fn query(
        &self,
        collection: Collection,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorMatch>, EmbeddingError>;
}

#[derive(Serialize)]
struct IngestRequest<'a> {
    document_type: &'a str,
    document_id: &'a str,
    title: &'a str,
    content: &'a str,
    category: Option<&'a str>,
    created_at: &'a str,
    embedding: &'a [f32],
    ttl_secs: Option<u64>,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    document_type: &'a str,
    embedding: &'a [f32],
    top_k: usize,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<VectorMatch>,
}

/// Thin `reqwest` wrapper around the RAG service's ingest/query endpoints,
/// grounded on the `POST /api/v1/ingest` shape used by the weekly back-sync.
pub struct HttpVectorIndexClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpVectorIndexClient {
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: String) -> Self {
        Self { http, base_url }
    }
}

#[async_trait]
impl VectorIndexClient for HttpVectorIndexClient {
    async fn upsert(&self, doc: VectorDocument, embedding: &[f32]) -> Result<(), EmbeddingError> {
        let url = format!("{}/api/v1/ingest", self.base_url.trim_end_matches('/'));
        let request = IngestRequest {
            document_type: doc.collection.as_str(),
            document_id: &doc.doc_id,
            title: &doc.title,
            content: &doc.content,
            category: doc.category.as_deref(),
            created_at: &doc.created_at,
            embedding,
            ttl_secs: doc.ttl_secs,
        };
        let response = self.http.post(&url).json(&request).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Status { status, body });
        }
        Ok(())
    }

    async fn query(
        &self,
        collection: Collection,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<VectorMatch>, EmbeddingError> {
        let url = format!("{}/api/v1/query", self.base_url.trim_end_matches('/'));
        let request = QueryRequest { document_type: collection.as_str(), embedding, top_k };
        let response = self.http.post(&url).json(&request).send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Status { status, body });
        }
        let parsed: QueryResponse =
            response.json().await.map_err(|e| EmbeddingError::Decode(e.to_string()))?;
        Ok(parsed.matches)
    }
}
