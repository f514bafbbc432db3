//! Embedding generation client over the RAG service (spec §6: `RAG_SERVICE_URL`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EmbeddingError;

/// Produces a fixed-dimension embedding vector for a piece of text.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

/// Thin `reqwest` wrapper around the RAG service's embedding endpoint.
pub struct HttpEmbeddingClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpEmbeddingClient {
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: String) -> Self {
        Self { http, base_url }
    }
}

#[async_trait]
impl EmbeddingClient for HttpEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let url = format!("{}/api/v1/embed", self.base_url.trim_end_matches('/'));
        let response = self.http.post(&url).json(&EmbedRequest { text }).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Status { status, body });
        }

        let parsed: EmbedResponse =
            response.json().await.map_err(|e| EmbeddingError::Decode(e.to_string()))?;
        Ok(parsed.embedding)
    }
}
