//! HTTP client for the chat-completion LLM call.

use crate::ai_types::{ChatRequest, ChatResponse};
use crate::error::LlmError;

/// Default model identifier when `LLM_MODEL` is not set.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5";

/// Truncates a string to the given maximum length at a char boundary.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        s
    } else {
        let mut end = max_len;
        while end > 0 && !s.is_char_boundary(end) {
            end = end.saturating_sub(1);
        }
        s.get(..end).unwrap_or("")
    }
}

/// Thin client over an OpenAI-compatible chat-completions endpoint. Both
/// `anthropic` and `openai` providers are reached through this shape; the
/// provider selection only changes `base_url`/`api_key`/`model` at
/// construction time.
#[derive(Debug)]
pub struct LlmClient {
    pub(crate) client: reqwest::Client,
    pub(crate) api_key: String,
    pub(crate) base_url: String,
    pub(crate) model: String,
}

impl LlmClient {
    #[must_use]
    pub fn new(api_key: String, base_url: String) -> Self {
        Self { client: reqwest::Client::new(), api_key, base_url, model: DEFAULT_MODEL.to_owned() }
    }

    #[must_use]
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Sends a chat-completion request and returns the first choice's raw content string.
    ///
    /// # Errors
    /// Returns `LlmError` on transport failure, non-2xx status, or an empty `choices` array.
    pub async fn chat_completion(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let code = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::HttpStatus { code, body });
        }

        let body_text = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&body_text)
            .map_err(|e| LlmError::JsonParse { context: "chat completion response".to_owned(), source: e })?;

        parsed.choices.into_iter().next().map(|c| c.message.content).ok_or(LlmError::EmptyResponse)
    }
}
