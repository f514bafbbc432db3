//! Chat notification boundary: adaptive-card webhook posts (spec §4.7 step
//! 4), shaped after a Teams incoming webhook.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::IntegrationError;

/// Fields rendered into the adaptive card the executor posts on completion.
#[derive(Debug, Clone)]
pub struct TriageNotification<'a> {
    pub triage_id: &'a str,
    pub incident_number: &'a str,
    pub category: &'a str,
    pub priority: &'a str,
    pub assignment_group: &'a str,
    pub confidence: f64,
    pub feedback_up_url: Option<&'a str>,
    pub feedback_down_url: Option<&'a str>,
}

/// Posts adaptive-card notifications to a chat channel.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Sends a triage-result notification. Returns `Ok(())` on a 2xx
    /// response; callers treat any error as absorbed per spec §4.7 (the
    /// executor records the failure and continues).
    async fn notify(&self, notification: TriageNotification<'_>) -> Result<(), IntegrationError>;
}

#[derive(Serialize)]
struct AdaptiveCardEnvelope {
    #[serde(rename = "type")]
    envelope_type: &'static str,
    attachments: Vec<Attachment>,
}

#[derive(Serialize)]
struct Attachment {
    #[serde(rename = "contentType")]
    content_type: &'static str,
    #[serde(rename = "contentUrl")]
    content_url: Option<String>,
    content: serde_json::Value,
}

fn build_card(n: &TriageNotification<'_>) -> serde_json::Value {
    let mut facts = vec![
        serde_json::json!({"title": "Incident", "value": n.incident_number}),
        serde_json::json!({"title": "Category", "value": n.category}),
        serde_json::json!({"title": "Priority", "value": n.priority}),
        serde_json::json!({"title": "Assignment group", "value": n.assignment_group}),
        serde_json::json!({"title": "Confidence", "value": format!("{:.0}%", n.confidence * 100.0)}),
    ];

    let mut actions = Vec::new();
    if let Some(url) = n.feedback_up_url {
        actions.push(serde_json::json!({"type": "Action.OpenUrl", "title": "👍 Helpful", "url": url}));
    }
    if let Some(url) = n.feedback_down_url {
        actions.push(serde_json::json!({"type": "Action.OpenUrl", "title": "👎 Not helpful", "url": url}));
    }
    facts.push(serde_json::json!({"title": "Triage ID", "value": n.triage_id}));

    serde_json::json!({
        "type": "AdaptiveCard",
        "version": "1.4",
        "body": [
            {"type": "TextBlock", "text": "Incident triaged", "weight": "bolder", "size": "medium"},
            {"type": "FactSet", "facts": facts},
        ],
        "actions": actions,
    })
}

/// Webhook-backed implementation; one POST per notification, no retries —
/// notification failures are non-fatal to the pipeline.
pub struct WebhookChatClient {
    http: reqwest::Client,
    webhook_url: String,
}

impl WebhookChatClient {
    #[must_use]
    pub fn new(http: reqwest::Client, webhook_url: String) -> Self {
        Self { http, webhook_url }
    }
}

#[async_trait]
impl ChatClient for WebhookChatClient {
    async fn notify(&self, notification: TriageNotification<'_>) -> Result<(), IntegrationError> {
        let envelope = AdaptiveCardEnvelope {
            envelope_type: "message",
            attachments: vec![Attachment {
                content_type: "application/vnd.microsoft.card.adaptive",
                content_url: None,
                content: build_card(&notification),
            }],
        };

        let response = self.http.post(&self.webhook_url).json(&envelope).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(IntegrationError::Status { status, body });
        }
        Ok(())
    }
}
