//! Wire types for the LLM chat-completion call and the loosely-typed
//! classification JSON it returns.

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Serialize, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub response_format: ResponseFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Serialize, Clone)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
}

#[derive(Serialize, Clone)]
pub struct Message {
    pub role: String,
    pub content: String,
}

#[derive(Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
}

#[derive(Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Deserialize)]
pub struct ResponseMessage {
    pub content: String,
}

/// Deserializes a JSON `null` or absent key as empty string.
fn null_as_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Option::<String>::deserialize(deserializer).map(|opt| opt.unwrap_or_default())
}

/// Deserializes a JSON `null` or wrong type as `None`, tolerating models
/// that emit `"tool": null` instead of omitting the key.
fn null_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::String(s) if !s.is_empty() => Some(s),
        _ => None,
    }))
}

fn default_priority() -> String {
    "3".to_owned()
}

/// Loosely-typed mirror of `Classification` used only to absorb whatever
/// shape the model actually returns before it is coerced and validated
/// into `aegis_core::Classification` (spec §4.6 step 3).
#[derive(Debug, Deserialize)]
pub struct ClassificationJson {
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    pub subcategory: Option<String>,
    #[serde(default = "default_priority")]
    pub priority: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub assignment_group: String,
    pub resolution_notes: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub action: String,
    #[serde(default, deserialize_with = "null_as_none")]
    pub tool: Option<String>,
    #[serde(default, deserialize_with = "null_as_none")]
    pub target: Option<String>,
    #[serde(default)]
    pub confidence: f64,
}
