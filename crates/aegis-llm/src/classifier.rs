//! Classifier: a single schema-constrained chat-completion call (spec §4.6).

use aegis_core::{CiInfo, Classification, KbArticle, UserInfo, strip_markdown_json};

use crate::ai_types::{ChatRequest, ClassificationJson, Message, ResponseFormat};
use crate::client::LlmClient;
use crate::error::LlmError;

const SYSTEM_PROMPT: &str = r#"You are the triage classifier for an IT service management pipeline.

You will be given a scrubbed incident ticket, enrichment facts gathered about
the caller and configuration item, and up to three knowledge-base snippets.
Respond with a single JSON object matching exactly this schema:

{
  "category": string,
  "subcategory": string | null,
  "priority": "1" | "2" | "3" | "4" | "5",
  "assignment_group": string,
  "resolution_notes": string | null,
  "action": "route" | "auto_heal" | "escalate",
  "tool": "restart_iis" | "clear_cache" | "unlock_account" | null,
  "target": string | null,
  "confidence": number between 0 and 1
}

Decision rules:
- If a knowledge-base article plausibly resolves the issue, propose
  "auto_heal" with the matching remediation tool and a valid target for
  that tool.
- If priority is "1" or "2" and no knowledge-base article matches, propose
  "escalate".
- Otherwise propose "route".
- Always include a confidence in [0, 1] reflecting how sure you are of this
  classification.

Respond with JSON only, no prose, no markdown fences."#;

/// Inputs to a single classification call, gathered by enrichment.
pub struct ClassifyRequest<'a> {
    pub scrubbed_short_description: &'a str,
    pub scrubbed_description: &'a str,
    pub priority: &'a str,
    pub kb_articles: &'a [KbArticle],
    pub user_info: Option<&'a UserInfo>,
    pub ci_info: Option<&'a CiInfo>,
}

fn build_user_message(req: &ClassifyRequest<'_>) -> String {
    let mut out = String::new();
    out.push_str("## Ticket\n");
    out.push_str(&format!("Short description: {}\n", req.scrubbed_short_description));
    out.push_str(&format!("Description: {}\n", req.scrubbed_description));
    out.push_str(&format!("Priority (reported): {}\n\n", req.priority));

    out.push_str("## Enrichment facts\n");
    if let Some(user) = req.user_info {
        out.push_str(&format!(
            "Caller: {} (department: {})\n",
            user.name.as_deref().unwrap_or("unknown"),
            user.department.as_deref().unwrap_or("unknown")
        ));
    }
    if let Some(ci) = req.ci_info {
        out.push_str(&format!(
            "Configuration item: {} (class: {}, environment: {})\n",
            ci.name.as_deref().unwrap_or(&ci.ci_id),
            ci.ci_class.as_deref().unwrap_or("unknown"),
            ci.environment.as_deref().unwrap_or("unknown")
        ));
    }
    out.push('\n');

    out.push_str("## Knowledge-base snippets\n");
    if req.kb_articles.is_empty() {
        out.push_str("(none found)\n");
    } else {
        for (i, kb) in req.kb_articles.iter().enumerate() {
            out.push_str(&format!("{}. {} — {}\n", i + 1, kb.title, kb.snippet));
        }
    }
    out
}

impl LlmClient {
    /// Classifies a ticket, parsing and validating the response per spec
    /// §4.6: strip code fences, parse JSON, coerce to `Classification`.
    ///
    /// # Errors
    /// Returns `LlmError::SchemaViolation` for a missing required field, an
    /// out-of-range confidence, or an unknown enum value; other variants for
    /// transport/parse failures.
    pub async fn classify(&self, req: &ClassifyRequest<'_>) -> Result<Classification, LlmError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message { role: "system".to_owned(), content: SYSTEM_PROMPT.to_owned() },
                Message { role: "user".to_owned(), content: build_user_message(req) },
            ],
            response_format: ResponseFormat { format_type: "json_object".to_owned() },
            max_tokens: Some(1024),
        };

        let raw = self.chat_completion(&request).await?;
        let stripped = strip_markdown_json(&raw);

        let parsed: ClassificationJson = serde_json::from_str(stripped)
            .map_err(|e| LlmError::JsonParse { context: "classification response".to_owned(), source: e })?;

        coerce_classification(parsed)
    }
}

fn coerce_classification(parsed: ClassificationJson) -> Result<Classification, LlmError> {
    use aegis_core::ClassificationAction;

    let action = match parsed.action.as_str() {
        "route" => ClassificationAction::Route,
        "auto_heal" => ClassificationAction::AutoHeal,
        "escalate" => ClassificationAction::Escalate,
        other => return Err(LlmError::SchemaViolation(format!("unknown action: {other}"))),
    };

    let tool = match parsed.tool {
        Some(ref t) => Some(
            t.parse().map_err(|_| LlmError::SchemaViolation(format!("unknown remediation tool: {t}")))?,
        ),
        None => None,
    };

    let classification = Classification {
        category: parsed.category,
        subcategory: parsed.subcategory,
        priority: parsed.priority,
        assignment_group: parsed.assignment_group,
        resolution_notes: parsed.resolution_notes,
        action,
        tool,
        target: parsed.target,
        confidence: parsed.confidence,
    };

    classification.validate().map_err(LlmError::SchemaViolation)?;
    Ok(classification)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerce_rejects_unknown_action() {
        let parsed = ClassificationJson {
            category: "Software".to_owned(),
            subcategory: None,
            priority: "3".to_owned(),
            assignment_group: "L2-Apps".to_owned(),
            resolution_notes: None,
            action: "do_nothing".to_owned(),
            tool: None,
            target: None,
            confidence: 0.9,
        };
        assert!(coerce_classification(parsed).is_err());
    }

    #[test]
    fn coerce_rejects_out_of_range_confidence() {
        let parsed = ClassificationJson {
            category: "Software".to_owned(),
            subcategory: None,
            priority: "3".to_owned(),
            assignment_group: "L2-Apps".to_owned(),
            resolution_notes: None,
            action: "route".to_owned(),
            tool: None,
            target: None,
            confidence: 1.5,
        };
        assert!(coerce_classification(parsed).is_err());
    }

    #[test]
    fn coerce_accepts_valid_route() {
        let parsed = ClassificationJson {
            category: "Software".to_owned(),
            subcategory: None,
            priority: "3".to_owned(),
            assignment_group: "L2-Apps".to_owned(),
            resolution_notes: Some("reset password".to_owned()),
            action: "route".to_owned(),
            tool: None,
            target: None,
            confidence: 0.88,
        };
        let classification = coerce_classification(parsed).unwrap();
        assert_eq!(classification.category, "Software");
    }
}
