//! Executor (spec §4.7): governance-gated remediation dispatch, ticket
//! update, and chat notification. Steps 3-4 are independently non-fatal —
//! a failure in either is recorded and does not abort the others.

use std::sync::Arc;

use aegis_core::{ClassificationAction, GovernanceMode, GovernanceState, PipelineState, RemediationTool, RiskTier};
use aegis_integrations::{ChatClient, IncidentUpdate, ItsmClient, RemediationClient, RemediationRequest, TriageNotification};
use aegis_storage::GovernanceStore;
use regex::Regex;
use std::sync::LazyLock;

static INSTANCE_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^i-[a-z0-9]+$").expect("valid regex"));
static EMAIL_TARGET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid regex"));

/// Static entry describing one dispatchable remediation.
struct RegistryEntry {
    command_template: &'static str,
    risk_tier: RiskTier,
    standard_change_template: Option<&'static str>,
}

fn registry_entry(tool: RemediationTool) -> RegistryEntry {
    match tool {
        RemediationTool::RestartIis => RegistryEntry {
            command_template: "Restart-Service -Name 'W3SVC' -Force",
            risk_tier: RiskTier::Medium,
            standard_change_template: Some("STD0001001"),
        },
        RemediationTool::ClearCache => RegistryEntry {
            command_template: "forfiles /p 'C:\\inetpub\\logs\\LogFiles' /s /m *.* /c 'cmd /c Del @path' /d -30",
            risk_tier: RiskTier::Low,
            standard_change_template: Some("STD0001002"),
        },
        RemediationTool::UnlockAccount => RegistryEntry {
            command_template: "Unlock-ADAccount -Identity '{target}'",
            risk_tier: RiskTier::High,
            standard_change_template: None,
        },
    }
}

fn target_is_valid(tool: RemediationTool, target: &str) -> bool {
    match tool {
        RemediationTool::RestartIis | RemediationTool::ClearCache => INSTANCE_ID_RE.is_match(target),
        RemediationTool::UnlockAccount => EMAIL_TARGET_RE.is_match(target),
    }
}

pub struct Executor {
    governance: Arc<GovernanceStore>,
    itsm: Arc<dyn ItsmClient>,
    chat: Arc<dyn ChatClient>,
    remediation: Arc<dyn RemediationClient>,
    chat_base_url: Option<String>,
}

impl Executor {
    #[must_use]
    pub fn new(
        governance: Arc<GovernanceStore>,
        itsm: Arc<dyn ItsmClient>,
        chat: Arc<dyn ChatClient>,
        remediation: Arc<dyn RemediationClient>,
        chat_base_url: Option<String>,
    ) -> Self {
        Self { governance, itsm, chat, remediation, chat_base_url }
    }

    /// Applies the precedence in spec §4.7 and mutates `state` in place,
    /// transitioning it to its terminal status.
    pub async fn execute(&self, state: &mut PipelineState) {
        let governance = match self.governance.read().await {
            Ok(g) => g,
            Err(e) => {
                tracing::error!(triage_id = %state.triage_id, error = %e, "governance read failed, blocking");
                state.error = Some(e.to_string());
                let _ = state.transition_to(aegis_core::PipelineStatus::Blocked);
                return;
            },
        };

        if !governance.enabled {
            state.record_action("killswitch disabled: blocked without side effects");
            let _ = state.transition_to(aegis_core::PipelineStatus::Blocked);
            return;
        }

        self.apply_remediation_precedence(state, &governance).await;

        if governance.mode == GovernanceMode::Monitor {
            state.record_action("monitor mode: classification recorded, no ticket update or chat notification sent");
        } else if let Some(classification) = state.classification.clone() {
            let update = IncidentUpdate {
                category: &classification.category,
                subcategory: classification.subcategory.as_deref(),
                priority: &classification.priority,
                assignment_group: &classification.assignment_group,
                resolution_notes: classification.resolution_notes.as_deref(),
            };
            match self.itsm.update_incident(&state.incident.number, update).await {
                Ok(()) => state.record_action("servicenow incident updated"),
                Err(e) => {
                    tracing::warn!(triage_id = %state.triage_id, error = %e, "ticket update failed");
                    state.record_action(format!("ticket update failed: {e}"));
                },
            }

            let feedback_up_url =
                self.chat_base_url.as_deref().map(|base| format!("{base}/feedback/{}/up", state.triage_id));
            let feedback_down_url =
                self.chat_base_url.as_deref().map(|base| format!("{base}/feedback/{}/down", state.triage_id));
            let notification = TriageNotification {
                triage_id: &state.triage_id,
                incident_number: &state.incident.number,
                category: &classification.category,
                priority: &classification.priority,
                assignment_group: &classification.assignment_group,
                confidence: classification.confidence,
                feedback_up_url: feedback_up_url.as_deref(),
                feedback_down_url: feedback_down_url.as_deref(),
            };
            match self.chat.notify(notification).await {
                Ok(()) => state.record_action("chat notification sent"),
                Err(e) => {
                    tracing::warn!(triage_id = %state.triage_id, error = %e, "chat notification failed");
                    state.record_action(format!("chat notification failed: {e}"));
                },
            }
        }

        let _ = state.transition_to(aegis_core::PipelineStatus::Executed);
    }

    async fn apply_remediation_precedence(&self, state: &mut PipelineState, governance: &GovernanceState) {
        let Some(classification) = state.classification.clone() else { return };
        if classification.action != ClassificationAction::AutoHeal {
            return;
        }
        let Some(tool) = classification.tool else { return };

        if (classification.confidence * 100.0) < f64::from(governance.threshold_remediate) {
            state.record_action(format!(
                "auto_heal downgraded to route: confidence {:.0}% below remediate threshold {}%",
                classification.confidence * 100.0,
                governance.threshold_remediate
            ));
            if let Some(c) = state.classification.as_mut() {
                c.action = ClassificationAction::Route;
            }
            return;
        }

        if governance.mode != GovernanceMode::Auto {
            state.record_action("auto_heal queued for approval: mode is not auto");
            if let Some(c) = state.classification.as_mut() {
                c.action = ClassificationAction::PendingApproval;
            }
            return;
        }

        let Some(target) = classification.target.as_deref() else {
            state.record_action("auto_heal has no target, downgraded to route");
            if let Some(c) = state.classification.as_mut() {
                c.action = ClassificationAction::Route;
            }
            return;
        };

        if !target_is_valid(tool, target) {
            state.record_action(format!("auto_heal target '{target}' failed format validation, downgraded to route"));
            if let Some(c) = state.classification.as_mut() {
                c.action = ClassificationAction::Route;
            }
            return;
        }

        let entry = registry_entry(tool);
        if entry.risk_tier == RiskTier::High {
            match self.governance.is_approved(&state.incident.number).await {
                Ok(true) => {},
                Ok(false) => {
                    state.record_action("high-risk auto_heal requires a pre-existing approval record, downgraded to route");
                    if let Some(c) = state.classification.as_mut() {
                        c.action = ClassificationAction::Route;
                    }
                    return;
                },
                Err(e) => {
                    tracing::warn!(triage_id = %state.triage_id, error = %e, "approval lookup failed, downgraded to route");
                    if let Some(c) = state.classification.as_mut() {
                        c.action = ClassificationAction::Route;
                    }
                    return;
                },
            }
        }

        let command = entry.command_template.replace("{target}", target);
        let request = RemediationRequest { tool, target, command: &command };
        match self.remediation.dispatch(request).await {
            Ok(result) => {
                state.record_action(format!("remediation dispatched: {} (command_id={})", tool.as_str(), result.command_id));
                if let Some(template) = entry.standard_change_template {
                    state.record_action(format!("standard change template: {template}"));
                }
            },
            Err(e) => {
                tracing::warn!(triage_id = %state.triage_id, error = %e, "remediation dispatch failed");
                state.record_action(format!("remediation dispatch failed: {e}"));
            },
        }
    }
}
