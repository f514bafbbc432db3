//! Domain types shared across all AEGIS crates.

use serde::{Deserialize, Serialize};

/// An inbound incident as received from the ticketing system. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    /// Ticketing-system identifier, e.g. `INC0012345`.
    pub number: String,
    pub short_description: String,
    pub description: String,
    pub caller_id: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    /// `"1"`–`"5"`, default `"3"`.
    #[serde(default = "default_priority")]
    pub priority: String,
    pub cmdb_ci: Option<String>,
    pub assignment_group: Option<String>,
}

fn default_priority() -> String {
    "3".to_owned()
}

impl Incident {
    /// Whether `priority` is one of the five valid ITSM priority strings.
    #[must_use]
    pub fn has_valid_priority(&self) -> bool {
        matches!(self.priority.as_str(), "1" | "2" | "3" | "4" | "5")
    }
}

/// Wraps an `Incident` with queue-visible identity and retry bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageJob {
    /// Opaque, unique per webhook receipt.
    pub triage_id: String,
    pub incident: Incident,
    /// Monotonic UTC receipt time, RFC 3339.
    pub received_at: String,
    #[serde(default)]
    pub retry_count: u32,
}

impl TriageJob {
    #[must_use]
    pub fn new(incident: Incident) -> Self {
        Self {
            triage_id: uuid::Uuid::new_v4().to_string(),
            incident,
            received_at: chrono::Utc::now().to_rfc3339(),
            retry_count: 0,
        }
    }
}

/// Lifecycle state of a `PipelineState`, advancing monotonically per the
/// transition table: `pending -> guardrails -> (blocked | enrichment) ->
/// classified -> (failed | executed)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    Pending,
    Guardrails,
    Enrichment,
    Classified,
    Executed,
    Blocked,
    Failed,
}

impl PipelineStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Guardrails => "guardrails",
            Self::Enrichment => "enrichment",
            Self::Classified => "classified",
            Self::Executed => "executed",
            Self::Blocked => "blocked",
            Self::Failed => "failed",
        }
    }

    /// Terminal statuses never transition further.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Executed | Self::Blocked | Self::Failed)
    }
}

/// Action the classifier/executor settles on for a ticket.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationAction {
    Route,
    AutoHeal,
    Escalate,
    /// Executor-assigned when an `auto_heal` needs a human to approve first.
    PendingApproval,
}

impl ClassificationAction {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Route => "route",
            Self::AutoHeal => "auto_heal",
            Self::Escalate => "escalate",
            Self::PendingApproval => "pending_approval",
        }
    }
}

/// A known, dispatchable remediation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RemediationTool {
    RestartIis,
    ClearCache,
    UnlockAccount,
}

impl RemediationTool {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RestartIis => "restart_iis",
            Self::ClearCache => "clear_cache",
            Self::UnlockAccount => "unlock_account",
        }
    }
}

impl std::str::FromStr for RemediationTool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "restart_iis" => Ok(Self::RestartIis),
            "clear_cache" => Ok(Self::ClearCache),
            "unlock_account" => Ok(Self::UnlockAccount),
            other => Err(format!("unknown remediation tool: {other}")),
        }
    }
}

/// Risk tier of a registered remediation; high-risk entries require a prior approval record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

/// Schema-constrained classifier output (spec §3/§4.6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub category: String,
    pub subcategory: Option<String>,
    pub priority: String,
    pub assignment_group: String,
    pub resolution_notes: Option<String>,
    pub action: ClassificationAction,
    pub tool: Option<RemediationTool>,
    pub target: Option<String>,
    pub confidence: f64,
}

impl Classification {
    /// Required-field/range validation applied after JSON parsing.
    ///
    /// # Errors
    /// Returns a human-readable reason when a field is missing, out of range,
    /// or an unknown enum value slipped through loose JSON parsing.
    pub fn validate(&self) -> Result<(), String> {
        if self.category.trim().is_empty() {
            return Err("category is empty".to_owned());
        }
        if self.assignment_group.trim().is_empty() {
            return Err("assignment_group is empty".to_owned());
        }
        if !matches!(self.priority.as_str(), "1" | "2" | "3" | "4" | "5") {
            return Err(format!("invalid priority: {}", self.priority));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(format!("confidence out of range: {}", self.confidence));
        }
        if self.action == ClassificationAction::AutoHeal && self.tool.is_none() {
            return Err("auto_heal action requires a tool".to_owned());
        }
        Ok(())
    }
}

/// Severity tag on an activity-log line (spec §4.8).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivitySeverity {
    Success,
    Warning,
    Error,
    Info,
}

impl ActivitySeverity {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Info => "info",
        }
    }
}

/// Stage tag on an activity-log line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Guardrails,
    Enrichment,
    TriageLlm,
    Executor,
}

impl Stage {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Guardrails => "GUARDRAILS",
            Self::Enrichment => "ENRICHMENT",
            Self::TriageLlm => "TRIAGE_LLM",
            Self::Executor => "EXECUTOR",
        }
    }
}

/// A knowledge-base hit surfaced by enrichment, best-first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KbArticle {
    pub doc_id: String,
    pub title: String,
    pub snippet: String,
    pub score: f32,
}

/// Caller lookup populated by enrichment when `caller_id` is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub user_id: String,
    pub name: Option<String>,
    pub department: Option<String>,
    pub email: Option<String>,
}

/// CMDB CI lookup populated by enrichment when `cmdb_ci` is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CiInfo {
    pub ci_id: String,
    pub name: Option<String>,
    pub ci_class: Option<String>,
    pub environment: Option<String>,
}

/// Carries a job through the pipeline state machine (spec §3/§4.8).
///
/// Invariants: scrubbed fields are derived only from the original fields and
/// never overwrite them; `status` advances only forward along the DAG;
/// `actions_taken` is append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineState {
    pub triage_id: String,
    pub incident: Incident,

    pub scrubbed_short_description: String,
    pub scrubbed_description: String,

    pub is_duplicate: bool,
    pub duplicate_of: Option<String>,

    #[serde(default)]
    pub kb_articles: Vec<KbArticle>,
    pub user_info: Option<UserInfo>,
    pub ci_info: Option<CiInfo>,

    pub classification: Option<Classification>,
    pub confidence: Option<f64>,
    pub reasoning: Option<String>,

    pub status: PipelineStatus,
    pub error: Option<String>,
    #[serde(default)]
    pub actions_taken: Vec<String>,
}

impl PipelineState {
    #[must_use]
    pub fn new(triage_id: String, incident: Incident, scrubbed_short_description: String, scrubbed_description: String) -> Self {
        Self {
            triage_id,
            incident,
            scrubbed_short_description,
            scrubbed_description,
            is_duplicate: false,
            duplicate_of: None,
            kb_articles: Vec::new(),
            user_info: None,
            ci_info: None,
            classification: None,
            confidence: None,
            reasoning: None,
            status: PipelineStatus::Pending,
            error: None,
            actions_taken: Vec::new(),
        }
    }

    /// Appends a line to the append-only action log. Never removes or rewrites prior entries.
    pub fn record_action(&mut self, line: impl Into<String>) {
        self.actions_taken.push(line.into());
    }

    /// Moves `status` forward, refusing to go backward or leave a terminal state.
    ///
    /// # Errors
    /// Returns the attempted transition description when `self.status` is
    /// already terminal.
    pub fn transition_to(&mut self, next: PipelineStatus) -> Result<(), String> {
        if self.status.is_terminal() {
            return Err(format!("cannot transition out of terminal state {:?}", self.status));
        }
        self.status = next;
        Ok(())
    }
}

/// Operating mode of the governance plane.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GovernanceMode {
    /// Remediation dispatches without approval.
    Auto,
    /// Remediation requires a prior approval record.
    Assist,
    /// No side effects of any kind.
    Monitor,
}

impl GovernanceMode {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Assist => "assist",
            Self::Monitor => "monitor",
        }
    }
}

impl std::str::FromStr for GovernanceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "assist" => Ok(Self::Assist),
            "monitor" => Ok(Self::Monitor),
            other => Err(format!("unknown governance mode: {other}")),
        }
    }
}

/// Process-wide governance knobs, externally mutable via the HTTP surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceState {
    pub enabled: bool,
    pub mode: GovernanceMode,
    pub threshold_assign: u8,
    pub threshold_categorize: u8,
    pub threshold_remediate: u8,
}

impl Default for GovernanceState {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: GovernanceMode::Assist,
            threshold_assign: 85,
            threshold_categorize: 80,
            threshold_remediate: 95,
        }
    }
}

/// Decision on a pending remediation, keyed by incident number, 1h TTL.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalDecision {
    Approve,
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRecord {
    pub incident: String,
    pub decision: ApprovalDecision,
    pub approver: String,
    pub reason: Option<String>,
    pub timestamp: String,
}

/// Per-`triage_id` human feedback, 90-day retention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub triage_id: String,
    pub thumbs_up: bool,
    pub classification: Option<Classification>,
    pub assignment_group: Option<String>,
    pub confidence: Option<f64>,
    pub reviewer: Option<String>,
    pub timestamp: String,
}
