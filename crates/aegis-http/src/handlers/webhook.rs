//! `POST /webhook/incident`, `POST /webhook/servicenow` (spec §6).
//!
//! Both ingress routes validate and enqueue the raw incident; the worker
//! re-derives the scrubbed fields idempotently when it dequeues the job
//! (spec §8 property 1). The ingress-side scrub here only keeps the audit
//! trail PII-free from the very first line.

use std::sync::Arc;

use aegis_core::{Incident, TriageJob};
use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::{ApiError, AppState};

#[derive(Debug, Serialize)]
pub struct QueuedResponse {
    pub status: &'static str,
    pub triage_id: String,
    pub queue_position: usize,
}

/// Vendor-shaped payload as delivered by a ServiceNow outbound REST message;
/// the incident table's field names are carried through unchanged.
#[derive(Debug, Deserialize)]
pub struct ServiceNowIncidentPayload {
    pub number: String,
    pub short_description: String,
    #[serde(default)]
    pub description: String,
    pub caller_id: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    #[serde(default = "default_priority")]
    pub priority: String,
    pub cmdb_ci: Option<String>,
    pub assignment_group: Option<String>,
}

fn default_priority() -> String {
    "3".to_owned()
}

impl From<ServiceNowIncidentPayload> for Incident {
    fn from(payload: ServiceNowIncidentPayload) -> Self {
        Self {
            number: payload.number,
            short_description: payload.short_description,
            description: payload.description,
            caller_id: payload.caller_id,
            category: payload.category,
            subcategory: payload.subcategory,
            priority: payload.priority,
            cmdb_ci: payload.cmdb_ci,
            assignment_group: payload.assignment_group,
        }
    }
}

pub async fn incident(
    State(state): State<Arc<AppState>>,
    Json(incident): Json<Incident>,
) -> Result<Json<QueuedResponse>, ApiError> {
    ingest(&state, incident).await
}

pub async fn servicenow(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ServiceNowIncidentPayload>,
) -> Result<Json<QueuedResponse>, ApiError> {
    ingest(&state, payload.into()).await
}

async fn ingest(state: &AppState, incident: Incident) -> Result<Json<QueuedResponse>, ApiError> {
    if incident.number.trim().is_empty() {
        return Err(ApiError::BadRequest("incident number is required".to_owned()));
    }
    if incident.short_description.trim().is_empty() {
        return Err(ApiError::BadRequest("short_description is required".to_owned()));
    }
    if !incident.has_valid_priority() {
        return Err(ApiError::BadRequest(format!("invalid priority: {}", incident.priority)));
    }

    let governance = state.governance.read().await?;
    if !governance.enabled {
        return Err(ApiError::ServiceUnavailable("kill switch is disabled".to_owned()));
    }

    let scrubbed = state.redactor.scrub(&incident.short_description);
    if let Err(e) = state.audit.push_incident(&incident.number, &format!("received: {scrubbed}")).await {
        tracing::warn!(incident = %incident.number, error = %e, "failed to push ingress audit line");
    }

    let job = TriageJob::new(incident);
    let triage_id = job.triage_id.clone();
    state.queue.enqueue(job).await?;
    let queue_position = state.queue.pending_len().await?;

    Ok(Json(QueuedResponse { status: "queued", triage_id, queue_position }))
}
