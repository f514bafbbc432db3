//! `/governance/*` and `/approve|reject/{incident}` (spec §6, §4.2).

use std::sync::Arc;

use aegis_core::{ApprovalDecision, GovernanceMode, GovernanceState};
use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use super::auth::AdminAuth;
use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct KillswitchRequest {
    pub action: String,
    pub reason: String,
    pub operator: String,
}

#[derive(Debug, Serialize)]
pub struct Ack {
    pub ok: bool,
}

pub async fn killswitch(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    Json(req): Json<KillswitchRequest>,
) -> Result<Json<Ack>, ApiError> {
    let enabled = match req.action.as_str() {
        "enable" => true,
        "disable" => false,
        other => return Err(ApiError::BadRequest(format!("invalid action: {other}"))),
    };
    state.governance.set_killswitch(enabled).await?;
    if let Err(e) =
        state.audit.push_killswitch(&format!("{} by {}: {}", req.action, req.operator, req.reason)).await
    {
        tracing::warn!(error = %e, "failed to push killswitch audit line");
    }
    Ok(Json(Ack { ok: true }))
}

#[derive(Debug, Deserialize)]
pub struct ModeRequest {
    pub mode: String,
    pub reason: String,
}

pub async fn mode(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    Json(req): Json<ModeRequest>,
) -> Result<Json<Ack>, ApiError> {
    let mode: GovernanceMode = req.mode.parse().map_err(ApiError::BadRequest)?;
    state.governance.set_mode(mode).await?;
    if let Err(e) = state.audit.push_killswitch(&format!("mode set to {}: {}", mode.as_str(), req.reason)).await {
        tracing::warn!(error = %e, "failed to push mode-change audit line");
    }
    Ok(Json(Ack { ok: true }))
}

pub async fn get_thresholds(State(state): State<Arc<AppState>>) -> Result<Json<GovernanceState>, ApiError> {
    Ok(Json(state.governance.read().await?))
}

#[derive(Debug, Deserialize)]
pub struct SetThresholdsRequest {
    pub threshold_assign: Option<u8>,
    pub threshold_categorize: Option<u8>,
    pub threshold_remediate: Option<u8>,
}

pub async fn set_thresholds(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    Json(req): Json<SetThresholdsRequest>,
) -> Result<Json<GovernanceState>, ApiError> {
    for value in [req.threshold_assign, req.threshold_categorize, req.threshold_remediate].into_iter().flatten() {
        if value > 100 {
            return Err(ApiError::BadRequest(format!("threshold out of range: {value}")));
        }
    }
    if let Some(v) = req.threshold_assign {
        state.governance.set_threshold_assign(v).await?;
    }
    if let Some(v) = req.threshold_categorize {
        state.governance.set_threshold_categorize(v).await?;
    }
    if let Some(v) = req.threshold_remediate {
        state.governance.set_threshold_remediate(v).await?;
    }
    Ok(Json(state.governance.read().await?))
}

#[derive(Debug, Deserialize)]
pub struct ApprovalRequest {
    pub approver: String,
    pub reason: Option<String>,
}

pub async fn approve(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    Path(incident): Path<String>,
    Json(req): Json<ApprovalRequest>,
) -> Result<Json<Ack>, ApiError> {
    record_decision(&state, &incident, ApprovalDecision::Approve, req).await
}

pub async fn reject(
    State(state): State<Arc<AppState>>,
    _admin: AdminAuth,
    Path(incident): Path<String>,
    Json(req): Json<ApprovalRequest>,
) -> Result<Json<Ack>, ApiError> {
    record_decision(&state, &incident, ApprovalDecision::Reject, req).await
}

async fn record_decision(
    state: &AppState,
    incident: &str,
    decision: ApprovalDecision,
    req: ApprovalRequest,
) -> Result<Json<Ack>, ApiError> {
    state.governance.record_approval(incident, decision, &req.approver, req.reason.clone()).await?;
    let verb = match decision {
        ApprovalDecision::Approve => "approved",
        ApprovalDecision::Reject => "rejected",
    };
    if let Err(e) = state.audit.push_approval(&format!("{incident} {verb} by {}", req.approver)).await {
        tracing::warn!(error = %e, "failed to push approval audit line");
    }
    Ok(Json(Ack { ok: true }))
}
