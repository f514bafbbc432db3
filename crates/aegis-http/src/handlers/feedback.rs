//! `GET /feedback/stats`, `POST /feedback/{triage_id}` (spec §6).

use std::sync::Arc;

use aegis_core::FeedbackRecord;
use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use crate::{ApiError, AppState};

#[derive(Debug, Serialize)]
pub struct FeedbackStats {
    pub positive: u64,
    pub negative: u64,
    pub approval_pct: f64,
}

pub async fn stats(State(state): State<Arc<AppState>>) -> Result<Json<FeedbackStats>, ApiError> {
    let (positive, negative) = state.results.feedback_stats().await?;
    let total = positive + negative;
    let approval_pct = if total == 0 { 0.0 } else { (positive as f64 / total as f64) * 100.0 };
    Ok(Json(FeedbackStats { positive, negative, approval_pct }))
}

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub thumbs_up: bool,
    pub reviewer: Option<String>,
}

pub async fn record(
    State(state): State<Arc<AppState>>,
    Path(triage_id): Path<String>,
    Json(req): Json<FeedbackRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let prior = state.results.get(&triage_id).await?;
    let record = FeedbackRecord {
        triage_id: triage_id.clone(),
        thumbs_up: req.thumbs_up,
        classification: prior.as_ref().and_then(|s| s.classification.clone()),
        assignment_group: prior.as_ref().and_then(|s| s.classification.as_ref()).map(|c| c.assignment_group.clone()),
        confidence: prior.as_ref().and_then(|s| s.confidence),
        reviewer: req.reviewer,
        timestamp: chrono::Utc::now().to_rfc3339(),
    };
    state.results.save_feedback(&record).await?;
    Ok(Json(serde_json::json!({"ok": true})))
}
