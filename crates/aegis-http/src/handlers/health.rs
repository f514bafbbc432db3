//! `GET /health`, `GET /status` (spec §6).

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub queue_reachable: bool,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let queue_reachable = state.queue.pending_len().await.is_ok();
    Json(HealthResponse { status: if queue_reachable { "ok" } else { "degraded" }, queue_reachable })
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub enabled: bool,
    pub mode: &'static str,
    pub processed_today: i64,
    pub blocked_today: i64,
    pub pending_len: usize,
    pub processing_len: usize,
    pub dead_letter_len: usize,
}

pub async fn status(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, crate::ApiError> {
    let governance = state.governance.read().await?;
    Ok(Json(StatusResponse {
        enabled: governance.enabled,
        mode: governance.mode.as_str(),
        processed_today: state.stats.processed_today().await?,
        blocked_today: state.stats.blocked_today().await?,
        pending_len: state.queue.pending_len().await?,
        processing_len: state.queue.processing_len().await?,
        dead_letter_len: state.queue.dead_letter_len().await?,
    }))
}
