//! `GET /triage/{triage_id}` (spec §6).

use std::sync::Arc;

use aegis_core::PipelineState;
use axum::Json;
use axum::extract::{Path, State};

use crate::{ApiError, AppState};

pub async fn get_triage(
    State(state): State<Arc<AppState>>,
    Path(triage_id): Path<String>,
) -> Result<Json<PipelineState>, ApiError> {
    let result = state.results.get(&triage_id).await?;
    result.map(Json).ok_or_else(|| ApiError::NotFound(format!("triage '{triage_id}' not found")))
}
