//! `GET /audit/incident/{incident}` (spec §6).

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};

use crate::{ApiError, AppState};

pub async fn incident_audit(
    State(state): State<Arc<AppState>>,
    Path(incident): Path<String>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(state.audit.get_incident(&incident).await?))
}
