//! HTTP front-end: webhook ingress, governance control plane, triage lookup,
//! feedback, and admin auth (spec §6). Runs as a process separate from the
//! worker loop, sharing only the queue and governance store (spec §9).

mod api_error;
mod handlers;

use std::sync::Arc;

use aegis_core::Redactor;
use aegis_service::ServiceError;
use aegis_storage::{AuditLog, GovernanceStore, QueueDriver, ResultStore, StatsStore};
use axum::routing::{get, post};
use axum::Router;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

pub use api_error::ApiError;

/// Admin credentials checked by `/auth/login`; the issued token is the only
/// thing `AdminAuth` verifies afterward (spec §9 open question: auth scope).
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

/// Everything a handler needs, constructed once per process and shared via `Arc`.
pub struct AppState {
    pub queue: Arc<QueueDriver>,
    pub governance: Arc<GovernanceStore>,
    pub results: Arc<ResultStore>,
    pub audit: Arc<AuditLog>,
    pub stats: Arc<StatsStore>,
    pub redactor: Arc<Redactor>,
    pub admin: AdminCredentials,
    /// Token minted by the last successful `/auth/login`; `None` until then.
    pub admin_token: RwLock<Option<String>>,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/status", get(handlers::health::status))
        .route("/webhook/incident", post(handlers::webhook::incident))
        .route("/webhook/servicenow", post(handlers::webhook::servicenow))
        .route("/triage/{triage_id}", get(handlers::triage::get_triage))
        .route("/governance/killswitch", post(handlers::governance::killswitch))
        .route("/governance/mode", post(handlers::governance::mode))
        .route(
            "/governance/thresholds",
            get(handlers::governance::get_thresholds).post(handlers::governance::set_thresholds),
        )
        .route("/approve/{incident}", post(handlers::governance::approve))
        .route("/reject/{incident}", post(handlers::governance::reject))
        .route("/audit/incident/{incident}", get(handlers::audit::incident_audit))
        .route("/feedback/stats", get(handlers::feedback::stats))
        .route("/feedback/{triage_id}", post(handlers::feedback::record))
        .route("/auth/login", post(handlers::auth::login))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

impl From<aegis_storage::StorageError> for ApiError {
    fn from(err: aegis_storage::StorageError) -> Self {
        ServiceError::Storage(err).into()
    }
}
