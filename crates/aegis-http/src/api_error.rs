//! Typed API error for HTTP handlers (spec §7 error taxonomy).
//!
//! Converts domain errors into proper HTTP responses with a JSON body.
//! `Internal` logs the real error server-side and returns a static message
//! to the client — no error detail leakage.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use aegis_storage::StorageError;

#[derive(Debug)]
pub enum ApiError {
    /// ClientFault (spec §7): malformed webhook, invalid governance action.
    BadRequest(String),
    /// Shared-secret admin auth rejected.
    Unauthorized(String),
    /// Unknown `triage_id` / incident.
    NotFound(String),
    /// GovernanceHalt at ingress (spec §7): kill switch disabled.
    ServiceUnavailable(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_owned())
            },
        };
        let body = serde_json::json!({"error": message});
        (status, Json(body)).into_response()
    }
}

impl From<aegis_service::ServiceError> for ApiError {
    fn from(err: aegis_service::ServiceError) -> Self {
        use aegis_service::ServiceError;
        match err {
            ServiceError::Storage(StorageError::NotFound { entity, key }) => {
                Self::NotFound(format!("{entity} '{key}' not found"))
            },
            ServiceError::InvalidInput(msg) => Self::BadRequest(msg),
            ServiceError::GovernanceHalt(msg) => Self::ServiceUnavailable(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}
