//! `POST /auth/login` and the `AdminAuth` extractor that gates governance
//! mutations (spec §9 open question: the login previously issued a token no
//! endpoint verified; here the token is checked on every write).

use std::sync::Arc;

use axum::Json;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};

use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    if req.username != state.admin.username || req.password != state.admin.password {
        return Err(ApiError::Unauthorized("invalid credentials".to_owned()));
    }
    let token = uuid::Uuid::new_v4().to_string();
    *state.admin_token.write().await = Some(token.clone());
    Ok(Json(LoginResponse { token }))
}

/// Extractor requiring a `Bearer` token matching the last issued login token.
pub struct AdminAuth;

impl FromRequestParts<Arc<AppState>> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        let Some(presented) = header else {
            return Err(ApiError::Unauthorized("missing bearer token".to_owned()));
        };
        let current = state.admin_token.read().await;
        match current.as_deref() {
            Some(token) if token == presented => Ok(Self),
            _ => Err(ApiError::Unauthorized("invalid or expired token".to_owned())),
        }
    }
}
