//! Remediation dispatch boundary (spec §4.7.1): commands are sent to a
//! remote-command service, never shelled out locally. Generalizes the
//! original system's AWS SSM `send_command` dispatch into a plain HTTP call.

use aegis_core::RemediationTool;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::IntegrationError;

/// A single remediation command ready for dispatch.
#[derive(Debug, Clone, Serialize)]
pub struct RemediationRequest<'a> {
    pub tool: RemediationTool,
    pub target: &'a str,
    pub command: &'a str,
}

/// Outcome of a dispatch call: the remote-command service's own tracking id.
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchResult {
    pub command_id: String,
    pub status: String,
}

/// Dispatches remediation commands to a remote-command service. The
/// executor never runs shell on the host process (spec §4.7.1).
#[async_trait]
pub trait RemediationClient: Send + Sync {
    async fn dispatch(&self, request: RemediationRequest<'_>) -> Result<DispatchResult, IntegrationError>;
}

/// HTTP-backed implementation posting to a remote-command service's
/// `/commands` endpoint.
pub struct HttpRemediationClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpRemediationClient {
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: String) -> Self {
        Self { http, base_url }
    }
}

#[async_trait]
impl RemediationClient for HttpRemediationClient {
    async fn dispatch(&self, request: RemediationRequest<'_>) -> Result<DispatchResult, IntegrationError> {
        let url = format!("{}/commands", self.base_url.trim_end_matches('/'));
        let response = self.http.post(&url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(target = request.target, status, "remediation dispatch failed");
            return Err(IntegrationError::Status { status, body });
        }

        response.json::<DispatchResult>().await.map_err(|e| IntegrationError::Decode(e.to_string()))
    }
}
