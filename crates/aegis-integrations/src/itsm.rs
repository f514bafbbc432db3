//! ITSM client boundary: CRUD over tickets, users, configuration items, and
//! knowledge articles (spec §6), shaped after a ServiceNow REST backend.

use aegis_core::{CiInfo, KbArticle, UserInfo};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::IntegrationError;

/// Fields AEGIS writes back to the source incident once a pipeline run
/// terminates in `executed` or `blocked`.
#[derive(Debug, Clone, Serialize)]
pub struct IncidentUpdate<'a> {
    pub category: &'a str,
    pub subcategory: Option<&'a str>,
    pub priority: &'a str,
    pub assignment_group: &'a str,
    pub resolution_notes: Option<&'a str>,
}

/// A closed incident pulled by the scheduled back-sync.
#[derive(Debug, Clone, Deserialize)]
pub struct ClosedIncident {
    pub number: String,
    pub short_description: String,
    pub description: String,
    pub resolution_notes: Option<String>,
    pub closed_at: DateTime<Utc>,
}

/// A published knowledge-base article pulled by the scheduled back-sync.
#[derive(Debug, Clone, Deserialize)]
pub struct KbDocument {
    pub doc_id: String,
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub published_at: DateTime<Utc>,
}

/// CRUD boundary over tickets, users, configuration items, and knowledge
/// articles. Every AEGIS reference to ServiceNow goes through this trait so
/// the pipeline is testable under mocks.
#[async_trait]
pub trait ItsmClient: Send + Sync {
    /// Returns up to `top_k` knowledge-base matches for `query`.
    async fn search_kb(&self, query: &str, top_k: usize) -> Result<Vec<KbArticle>, IntegrationError>;

    /// Looks up a caller; `None` if the identifier does not resolve to a user.
    async fn get_user(&self, caller_id: &str) -> Result<Option<UserInfo>, IntegrationError>;

    /// Looks up a configuration item; `None` if it does not resolve.
    async fn get_ci(&self, cmdb_ci: &str) -> Result<Option<CiInfo>, IntegrationError>;

    /// Writes the pipeline's outcome back to the incident record.
    async fn update_incident(&self, number: &str, update: IncidentUpdate<'_>) -> Result<(), IntegrationError>;

    /// Closed incidents (`state=7`) updated since `since`, for the back-sync.
    async fn fetch_closed_incidents(&self, since: DateTime<Utc>) -> Result<Vec<ClosedIncident>, IntegrationError>;

    /// Published knowledge-base articles updated since `since`, for the back-sync.
    async fn fetch_published_kb_articles(&self, since: DateTime<Utc>) -> Result<Vec<KbDocument>, IntegrationError>;
}

#[derive(Deserialize)]
struct KbSearchResponse {
    #[serde(default)]
    result: Vec<KbArticle>,
}

#[derive(Deserialize)]
struct UserLookupResponse {
    result: Option<UserInfo>,
}

#[derive(Deserialize)]
struct CiLookupResponse {
    result: Option<CiInfo>,
}

#[derive(Deserialize)]
struct ClosedIncidentsResponse {
    #[serde(default)]
    result: Vec<ClosedIncident>,
}

#[derive(Deserialize)]
struct KbArticlesResponse {
    #[serde(default)]
    result: Vec<KbDocument>,
}

/// ServiceNow-shaped HTTP implementation, basic-auth over `/api/now`.
pub struct HttpItsmClient {
    http: reqwest::Client,
    base_url: String,
    user: String,
    password: String,
}

impl HttpItsmClient {
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: String, user: String, password: String) -> Self {
        Self { http, base_url, user, password }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T, IntegrationError> {
        let response = self
            .http
            .get(self.url(endpoint))
            .basic_auth(&self.user, Some(&self.password))
            .query(query)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(IntegrationError::Status { status, body });
        }

        response.json::<T>().await.map_err(|e| IntegrationError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ItsmClient for HttpItsmClient {
    async fn search_kb(&self, query: &str, top_k: usize) -> Result<Vec<KbArticle>, IntegrationError> {
        let limit = top_k.to_string();
        let response: KbSearchResponse = self
            .get_json("table/kb_knowledge", &[("sysparm_query", query), ("sysparm_limit", &limit)])
            .await?;
        Ok(response.result)
    }

    async fn get_user(&self, caller_id: &str) -> Result<Option<UserInfo>, IntegrationError> {
        let response: UserLookupResponse =
            self.get_json(&format!("table/sys_user/{caller_id}"), &[]).await?;
        Ok(response.result)
    }

    async fn get_ci(&self, cmdb_ci: &str) -> Result<Option<CiInfo>, IntegrationError> {
        let response: CiLookupResponse =
            self.get_json(&format!("table/cmdb_ci/{cmdb_ci}"), &[]).await?;
        Ok(response.result)
    }

    async fn update_incident(&self, number: &str, update: IncidentUpdate<'_>) -> Result<(), IntegrationError> {
        let response = self
            .http
            .patch(self.url(&format!("table/incident/{number}")))
            .basic_auth(&self.user, Some(&self.password))
            .json(&update)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(number, status, "servicenow incident update failed");
            return Err(IntegrationError::Status { status, body });
        }
        Ok(())
    }

    async fn fetch_closed_incidents(&self, since: DateTime<Utc>) -> Result<Vec<ClosedIncident>, IntegrationError> {
        let query = format!("state=7^sys_updated_on>={}", since.format("%Y-%m-%d %H:%M:%S"));
        let response: ClosedIncidentsResponse =
            self.get_json("table/incident", &[("sysparm_query", &query)]).await?;
        Ok(response.result)
    }

    async fn fetch_published_kb_articles(&self, since: DateTime<Utc>) -> Result<Vec<KbDocument>, IntegrationError> {
        let query = format!("workflow_state=published^sys_updated_on>={}", since.format("%Y-%m-%d %H:%M:%S"));
        let response: KbArticlesResponse =
            self.get_json("table/kb_knowledge", &[("sysparm_query", &query)]).await?;
        Ok(response.result)
    }
}
