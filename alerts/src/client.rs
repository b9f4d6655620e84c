// SPDX-License-Identifier: PMPL-1.0-or-later
//! Backend request layer
//!
//! [`AlertBackend`] is the contract the core consumes. [`HttpBackend`] is the
//! production implementation over the console's REST API; tests swap in
//! their own implementations.

use crate::error::{ConsoleError, Result};
use crate::model::{
    AlertRecord, AlertStatus, ComplianceSummary, FimRecent, Incident, IncidentStatus,
    MitreTactics, OverviewStats, ScaLatest, Severity, TimeseriesData,
};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, RETRY_AFTER, USER_AGENT};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Query for `GET alerts`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertQuery {
    pub limit: u32,
    pub severity: Option<Severity>,
}

impl Default for AlertQuery {
    fn default() -> Self {
        Self {
            limit: 200,
            severity: None,
        }
    }
}

/// Bucket width for the time-series stats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeBucket {
    Hour,
    #[default]
    Day,
}

impl TimeBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeBucket::Hour => "hour",
            TimeBucket::Day => "day",
        }
    }
}

/// Read/write operations the console core depends on
#[async_trait]
pub trait AlertBackend: Send + Sync {
    async fn list_alerts(&self, query: AlertQuery) -> Result<Vec<AlertRecord>>;

    async fn get_alert(&self, id: &str) -> Result<AlertRecord>;

    async fn update_alert_status(&self, id: &str, status: AlertStatus) -> Result<()>;

    async fn list_incidents(&self, limit: u32) -> Result<Vec<Incident>>;

    async fn update_incident_status(&self, id: &str, status: IncidentStatus) -> Result<()>;

    async fn overview(&self) -> Result<OverviewStats>;

    async fn timeseries(&self, days: u32, bucket: TimeBucket) -> Result<TimeseriesData>;

    async fn compliance(&self) -> Result<ComplianceSummary>;

    async fn mitre_tactics(&self) -> Result<MitreTactics>;

    async fn fim_recent(&self) -> Result<FimRecent>;

    async fn sca_latest(&self) -> Result<ScaLatest>;
}

/// Bearer credential shared between the request layer and its owner
///
/// A 401 from the backend clears it; the owner can check
/// [`SessionCredential::is_invalidated`] to drop any persisted copy.
#[derive(Debug, Clone, Default)]
pub struct SessionCredential {
    inner: Arc<RwLock<CredentialState>>,
}

#[derive(Debug, Default)]
struct CredentialState {
    token: Option<String>,
    invalidated: bool,
}

impl SessionCredential {
    pub fn new(token: Option<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(CredentialState {
                token: token.filter(|t| !t.is_empty()),
                invalidated: false,
            })),
        }
    }

    pub async fn token(&self) -> Option<String> {
        self.inner.read().await.token.clone()
    }

    pub async fn set(&self, token: impl Into<String>) {
        let mut state = self.inner.write().await;
        state.token = Some(token.into());
        state.invalidated = false;
    }

    pub async fn invalidate(&self) {
        let mut state = self.inner.write().await;
        if state.token.take().is_some() {
            warn!("Backend rejected credential; session token invalidated");
        }
        state.invalidated = true;
    }

    pub async fn is_invalidated(&self) -> bool {
        self.inner.read().await.invalidated
    }
}

/// Connection settings for [`HttpBackend`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: concat!("socdash/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// REST implementation of [`AlertBackend`]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    credential: SessionCredential,
}

impl HttpBackend {
    pub fn new(config: ClientConfig, credential: SessionCredential) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|_| ConsoleError::Config("Invalid user agent".into()))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: config.timeout,
            credential,
        })
    }

    /// Create with default settings against `base_url`
    pub fn with_base_url(base_url: &str, credential: SessionCredential) -> Result<Self> {
        Self::new(
            ClientConfig {
                base_url: base_url.to_string(),
                ..ClientConfig::default()
            },
            credential,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credential(&self) -> &SessionCredential {
        &self.credential
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    async fn authorize(&self, request: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder> {
        match self.credential.token().await {
            Some(token) => {
                let value = HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|_| ConsoleError::Config("Invalid token".into()))?;
                Ok(request.header(AUTHORIZATION, value))
            }
            None => Ok(request),
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder, resource: &str) -> Result<Response> {
        let response = self
            .authorize(request)
            .await?
            .send()
            .await
            .map_err(|e| self.map_transport(e, resource))?;
        self.check_status(response, resource).await
    }

    /// Translate non-2xx responses into the console's error taxonomy
    async fn check_status(&self, response: Response, resource: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::UNAUTHORIZED => {
                self.credential.invalidate().await;
                Err(ConsoleError::Auth(format!("{} (HTTP 401)", resource)))
            }
            StatusCode::NOT_FOUND => Err(ConsoleError::NotFound(resource.to_string())),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(60);
                Err(ConsoleError::RateLimited(retry_after))
            }
            StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                let detail = error_detail(response).await;
                Err(ConsoleError::Rejected(format!("{}: {}", resource, detail)))
            }
            _ if status.is_server_error() => {
                let detail = error_detail(response).await;
                Err(ConsoleError::Unavailable(format!(
                    "HTTP {} on {}: {}",
                    status, resource, detail
                )))
            }
            _ => {
                let detail = error_detail(response).await;
                Err(ConsoleError::Api(format!("HTTP {} on {}: {}", status, resource, detail)))
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        debug!(path, "GET");
        let request = self.client.get(self.url(path)).query(query);
        let response = self.send(request, path).await?;
        let bytes = response.bytes().await.map_err(|e| self.map_transport(e, path))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn patch_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        debug!(path, "PATCH");
        let request = self.client.patch(self.url(path)).json(body);
        self.send(request, path).await?;
        Ok(())
    }

    fn map_transport(&self, error: reqwest::Error, resource: &str) -> ConsoleError {
        if error.is_timeout() {
            warn!(resource, timeout_ms = self.timeout.as_millis() as u64, "Request timed out");
            ConsoleError::Timeout(self.timeout)
        } else {
            ConsoleError::Http(error)
        }
    }
}

/// Pull FastAPI-style `{"detail": ...}` out of an error body when present
async fn error_detail(response: Response) -> String {
    let text = response.text().await.unwrap_or_default();
    serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|v| v.get("detail").map(|d| match d.as_str() {
            Some(s) => s.to_string(),
            None => d.to_string(),
        }))
        .unwrap_or(text)
}

#[derive(Serialize)]
struct StatusBody<'a> {
    status: &'a str,
}

#[async_trait]
impl AlertBackend for HttpBackend {
    async fn list_alerts(&self, query: AlertQuery) -> Result<Vec<AlertRecord>> {
        let mut params = vec![("limit", query.limit.to_string())];
        if let Some(severity) = query.severity {
            params.push(("severity", severity.to_string()));
        }
        self.get_json("alerts", &params).await
    }

    async fn get_alert(&self, id: &str) -> Result<AlertRecord> {
        let path = format!("alerts/{}", urlencoding::encode(id));
        self.get_json(&path, &[]).await
    }

    async fn update_alert_status(&self, id: &str, status: AlertStatus) -> Result<()> {
        let path = format!("alerts/{}/status", urlencoding::encode(id));
        self.patch_json(&path, &StatusBody { status: status.as_str() })
            .await
    }

    async fn list_incidents(&self, limit: u32) -> Result<Vec<Incident>> {
        self.get_json("incidents", &[("limit", limit.to_string())])
            .await
    }

    async fn update_incident_status(&self, id: &str, status: IncidentStatus) -> Result<()> {
        let path = format!("incidents/{}/status", urlencoding::encode(id));
        let status = status.to_string();
        self.patch_json(&path, &StatusBody { status: &status }).await
    }

    async fn overview(&self) -> Result<OverviewStats> {
        self.get_json("stats/overview", &[]).await
    }

    async fn timeseries(&self, days: u32, bucket: TimeBucket) -> Result<TimeseriesData> {
        self.get_json(
            "stats/timeseries",
            &[
                ("days", days.to_string()),
                ("bucket", bucket.as_str().to_string()),
            ],
        )
        .await
    }

    async fn compliance(&self) -> Result<ComplianceSummary> {
        self.get_json("stats/compliance", &[]).await
    }

    async fn mitre_tactics(&self) -> Result<MitreTactics> {
        self.get_json("stats/mitre", &[]).await
    }

    async fn fim_recent(&self) -> Result<FimRecent> {
        self.get_json("stats/fim/recent", &[]).await
    }

    async fn sca_latest(&self) -> Result<ScaLatest> {
        self.get_json("stats/sca/latest", &[]).await
    }
}
