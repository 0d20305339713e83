//! HTTP date source
//!
//! Talks to a remote dates API:
//!
//! - `GET    {base}/api/dates`        → `["2024-01-01", ...]`
//! - `POST   {base}/api/dates`        ← `{"date": "2024-01-01"}`
//! - `DELETE {base}/api/dates/{date}`
//!
//! Authentication is the server's business; an optional bearer token is
//! forwarded as-is.

use super::{DateSource, SourceError, SourceResult};
use crate::calendar::{parse, RecordedDate};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;

/// Configuration for the HTTP source
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    /// Base URL of the dates API (e.g., "http://localhost:3000")
    pub base_url: String,
    /// Bearer token sent with every request
    pub token: Option<String>,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            token: None,
            request_timeout_ms: 10_000,
        }
    }
}

/// Date source backed by a remote REST API
pub struct HttpSource {
    client: Client,
    config: HttpSourceConfig,
}

#[derive(Debug, Serialize)]
struct PersistRequest {
    date: RecordedDate,
}

impl HttpSource {
    pub fn new(config: HttpSourceConfig) -> SourceResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpSourceConfig {
        &self.config
    }

    fn base(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn dates_url(&self) -> String {
        format!("{}/api/dates", self.base())
    }

    fn date_url(&self, date: RecordedDate) -> String {
        format!("{}/api/dates/{}", self.base(), date)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> SourceResult<Response> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(SourceError::from_transport)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            return Err(SourceError::NotAuthenticated);
        }

        let message = response.text().await.unwrap_or_default();
        Err(SourceError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Keep the well-formed entries of a date listing
fn parse_listing(raw: Vec<String>) -> Vec<RecordedDate> {
    raw.into_iter()
        .filter_map(|entry| match parse(&entry) {
            Ok(date) => Some(date),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed date from dates API");
                None
            }
        })
        .collect()
}

#[async_trait]
impl DateSource for HttpSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_all(&self) -> SourceResult<Vec<RecordedDate>> {
        let response = self.send(self.client.get(self.dates_url())).await?;
        let raw: Vec<String> = response.json().await.map_err(SourceError::Request)?;
        Ok(parse_listing(raw))
    }

    async fn persist(&self, date: RecordedDate) -> SourceResult<()> {
        let request = self
            .client
            .post(self.dates_url())
            .json(&PersistRequest { date });

        match self.send(request).await {
            Err(SourceError::Api { status: 409, .. }) => Err(SourceError::AlreadyRecorded(date)),
            other => other.map(|_| ()),
        }
    }

    async fn delete(&self, date: RecordedDate) -> SourceResult<()> {
        self.send(self.client.delete(self.date_url(date))).await?;
        Ok(())
    }
}
