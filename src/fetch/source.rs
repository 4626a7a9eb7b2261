//! Remote contact source.
//!
//! The paginator talks to a [`PageSource`], which only knows how to
//! issue one page request and hand back the raw status and body.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Raw answer to one page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResponse {
    pub status: u16,
    pub body: String,
}

impl PageResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// A transport-level failure: the request never produced a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportFailure(pub String);

/// A paginated listing endpoint.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Request `limit` records starting at `offset`.
    async fn fetch_page(&self, limit: usize, offset: usize)
        -> Result<PageResponse, TransportFailure>;
}

/// Settings for [`HttpPageSource`].
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    /// Base URL of the CRM API, without trailing slash.
    pub api_url: String,
    pub api_key: String,
    pub timeout_seconds: u64,
}

/// Brevo-style contacts endpoint over HTTP.
pub struct HttpPageSource {
    config: HttpSourceConfig,
    http_client: reqwest::Client,
}

impl HttpPageSource {
    pub fn new(config: HttpSourceConfig) -> reqwest::Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn contacts_url(&self) -> String {
        format!("{}/contacts", self.config.api_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch_page(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<PageResponse, TransportFailure> {
        let url = self.contacts_url();
        debug!("GET {} limit={} offset={}", url, limit, offset);

        let response = self
            .http_client
            .get(&url)
            .query(&[("limit", limit), ("offset", offset)])
            .header("api-key", &self.config.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportFailure(format!(
                        "request timed out after {}s",
                        self.config.timeout_seconds
                    ))
                } else if e.is_connect() {
                    TransportFailure(format!("cannot connect to {}", self.config.api_url))
                } else {
                    TransportFailure(format!("failed to send request: {}", e))
                }
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportFailure(format!("failed to read response body: {}", e)))?;

        Ok(PageResponse { status, body })
    }
}
