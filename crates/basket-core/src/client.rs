//! Client for the remote price service.
//!
//! [`PriceService`] is the seam the controllers talk to; [`HttpPriceService`]
//! is the real implementation over HTTP.

use crate::{BasketError, Result, ServiceError};
use async_trait::async_trait;
use basket_types::{ErrorBody, HealthResponse, JobAccepted, JobKind, QueryRequest, QueryResponse};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Local-development service address, used when nothing else is configured.
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8080";

/// The remote operations the client depends on.
#[async_trait]
pub trait PriceService: Send + Sync {
    /// `POST /query`. A 2xx body that reports an engine error is returned as
    /// [`ServiceError::Rejected`].
    async fn query(&self, request: &QueryRequest) -> std::result::Result<QueryResponse, ServiceError>;

    /// `POST /scrape` or `POST /import`.
    async fn start_job(&self, kind: JobKind) -> std::result::Result<JobAccepted, ServiceError>;

    /// `GET /health`.
    async fn health(&self) -> std::result::Result<HealthResponse, ServiceError>;
}

/// Configuration for [`HttpPriceService`].
#[derive(Debug, Clone)]
pub struct ServiceClientConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    /// Ask `/query` for the metadata it used to build the query.
    pub debug_queries: bool,
}

impl Default for ServiceClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVICE_URL.to_string(),
            request_timeout: Duration::from_secs(60),
            debug_queries: false,
        }
    }
}

/// [`PriceService`] over HTTP/JSON.
pub struct HttpPriceService {
    client: reqwest::Client,
    base_url: String,
    debug_queries: bool,
}

impl HttpPriceService {
    pub fn new(config: ServiceClientConfig) -> Result<Self> {
        let base_url = normalize_base_url(&config.base_url)?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            debug_queries: config.debug_queries,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl PriceService for HttpPriceService {
    async fn query(&self, request: &QueryRequest) -> std::result::Result<QueryResponse, ServiceError> {
        debug!(
            target: "basket::http",
            "POST /query ({} context turns, debug={})",
            request.conversation_history.len(),
            self.debug_queries
        );

        let mut builder = self.client.post(self.url("/query")).json(request);
        if self.debug_queries {
            builder = builder.query(&[("debug", "true")]);
        }
        let mut response: QueryResponse = decode(builder.send().await?).await?;

        match response.error.take() {
            Some(error) => Err(ServiceError::Rejected(error)),
            None => Ok(response),
        }
    }

    async fn start_job(&self, kind: JobKind) -> std::result::Result<JobAccepted, ServiceError> {
        debug!(target: "basket::http", "POST {}", kind.endpoint());
        let response = self.client.post(self.url(kind.endpoint())).send().await?;
        decode(response).await
    }

    async fn health(&self) -> std::result::Result<HealthResponse, ServiceError> {
        let response = self.client.get(self.url("/health")).send().await?;
        decode(response).await
    }
}

/// Turn a response into `T`, or into a [`ServiceError`] carrying the error
/// body's `detail`.
async fn decode<T: DeserializeOwned>(
    response: reqwest::Response,
) -> std::result::Result<T, ServiceError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|body| body.detail_text());
        debug!(target: "basket::http", "Service returned {}: {:?}", status, detail);
        return Err(ServiceError::Status {
            status: status.as_u16(),
            detail,
        });
    }

    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ServiceError::Malformed(e.to_string()))
}

/// Validate the base URL and strip trailing slashes so paths can be appended.
fn normalize_base_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = reqwest::Url::parse(trimmed).map_err(|e| BasketError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(BasketError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("http://localhost:8080/").unwrap(),
            "http://localhost:8080"
        );
        assert_eq!(
            normalize_base_url(" https://prices.example.com/api// ").unwrap(),
            "https://prices.example.com/api"
        );
    }

    #[test]
    fn test_normalize_rejects_bad_urls() {
        assert!(matches!(
            normalize_base_url("not a url"),
            Err(BasketError::InvalidUrl { .. })
        ));
        assert!(matches!(
            normalize_base_url("ftp://example.com"),
            Err(BasketError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_endpoint_urls() {
        let service = HttpPriceService::new(ServiceClientConfig {
            base_url: "http://127.0.0.1:9000/".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(service.base_url(), "http://127.0.0.1:9000");
        assert_eq!(service.url(JobKind::Scrape.endpoint()), "http://127.0.0.1:9000/scrape");
        assert_eq!(service.url("/health"), "http://127.0.0.1:9000/health");
    }
}
