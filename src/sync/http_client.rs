//! HTTP transport and single fetch attempts for calendar feeds
//!
//! [`HttpTransport`] is the seam to the network. [`FeedFetcher`] wraps it with
//! the request timeout and User-Agent, and classifies each attempt as a
//! success, a retryable failure, or a fatal failure.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{RetryableError, SyncError};

/// Raw response of a GET request
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// Status code
    pub status: u16,
    /// Reason phrase
    pub reason: String,
    /// Response body
    pub body: Bytes,
}

impl HttpResponse {
    /// Build a response with the canonical reason phrase for `status`
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        let reason = StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("")
            .to_string();
        Self {
            status,
            reason,
            body: body.into(),
        }
    }
}

/// Network seam used by the fetcher
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Issue a GET request with the given headers and timeout
    async fn get(
        &self,
        url: &str,
        headers: &HeaderMap,
        timeout: Duration,
    ) -> Result<HttpResponse, SyncError>;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Create a transport with a fresh client
    pub fn new() -> Result<Self, SyncError> {
        let client = Client::builder()
            .build()
            .map_err(|e| SyncError::Network(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Create a transport with a custom reqwest Client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(
        &self,
        url: &str,
        headers: &HeaderMap,
        timeout: Duration,
    ) -> Result<HttpResponse, SyncError> {
        debug!(url = url, "Sending HTTP GET request");

        let response = self
            .client
            .get(url)
            .headers(headers.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        debug!(
            url = url,
            status = status.as_u16(),
            body_size = body.len(),
            "Received response"
        );

        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("").to_string(),
            body,
        })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> SyncError {
    if e.is_timeout() {
        SyncError::NetworkTimeout
    } else if e.is_builder() {
        SyncError::InvalidUrl(e.to_string())
    } else if e.is_connect() {
        SyncError::ConnectionRefused
    } else {
        SyncError::Network(e.to_string())
    }
}

/// Classified result of one fetch attempt
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// HTTP 200 with the feed body
    Success(Bytes),
    /// Failure worth retrying
    Retryable(SyncError),
    /// Failure that retrying cannot fix
    Fatal(SyncError),
}

/// Performs single, time-bounded feed downloads
#[derive(Clone)]
pub struct FeedFetcher {
    transport: Arc<dyn HttpTransport>,
    headers: HeaderMap,
    timeout: Duration,
}

impl FeedFetcher {
    /// Create a fetcher sending `user_agent` and giving up after `timeout`
    pub fn new(transport: Arc<dyn HttpTransport>, user_agent: &str, timeout: Duration) -> Self {
        let mut headers = HeaderMap::new();
        match HeaderValue::from_str(user_agent) {
            Ok(value) => {
                headers.insert(USER_AGENT, value);
            }
            Err(_) => {
                warn!(user_agent = user_agent, "Ignoring invalid User-Agent");
            }
        }

        Self {
            transport,
            headers,
            timeout,
        }
    }

    /// Create a fetcher from application configuration
    pub fn from_config(transport: Arc<dyn HttpTransport>, config: &Config) -> Self {
        Self::new(
            transport,
            &config.http.user_agent,
            config.sync.request_timeout(),
        )
    }

    /// Request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Perform one GET of `url` and classify the result
    pub async fn attempt(&self, url: &str) -> AttemptOutcome {
        // Bound the call even if the transport ignores its timeout argument
        let result = tokio::time::timeout(
            self.timeout,
            self.transport.get(url, &self.headers, self.timeout),
        )
        .await
        .unwrap_or(Err(SyncError::NetworkTimeout));

        match result {
            Ok(response) if response.status == StatusCode::OK.as_u16() => {
                AttemptOutcome::Success(response.body)
            }
            Ok(response) => AttemptOutcome::Retryable(SyncError::HttpStatus {
                status: response.status,
                reason: response.reason,
            }),
            Err(err) if err.is_retryable() => AttemptOutcome::Retryable(err),
            Err(err) => AttemptOutcome::Fatal(err),
        }
    }
}

impl std::fmt::Debug for FeedFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedFetcher")
            .field("headers", &self.headers)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
