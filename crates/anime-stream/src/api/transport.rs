//! HTTP transport seam.
//!
//! [`ApiClient`](super::ApiClient) only needs "GET this URL with these headers and
//! give me status + body"; keeping that behind a trait lets the retry loop be
//! exercised without a network.

use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, PRAGMA, REFERER};
use reqwest::Client;
use shared::config::ApiConfig;
use thiserror::Error;

/// Raw HTTP response: status code and body text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Network-level failure before any status code was received
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),
}

/// Performs a single GET, no retries
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, referer: &str) -> Result<RawResponse, TransportError>;
}

/// Production transport backed by `reqwest`
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a client with the configured timeout and user agent
    pub fn new(config: &ApiConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str, referer: &str) -> Result<RawResponse, TransportError> {
        let response = self
            .client
            .get(url)
            .header(REFERER, referer)
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_reqwest_error)?;

        Ok(RawResponse { status, body })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Network(err.to_string())
    }
}
