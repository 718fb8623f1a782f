//! Upstream API client with server-pool selection and bounded retries.

use super::pool::ServerPool;
use super::retry::RetryPolicy;
use super::transport::{ReqwestTransport, Transport};
use crate::error::FetchError;
use anyhow::{Context, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;
use shared::config::ApiConfig;
use std::sync::Arc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Characters left as-is inside a path segment (RFC 3986 unreserved)
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// JSON API client
///
/// Cheap to clone; clones share the transport and pool.
#[derive(Clone)]
pub struct ApiClient {
    /// HTTP transport
    transport: Arc<dyn Transport>,
    /// Base URLs, one picked per attempt
    pool: ServerPool,
    /// Value of the referer header
    origin: String,
    /// Attempt budget and backoff
    policy: RetryPolicy,
    /// Aborts in-flight attempts and backoff sleeps
    cancel: CancellationToken,
}

impl ApiClient {
    /// Create a client from the `[api]` config section
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config).context("Failed to create HTTP client")?;
        Self::with_transport(Arc::new(transport), config)
    }

    /// Create a client over an explicit transport
    pub fn with_transport(transport: Arc<dyn Transport>, config: &ApiConfig) -> Result<Self> {
        let pool = ServerPool::new(&config.servers).context("Invalid server pool")?;

        info!(
            servers = pool.len(),
            max_attempts = config.max_attempts,
            backoff = ?config.backoff,
            "API client created"
        );

        Ok(Self {
            transport,
            pool,
            origin: config.origin.clone(),
            policy: RetryPolicy::from_config(config),
            cancel: CancellationToken::new(),
        })
    }

    /// A client whose requests stop when `cancel` fires
    pub fn with_cancellation(&self, cancel: CancellationToken) -> Self {
        Self {
            cancel,
            ..self.clone()
        }
    }

    /// A client scoped to a child of this client's token
    pub fn scoped(&self) -> Self {
        self.with_cancellation(self.cancel.child_token())
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Fetch a path from the pool and decode it as JSON
    ///
    /// Network errors, non-2xx statuses and undecodable bodies are all retried
    /// until the attempt budget runs out.
    pub async fn fetch_json(&self, path: &str) -> Result<Value, FetchError> {
        let max_attempts = self.policy.max_attempts;
        let mut last_url = String::new();
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            let url = self.pool.url_for(path);
            debug!(url = %url, attempt, max_attempts, "Making API request");

            let outcome = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    return Err(FetchError::Cancelled { url });
                }
                outcome = self.attempt(&url) => outcome,
            };

            match outcome {
                Ok(value) => {
                    debug!(url = %url, attempt, "Request successful");
                    return Ok(value);
                }
                Err(reason) => {
                    warn!(url = %url, attempt, error = %reason, "Request failed");
                    last_error = reason;
                }
            }

            if attempt < max_attempts {
                let delay = self.policy.delay_after(attempt);
                if !delay.is_zero() {
                    debug!(delay_ms = delay.as_millis() as u64, "Retrying after delay");
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => {
                            return Err(FetchError::Cancelled { url });
                        }
                        _ = sleep(delay) => {}
                    }
                }
            }

            last_url = url;
        }

        Err(FetchError::ExhaustedRetries {
            url: last_url,
            attempts: max_attempts,
            last_error,
        })
    }

    async fn attempt(&self, url: &str) -> Result<Value, String> {
        let response = self
            .transport
            .get(url, &self.origin)
            .await
            .map_err(|e| e.to_string())?;

        if !response.is_success() {
            return Err(format!("HTTP {}", response.status));
        }

        serde_json::from_str(&response.body).map_err(|e| format!("Failed to parse response: {}", e))
    }

    /// `GET /home`
    pub async fn home(&self) -> Result<Value, FetchError> {
        info!("Fetching home feed");
        self.fetch_json("/home").await
    }

    /// `GET /anime/{id}`
    pub async fn anime(&self, anime_id: &str) -> Result<Value, FetchError> {
        info!(anime_id = anime_id, "Fetching anime details");
        self.fetch_json(&format!("/anime/{}", encode_segment(anime_id)))
            .await
    }

    /// `GET /episode/{id}`
    pub async fn episode(&self, episode_id: &str) -> Result<Value, FetchError> {
        info!(episode_id = episode_id, "Fetching episode");
        self.fetch_json(&format!("/episode/{}", encode_segment(episode_id)))
            .await
    }

    /// `GET /recommendations/{title}`, spaces in the title sent as `+`
    pub async fn recommendations(&self, title: &str) -> Result<Value, FetchError> {
        info!(title = title, "Fetching recommendations");
        let encoded = title
            .split(' ')
            .map(encode_segment)
            .collect::<Vec<_>>()
            .join("+");
        self.fetch_json(&format!("/recommendations/{}", encoded)).await
    }

    /// `GET /recent/{page}`
    pub async fn recent(&self, page: u32) -> Result<Value, FetchError> {
        info!(page = page, "Fetching recent releases");
        self.fetch_json(&format!("/recent/{}", page)).await
    }

    /// `GET /search/{query}?page={page}`
    pub async fn search(&self, query: &str, page: u32) -> Result<Value, FetchError> {
        info!(query = query, page = page, "Searching anime");
        self.fetch_json(&format!("/search/{}?page={}", encode_segment(query), page))
            .await
    }

    /// `GET /download/{episode_id}`
    pub async fn download(&self, episode_id: &str) -> Result<Value, FetchError> {
        info!(episode_id = episode_id, "Fetching download links");
        self.fetch_json(&format!("/download/{}", encode_segment(episode_id)))
            .await
    }

    /// `GET /stream/{channel}/{message_id}`
    pub async fn stream(&self, channel: &str, message_id: &str) -> Result<Value, FetchError> {
        debug!(channel = channel, message_id = message_id, "Resolving stream URL");
        self.fetch_json(&format!(
            "/stream/{}/{}",
            encode_segment(channel),
            encode_segment(message_id)
        ))
        .await
    }

    /// `GET /direct-stream/{channel}/{message_id}`
    pub async fn direct_stream(&self, channel: &str, message_id: &str) -> Result<Value, FetchError> {
        debug!(channel = channel, message_id = message_id, "Resolving direct stream URL");
        self.fetch_json(&format!(
            "/direct-stream/{}/{}",
            encode_segment(channel),
            encode_segment(message_id)
        ))
        .await
    }
}

/// Percent-encode one path segment
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}
