//! Playback locators and the strategies that resolve them.
//!
//! A variant either carries a directly playable URL or only a channel message
//! on the video-hosting platform. Resolution runs an ordered list of
//! strategies; the first one that produces a locator wins.

use crate::api::ApiClient;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use shared::{ChannelMessage, Variant};
use tracing::{debug, warn};

/// Public page for a channel message on the hosting platform
const CHANNEL_LINK_BASE: &str = "https://t.me";

/// Fields the stream endpoints may put the resolved URL under
const STREAM_URL_KEYS: &[&str] = &["videoUrl", "url", "streamUrl"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlaybackLocatorKind {
    /// Embeddable in the player
    DirectUrl,
    /// Only openable externally; auto-play not guaranteed
    ChannelMessageLink,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlaybackLocator {
    DirectUrl {
        url: String,
    },
    ChannelMessageLink {
        channel: String,
        message_id: String,
        url: String,
    },
}

impl PlaybackLocator {
    pub fn channel_link(message: &ChannelMessage) -> Self {
        PlaybackLocator::ChannelMessageLink {
            channel: message.channel.clone(),
            message_id: message.message_id.clone(),
            url: format!("{}/{}/{}", CHANNEL_LINK_BASE, message.channel, message.message_id),
        }
    }

    /// Direct URL if the variant has one, else the channel link
    pub fn for_variant(variant: &Variant) -> Option<Self> {
        match (&variant.direct_url, &variant.channel) {
            (Some(url), _) => Some(PlaybackLocator::DirectUrl { url: url.clone() }),
            (None, Some(message)) => Some(Self::channel_link(message)),
            (None, None) => None,
        }
    }

    pub fn kind(&self) -> PlaybackLocatorKind {
        match self {
            PlaybackLocator::DirectUrl { .. } => PlaybackLocatorKind::DirectUrl,
            PlaybackLocator::ChannelMessageLink { .. } => PlaybackLocatorKind::ChannelMessageLink,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            PlaybackLocator::DirectUrl { url } | PlaybackLocator::ChannelMessageLink { url, .. } => url,
        }
    }
}

/// One way of turning a variant into a locator
#[async_trait]
pub trait LocatorStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn resolve(&self, variant: &Variant) -> Option<PlaybackLocator>;
}

/// Uses the URL the variant already carries
pub struct DirectUrlStrategy;

#[async_trait]
impl LocatorStrategy for DirectUrlStrategy {
    fn name(&self) -> &'static str {
        "direct-url"
    }

    async fn resolve(&self, variant: &Variant) -> Option<PlaybackLocator> {
        variant
            .direct_url
            .as_ref()
            .map(|url| PlaybackLocator::DirectUrl { url: url.clone() })
    }
}

/// Asks the API's stream endpoints for a direct URL to a channel message
pub struct StreamEndpointStrategy {
    client: ApiClient,
}

impl StreamEndpointStrategy {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

fn stream_url(value: &Value) -> Option<String> {
    let value = crate::normalize::fields::unwrap_results(value);
    crate::normalize::fields::first_present(value, STREAM_URL_KEYS)
}

#[async_trait]
impl LocatorStrategy for StreamEndpointStrategy {
    fn name(&self) -> &'static str {
        "stream-endpoint"
    }

    async fn resolve(&self, variant: &Variant) -> Option<PlaybackLocator> {
        let message = variant.channel.as_ref()?;

        match self.client.stream(&message.channel, &message.message_id).await {
            Ok(value) => {
                if let Some(url) = stream_url(&value) {
                    return Some(PlaybackLocator::DirectUrl { url });
                }
            }
            Err(e) => warn!(channel = %message.channel, error = %e, "Stream endpoint failed"),
        }

        match self
            .client
            .direct_stream(&message.channel, &message.message_id)
            .await
        {
            Ok(value) => stream_url(&value).map(|url| PlaybackLocator::DirectUrl { url }),
            Err(e) => {
                warn!(channel = %message.channel, error = %e, "Direct stream endpoint failed");
                None
            }
        }
    }
}

/// Falls back to the public channel message page
pub struct ChannelLinkStrategy;

#[async_trait]
impl LocatorStrategy for ChannelLinkStrategy {
    fn name(&self) -> &'static str {
        "channel-link"
    }

    async fn resolve(&self, variant: &Variant) -> Option<PlaybackLocator> {
        variant.channel.as_ref().map(PlaybackLocator::channel_link)
    }
}

/// Ordered chain of strategies
pub struct LocatorResolver {
    strategies: Vec<Box<dyn LocatorStrategy>>,
}

impl LocatorResolver {
    pub fn new(strategies: Vec<Box<dyn LocatorStrategy>>) -> Self {
        Self { strategies }
    }

    /// Direct URL, then the stream endpoints, then the channel link
    pub fn with_defaults(client: ApiClient) -> Self {
        Self::new(vec![
            Box::new(DirectUrlStrategy),
            Box::new(StreamEndpointStrategy::new(client)),
            Box::new(ChannelLinkStrategy),
        ])
    }

    /// Resolution without network round-trips
    pub fn offline() -> Self {
        Self::new(vec![Box::new(DirectUrlStrategy), Box::new(ChannelLinkStrategy)])
    }

    pub async fn resolve(&self, variant: &Variant) -> Option<PlaybackLocator> {
        for strategy in &self.strategies {
            if let Some(locator) = strategy.resolve(variant).await {
                debug!(
                    strategy = strategy.name(),
                    kind = ?locator.kind(),
                    quality = %variant.quality,
                    "Resolved playback locator"
                );
                return Some(locator);
            }
        }

        warn!(variant = %variant.label(), "No strategy produced a playback locator");
        None
    }
}
