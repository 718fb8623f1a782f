//! Data models for the project.
//!
//! The normalized view of everything the upstream API returns, independent of
//! which upstream schema produced it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// User-facing episode number; may be fractional for specials (`12.5`)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ordinal(f64);

impl Ordinal {
    /// Wrap a finite value; NaN and infinities are rejected
    pub fn new(value: f64) -> Option<Self> {
        value.is_finite().then_some(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// True when the ordinal has no fractional part
    pub fn is_whole(self) -> bool {
        self.0.fract() == 0.0
    }
}

impl From<u32> for Ordinal {
    fn from(value: u32) -> Self {
        Self(f64::from(value))
    }
}

impl fmt::Display for Ordinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_whole() {
            write!(f, "{}", self.0 as i64)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Which upstream schema a payload was recognized as
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Telegram,
    GogoAnime,
    AniList,
    Generic,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Telegram => "telegram",
            SourceKind::GogoAnime => "gogoanime",
            SourceKind::AniList => "anilist",
            SourceKind::Generic => "generic",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full anime details, built once per detail-page load
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anime {
    /// Opaque key, used verbatim in later requests
    pub id: String,
    pub name: String,
    pub other_name: Option<String>,
    pub image: Option<String>,
    pub banner: Option<String>,
    pub synopsis: Option<String>,
    pub format: Option<String>,
    pub status: Option<String>,
    pub release: Option<String>,
    pub genres: Vec<String>,
    pub total_episodes: Option<u32>,
    /// In upstream order; ordinals may skip or repeat
    pub episodes: Vec<Episode>,
    pub source: SourceKind,
}

/// One entry of an anime's episode list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub ordinal: Option<Ordinal>,
    /// Opaque identifier used to build episode URLs
    pub id: String,
    /// Raw text after `-episode-` in the identifier, if any
    pub suffix: Option<String>,
}

/// A (channel, message) location on the video-hosting platform
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelMessage {
    pub channel: String,
    pub message_id: String,
}

/// One playable rendition of an episode
///
/// At least one of `direct_url` and `channel` is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub language: String,
    pub quality: String,
    pub direct_url: Option<String>,
    pub channel: Option<ChannelMessage>,
}

impl Variant {
    /// Human-readable button label, e.g. `720p ENGLISH`
    pub fn label(&self) -> String {
        format!("{} {}", self.quality, self.language)
    }
}

/// Episode page payload: the episode plus its playable variants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeDetail {
    pub name: String,
    pub episode: Episode,
    pub variants: Vec<Variant>,
    pub source: SourceKind,
}

/// Card-sized anime entry used by listings, search and recommendations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimeSummary {
    /// Key for the detail page
    pub id: String,
    pub title: String,
    pub image: Option<String>,
    pub release: Option<String>,
    pub episode_label: Option<String>,
    pub format: Option<String>,
    pub status: Option<String>,
    pub score: Option<f64>,
    pub total_episodes: Option<u32>,
    pub description: Option<String>,
    pub is_dub: bool,
    pub source: SourceKind,
}

/// Home page feed split by section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HomeFeed {
    pub trending: Vec<AnimeSummary>,
    pub popular: Vec<AnimeSummary>,
    pub recent: Vec<AnimeSummary>,
}

/// Direct download link for one quality
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadLink {
    pub quality: String,
    pub url: String,
}
