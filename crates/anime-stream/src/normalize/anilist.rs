//! AniList media objects.
//!
//! Titles come as `{userPreferred, english, romaji, native}` and descriptions
//! may contain HTML markup.

use super::fields::{self, as_text, first_count, first_number, first_present};
use serde_json::Value;
use shared::{Anime, AnimeSummary, SourceKind};

/// Title preference, most preferred first
pub const TITLE_PREFERENCE: &[&str] = &["userPreferred", "english", "romaji", "native"];

const UNKNOWN_TITLE: &str = "Unknown";

/// Primary title and the next preferred title that differs from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Titles {
    pub primary: String,
    pub other: String,
}

pub fn titles(title: Option<&Value>) -> Titles {
    let candidates: Vec<String> = TITLE_PREFERENCE
        .iter()
        .filter_map(|key| title.and_then(|t| t.get(*key)).and_then(as_text))
        .collect();

    let primary = candidates
        .first()
        .cloned()
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string());
    let other = candidates
        .iter()
        .find(|candidate| **candidate != primary)
        .cloned()
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string());

    Titles { primary, other }
}

fn cover(raw: &Value) -> Option<String> {
    raw.get("coverImage")
        .and_then(|c| first_present(c, &["extraLarge", "large", "medium"]))
        .or_else(|| first_present(raw, fields::IMAGE_KEYS))
}

fn description(raw: &Value) -> Option<String> {
    first_present(raw, &["description"])
        .map(|d| fields::strip_tags(&d))
        .filter(|d| !d.is_empty())
}

fn release(raw: &Value) -> Option<String> {
    first_present(raw, &["seasonYear"])
        .or_else(|| raw.get("startDate").and_then(|d| first_present(d, &["year"])))
}

pub fn anime_detail(raw: &Value) -> Anime {
    let Titles { primary, other } = titles(raw.get("title"));

    Anime {
        id: first_present(raw, &["id"]).unwrap_or_else(|| primary.clone()),
        other_name: (other != UNKNOWN_TITLE).then_some(other),
        image: cover(raw),
        banner: first_present(raw, &["bannerImage"]),
        synopsis: description(raw),
        format: first_present(raw, &["format"]),
        status: first_present(raw, &["status"]),
        release: release(raw),
        genres: fields::genres_of(raw),
        total_episodes: first_count(raw, &["episodes", "totalEpisodes"]),
        episodes: super::episode_list(raw.get("episodesList")),
        name: primary,
        source: SourceKind::AniList,
    }
}

/// Listing card; the primary title doubles as the detail-page key
pub fn summary(raw: &Value) -> AnimeSummary {
    let Titles { primary, .. } = titles(raw.get("title"));

    AnimeSummary {
        id: primary.clone(),
        is_dub: fields::is_dub(&primary),
        image: cover(raw),
        release: release(raw),
        episode_label: None,
        format: first_present(raw, &["format"]),
        status: first_present(raw, &["status"]),
        score: first_number(raw, &["meanScore", "averageScore"]),
        total_episodes: first_count(raw, &["episodes"]),
        description: description(raw),
        title: primary,
        source: SourceKind::AniList,
    }
}
