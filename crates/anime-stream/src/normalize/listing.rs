//! Listings: home feed, recent releases, search results, recommendations,
//! and the download link table.

use super::anilist;
use super::fields::{self, first_count, first_number, first_present};
use serde_json::Value;
use shared::{AnimeSummary, DownloadLink, HomeFeed, SourceKind};
use tracing::debug;

/// Where listing arrays may live, checked in order
const LISTING_PATHS: &[&[&str]] = &[
    &[],
    &["results"],
    &["results", "results"],
    &["gogoPopular"],
    &["gogoRecent"],
];

const TRENDING_PATHS: &[&[&str]] = &[&["trending", "media"], &["trending"]];
const POPULAR_PATHS: &[&[&str]] = &[&["popular", "results"], &["popular"], &["gogoPopular"]];
const RECENT_PATHS: &[&[&str]] = &[&["recent", "results"], &["recent"], &["gogoRecent"]];

fn at_path<'a>(raw: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(raw, |value, key| value.get(*key))
}

/// First array found along `paths`
pub fn first_array<'a>(raw: &'a Value, paths: &[&[&str]]) -> Option<&'a Vec<Value>> {
    paths.iter().find_map(|path| at_path(raw, path).and_then(Value::as_array))
}

pub fn listing(raw: &Value) -> Vec<AnimeSummary> {
    summaries(first_array(raw, LISTING_PATHS))
}

pub fn home(raw: &Value) -> HomeFeed {
    let raw = match raw.get("results") {
        Some(inner) if inner.is_object() => inner,
        _ => raw,
    };

    let feed = HomeFeed {
        trending: summaries(first_array(raw, TRENDING_PATHS)),
        popular: summaries(first_array(raw, POPULAR_PATHS)),
        recent: summaries(first_array(raw, RECENT_PATHS)),
    };

    debug!(
        trending = feed.trending.len(),
        popular = feed.popular.len(),
        recent = feed.recent.len(),
        "Mapped home feed"
    );

    feed
}

/// `hasNextPage` at the top level or inside `results`; absent means "maybe more"
pub fn has_next_page(raw: &Value) -> bool {
    let flag = raw
        .get("hasNextPage")
        .or_else(|| raw.get("results").and_then(|r| r.get("hasNextPage")));
    !matches!(flag, Some(Value::Bool(false)))
}

fn summaries(items: Option<&Vec<Value>>) -> Vec<AnimeSummary> {
    items
        .map(|items| items.iter().filter_map(summary).collect())
        .unwrap_or_default()
}

/// One listing card, AniList-shaped or flat
pub fn summary(raw: &Value) -> Option<AnimeSummary> {
    if !raw.is_object() {
        return None;
    }
    if raw.get("title").is_some_and(Value::is_object) {
        return Some(anilist::summary(raw));
    }

    let title = first_present(raw, &["title", "name"]).unwrap_or_else(|| "Unknown Anime".to_string());
    let raw_id = first_present(raw, &["id", "animeId"])?;
    let episode_label = first_present(raw, &["episode", "episodeNumber"])
        .and_then(|e| fields::first_digits(&e))
        .or_else(|| fields::episode_suffix(&raw_id).map(str::to_string));
    let source = match first_present(raw, &["source"]).as_deref() {
        Some("telegram") => SourceKind::Telegram,
        Some("gogoanime") | Some("gogo") => SourceKind::GogoAnime,
        _ => SourceKind::Generic,
    };

    Some(AnimeSummary {
        id: fields::strip_episode_suffix(&raw_id).to_string(),
        is_dub: fields::is_dub(&title),
        image: first_present(raw, fields::IMAGE_KEYS),
        release: first_present(raw, fields::RELEASE_KEYS),
        episode_label,
        format: first_present(raw, &["type", "format", "subOrDub"]),
        status: first_present(raw, &["status"]),
        score: first_number(raw, &["score", "rating"]),
        total_episodes: first_count(raw, &["totalEpisodes"]),
        description: first_present(raw, fields::SYNOPSIS_KEYS).map(|d| fields::strip_tags(&d)),
        title,
        source,
    })
}

/// Map `{"<w>x<h>": url}` to `<h>p` links, lowest quality first
pub fn downloads(raw: &Value) -> Vec<DownloadLink> {
    let Some(table) = fields::unwrap_results(raw).as_object() else {
        return Vec::new();
    };

    let mut links: Vec<(u32, DownloadLink)> = table
        .iter()
        .filter_map(|(key, value)| {
            let url = fields::as_text(value)?;
            let height = key.rsplit_once('x').map(|(_, h)| h.trim()).unwrap_or(key);
            let quality = match height.parse::<u32>() {
                Ok(h) => format!("{}p", h),
                Err(_) => key.clone(),
            };
            Some((height.parse().unwrap_or(u32::MAX), DownloadLink { quality, url }))
        })
        .collect();

    links.sort_by_key(|(height, _)| *height);
    links.into_iter().map(|(_, link)| link).collect()
}
