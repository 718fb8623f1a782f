//! Response normalization.
//!
//! The upstream API answers in several schemas depending on which backend
//! served the request. Each payload is classified into a [`SourceKind`] and
//! handed to exactly one pure mapping function for that kind.

pub mod anilist;
pub mod fields;
pub mod gogoanime;
pub mod listing;
pub mod telegram;

use crate::error::NormalizeError;
use serde_json::Value;
use shared::config::NormalizerConfig;
use shared::{Anime, AnimeSummary, DownloadLink, Episode, EpisodeDetail, HomeFeed, SourceKind};
use tracing::{debug, warn};

pub use fields::{ordinal_from_id, parse_ordinal};

/// Keys that carry an explicit episode ordinal
const ORDINAL_KEYS: &[&str] = &["number", "episodeNum", "episodeNumber", "episode"];

/// Maps raw payloads onto the shared model
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    fallback_to_gogoanime: bool,
}

impl Normalizer {
    pub fn new(config: &NormalizerConfig) -> Self {
        Self {
            fallback_to_gogoanime: config.fallback_to_gogoanime,
        }
    }

    /// Classify a detail payload (already unwrapped from `results`)
    ///
    /// An explicit `source` tag wins; untagged payloads are sniffed.
    pub fn detect_source(&self, raw: &Value) -> Result<SourceKind, NormalizeError> {
        if !raw.is_object() {
            return Err(NormalizeError::UnrecognizedShape(format!(
                "expected an object, got {}",
                kind_of(raw)
            )));
        }

        if let Some(tag) = raw.get("source").and_then(Value::as_str) {
            return match tag.trim().to_ascii_lowercase().as_str() {
                "telegram" => Ok(SourceKind::Telegram),
                "gogoanime" | "gogo" => Ok(SourceKind::GogoAnime),
                "anilist" => Ok(SourceKind::AniList),
                other if self.fallback_to_gogoanime => {
                    warn!(source = other, "Unknown source, treating as gogoanime");
                    Ok(SourceKind::GogoAnime)
                }
                other => Err(NormalizeError::UnrecognizedSource(other.to_string())),
            };
        }

        let kind = sniff(raw).ok_or_else(|| {
            NormalizeError::UnrecognizedSource("untagged payload matches no known shape".to_string())
        })?;
        debug!(source = %kind, "Detected source by shape");
        Ok(kind)
    }

    /// `GET /anime/{id}` payload → [`Anime`]
    pub fn normalize_anime_detail(&self, raw: &Value) -> Result<Anime, NormalizeError> {
        let raw = fields::unwrap_results(raw);
        let anime = match self.detect_source(raw)? {
            SourceKind::Telegram => telegram::anime_detail(raw),
            SourceKind::AniList => anilist::anime_detail(raw),
            SourceKind::GogoAnime | SourceKind::Generic => gogoanime::anime_detail(raw),
        };

        debug!(
            name = %anime.name,
            source = %anime.source,
            episodes = anime.episodes.len(),
            "Normalized anime detail"
        );
        Ok(anime)
    }

    /// `GET /episode/{id}` payload → [`EpisodeDetail`]
    ///
    /// `episode_id` is the identifier the payload was requested with; it backs
    /// the ordinal when the payload carries none.
    pub fn normalize_episode(&self, raw: &Value, episode_id: &str) -> Result<EpisodeDetail, NormalizeError> {
        let raw = fields::unwrap_results(raw);
        let detail = match self.detect_source(raw)? {
            SourceKind::Telegram => telegram::episode_detail(raw, episode_id),
            SourceKind::AniList => {
                return Err(NormalizeError::UnrecognizedShape(
                    "anilist payloads carry no episode sources".to_string(),
                ))
            }
            SourceKind::GogoAnime | SourceKind::Generic => gogoanime::episode_detail(raw, episode_id),
        };

        debug!(
            episode_id = episode_id,
            variants = detail.variants.len(),
            "Normalized episode"
        );
        Ok(detail)
    }

    /// Listing/search/recommendation payload → cards; never fails, may be empty
    pub fn normalize_listing(&self, raw: &Value) -> Vec<AnimeSummary> {
        listing::listing(raw)
    }

    pub fn normalize_home(&self, raw: &Value) -> HomeFeed {
        listing::home(raw)
    }

    pub fn normalize_downloads(&self, raw: &Value) -> Vec<DownloadLink> {
        listing::downloads(raw)
    }
}

fn sniff(raw: &Value) -> Option<SourceKind> {
    if raw.get("title").is_some_and(Value::is_object) {
        return Some(SourceKind::AniList);
    }

    let pair_episodes = raw
        .get("episodes")
        .and_then(Value::as_array)
        .and_then(|eps| eps.first())
        .is_some_and(Value::is_array);
    if pair_episodes || raw.get("variants").is_some_and(Value::is_array) {
        return Some(SourceKind::Telegram);
    }

    let gogo_keys = ["plot_summary", "synopsis", "released", "releaseYear", "totalEpisodes", "sources", "episodes"];
    let named = fields::first_present(raw, &["name", "title", "id"]).is_some();
    if named && gogo_keys.iter().any(|key| raw.get(*key).is_some()) {
        return Some(SourceKind::GogoAnime);
    }

    None
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Episode list items: `[label, id]` pairs or `{id|episodeId, number|...}` objects
pub(crate) fn episode_list(value: Option<&Value>) -> Vec<Episode> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::Array(pair) if pair.len() >= 2 => {
                let id = fields::as_text(&pair[1])?;
                let label = fields::as_text(&pair[0]);
                Some(fields::episode(id, label.as_deref()))
            }
            Value::Object(_) => {
                let id = fields::first_present(item, &["id", "episodeId"])?;
                let label = fields::first_present(item, ORDINAL_KEYS);
                Some(fields::episode(id, label.as_deref()))
            }
            _ => None,
        })
        .collect()
}

/// Episode identity of an episode-detail payload
pub(crate) fn episode_of(raw: &Value, episode_id: &str) -> Episode {
    let label = fields::first_present(raw, ORDINAL_KEYS);
    let id = fields::first_present(raw, &["episodeId", "id"]).unwrap_or_else(|| episode_id.to_string());
    let mut episode = fields::episode(id, label.as_deref());
    if episode.ordinal.is_none() {
        episode.ordinal = ordinal_from_id(episode_id);
    }
    episode
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalizer() -> Normalizer {
        Normalizer::default()
    }

    #[test]
    fn test_detect_explicit_tags() {
        let n = normalizer();
        assert_eq!(n.detect_source(&json!({"source": "telegram"})).unwrap(), SourceKind::Telegram);
        assert_eq!(n.detect_source(&json!({"source": "GogoAnime"})).unwrap(), SourceKind::GogoAnime);
        assert_eq!(n.detect_source(&json!({"source": "anilist"})).unwrap(), SourceKind::AniList);
    }

    #[test]
    fn test_unknown_tag_is_unrecognized() {
        let err = normalizer()
            .detect_source(&json!({"source": "zoro", "name": "x"}))
            .unwrap_err();
        assert_eq!(err, NormalizeError::UnrecognizedSource("zoro".to_string()));
    }

    #[test]
    fn test_unknown_tag_with_fallback() {
        let n = Normalizer::new(&NormalizerConfig {
            fallback_to_gogoanime: true,
        });
        assert_eq!(n.detect_source(&json!({"source": "zoro"})).unwrap(), SourceKind::GogoAnime);
    }

    #[test]
    fn test_sniffing() {
        let n = normalizer();
        assert_eq!(n.detect_source(&json!({"title": {"romaji": "x"}})).unwrap(), SourceKind::AniList);
        assert_eq!(
            n.detect_source(&json!({"name": "x", "episodes": [["1", "x-episode-1"]]})).unwrap(),
            SourceKind::Telegram
        );
        assert_eq!(
            n.detect_source(&json!({"name": "x", "plot_summary": "y"})).unwrap(),
            SourceKind::GogoAnime
        );
        assert!(matches!(
            n.detect_source(&json!({"foo": 1})),
            Err(NormalizeError::UnrecognizedSource(_))
        ));
        assert!(matches!(
            n.detect_source(&json!([1, 2])),
            Err(NormalizeError::UnrecognizedShape(_))
        ));
    }

    #[test]
    fn test_each_source_populates_model() {
        let n = normalizer();

        let telegram = n
            .normalize_anime_detail(&json!({"results": {
                "source": "telegram", "name": "T", "image": "i", "description": "d",
                "released": "2020", "status": "s", "type": "TV", "genre": ["g"],
                "episodes": [["1", "t-episode-1"]]
            }}))
            .unwrap();
        let gogo = n
            .normalize_anime_detail(&json!({"results": {
                "source": "gogoanime", "id": "g", "title": "G", "img": "i", "synopsis": "d",
                "releaseYear": "2020", "status": "s", "type": "TV", "genres": "g",
                "episodes": [{"id": "g-episode-1", "number": "1"}]
            }}))
            .unwrap();
        let anilist = n
            .normalize_anime_detail(&json!({"results": {
                "source": "anilist", "id": 1, "title": {"english": "A"},
                "coverImage": {"large": "i"}, "description": "<i>d</i>", "seasonYear": 2020,
                "status": "s", "format": "TV", "genres": ["g"], "episodes": 1
            }}))
            .unwrap();

        for anime in [&telegram, &gogo, &anilist] {
            assert_eq!(anime.image.as_deref(), Some("i"), "{}", anime.source);
            assert_eq!(anime.synopsis.as_deref(), Some("d"), "{}", anime.source);
            assert_eq!(anime.release.as_deref(), Some("2020"), "{}", anime.source);
            assert_eq!(anime.status.as_deref(), Some("s"), "{}", anime.source);
            assert_eq!(anime.format.as_deref(), Some("TV"), "{}", anime.source);
            assert_eq!(anime.genres, vec!["g"], "{}", anime.source);
            assert_eq!(anime.total_episodes, Some(1), "{}", anime.source);
        }
        assert_eq!(telegram.episodes.len(), 1);
        assert_eq!(gogo.episodes.len(), 1);
    }

    #[test]
    fn test_normalize_episode_ordinal_fallback() {
        let detail = normalizer()
            .normalize_episode(
                &json!({"results": {"name": "E", "variants": [
                    {"language": "EN", "quality": "720p", "channelName": "c", "messageId": "1"}
                ]}}),
                "show-episode-12-5",
            )
            .unwrap();

        assert_eq!(detail.episode.id, "show-episode-12-5");
        assert_eq!(detail.episode.ordinal.unwrap().value(), 12.5);
        assert_eq!(detail.source, SourceKind::Telegram);
    }

    #[test]
    fn test_normalize_episode_without_variants() {
        let detail = normalizer()
            .normalize_episode(&json!({"results": {"source": "telegram", "name": "E"}}), "e-episode-1")
            .unwrap();
        assert!(detail.variants.is_empty());
    }

    #[test]
    fn test_episode_list_skips_malformed_items() {
        let episodes = episode_list(Some(&json!([["1"], null, ["2", "x-episode-2"], {"number": 3}])));
        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[0].id, "x-episode-2");
    }
}
