//! GogoAnime-style payloads: flat objects whose fields go by several aliases.

use super::fields::{self, first_present, genres_of};
use super::episode_list;
use serde_json::Value;
use shared::{Anime, EpisodeDetail, SourceKind, Variant};

pub fn anime_detail(raw: &Value) -> Anime {
    let name = first_present(raw, &["name", "title"]).unwrap_or_else(|| "Unknown Anime".to_string());
    let episodes = episode_list(raw.get("episodes").or_else(|| raw.get("episodesList")));

    Anime {
        id: first_present(raw, &["id", "animeId"]).unwrap_or_else(|| name.clone()),
        other_name: first_present(raw, fields::OTHER_NAME_KEYS),
        image: first_present(raw, fields::IMAGE_KEYS),
        banner: None,
        synopsis: first_present(raw, fields::SYNOPSIS_KEYS),
        format: first_present(raw, &["type", "subOrDub"]),
        status: first_present(raw, &["status"]),
        release: first_present(raw, fields::RELEASE_KEYS),
        genres: genres_of(raw),
        total_episodes: fields::total_episodes(raw, &episodes),
        episodes,
        name,
        source: SourceKind::GogoAnime,
    }
}

/// Episode detail with a `sources` array of `{url|file, quality|label}`
pub fn episode_detail(raw: &Value, episode_id: &str) -> EpisodeDetail {
    let language = first_present(raw, &["language"]).unwrap_or_else(|| {
        if fields::is_dub(episode_id) {
            "DUB".to_string()
        } else {
            "SUB".to_string()
        }
    });

    let variants = raw
        .get("sources")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let url = first_present(item, &["url", "file"])?;
                    Some(Variant {
                        language: first_present(item, &["language"]).unwrap_or_else(|| language.clone()),
                        quality: first_present(item, &["quality", "label"])
                            .unwrap_or_else(|| "default".to_string()),
                        direct_url: Some(url),
                        channel: None,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    EpisodeDetail {
        name: first_present(raw, &["name", "title"]).unwrap_or_else(|| episode_id.to_string()),
        episode: super::episode_of(raw, episode_id),
        variants,
        source: SourceKind::GogoAnime,
    }
}
