//! Telegram-backed payloads.
//!
//! Episode lists are `[ordinalLabel, episodeId]` pairs; episode details carry a
//! `variants` array pointing at channel messages, sometimes with a direct URL.

use super::fields::{self, first_present, genres_of};
use super::episode_list;
use serde_json::Value;
use shared::{Anime, ChannelMessage, EpisodeDetail, SourceKind, Variant};
use tracing::{debug, warn};

const DIRECT_URL_KEYS: &[&str] = &["videoUrl", "url", "directUrl"];

pub fn anime_detail(raw: &Value) -> Anime {
    let name = first_present(raw, &["name", "title"]).unwrap_or_else(|| "Unknown Anime".to_string());
    let episodes = episode_list(raw.get("episodes"));

    debug!(name = %name, episodes = episodes.len(), "Mapped telegram anime");

    Anime {
        id: first_present(raw, &["id", "animeId"]).unwrap_or_else(|| name.clone()),
        other_name: first_present(raw, fields::OTHER_NAME_KEYS),
        image: first_present(raw, fields::IMAGE_KEYS),
        banner: first_present(raw, &["banner", "bannerImage"]),
        synopsis: first_present(raw, fields::SYNOPSIS_KEYS),
        format: first_present(raw, &["type", "format"]),
        status: first_present(raw, &["status"]),
        release: first_present(raw, fields::RELEASE_KEYS),
        genres: genres_of(raw),
        total_episodes: fields::total_episodes(raw, &episodes),
        episodes,
        name,
        source: SourceKind::Telegram,
    }
}

pub fn episode_detail(raw: &Value, episode_id: &str) -> EpisodeDetail {
    let variants: Vec<Variant> = raw
        .get("variants")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(variant).collect())
        .unwrap_or_default();

    EpisodeDetail {
        name: first_present(raw, &["name", "title"]).unwrap_or_else(|| "Unknown Episode".to_string()),
        episode: super::episode_of(raw, episode_id),
        variants,
        source: SourceKind::Telegram,
    }
}

fn variant(raw: &Value) -> Option<Variant> {
    let direct_url = first_present(raw, DIRECT_URL_KEYS);
    let channel = match (
        first_present(raw, &["channelName", "channel"]),
        first_present(raw, &["messageId", "msgId"]),
    ) {
        (Some(channel), Some(message_id)) => Some(ChannelMessage {
            channel,
            message_id,
        }),
        _ => None,
    };

    if direct_url.is_none() && channel.is_none() {
        warn!(variant = %raw, "Skipping variant without a playback locator");
        return None;
    }

    Some(Variant {
        language: first_present(raw, &["language", "lang"]).unwrap_or_else(|| "DEFAULT".to_string()),
        quality: first_present(raw, &["quality"]).unwrap_or_else(|| "Auto".to_string()),
        direct_url,
        channel,
    })
}
