//! Field-level helpers shared by every source mapper.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use shared::{Episode, Ordinal};

/// Synopsis aliases, highest priority first
pub const SYNOPSIS_KEYS: &[&str] = &["synopsis", "plot_summary", "description"];
/// Release date aliases, highest priority first
pub const RELEASE_KEYS: &[&str] = &["releaseYear", "released", "release", "releaseDate"];
pub const IMAGE_KEYS: &[&str] = &["image", "img"];
pub const OTHER_NAME_KEYS: &[&str] = &["other_name", "otherNames"];
pub const GENRE_KEYS: &[&str] = &["genres", "genre"];

const EPISODE_MARKER: &str = "-episode-";

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// Render a scalar as text; null, empty strings and containers yield `None`
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// First alias present with a usable value
pub fn first_present(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| raw.get(*key).and_then(as_text))
}

/// Like [`first_present`] but reads a number
pub fn first_number(raw: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| match raw.get(*key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

pub fn first_count(raw: &Value, keys: &[&str]) -> Option<u32> {
    first_number(raw, keys)
        .filter(|n| *n >= 0.0 && n.fract() == 0.0)
        .map(|n| n as u32)
}

/// Parse an episode label: every `-` acts as the decimal separator
///
/// `"12-5"` → `12.5`, `"7"` → `7`. Empty or non-numeric labels yield `None`.
pub fn parse_ordinal(label: &str) -> Option<Ordinal> {
    let normalized = label.trim().replace('-', ".");
    if normalized.is_empty() {
        return None;
    }
    normalized.parse::<f64>().ok().and_then(Ordinal::new)
}

/// Text after `-episode-` in an identifier
pub fn episode_suffix(id: &str) -> Option<&str> {
    id.split_once(EPISODE_MARKER)
        .map(|(_, suffix)| suffix)
        .filter(|suffix| !suffix.is_empty())
}

/// Identifier with any `-episode-<n>` suffix removed
pub fn strip_episode_suffix(id: &str) -> &str {
    id.split_once(EPISODE_MARKER)
        .map(|(anime, _)| anime)
        .unwrap_or(id)
}

/// Ordinal recovered from an `...-episode-<n>` identifier
pub fn ordinal_from_id(id: &str) -> Option<Ordinal> {
    episode_suffix(id).and_then(parse_ordinal)
}

/// Build an episode; an explicit ordinal label wins over the id suffix
pub fn episode(id: String, label: Option<&str>) -> Episode {
    let suffix = episode_suffix(&id).map(str::to_string);
    let ordinal = label
        .and_then(parse_ordinal)
        .or_else(|| suffix.as_deref().and_then(parse_ordinal));

    Episode {
        ordinal,
        id,
        suffix,
    }
}

/// Declared `totalEpisodes`, else the length of the parsed list
pub fn total_episodes(raw: &Value, episodes: &[Episode]) -> Option<u32> {
    first_count(raw, &["totalEpisodes"]).or_else(|| u32::try_from(episodes.len()).ok())
}

/// Accept a comma-separated string or an array of strings
pub fn genres(value: Option<&Value>) -> Vec<String> {
    let parts: Vec<String> = match value {
        Some(Value::String(s)) => s.split(',').map(str::to_string).collect(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Object(_) => item.get("name").and_then(as_text),
                other => as_text(other),
            })
            .collect(),
        _ => Vec::new(),
    };

    parts
        .into_iter()
        .map(|g| g.trim().to_string())
        .filter(|g| !g.is_empty())
        .collect()
}

pub fn genres_of(raw: &Value) -> Vec<String> {
    GENRE_KEYS
        .iter()
        .map(|key| genres(raw.get(*key)))
        .find(|list| !list.is_empty())
        .unwrap_or_default()
}

/// Naive markup removal: drops anything between `<` and `>`
pub fn strip_tags(text: &str) -> String {
    TAG_RE.replace_all(text, "").trim().to_string()
}

/// First run of digits, e.g. `"Episode 12"` → `"12"`
pub fn first_digits(text: &str) -> Option<String> {
    DIGITS_RE.find(text).map(|m| m.as_str().to_string())
}

pub fn is_dub(title: &str) -> bool {
    title.to_lowercase().contains("dub")
}

/// Unwrap a `{results: X}` envelope when present
pub fn unwrap_results(raw: &Value) -> &Value {
    match raw.get("results") {
        Some(inner) if inner.is_object() || inner.is_array() => inner,
        _ => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_ordinal_dash_is_decimal() {
        assert_eq!(parse_ordinal("12-5").unwrap().value(), 12.5);
        assert_eq!(parse_ordinal("7").unwrap().value(), 7.0);
        assert_eq!(parse_ordinal(" 100 ").unwrap().value(), 100.0);
    }

    #[test]
    fn test_parse_ordinal_rejects_garbage() {
        assert!(parse_ordinal("").is_none());
        assert!(parse_ordinal("special").is_none());
        assert!(parse_ordinal("1-2-3").is_none());
    }

    #[test]
    fn test_first_present_priority() {
        let raw = json!({"plot_summary": "second", "description": "third", "synopsis": null});
        assert_eq!(first_present(&raw, SYNOPSIS_KEYS).as_deref(), Some("second"));

        let raw = json!({"released": "", "release": 2004});
        assert_eq!(first_present(&raw, RELEASE_KEYS).as_deref(), Some("2004"));
    }

    #[test]
    fn test_episode_prefers_explicit_label() {
        let ep = episode("naruto-episode-3".to_string(), Some("12-5"));
        assert_eq!(ep.ordinal.unwrap().value(), 12.5);
        assert_eq!(ep.suffix.as_deref(), Some("3"));

        let ep = episode("naruto-episode-3".to_string(), None);
        assert_eq!(ep.ordinal.unwrap().value(), 3.0);

        let ep = episode("naruto-episode-7-5".to_string(), Some("n/a"));
        assert_eq!(ep.ordinal.unwrap().value(), 7.5);
    }

    #[test]
    fn test_strip_episode_suffix() {
        assert_eq!(strip_episode_suffix("one-piece-episode-1071"), "one-piece");
        assert_eq!(strip_episode_suffix("one-piece"), "one-piece");
        assert!(episode_suffix("one-piece-episode-").is_none());
    }

    #[test]
    fn test_genres_string_and_array() {
        assert_eq!(
            genres(Some(&json!("Action, ,Comedy ,,Drama"))),
            vec!["Action", "Comedy", "Drama"]
        );
        assert_eq!(
            genres(Some(&json!(["Action", "", "  Drama ", null]))),
            vec!["Action", "Drama"]
        );
        assert!(genres(None).is_empty());
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(
            strip_tags("<p>Luffy sets <i>sail</i>.<br></p>"),
            "Luffy sets sail."
        );
    }

    #[test]
    fn test_unwrap_results() {
        let raw = json!({"results": {"name": "x"}});
        assert_eq!(unwrap_results(&raw)["name"], "x");

        let raw = json!({"name": "y"});
        assert_eq!(unwrap_results(&raw)["name"], "y");
    }

    #[test]
    fn test_total_episodes_falls_back_to_list_length() {
        let episodes = vec![episode("x-episode-1".to_string(), None), episode("x-episode-2".to_string(), None)];

        assert_eq!(total_episodes(&json!({"totalEpisodes": 24}), &episodes), Some(24));
        assert_eq!(total_episodes(&json!({"totalEpisodes": null}), &episodes), Some(2));
        assert_eq!(total_episodes(&json!({}), &[]), Some(0));
    }
}
