//! Episode list index with range buckets for long series.
//!
//! Episodes are grouped into buckets of 100 ordinals (`1 - 100`, `101 - 200`,
//! ...). Range lookups slice the list by position, which assumes the list is
//! gapless and sorted so that position `n - 1` holds ordinal `n`.

use serde::Serialize;
use shared::{Episode, Ordinal};
use std::collections::HashSet;
use tracing::debug;

/// Ordinals per bucket
pub const BUCKET_SIZE: u32 = 100;

/// Inclusive ordinal range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BucketRange {
    pub lower: u32,
    pub upper: u32,
}

impl BucketRange {
    pub fn contains(&self, ordinal: Ordinal) -> bool {
        let value = ordinal.value();
        f64::from(self.lower) <= value && value <= f64::from(self.upper)
    }

    /// Label shown in the range picker, e.g. `101 - 200`
    pub fn label(&self) -> String {
        format!("{} - {}", self.lower, self.upper)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub range: BucketRange,
    /// Pre-selected because it holds the current episode
    pub is_default: bool,
}

/// Derived view over one anime's episode list
#[derive(Debug, Clone, Default, Serialize)]
pub struct EpisodeIndex {
    episodes: Vec<Episode>,
    buckets: Vec<Bucket>,
    current: Option<Ordinal>,
}

impl EpisodeIndex {
    /// Bucket `episodes`, marking the bucket that holds `current` as default
    ///
    /// A bucket opens at every whole ordinal `o` with `(o - 1) % 100 == 0` and
    /// ends at `min(o + 99, episode count)`.
    pub fn build(episodes: Vec<Episode>, current: Option<Ordinal>) -> Self {
        let total = u32::try_from(episodes.len()).unwrap_or(u32::MAX);

        // Repeated ordinals (sub and dub entries) open their bucket once
        let mut opened = HashSet::new();
        let buckets: Vec<Bucket> = episodes
            .iter()
            .filter_map(|episode| episode.ordinal)
            .filter(|ordinal| ordinal.is_whole() && ordinal.value() >= 1.0)
            .map(|ordinal| ordinal.value() as u32)
            .filter(|lower| (lower - 1) % BUCKET_SIZE == 0)
            .filter(|lower| opened.insert(*lower))
            .map(|lower| {
                let range = BucketRange {
                    lower,
                    upper: lower.saturating_add(BUCKET_SIZE - 1).min(total),
                };
                Bucket {
                    range,
                    is_default: current.is_some_and(|c| range.contains(c)),
                }
            })
            .collect();

        debug!(
            episodes = episodes.len(),
            buckets = buckets.len(),
            current = ?current.map(|c| c.value()),
            "Built episode index"
        );

        Self {
            episodes,
            buckets,
            current,
        }
    }

    pub fn episodes(&self) -> &[Episode] {
        &self.episodes
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn current(&self) -> Option<Ordinal> {
        self.current
    }

    pub fn len(&self) -> usize {
        self.episodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.episodes.is_empty()
    }

    /// The pre-selected bucket, if the current episode is in the list
    pub fn default_bucket(&self) -> Option<&Bucket> {
        self.buckets.iter().find(|bucket| bucket.is_default)
    }

    /// Bucket whose range covers `ordinal`
    pub fn bucket_for(&self, ordinal: Ordinal) -> Option<BucketRange> {
        self.buckets
            .iter()
            .map(|bucket| bucket.range)
            .find(|range| range.contains(ordinal))
    }

    /// Episodes at positions `lower - 1 ..= upper - 1`
    ///
    /// Positional: returns the wrong episodes if the list has gaps or repeats.
    pub fn episodes_in_range(&self, range: BucketRange) -> &[Episode] {
        let start = range.lower.saturating_sub(1) as usize;
        let end = (range.upper as usize).min(self.episodes.len());
        if start >= end {
            return &[];
        }
        &self.episodes[start..end]
    }

    pub fn position_of(&self, episode_id: &str) -> Option<usize> {
        self.episodes.iter().position(|episode| episode.id == episode_id)
    }

    /// Episodes before and after `episode_id` in list order
    pub fn neighbours(&self, episode_id: &str) -> (Option<&Episode>, Option<&Episode>) {
        match self.position_of(episode_id) {
            Some(pos) => (
                pos.checked_sub(1).and_then(|prev| self.episodes.get(prev)),
                self.episodes.get(pos + 1),
            ),
            None => (None, None),
        }
    }
}
