//! Anime detail page.

use super::PageContext;
use crate::episode_index::EpisodeIndex;
use crate::error::PageError;
use serde::Serialize;
use shared::{Anime, AnimeSummary, Episode};
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct DetailView {
    /// Metadata; the episode list lives in `index`
    pub anime: Anime,
    pub index: EpisodeIndex,
    /// Target of the "watch now" button
    pub watch_first: Option<Episode>,
    pub recommendations: Vec<AnimeSummary>,
}

pub struct DetailPage {
    ctx: PageContext,
}

impl DetailPage {
    pub fn new(ctx: PageContext) -> Self {
        Self { ctx }
    }

    pub async fn load(&self, anime_id: &str) -> Result<DetailView, PageError> {
        if anime_id.trim().is_empty() {
            return Err(PageError::MissingParameter("anime_id"));
        }

        let raw = self.ctx.client().anime(anime_id).await?;
        let mut anime = self.ctx.normalizer().normalize_anime_detail(&raw)?;
        // Later requests must reuse the key this page was opened with
        anime.id = anime_id.to_string();

        let episodes = std::mem::take(&mut anime.episodes);
        let watch_first = episodes.first().cloned();
        let index = EpisodeIndex::build(episodes, watch_first.as_ref().and_then(|e| e.ordinal));

        let recommendations = self.recommendations(&anime.name).await;

        info!(
            anime_id = anime_id,
            name = %anime.name,
            episodes = index.len(),
            recommendations = recommendations.len(),
            "Detail page loaded"
        );

        Ok(DetailView {
            anime,
            index,
            watch_first,
            recommendations,
        })
    }

    /// Best effort: failures leave the section empty
    async fn recommendations(&self, title: &str) -> Vec<AnimeSummary> {
        match self.ctx.client().recommendations(title).await {
            Ok(raw) => {
                let mut items = self.ctx.normalizer().normalize_listing(&raw);
                items.truncate(self.ctx.config().recommendations_limit);
                items
            }
            Err(e) => {
                warn!(title = title, error = %e, "Failed to load recommendations");
                Vec::new()
            }
        }
    }

    pub fn close(&self) {
        self.ctx.close();
    }
}
