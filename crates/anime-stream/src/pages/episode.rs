//! Episode player page.

use super::PageContext;
use crate::episode_index::EpisodeIndex;
use crate::error::PageError;
use crate::locator::{LocatorResolver, PlaybackLocator};
use crate::selection::ServerSelection;
use serde::Serialize;
use shared::{DownloadLink, Episode, EpisodeDetail};
use tracing::{info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct EpisodeView {
    pub anime_id: String,
    pub anime_name: String,
    /// Episode metadata; its variants live in `selection`
    pub detail: EpisodeDetail,
    pub selection: ServerSelection,
    pub index: EpisodeIndex,
    pub previous: Option<Episode>,
    pub next: Option<Episode>,
}

impl EpisodeView {
    pub fn current(&self) -> &Episode {
        &self.detail.episode
    }
}

pub struct EpisodePage {
    ctx: PageContext,
    resolver: LocatorResolver,
}

impl EpisodePage {
    pub fn new(ctx: PageContext) -> Self {
        let resolver = LocatorResolver::with_defaults(ctx.client().clone());
        Self { ctx, resolver }
    }

    pub fn with_resolver(ctx: PageContext, resolver: LocatorResolver) -> Self {
        Self { ctx, resolver }
    }

    /// Load the episode, then its anime for the episode list
    ///
    /// Either request failing fails the load, as does an episode with no
    /// playable variant.
    pub async fn load(&self, anime_id: &str, episode_id: &str) -> Result<EpisodeView, PageError> {
        if anime_id.trim().is_empty() {
            return Err(PageError::MissingParameter("anime_id"));
        }
        if episode_id.trim().is_empty() {
            return Err(PageError::MissingParameter("episode_id"));
        }

        let raw = self.ctx.client().episode(episode_id).await?;
        let mut detail = self.ctx.normalizer().normalize_episode(&raw, episode_id)?;

        let mut selection = ServerSelection::new();
        selection
            .load_variants(std::mem::take(&mut detail.variants))
            .map_err(|_| PageError::NoPlayableVariant {
                episode_id: episode_id.to_string(),
            })?;

        let raw = self.ctx.client().anime(anime_id).await?;
        let anime = self.ctx.normalizer().normalize_anime_detail(&raw)?;
        let index = EpisodeIndex::build(anime.episodes, detail.episode.ordinal);

        let (previous, next) = match index.position_of(episode_id) {
            Some(_) => index.neighbours(episode_id),
            None => index.neighbours(&detail.episode.id),
        };
        let (previous, next) = (previous.cloned(), next.cloned());

        info!(
            anime_id = anime_id,
            episode_id = episode_id,
            languages = selection.languages().len(),
            episodes = index.len(),
            "Episode page loaded"
        );

        Ok(EpisodeView {
            anime_id: anime_id.to_string(),
            anime_name: anime.name,
            detail,
            selection,
            index,
            previous,
            next,
        })
    }

    /// Resolve the active variant through the locator strategies
    pub async fn resolve_active(&self, selection: &ServerSelection) -> Option<PlaybackLocator> {
        let variant = selection.current_variant()?;
        self.resolver.resolve(variant).await
    }

    /// Direct download links, lowest quality first
    pub async fn downloads(&self, episode_id: &str) -> Result<Vec<DownloadLink>, PageError> {
        if episode_id.trim().is_empty() {
            return Err(PageError::MissingParameter("episode_id"));
        }

        let raw = self.ctx.client().download(episode_id).await?;
        let links = self.ctx.normalizer().normalize_downloads(&raw);
        if links.is_empty() {
            warn!(episode_id = episode_id, "No download links");
        }
        Ok(links)
    }

    pub fn close(&self) {
        self.ctx.close();
    }
}
