//! Home page: trending slider, popular grid and the recent-release feed.

use super::{PageContext, PageOutcome, Paginator};
use crate::error::PageError;
use rand::seq::SliceRandom;
use serde::Serialize;
use shared::AnimeSummary;
use tracing::{info, warn};

/// Recent releases are paged from here on; page 1 comes with the first load
const FIRST_MORE_PAGE: u32 = 2;

/// Label reported for an empty home feed
const HOME_QUERY: &str = "home";

#[derive(Debug, Clone, Serialize)]
pub struct HomeView {
    pub trending: Vec<AnimeSummary>,
    pub popular: Vec<AnimeSummary>,
    pub recent: Vec<AnimeSummary>,
}

pub struct HomePage {
    ctx: PageContext,
    recent: Paginator,
}

impl HomePage {
    pub fn new(ctx: PageContext) -> Self {
        Self {
            ctx,
            recent: Paginator::starting_at(FIRST_MORE_PAGE),
        }
    }

    /// Load the feed and the first page of recent releases
    ///
    /// A failed `/home` fails the load. A failed `/recent/1` only leaves the
    /// recent section with whatever the feed carried. A feed with every
    /// section empty is [`PageError::EmptyResultSet`]. Each load rewinds
    /// infinite scroll to page 2.
    pub async fn load(&self) -> Result<HomeView, PageError> {
        let config = self.ctx.config();
        self.recent.reset(FIRST_MORE_PAGE);

        let raw = self.ctx.client().home().await?;
        let mut feed = self.ctx.normalizer().normalize_home(&raw);

        if config.shuffle_home {
            let mut rng = rand::thread_rng();
            feed.trending.shuffle(&mut rng);
            feed.popular.shuffle(&mut rng);
        }
        feed.trending.truncate(config.trending_limit);
        feed.popular.truncate(config.popular_limit);

        match self.ctx.client().recent(1).await {
            Ok(raw) => {
                let recent = self.ctx.normalizer().normalize_listing(&raw);
                if !recent.is_empty() {
                    feed.recent = recent;
                }
            }
            Err(e) => warn!(error = %e, "Failed to load recent releases"),
        }

        if feed.trending.is_empty() && feed.popular.is_empty() && feed.recent.is_empty() {
            warn!("Home feed is empty");
            self.recent.finish();
            return Err(PageError::EmptyResultSet {
                query: HOME_QUERY.to_string(),
            });
        }

        info!(
            trending = feed.trending.len(),
            popular = feed.popular.len(),
            recent = feed.recent.len(),
            "Home page loaded"
        );

        Ok(HomeView {
            trending: feed.trending,
            popular: feed.popular,
            recent: feed.recent,
        })
    }

    /// Next page of recent releases (infinite scroll)
    pub async fn load_more(&self) -> PageOutcome {
        let client = self.ctx.client();
        self.recent
            .load_next(self.ctx.normalizer(), |page| client.recent(page))
            .await
    }

    pub fn paginator(&self) -> &Paginator {
        &self.recent
    }

    pub fn close(&self) {
        self.ctx.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::mock::MockTransport;
    use crate::normalize::Normalizer;
    use crate::pages::testing;
    use serde_json::json;
    use shared::config::PagesConfig;
    use std::sync::Arc;

    fn page(transport: &Arc<MockTransport>, config: PagesConfig) -> HomePage {
        let client = testing::client(transport.clone());
        HomePage::new(PageContext::new(&client, Normalizer::default(), config))
    }

    fn home_payload() -> serde_json::Value {
        let popular: Vec<_> = (0..30)
            .map(|i| json!({"id": format!("p{}", i), "title": format!("P{}", i)}))
            .collect();
        json!({
            "trending": {"media": [{"title": {"english": "T1"}}, {"title": {"english": "T2"}}]},
            "popular": {"results": popular},
        })
    }

    #[tokio::test]
    async fn test_load_truncates_sections() {
        let transport = Arc::new(MockTransport::new());
        transport.respond_json("/home", home_payload());
        transport.respond_json("/recent/1", json!({"results": [{"id": "r-episode-3", "title": "R"}]}));

        let view = page(&transport, PagesConfig::default()).load().await.unwrap();
        assert_eq!(view.trending.len(), 2);
        assert_eq!(view.popular.len(), 20);
        assert_eq!(view.recent[0].id, "r");
    }

    #[tokio::test]
    async fn test_unshuffled_order_is_stable() {
        let transport = Arc::new(MockTransport::new());
        transport.respond_json("/home", home_payload());
        transport.respond_json("/recent/1", json!([]));

        let config = PagesConfig {
            shuffle_home: false,
            popular_limit: 3,
            ..PagesConfig::default()
        };
        let view = page(&transport, config).load().await.unwrap();
        let ids: Vec<&str> = view.popular.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["p0", "p1", "p2"]);
        assert!(view.recent.is_empty());
    }

    #[tokio::test]
    async fn test_home_failure_is_terminal() {
        let transport = Arc::new(MockTransport::new());
        transport.respond("/home", 503, "");

        let err = page(&transport, PagesConfig::default()).load().await.unwrap_err();
        assert!(matches!(err, PageError::Fetch(FetchError::ExhaustedRetries { .. })));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_recent_failure_is_not_fatal() {
        let transport = Arc::new(MockTransport::new());
        transport.respond_json("/home", home_payload());
        transport.respond("/recent/1", 500, "");

        let view = page(&transport, PagesConfig::default()).load().await.unwrap();
        assert_eq!(view.trending.len(), 2);
        assert!(view.recent.is_empty());
    }

    #[tokio::test]
    async fn test_empty_feed_is_empty_result_set() {
        let transport = Arc::new(MockTransport::new());
        transport.respond_json("/home", json!({}));
        transport.respond_json("/recent/1", json!({"results": []}));

        let err = page(&transport, PagesConfig::default()).load().await.unwrap_err();
        assert!(matches!(err, PageError::EmptyResultSet { .. }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_reload_reopens_infinite_scroll() {
        let transport = Arc::new(MockTransport::new());
        transport.respond_json("/home", home_payload());
        transport.respond_json("/recent/1", json!([]));
        transport.respond_sequence("/recent/2", vec![(500, ""), (500, "")]);
        transport.respond_json("/recent/2", json!({"results": [{"id": "b-episode-4", "title": "B"}]}));

        let home = page(&transport, PagesConfig::default());
        home.load().await.unwrap();
        assert!(matches!(home.load_more().await, PageOutcome::Stopped { .. }));
        assert_eq!(home.load_more().await, PageOutcome::Exhausted);

        home.load().await.unwrap();
        assert!(home.paginator().has_next());
        match home.load_more().await {
            PageOutcome::Loaded(items) => assert_eq!(items[0].id, "b"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_load_more_pages_from_two() {
        let transport = Arc::new(MockTransport::new());
        transport.respond_json("/recent/2", json!({"results": [{"id": "a-episode-1", "title": "A"}]}));
        transport.respond_json("/recent/3", json!({"results": []}));

        let home = page(&transport, PagesConfig::default());
        match home.load_more().await {
            PageOutcome::Loaded(items) => assert_eq!(items[0].id, "a"),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(home.load_more().await, PageOutcome::Exhausted);
        assert_eq!(home.load_more().await, PageOutcome::Exhausted);
        assert_eq!(transport.paths(), vec!["/recent/2", "/recent/3"]);
    }
}
