//! Page controllers.
//!
//! Each page owns a [`PageContext`] for its lifetime. Closing or dropping the
//! context cancels every request the page still has in flight.

pub mod detail;
pub mod episode;
pub mod home;
pub mod search;

pub use detail::{DetailPage, DetailView};
pub use episode::{EpisodePage, EpisodeView};
pub use home::{HomePage, HomeView};
pub use search::SearchPage;

use crate::api::ApiClient;
use crate::error::FetchError;
use crate::normalize::{listing, Normalizer};
use serde::Serialize;
use serde_json::Value;
use shared::config::PagesConfig;
use shared::AnimeSummary;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Per-page session: scoped client, normalizer and page settings
pub struct PageContext {
    client: ApiClient,
    normalizer: Normalizer,
    config: PagesConfig,
}

impl PageContext {
    /// Derive a page session whose requests can be cancelled independently
    /// of `client`
    pub fn new(client: &ApiClient, normalizer: Normalizer, config: PagesConfig) -> Self {
        Self {
            client: client.scoped(),
            normalizer,
            config,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    pub fn config(&self) -> &PagesConfig {
        &self.config
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        self.client.cancellation_token()
    }

    pub fn is_closed(&self) -> bool {
        self.client.cancellation_token().is_cancelled()
    }

    /// Abort in-flight requests; later requests fail with `Cancelled`
    pub fn close(&self) {
        if !self.is_closed() {
            debug!("Closing page context");
            self.client.cancellation_token().cancel();
        }
    }
}

impl Drop for PageContext {
    fn drop(&mut self) {
        self.close();
    }
}

/// Result of asking for the next page of a listing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "items", rename_all = "snake_case")]
pub enum PageOutcome {
    Loaded(Vec<AnimeSummary>),
    /// No further pages
    Exhausted,
    /// A fetch for this listing is already running
    Busy,
    /// The fetch failed; pagination is over but loaded pages stay valid
    Stopped { reason: String },
}

/// Page cursor with an in-flight gate
///
/// Only one fetch runs at a time; a second request while one is outstanding
/// returns [`PageOutcome::Busy`] without touching the network.
#[derive(Debug)]
pub struct Paginator {
    next_page: AtomicU32,
    has_next: AtomicBool,
    in_flight: AtomicBool,
}

/// Held while a page fetch runs; dropping it reopens the gate
#[derive(Debug)]
pub struct PageTicket<'a> {
    paginator: &'a Paginator,
    page: u32,
}

impl Paginator {
    pub fn starting_at(page: u32) -> Self {
        Self {
            next_page: AtomicU32::new(page),
            has_next: AtomicBool::new(true),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn next_page(&self) -> u32 {
        self.next_page.load(Ordering::Acquire)
    }

    pub fn has_next(&self) -> bool {
        self.has_next.load(Ordering::Acquire)
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Rewind the cursor to `page` and reopen pagination
    pub fn reset(&self, page: u32) {
        self.next_page.store(page, Ordering::Release);
        self.has_next.store(true, Ordering::Release);
    }

    /// End pagination without a fetch
    pub fn finish(&self) {
        self.has_next.store(false, Ordering::Release);
    }

    /// Claim the gate for the next page
    pub fn try_begin(&self) -> Result<PageTicket<'_>, PageOutcome> {
        if !self.has_next() {
            return Err(PageOutcome::Exhausted);
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(PageOutcome::Busy);
        }

        Ok(PageTicket {
            paginator: self,
            page: self.next_page(),
        })
    }

    /// Fetch, normalize and account for one listing page
    ///
    /// An empty page or `hasNextPage == false` ends pagination; so does a
    /// failed fetch.
    pub async fn load_next<F, Fut>(&self, normalizer: &Normalizer, fetch: F) -> PageOutcome
    where
        F: FnOnce(u32) -> Fut,
        Fut: Future<Output = Result<Value, FetchError>>,
    {
        let ticket = match self.try_begin() {
            Ok(ticket) => ticket,
            Err(outcome) => return outcome,
        };
        let page = ticket.page();

        match fetch(page).await {
            Ok(raw) => {
                let items = normalizer.normalize_listing(&raw);
                if items.is_empty() {
                    debug!(page, "Empty page, pagination finished");
                    ticket.stop();
                    return PageOutcome::Exhausted;
                }

                let more = listing::has_next_page(&raw);
                debug!(page, items = items.len(), has_next = more, "Loaded page");
                ticket.advance(more);
                PageOutcome::Loaded(items)
            }
            Err(e) => {
                warn!(page, error = %e, "Page fetch failed, stopping pagination");
                ticket.stop();
                PageOutcome::Stopped {
                    reason: e.to_string(),
                }
            }
        }
    }
}

impl PageTicket<'_> {
    pub fn page(&self) -> u32 {
        self.page
    }

    /// Move the cursor past this page
    pub fn advance(self, has_next: bool) {
        self.paginator.next_page.fetch_add(1, Ordering::AcqRel);
        self.paginator.has_next.store(has_next, Ordering::Release);
    }

    /// End pagination
    pub fn stop(self) {
        self.paginator.has_next.store(false, Ordering::Release);
    }
}

impl Drop for PageTicket<'_> {
    fn drop(&mut self) {
        self.paginator.in_flight.store(false, Ordering::Release);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::api::ApiClient;
    use crate::mock::MockTransport;
    use shared::config::{ApiConfig, BackoffKind};
    use std::sync::Arc;

    pub fn client(transport: Arc<MockTransport>) -> ApiClient {
        let config = ApiConfig {
            servers: vec!["https://api-a.example".to_string(), "https://api-b.example".to_string()],
            max_attempts: 2,
            backoff: BackoffKind::Immediate,
            ..ApiConfig::default()
        };
        ApiClient::with_transport(transport, &config).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_gate_rejects_overlapping_fetch() {
        let paginator = Paginator::starting_at(2);

        let ticket = paginator.try_begin().unwrap();
        assert_eq!(ticket.page(), 2);
        assert!(paginator.is_busy());
        assert_eq!(paginator.try_begin().unwrap_err(), PageOutcome::Busy);

        ticket.advance(true);
        assert!(!paginator.is_busy());
        assert_eq!(paginator.next_page(), 3);
        assert_eq!(paginator.try_begin().unwrap().page(), 3);
    }

    #[test]
    fn test_dropped_ticket_reopens_gate() {
        let paginator = Paginator::starting_at(1);
        {
            let _ticket = paginator.try_begin().unwrap();
        }
        assert!(!paginator.is_busy());
        assert_eq!(paginator.next_page(), 1);
    }

    #[test]
    fn test_stopped_paginator_is_exhausted() {
        let paginator = Paginator::starting_at(1);
        paginator.try_begin().unwrap().stop();
        assert_eq!(paginator.try_begin().unwrap_err(), PageOutcome::Exhausted);
    }

    #[test]
    fn test_reset_reopens_pagination() {
        let paginator = Paginator::starting_at(2);
        paginator.try_begin().unwrap().advance(true);
        paginator.try_begin().unwrap().stop();

        paginator.reset(2);
        assert!(paginator.has_next());
        assert_eq!(paginator.try_begin().unwrap().page(), 2);
    }

    #[tokio::test]
    async fn test_load_next_failure_stops() {
        let transport = Arc::new(MockTransport::new());
        transport.respond("/recent/2", 500, "");
        let client = testing::client(transport.clone());
        let paginator = Paginator::starting_at(2);
        let normalizer = Normalizer::default();

        let outcome = paginator.load_next(&normalizer, |page| client.recent(page)).await;
        assert!(matches!(outcome, PageOutcome::Stopped { .. }));
        assert_eq!(
            paginator.load_next(&normalizer, |page| client.recent(page)).await,
            PageOutcome::Exhausted
        );
        assert_eq!(transport.call_count(), 2, "one page, two attempts");
    }

    #[tokio::test]
    async fn test_close_cancels_context_only() {
        let transport = Arc::new(MockTransport::new());
        transport.respond_json("/home", json!({}));
        let client = testing::client(transport);

        let ctx = PageContext::new(&client, Normalizer::default(), PagesConfig::default());
        ctx.close();
        assert!(ctx.is_closed());
        assert!(matches!(
            ctx.client().home().await,
            Err(FetchError::Cancelled { .. })
        ));
        assert!(client.home().await.is_ok());
    }
}
