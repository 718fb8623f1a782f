//! Search results with infinite scroll.

use super::{PageContext, PageOutcome, Paginator};
use crate::error::PageError;
use crate::normalize::listing;
use shared::AnimeSummary;
use tracing::info;

pub struct SearchPage {
    ctx: PageContext,
    query: Option<String>,
    pages: Paginator,
}

impl SearchPage {
    pub fn new(ctx: PageContext) -> Self {
        Self {
            ctx,
            query: None,
            pages: Paginator::starting_at(2),
        }
    }

    /// Run a new query
    ///
    /// Zero results on page 1 is [`PageError::EmptyResultSet`], which callers
    /// show as "no results" rather than as a failure.
    pub async fn first_page(&mut self, query: &str) -> Result<Vec<AnimeSummary>, PageError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(PageError::MissingParameter("query"));
        }

        self.query = Some(query.to_string());
        self.pages = Paginator::starting_at(2);

        let raw = match self.ctx.client().search(query, 1).await {
            Ok(raw) => raw,
            Err(e) => {
                self.pages.finish();
                return Err(e.into());
            }
        };
        let items = self.ctx.normalizer().normalize_listing(&raw);
        let more = listing::has_next_page(&raw);

        info!(query = query, results = items.len(), has_next = more, "Search page 1 loaded");

        if items.is_empty() {
            self.pages.finish();
            return Err(PageError::EmptyResultSet {
                query: query.to_string(),
            });
        }
        if !more {
            self.pages.finish();
        }
        Ok(items)
    }

    /// Following page of the current query
    pub async fn next_page(&self) -> PageOutcome {
        let Some(query) = self.query.as_deref() else {
            return PageOutcome::Exhausted;
        };

        let client = self.ctx.client();
        self.pages
            .load_next(self.ctx.normalizer(), |page| client.search(query, page))
            .await
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn has_next(&self) -> bool {
        self.query.is_some() && self.pages.has_next()
    }

    pub fn close(&self) {
        self.ctx.close();
    }
}
