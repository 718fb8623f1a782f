//! Anime streaming client core.
//!
//! This library fetches JSON from a pool of upstream API servers, maps the
//! several response schemas onto one model, and derives the view state the
//! home, detail, episode and search pages render: episode range buckets and
//! the language/server selection for playback.

pub mod api;
pub mod episode_index;
pub mod error;
pub mod locator;
pub mod normalize;
pub mod pages;
pub mod selection;

#[cfg(test)]
mod mock;

pub use api::{ApiClient, RetryPolicy, ServerPool};
pub use episode_index::{Bucket, BucketRange, EpisodeIndex};
pub use error::{FetchError, NormalizeError, PageError, SelectionError};
pub use locator::{LocatorResolver, PlaybackLocator, PlaybackLocatorKind};
pub use normalize::Normalizer;
pub use pages::{PageContext, PageOutcome};
pub use selection::{SelectionState, ServerSelection};
