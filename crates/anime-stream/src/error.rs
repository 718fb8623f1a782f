//! Error types for the client library.

use thiserror::Error;

/// Transport-level failure of [`crate::api::ApiClient::fetch_json`]
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("gave up on {url} after {attempts} attempts: {last_error}")]
    ExhaustedRetries {
        /// Last URL attempted (the pool member may differ between attempts)
        url: String,
        attempts: u32,
        last_error: String,
    },

    #[error("request to {url} cancelled")]
    Cancelled { url: String },
}

/// Payload did not match any known upstream schema
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("unrecognized source: {0}")]
    UnrecognizedSource(String),

    #[error("unrecognized payload shape: {0}")]
    UnrecognizedShape(String),
}

/// Misuse of the server selection state machine
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("no playable variant available")]
    NoPlayableVariant,

    #[error("unknown language: {0}")]
    UnknownLanguage(String),

    #[error("variant language {found} does not match selected language {expected}")]
    VariantLanguageMismatch { expected: String, found: String },

    #[error("no variant {0} under the selected language")]
    UnknownVariant(String),
}

/// Failure of a page load, as surfaced to the presentation layer
#[derive(Debug, Error)]
pub enum PageError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error("no results found for \"{query}\"")]
    EmptyResultSet { query: String },

    #[error("no playable variant for episode {episode_id}")]
    NoPlayableVariant { episode_id: String },

    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),
}

impl PageError {
    /// Whether the user should be offered a retry rather than a "no results" state
    pub fn is_retryable(&self) -> bool {
        matches!(self, PageError::Fetch(FetchError::ExhaustedRetries { .. }))
    }
}
