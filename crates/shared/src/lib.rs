//! Shared library for the anime-stream workspace.
//!
//! This crate provides common functionality used by the client library and CLI:
//! - Configuration management
//! - Logging infrastructure
//! - The normalized domain model (anime, episodes, variants, listings)

pub mod config;
pub mod logging;
pub mod models;

// Re-export commonly used types
pub use config::Config;
pub use logging::LogConfig;
pub use models::*;

/// Common result type using anyhow::Error
pub type Result<T> = anyhow::Result<T>;
