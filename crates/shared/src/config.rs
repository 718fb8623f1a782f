//! Configuration management for anime-stream.
//!
//! This module handles loading and parsing configuration from TOML files,
//! with sensible defaults for all settings.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Upstream API settings
    pub api: ApiConfig,

    /// Response normalization settings
    #[serde(default)]
    pub normalizer: NormalizerConfig,

    /// Page controller settings
    #[serde(default)]
    pub pages: PagesConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Upstream API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Pool of interchangeable API base URLs
    pub servers: Vec<String>,

    /// Origin sent as the referer header on every request
    pub origin: String,

    /// Total attempts per request, including the first one
    pub max_attempts: u32,

    /// Delay strategy between attempts
    pub backoff: BackoffKind,

    /// Base retry delay in milliseconds
    pub retry_delay_ms: u64,

    /// Per-attempt request timeout in seconds
    pub request_timeout_secs: u64,

    /// User agent sent with every request
    pub user_agent: String,
}

/// Delay strategy between fetch attempts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    /// Retry straight away
    Immediate,
    /// `retry_delay * attempt`
    Linear,
    /// `retry_delay * 2^(attempt - 1)`
    Exponential,
}

/// Normalizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// Treat payloads with an unknown `source` tag as GogoAnime-shaped
    pub fallback_to_gogoanime: bool,
}

/// Page controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagesConfig {
    /// Maximum trending entries shown on the home page
    pub trending_limit: usize,

    /// Maximum popular entries shown on the home page
    pub popular_limit: usize,

    /// Maximum recommendations shown on the detail page
    pub recommendations_limit: usize,

    /// Shuffle trending and popular lists on each home load
    pub shuffle_home: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log directory path
    pub log_dir: String,

    /// Default log level (trace, debug, info, warn, error)
    pub default_level: String,

    /// Enable console output
    pub console: bool,

    /// Enable file output
    pub file: bool,

    /// Enable JSON formatting for file logs
    pub json_format: bool,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            fallback_to_gogoanime: false,
        }
    }
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            trending_limit: 10,
            popular_limit: 20,
            recommendations_limit: 20,
            shuffle_home: true,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            servers: vec!["https://beatanimesapi.onrender.com".to_string()],
            origin: "http://localhost".to_string(),
            max_attempts: 3,
            backoff: BackoffKind::Linear,
            retry_delay_ms: 1000,
            request_timeout_secs: 30,
            user_agent: format!("anime-stream/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            normalizer: NormalizerConfig::default(),
            pages: PagesConfig::default(),
            logging: LoggingConfig {
                log_dir: "data/logs".to_string(),
                default_level: "info".to_string(),
                console: true,
                file: false,
                json_format: false,
            },
        }
    }
}

impl ApiConfig {
    /// Base retry delay as a duration
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Per-attempt timeout as a duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// If the file doesn't exist, returns the default configuration.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Config file not found, using defaults"
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.validate()?;

        tracing::info!(
            path = %path.display(),
            servers = config.api.servers.len(),
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Load configuration from a TOML file or create default if not found
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::from_file(path).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load config, using defaults");
            Self::default()
        })
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = toml::to_string_pretty(self)
            .context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            "Configuration saved successfully"
        );

        Ok(())
    }

    /// Reject settings the client cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.api.servers.is_empty() {
            anyhow::bail!("api.servers must list at least one base URL");
        }
        if self.api.max_attempts == 0 {
            anyhow::bail!("api.max_attempts must be at least 1");
        }
        Ok(())
    }

    /// Get the log directory path
    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.logging.log_dir)
    }
}
