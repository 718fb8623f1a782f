//! Pool of interchangeable API base URLs.
//!
//! A member is picked uniformly at random for every attempt; nothing is sticky,
//! so consecutive retries of one request may land on different servers.

use anyhow::{bail, Result};
use rand::seq::SliceRandom;
use std::sync::Arc;

/// Base URLs requests are spread across
#[derive(Debug, Clone)]
pub struct ServerPool {
    servers: Arc<[String]>,
}

impl ServerPool {
    /// Create a pool; trailing slashes are trimmed from each base URL
    pub fn new(servers: &[String]) -> Result<Self> {
        let servers: Vec<String> = servers
            .iter()
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if servers.is_empty() {
            bail!("Server pool needs at least one base URL");
        }

        Ok(Self {
            servers: servers.into(),
        })
    }

    /// Pick one member at random
    pub fn pick(&self) -> &str {
        self.servers
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Qualify a path against a randomly chosen member
    pub fn url_for(&self, path: &str) -> String {
        join(self.pick(), path)
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    pub fn servers(&self) -> &[String] {
        &self.servers
    }
}

fn join(base: &str, path: &str) -> String {
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}
