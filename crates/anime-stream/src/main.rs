//! anime-stream CLI application.

use anime_stream::pages::{DetailPage, EpisodePage, EpisodeView, HomePage, SearchPage};
use anime_stream::{ApiClient, Normalizer, PageContext, PageError, PageOutcome, PlaybackLocator};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use shared::{Config, LogConfig};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Trending, popular and recent releases
    Home,

    /// One page of recent releases
    Recent {
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },

    /// Anime details, episode ranges and recommendations
    Anime { anime_id: String },

    /// Episode servers and the playback locator for the chosen variant
    Episode {
        anime_id: String,
        episode_id: String,

        /// Language group to select
        #[arg(short, long)]
        language: Option<String>,

        /// Quality label to select within the language
        #[arg(short, long)]
        quality: Option<String>,
    },

    /// Search by title
    Search {
        query: String,

        /// Maximum number of pages to fetch
        #[arg(short, long, default_value_t = 1)]
        pages: u32,
    },

    /// Direct download links for an episode
    Download { episode_id: String },

    /// Write the default configuration to the config path
    InitConfig,
}

#[derive(Serialize)]
struct EpisodeOutput<'a> {
    episode: &'a EpisodeView,
    locator: Option<PlaybackLocator>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Command::InitConfig => init_config(&args.config),
        command => run(command, &args.config, args.verbose).await,
    }
}

fn init_config(path: &Path) -> Result<()> {
    Config::default()
        .save(path)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

async fn run(command: Command, config_path: &Path, verbose: bool) -> Result<()> {
    // Load configuration
    let config = Config::from_file(config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    // Initialize logging
    let mut log_config = LogConfig::from_settings("anime-stream", &config.logging);
    if verbose {
        log_config.default_level = tracing::Level::DEBUG;
    }
    shared::logging::init(log_config)?;

    info!(config_file = %config_path.display(), "Loaded configuration");

    let cancel = CancellationToken::new();
    let client = ApiClient::new(&config.api)
        .context("Failed to create API client")?
        .with_cancellation(cancel.clone());

    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling requests");
                cancel.cancel();
            }
        }
    });

    let ctx = || PageContext::new(&client, Normalizer::new(&config.normalizer), config.pages.clone());

    match command {
        Command::Home => match HomePage::new(ctx()).load().await {
            Ok(view) => print_json(&view)?,
            Err(PageError::EmptyResultSet { .. }) => eprintln!("No results found"),
            Err(e) => return Err(e.into()),
        },
        Command::Recent { page } => {
            let raw = client.recent(page).await?;
            let items = Normalizer::new(&config.normalizer).normalize_listing(&raw);
            if items.is_empty() {
                eprintln!("No results found on page {}", page);
                return Ok(());
            }
            print_json(&items)?;
        }
        Command::Anime { anime_id } => {
            let view = DetailPage::new(ctx()).load(&anime_id).await?;
            print_json(&view)?;
        }
        Command::Episode {
            anime_id,
            episode_id,
            language,
            quality,
        } => {
            let page = EpisodePage::new(ctx());
            let mut view = page.load(&anime_id, &episode_id).await?;

            if let Some(language) = language {
                view.selection.select_language(&language)?;
            }
            if let Some(quality) = quality {
                view.selection.select_quality(&quality)?;
            }

            let locator = page.resolve_active(&view.selection).await;
            print_json(&EpisodeOutput {
                episode: &view,
                locator,
            })?;
        }
        Command::Search { query, pages } => {
            let mut search = SearchPage::new(ctx());
            let mut results = match search.first_page(&query).await {
                Ok(items) => items,
                Err(PageError::EmptyResultSet { query }) => {
                    eprintln!("No results found for \"{}\"", query);
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };

            for _ in 1..pages {
                match search.next_page().await {
                    PageOutcome::Loaded(items) => results.extend(items),
                    PageOutcome::Stopped { reason } => {
                        warn!(reason = %reason, "Stopped paging search results");
                        break;
                    }
                    PageOutcome::Exhausted | PageOutcome::Busy => break,
                }
            }

            info!(query = %query, results = results.len(), "Search complete");
            print_json(&results)?;
        }
        Command::Download { episode_id } => {
            let links = EpisodePage::new(ctx()).downloads(&episode_id).await?;
            print_json(&links)?;
        }
        Command::InitConfig => init_config(config_path)?,
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", out);
    Ok(())
}
