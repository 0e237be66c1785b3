//! Media-Harvest main entry point
//!
//! This is the command-line interface for the Media-Harvest collection downloader.

use anyhow::Context;
use clap::Parser;
use media_harvest::config::{load_config_with_hash, validate, Config};
use media_harvest::crawler::run_crawl;
use media_harvest::history::history_path;
use media_harvest::CollectionRef;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Media-Harvest: a resumable paginated media harvester
///
/// Media-Harvest pages through each configured collection, skips items it
/// has already recorded, downloads the video and audio streams of every new
/// item with parallel range requests, and merges them with ffmpeg.
#[derive(Parser, Debug)]
#[command(name = "media-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A resumable paginated media harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Output directory (overrides crawler.output-dir)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Re-download streams even when the files already exist
    #[arg(short = 'w', long = "override")]
    override_existing: bool,

    /// Walk every page instead of stopping at the last processed item
    #[arg(short, long)]
    ergodic: bool,

    /// Minimum seconds between listing pages (overrides crawler.page-delay)
    #[arg(long, value_name = "SECONDS")]
    per: Option<u64>,

    /// Item pipelines run at once (overrides crawler.item-workers)
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// Validate config and show what would be harvested without downloading
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration
    fn apply(&self, config: &mut Config) {
        if let Some(output) = &self.output {
            config.crawler.output_dir = output.to_string_lossy().into_owned();
        }
        if self.override_existing {
            config.crawler.override_existing = true;
        }
        if self.ergodic {
            config.crawler.ergodic = true;
        }
        if let Some(per) = self.per {
            config.crawler.page_delay = per;
        }
        if let Some(workers) = self.workers {
            config.crawler.item_workers = workers;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    cli.apply(&mut config);
    validate(&config).context("Invalid configuration after applying command-line options")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("media_harvest=info,warn"),
            1 => EnvFilter::new("media_harvest=debug,info"),
            2 => EnvFilter::new("media_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== Media-Harvest Dry Run ===\n");

    println!("Crawler:");
    println!("  Output directory: {}", config.crawler.output_dir);
    println!("  Override existing: {}", config.crawler.override_existing);
    println!("  Ergodic: {}", config.crawler.ergodic);
    println!(
        "  Page delay: {}s (+ up to {}ms jitter)",
        config.crawler.page_delay, config.crawler.page_jitter_ms
    );
    println!("  Item workers: {}", config.crawler.item_workers);

    println!("\nDownload:");
    println!("  Chunk size: {} bytes", config.download.chunk_size);
    println!("  Chunk workers: {}", config.download.chunk_workers);
    println!("  Timeout: {}s", config.download.timeout_secs);
    println!("  Cookie: {}", if config.download.cookie.is_empty() { "none" } else { "set" });

    println!("\nSource:");
    println!("  Listing: {}", config.source.listing_url);
    println!("  Item: {}", config.source.item_url);

    println!("\nMedia:");
    println!("  ffmpeg: {}", config.media.ffmpeg);
    println!(
        "  Mark: {}",
        if config.media.mark { config.media.mark_symbol.as_str() } else { "off" }
    );

    println!("\nCollections ({}):", config.collections.len());
    for entry in &config.collections {
        let collection = CollectionRef::from(entry);
        let history = history_path(Path::new(&config.history.folder), &collection, &config.history.extension);
        println!("  - {} -> history {}", collection, history.display());
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main harvest operation
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Harvesting {} collections into {}",
        config.collections.len(),
        config.crawler.output_dir
    );

    match run_crawl(config).await {
        Ok(reports) => {
            let succeeded: usize = reports.iter().map(|r| r.succeeded).sum();
            let failed: usize = reports.iter().map(|r| r.failed).sum();
            tracing::info!(
                "Harvest completed: {} items done, {} failed",
                succeeded,
                failed
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
