//! Crawler module for collection enumeration
//!
//! This module contains the paging side of the harvester:
//! - The page navigator seam and the JSON listing navigator
//! - The pagination state machine that filters and dispatches items
//! - The manager that walks all configured collections

mod controller;
mod manager;
mod navigator;

pub use controller::{filter_new_items, page_delay, ControllerOptions, CrawlReport, PaginationController};
pub use manager::CrawlManager;
pub use navigator::{parse_listing, ApiNavigator, PageNavigator};

use crate::config::Config;
use crate::download::HttpTransport;
use crate::pipeline::FfmpegProcessor;
use crate::Result;
use std::sync::Arc;

/// Runs a complete harvest
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP transport and the ffmpeg-backed media processor
/// 2. Open each collection's history ledger
/// 3. Page through each collection and run one pipeline per new item
///
/// # Returns
///
/// * `Ok(reports)` - One report per collection
/// * `Err(HarvestError)` - The transport could not be built, or a collection could not be enumerated
pub async fn run_crawl(config: Config) -> Result<Vec<CrawlReport>> {
    let config = Arc::new(config);
    let transport = Arc::new(HttpTransport::new(&config.download)?);
    let processor = Arc::new(FfmpegProcessor::new(config.media.ffmpeg.clone()));

    CrawlManager::new(config, transport, processor).run().await
}
