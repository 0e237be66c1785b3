//! Configuration module for Media-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use media_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Item workers: {}", config.crawler.item_workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CollectionEntry, Config, CrawlerConfig, DownloadConfig, HistoryConfig, MediaConfig,
    SourceConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
