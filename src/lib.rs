//! Media-Harvest: a resumable paginated media harvester
//!
//! This crate walks paginated content listings, skips items already recorded in a
//! per-collection history ledger, downloads each new item's media streams with
//! parallel byte-range requests, and merges them into one container.

pub mod config;
pub mod crawler;
pub mod download;
pub mod history;
pub mod model;
pub mod pipeline;
pub mod state;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Media-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP status {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Could not determine content length for {url}")]
    SizeUnavailable { url: String },

    #[error("Short body for {url}: expected {expected} bytes, got {received}")]
    ShortBody {
        url: String,
        expected: u64,
        received: u64,
    },

    #[error("No media URL found for item {id}")]
    MissingMediaUrl { id: String },

    #[error("Malformed listing payload: {0}")]
    Payload(String),

    #[error("History write failed for {path}: {source}")]
    History {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("External tool not found: {tool}")]
    ToolMissing { tool: String },

    #[error("Enumeration of collection {collection} failed: {message}")]
    Enumeration { collection: String, message: String },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL template in config: {0}")]
    InvalidTemplate(String),
}

/// Result type alias for Media-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use model::{CollectionRef, MediaItem};
pub use state::CrawlState;
