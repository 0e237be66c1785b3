use serde::Deserialize;

/// Main configuration structure for Media-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    pub source: SourceConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default, rename = "collection")]
    pub collections: Vec<CollectionEntry>,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Root directory that receives one folder per collection
    #[serde(rename = "output-dir")]
    pub output_dir: String,

    /// Re-download items whose files already exist
    #[serde(rename = "override", default)]
    pub override_existing: bool,

    /// Walk every page instead of stopping at the first recorded item
    #[serde(default)]
    pub ergodic: bool,

    /// Minimum time spent on each listing page (seconds)
    #[serde(rename = "page-delay", default = "default_page_delay")]
    pub page_delay: u64,

    /// Upper bound of the random delay added after each page (milliseconds)
    #[serde(rename = "page-jitter-ms", default = "default_page_jitter_ms")]
    pub page_jitter_ms: u64,

    /// Number of item pipelines running at once
    #[serde(rename = "item-workers", default = "default_item_workers")]
    pub item_workers: usize,
}

/// Chunked transfer configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadConfig {
    /// Length of one byte-range request
    #[serde(rename = "chunk-size", default = "default_chunk_size")]
    pub chunk_size: u64,

    /// Number of ranges fetched at once for a single file
    #[serde(rename = "chunk-workers", default = "default_chunk_workers")]
    pub chunk_workers: usize,

    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default)]
    pub cookie: String,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Remote source URL templates
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Listing endpoint; `{collection}` and `{page}` are substituted
    #[serde(rename = "listing-url")]
    pub listing_url: String,

    /// Item page; `{id}` is substituted
    #[serde(rename = "item-url")]
    pub item_url: String,
}

/// History ledger configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_history_folder")]
    pub folder: String,

    #[serde(default = "default_history_extension")]
    pub extension: String,

    #[serde(default = "default_separator")]
    pub separator: String,
}

/// Media naming and post-processing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    /// Path or name of the ffmpeg binary
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,

    /// Prefix for the intermediate stream files
    #[serde(default = "default_prefix")]
    pub prefix: String,

    #[serde(rename = "video-suffix", default = "default_video_suffix")]
    pub video_suffix: String,

    #[serde(rename = "audio-suffix", default = "default_audio_suffix")]
    pub audio_suffix: String,

    /// Brand the merged file with `mark-symbol`
    #[serde(default = "default_mark")]
    pub mark: bool,

    #[serde(rename = "mark-symbol", default = "default_mark_symbol")]
    pub mark_symbol: String,
}

/// One enumerable source (e.g. one author's uploads)
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionEntry {
    pub id: String,
    pub name: String,
}

fn default_page_delay() -> u64 {
    5
}

fn default_page_jitter_ms() -> u64 {
    500
}

fn default_item_workers() -> usize {
    5
}

fn default_chunk_size() -> u64 {
    1024 * 1024
}

fn default_chunk_workers() -> usize {
    8
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_history_folder() -> String {
    "./history".to_string()
}

fn default_history_extension() -> String {
    ".txt".to_string()
}

fn default_separator() -> String {
    ";".to_string()
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_prefix() -> String {
    "#_".to_string()
}

fn default_video_suffix() -> String {
    ".mp4".to_string()
}

fn default_audio_suffix() -> String {
    ".mp3".to_string()
}

fn default_mark() -> bool {
    true
}

fn default_mark_symbol() -> String {
    "C".to_string()
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_workers: default_chunk_workers(),
            user_agent: default_user_agent(),
            cookie: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            folder: default_history_folder(),
            extension: default_history_extension(),
            separator: default_separator(),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
            prefix: default_prefix(),
            video_suffix: default_video_suffix(),
            audio_suffix: default_audio_suffix(),
            mark: default_mark(),
            mark_symbol: default_mark_symbol(),
        }
    }
}
