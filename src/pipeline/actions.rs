//! Concrete steps of the media pipeline
//!
//! In execution order: fetch the item page, resolve stream URLs, download the
//! video and audio streams, merge them, brand the merged output, and remove
//! the intermediates.

use crate::config::DownloadConfig;
use crate::download::{ChunkedDownloader, DownloadSpec, HeaderList, Transport};
use crate::pipeline::action::Action;
use crate::pipeline::context::TaskContext;
use crate::pipeline::media::{brand, is_branded, MediaProcessor};
use crate::pipeline::playinfo::extract_media_urls;
use crate::HarvestError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// User agent and cookie headers sent with every request of an item
pub fn base_headers(config: &DownloadConfig) -> HeaderList {
    let mut headers = HeaderList::new();
    headers.insert("User-Agent".to_string(), config.user_agent.clone());
    if !config.cookie.is_empty() {
        headers.insert("Cookie".to_string(), config.cookie.clone());
    }
    headers
}

/// Fetches the item page HTML into the context
pub struct FetchItemPage {
    transport: Arc<dyn Transport>,
    headers: HeaderList,
}

impl FetchItemPage {
    pub fn new(transport: Arc<dyn Transport>, headers: HeaderList) -> Self {
        Self { transport, headers }
    }
}

#[async_trait]
impl Action for FetchItemPage {
    fn name(&self) -> &'static str {
        "fetch_item_page"
    }

    fn met(&self, ctx: &TaskContext) -> bool {
        !ctx.item_url.is_empty()
    }

    async fn invoke(&self, ctx: &mut TaskContext) -> bool {
        let result = self.transport.get_text(&ctx.item_url, &self.headers).await;
        match result {
            Ok(html) => {
                ctx.item_page = Some(html);
                true
            }
            Err(e) => {
                tracing::warn!("[{}] Failed to fetch item page: {}", ctx.item.id, e);
                false
            }
        }
    }
}

/// Reads the stream URLs out of the fetched page
pub struct ResolveMediaUrls;

#[async_trait]
impl Action for ResolveMediaUrls {
    fn name(&self) -> &'static str {
        "resolve_media_urls"
    }

    fn met(&self, ctx: &TaskContext) -> bool {
        ctx.item_page.as_deref().is_some_and(|page| !page.is_empty())
    }

    async fn invoke(&self, ctx: &mut TaskContext) -> bool {
        let page = ctx.item_page.as_deref().unwrap_or_default();
        match extract_media_urls(page) {
            Some(urls) => {
                ctx.video_url = Some(urls.video);
                ctx.audio_url = Some(urls.audio);
                true
            }
            None => {
                let err = HarvestError::MissingMediaUrl {
                    id: ctx.item.id.clone(),
                };
                tracing::warn!("{}", err);
                false
            }
        }
    }
}

/// Which of the two streams a `DownloadStream` handles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Video,
    Audio,
}

impl StreamKind {
    fn url(self, ctx: &TaskContext) -> Option<&str> {
        match self {
            StreamKind::Video => ctx.video_url.as_deref(),
            StreamKind::Audio => ctx.audio_url.as_deref(),
        }
    }

    fn destination(self, ctx: &TaskContext) -> &Path {
        match self {
            StreamKind::Video => &ctx.paths.video,
            StreamKind::Audio => &ctx.paths.audio,
        }
    }
}

/// Downloads one stream to its intermediate path
pub struct DownloadStream {
    kind: StreamKind,
    downloader: ChunkedDownloader,
    headers: HeaderList,
}

impl DownloadStream {
    pub fn new(kind: StreamKind, downloader: ChunkedDownloader, headers: HeaderList) -> Self {
        Self {
            kind,
            downloader,
            headers,
        }
    }
}

#[async_trait]
impl Action for DownloadStream {
    fn name(&self) -> &'static str {
        match self.kind {
            StreamKind::Video => "download_video",
            StreamKind::Audio => "download_audio",
        }
    }

    fn met(&self, ctx: &TaskContext) -> bool {
        ctx.override_existing || !self.kind.destination(ctx).exists()
    }

    async fn invoke(&self, ctx: &mut TaskContext) -> bool {
        let Some(url) = self.kind.url(ctx) else {
            tracing::warn!("{}", HarvestError::MissingMediaUrl { id: ctx.item.id.clone() });
            return false;
        };

        let mut headers = self.headers.clone();
        if !ctx.item_url.is_empty() {
            headers.insert("Referer".to_string(), ctx.item_url.clone());
        }

        let spec = DownloadSpec {
            url: url.to_string(),
            headers,
            destination: self.kind.destination(ctx).to_path_buf(),
        };

        match self.downloader.download(&spec).await {
            Ok(report) => {
                tracing::debug!(
                    "[{}] {}: {} bytes written, {} on disk before",
                    ctx.item.id,
                    self.name(),
                    report.bytes_written,
                    report.existing_len
                );
                report.is_complete()
            }
            Err(e) => {
                tracing::warn!("[{}] {} failed: {}", ctx.item.id, self.name(), e);
                false
            }
        }
    }
}

/// Merges the two intermediates into the output container
pub struct MergeMedia {
    processor: Arc<dyn MediaProcessor>,
}

impl MergeMedia {
    pub fn new(processor: Arc<dyn MediaProcessor>) -> Self {
        Self { processor }
    }
}

#[async_trait]
impl Action for MergeMedia {
    fn name(&self) -> &'static str {
        "merge_media"
    }

    async fn invoke(&self, ctx: &mut TaskContext) -> bool {
        let paths = &ctx.paths;
        if !paths.video.exists() || !paths.audio.exists() {
            tracing::warn!("[{}] Cannot merge: intermediate stream missing", ctx.item.id);
            return false;
        }

        let inputs: Vec<PathBuf> = vec![paths.video.clone(), paths.audio.clone()];
        let result = self.processor.merge(&inputs, &paths.output).await;
        match result {
            Ok(0) => {
                ctx.merged = true;
                true
            }
            Ok(code) => {
                tracing::warn!("[{}] Merge exited with status {}", ctx.item.id, code);
                false
            }
            Err(e) => {
                tracing::error!("[{}] Merge failed: {}", ctx.item.id, e);
                false
            }
        }
    }
}

/// Brands the merged output's final byte
pub struct MarkMedia {
    symbol: u8,
}

impl MarkMedia {
    pub fn new(symbol: u8) -> Self {
        Self { symbol }
    }
}

#[async_trait]
impl Action for MarkMedia {
    fn name(&self) -> &'static str {
        "mark_media"
    }

    fn met(&self, ctx: &TaskContext) -> bool {
        ctx.paths.output.exists()
    }

    async fn invoke(&self, ctx: &mut TaskContext) -> bool {
        if let Ok(true) = is_branded(&ctx.paths.output, self.symbol).await {
            tracing::debug!("[{}] {} already marked", ctx.item.id, ctx.paths.output.display());
            ctx.marked = true;
            return true;
        }

        let result = brand(&ctx.paths.output, self.symbol).await;
        match result {
            Ok(marked) => {
                ctx.marked = marked;
                marked
            }
            Err(e) => {
                tracing::warn!("[{}] Failed to mark {}: {}", ctx.item.id, ctx.paths.output.display(), e);
                false
            }
        }
    }
}

/// Removes the intermediate stream files
pub struct CleanUp;

#[async_trait]
impl Action for CleanUp {
    fn name(&self) -> &'static str {
        "clean_up"
    }

    async fn invoke(&self, ctx: &mut TaskContext) -> bool {
        for path in [&ctx.paths.video, &ctx.paths.audio] {
            if let Err(e) = tokio::fs::remove_file(path).await {
                tracing::warn!("[{}] Failed to remove {}: {}", ctx.item.id, path.display(), e);
                return false;
            }
        }
        true
    }
}
