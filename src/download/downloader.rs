//! Resumable chunked downloader
//!
//! A download probes the target size, splits it into fixed-length byte ranges,
//! skips the ranges already covered by an existing partial file, and fetches
//! the rest concurrently. Each worker opens its own read+write handle and
//! writes its range at the range's offset, so completion order does not matter.

use crate::config::DownloadConfig;
use crate::download::chunk::{plan_chunks, resume_chunks, ChunkRange, DEFAULT_CHUNK_SIZE};
use crate::download::transport::{HeaderList, Transport};
use crate::{HarvestError, Result};
use std::io::SeekFrom;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs::OpenOptions;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// What to fetch and where to put it
#[derive(Debug, Clone)]
pub struct DownloadSpec {
    pub url: String,
    pub headers: HeaderList,
    pub destination: PathBuf,
}

/// Outcome of one download invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadReport {
    /// Size reported by the probe
    pub total_size: u64,

    /// Length of the destination before this run
    pub existing_len: u64,

    /// Ranges sent to workers this run
    pub chunks_dispatched: usize,

    /// Ranges that failed and left a hole in the file
    pub chunks_failed: usize,

    /// Bytes written this run
    pub bytes_written: u64,
}

impl DownloadReport {
    /// True when every dispatched range was written in full
    pub fn is_complete(&self) -> bool {
        self.chunks_failed == 0
    }
}

/// Fetches a URL into a file with parallel byte-range requests
#[derive(Clone)]
pub struct ChunkedDownloader {
    transport: Arc<dyn Transport>,
    chunk_size: u64,
    workers: usize,
}

impl ChunkedDownloader {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            chunk_size: DEFAULT_CHUNK_SIZE,
            workers: 8,
        }
    }

    pub fn from_config(transport: Arc<dyn Transport>, config: &DownloadConfig) -> Self {
        Self::new(transport)
            .with_chunk_size(config.chunk_size)
            .with_workers(config.chunk_workers)
    }

    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Probes the target and works out which ranges still need fetching
    ///
    /// Creates the destination directory and an empty destination file when
    /// they are missing. Fails when the size cannot be determined.
    pub async fn prepare(&self, spec: &DownloadSpec) -> Result<(u64, u64, Vec<ChunkRange>)> {
        if let Some(parent) = spec.destination.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let total_size = match self.transport.content_length(&spec.url, &spec.headers).await? {
            Some(size) if size > 0 => size,
            _ => {
                return Err(HarvestError::SizeUnavailable {
                    url: spec.url.clone(),
                })
            }
        };

        let existing_len = match tokio::fs::metadata(&spec.destination).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tokio::fs::File::create(&spec.destination).await?;
                0
            }
            Err(e) => return Err(HarvestError::Io(e)),
        };

        let chunks = resume_chunks(plan_chunks(total_size, self.chunk_size), existing_len);
        Ok((total_size, existing_len, chunks))
    }

    /// Downloads `spec.url` into `spec.destination`
    ///
    /// Returns `Err` only when the download could not start (size probe or
    /// destination setup failed). Per-range failures are logged and counted in
    /// the report; they are not retried.
    pub async fn download(&self, spec: &DownloadSpec) -> Result<DownloadReport> {
        let (total_size, existing_len, chunks) = self.prepare(spec).await?;

        let mut report = DownloadReport {
            total_size,
            existing_len,
            chunks_dispatched: chunks.len(),
            ..DownloadReport::default()
        };

        if chunks.is_empty() {
            tracing::info!(
                "{} already complete ({} of {} bytes)",
                spec.destination.display(),
                existing_len,
                total_size
            );
            return Ok(report);
        }

        tracing::debug!(
            "Downloading {} in {} ranges ({} bytes, {} on disk)",
            spec.url,
            chunks.len(),
            total_size,
            existing_len
        );

        let spec = Arc::new(spec.clone());
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();

        for range in chunks {
            let transport = Arc::clone(&self.transport);
            let spec = Arc::clone(&spec);
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return (range, Err(HarvestError::Io(std::io::ErrorKind::Interrupted.into()))),
                };
                let result = fetch_range(transport.as_ref(), &spec, range).await;
                (range, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(written))) => report.bytes_written += written,
                Ok((range, Err(e))) => {
                    tracing::warn!("Range {} of {} failed: {}", range, spec.url, e);
                    report.chunks_failed += 1;
                }
                Err(e) => {
                    tracing::error!("Range worker for {} panicked: {}", spec.url, e);
                    report.chunks_failed += 1;
                }
            }
        }

        if !report.is_complete() {
            tracing::warn!(
                "{} incomplete: {}/{} ranges failed",
                spec.destination.display(),
                report.chunks_failed,
                report.chunks_dispatched
            );
        }

        Ok(report)
    }
}

/// Streams one range into the destination at the range's offset
async fn fetch_range(transport: &dyn Transport, spec: &DownloadSpec, range: ChunkRange) -> Result<u64> {
    let mut body = transport.get_range(&spec.url, &spec.headers, range).await?;

    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(&spec.destination)
        .await?;
    file.seek(SeekFrom::Start(range.start)).await?;

    let expected = range.len();
    let mut written = 0u64;

    while written < expected {
        let Some(bytes) = body.next_chunk().await? else {
            break;
        };
        let take = (expected - written).min(bytes.len() as u64) as usize;
        file.write_all(&bytes[..take]).await?;
        written += take as u64;
    }
    file.flush().await?;

    if written < expected {
        return Err(HarvestError::ShortBody {
            url: spec.url.clone(),
            expected,
            received: written,
        });
    }

    Ok(written)
}
