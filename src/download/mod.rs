//! Download module for media payloads
//!
//! This module contains:
//! - Byte-range planning and resume filtering
//! - The transport seam (HEAD probe, text GET, ranged GET) and its reqwest implementation
//! - The resumable chunked downloader

mod chunk;
mod downloader;
mod transport;

pub use chunk::{plan_chunks, resume_chunks, ChunkRange, DEFAULT_CHUNK_SIZE};
pub use downloader::{ChunkedDownloader, DownloadReport, DownloadSpec};
pub use transport::{build_http_client, BodyStream, HeaderList, HttpTransport, Transport};
