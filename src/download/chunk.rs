//! Byte-range planning for chunked downloads

use std::fmt;

/// Default length of one ranged request (1 MiB)
pub const DEFAULT_CHUNK_SIZE: u64 = 1024 * 1024;

/// Inclusive byte range `[start, end]` of a download target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkRange {
    pub start: u64,
    pub end: u64,
}

impl ChunkRange {
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end, "empty chunk range {}-{}", start, end);
        Self { start, end }
    }

    /// Number of bytes covered by the range
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Value for the HTTP `Range` request header
    pub fn header_value(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }
}

impl fmt::Display for ChunkRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Partitions `[0, size)` into ranges of `chunk_size` bytes
///
/// Produces `size / chunk_size` full ranges followed by one remainder range
/// when the size is not a multiple of the chunk length. A zero size or zero
/// chunk length yields no ranges.
pub fn plan_chunks(size: u64, chunk_size: u64) -> Vec<ChunkRange> {
    if size == 0 || chunk_size == 0 {
        return Vec::new();
    }

    let full = size / chunk_size;
    let mut chunks: Vec<ChunkRange> = (0..full)
        .map(|i| ChunkRange::new(i * chunk_size, (i + 1) * chunk_size - 1))
        .collect();

    if size % chunk_size != 0 || full == 0 {
        chunks.push(ChunkRange::new(full * chunk_size, size - 1));
    }

    chunks
}

/// Drops every range that starts before `existing_len`
///
/// This is resume-by-length: a range straddling the boundary is treated as
/// already written.
pub fn resume_chunks(chunks: Vec<ChunkRange>, existing_len: u64) -> Vec<ChunkRange> {
    chunks
        .into_iter()
        .filter(|chunk| chunk.start >= existing_len)
        .collect()
}
