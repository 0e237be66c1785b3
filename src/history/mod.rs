//! History module: per-collection dedup ledger
//!
//! This module handles:
//! - Loading the newline-delimited ledger file into memory
//! - Thread-safe membership checks with a lookup cache
//! - Appending records under a per-store lock
//! - Sharing one store per absolute path across the process

mod registry;
mod store;

pub use registry::HistoryRegistry;
pub use store::{HistoryRecord, HistoryStore, DEFAULT_SEPARATOR};

use crate::model::CollectionRef;
use crate::url::sanitize_filename;
use std::path::{Path, PathBuf};

/// Ledger path for a collection: `<folder>/<name>-<id><extension>`
pub fn history_path(folder: &Path, collection: &CollectionRef, extension: &str) -> PathBuf {
    folder.join(format!(
        "{}-{}{}",
        sanitize_filename(&collection.name),
        sanitize_filename(&collection.id),
        extension
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_path() {
        let collection = CollectionRef::new("8047632", "someone");
        let path = history_path(Path::new("/var/history"), &collection, ".txt");
        assert_eq!(path, PathBuf::from("/var/history/someone-8047632.txt"));
    }
}
