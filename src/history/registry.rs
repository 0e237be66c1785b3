//! Path-keyed registry of history stores
//!
//! Every absolute ledger path maps to exactly one `HistoryStore`, so pipelines
//! that target the same collection share one mirror and one file lock while
//! unrelated collections stay independent.

use crate::history::store::HistoryStore;
use crate::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// Lazily populated map from absolute path to store instance
#[derive(Debug, Default)]
pub struct HistoryRegistry {
    stores: Mutex<HashMap<PathBuf, Arc<HistoryStore>>>,
}

static GLOBAL: OnceLock<HistoryRegistry> = OnceLock::new();

impl HistoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry
    pub fn global() -> &'static HistoryRegistry {
        GLOBAL.get_or_init(HistoryRegistry::new)
    }

    /// Returns the store for `path`, creating and loading it on first use
    ///
    /// Later calls with the same path return the existing instance unchanged;
    /// the separator passed on first use wins.
    pub fn open(&self, path: &Path, separator: &str) -> Result<Arc<HistoryStore>> {
        let key = std::path::absolute(path)?;
        let mut stores = self.stores.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = stores.get(&key) {
            if existing.separator() != separator {
                tracing::debug!(
                    "History {} already open with separator {:?}, ignoring {:?}",
                    key.display(),
                    existing.separator(),
                    separator
                );
            }
            return Ok(Arc::clone(existing));
        }

        let store = Arc::new(HistoryStore::new(key.clone(), separator));
        store.load()?;
        stores.insert(key, Arc::clone(&store));
        Ok(store)
    }

    /// Number of distinct stores opened so far
    pub fn len(&self) -> usize {
        self.stores
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
