//! Append-only history ledger for one collection

use crate::{HarvestError, Result};
use std::collections::{HashMap, HashSet};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Default field delimiter for history lines
pub const DEFAULT_SEPARATOR: &str = ";";

/// A value to append to the ledger
///
/// A list of fields is joined with the store's separator into one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryRecord {
    Single(String),
    Fields(Vec<String>),
}

impl HistoryRecord {
    /// Renders the record as exactly one ledger line
    fn to_line(&self, separator: &str) -> String {
        match self {
            Self::Single(value) => single_line(value),
            Self::Fields(fields) => fields
                .iter()
                .map(|field| clean_field(field, separator))
                .collect::<Vec<_>>()
                .join(separator),
        }
    }
}

fn single_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

/// Flattens line breaks and strips the separator from both ends of a field
fn clean_field(field: &str, separator: &str) -> String {
    let field = single_line(field);
    if separator.is_empty() {
        return field;
    }
    field
        .trim_start_matches(separator)
        .trim_end_matches(separator)
        .to_string()
}

impl From<&str> for HistoryRecord {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for HistoryRecord {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for HistoryRecord {
    fn from(fields: Vec<String>) -> Self {
        Self::Fields(fields)
    }
}

impl From<&[&str]> for HistoryRecord {
    fn from(fields: &[&str]) -> Self {
        Self::Fields(fields.iter().map(|f| f.to_string()).collect())
    }
}

#[derive(Debug, Default)]
struct HistoryState {
    /// Deduplicated lines of the ledger file
    records: HashSet<String>,

    /// Memoized membership answers, keyed by lookup key
    cache: HashMap<String, bool>,
}

/// Durable membership ledger backed by a newline-delimited file
///
/// The file is the source of truth; the in-memory record set and lookup cache
/// mirror it. One mutex guards the mirror and the file appends, so the store
/// can be shared between concurrently running item pipelines.
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    separator: String,
    state: Mutex<HistoryState>,
}

impl HistoryStore {
    /// Creates an empty, unloaded store for `path`
    pub fn new(path: impl Into<PathBuf>, separator: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            separator: separator.into(),
            state: Mutex::new(HistoryState::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    fn lock(&self) -> MutexGuard<'_, HistoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reads the ledger file into memory
    ///
    /// A missing file yields an empty ledger. Any previous in-memory state,
    /// including the lookup cache, is replaced.
    pub fn load(&self) -> Result<()> {
        let records = match std::fs::read_to_string(&self.path) {
            Ok(content) => content
                .lines()
                .map(|line| line.trim_end_matches('\r'))
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No history at {}, starting empty", self.path.display());
                HashSet::new()
            }
            Err(e) => return Err(HarvestError::Io(e)),
        };

        let mut state = self.lock();
        state.records = records;
        state.cache.clear();
        tracing::debug!(
            "Loaded {} history records from {}",
            state.records.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Returns true if any recorded line contains `key`
    pub fn contains(&self, key: &str) -> bool {
        let mut state = self.lock();
        if let Some(hit) = state.cache.get(key) {
            return *hit;
        }

        let hit = state.records.iter().any(|record| record.contains(key));
        state.cache.insert(key.to_string(), hit);
        hit
    }

    /// Appends one record to the ledger
    ///
    /// The line is written and flushed before the in-memory mirror changes; a
    /// failed write leaves the store exactly as it was.
    pub fn store(&self, record: impl Into<HistoryRecord>) -> Result<()> {
        let line = record.into().to_line(&self.separator);
        let mut state = self.lock();

        self.append_line(&line).map_err(|source| HarvestError::History {
            path: self.path.clone(),
            source,
        })?;

        for (key, hit) in state.cache.iter_mut() {
            if !*hit && line.contains(key.as_str()) {
                *hit = true;
            }
        }
        state.cache.insert(line.clone(), true);
        state.records.insert(line);
        Ok(())
    }

    fn append_line(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(format!("{}\n", line).as_bytes())?;
        file.flush()
    }

    /// Number of distinct records held in memory
    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
