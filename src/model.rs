//! Core data types shared by the crawler, the pipeline and the history ledger

use crate::config::CollectionEntry;
use serde_json::Value;
use std::fmt;

/// One enumerable source, e.g. one author's uploads
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionRef {
    /// Opaque identifier understood by the page navigator
    pub id: String,

    /// Display name, also used for folder and history file names
    pub name: String,
}

impl CollectionRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl From<&CollectionEntry> for CollectionRef {
    fn from(entry: &CollectionEntry) -> Self {
        Self::new(entry.id.clone(), entry.name.clone())
    }
}

impl fmt::Display for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// One unit of content discovered on a listing page
#[derive(Debug, Clone, PartialEq)]
pub struct MediaItem {
    /// Stable content identifier
    pub id: String,

    /// Title as reported by the source (not yet sanitized)
    pub title: String,

    /// Raw listing entry as provided by the source
    pub raw: Value,
}

impl MediaItem {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            raw: Value::Null,
        }
    }

    pub fn with_raw(mut self, raw: Value) -> Self {
        self.raw = raw;
        self
    }
}

/// Position of a page within a collection's listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationInfo {
    /// 1-based page index
    pub page: u32,

    /// Total page count reported by the source
    pub total_pages: u32,
}

/// Structured content of one listing page
#[derive(Debug, Clone, PartialEq)]
pub struct PagePayload {
    /// Items in source order (assumed newest first)
    pub items: Vec<MediaItem>,
    pub pagination: PaginationInfo,
}
