//! Per-item scratch space shared by one pipeline's actions

use crate::config::MediaConfig;
use crate::model::{CollectionRef, MediaItem};
use crate::url::sanitize_filename;
use std::path::{Path, PathBuf};

/// Where an item's files live on disk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPaths {
    /// Intermediate video stream
    pub video: PathBuf,

    /// Intermediate audio stream
    pub audio: PathBuf,

    /// Merged container
    pub output: PathBuf,
}

impl ItemPaths {
    /// Lays out `<output_dir>/<collection name>/...` for one item
    pub fn resolve(
        output_dir: &Path,
        collection: &CollectionRef,
        item: &MediaItem,
        media: &MediaConfig,
    ) -> Self {
        let folder = output_dir.join(sanitize_filename(&collection.name));
        let title = sanitize_filename(&item.title);

        let stem = |fallback: &str| {
            if title.is_empty() {
                fallback.to_string()
            } else {
                title.clone()
            }
        };

        Self {
            video: folder.join(format!("{}{}{}", media.prefix, stem("video"), media.video_suffix)),
            audio: folder.join(format!("{}{}{}", media.prefix, stem("audio"), media.audio_suffix)),
            output: folder.join(format!("{}{}", stem("video"), media.video_suffix)),
        }
    }
}

/// Mutable state carried through one item's pipeline
///
/// Created per item and dropped when its pipeline finishes; never shared
/// between items.
#[derive(Debug, Clone)]
pub struct TaskContext {
    pub collection: CollectionRef,
    pub item: MediaItem,
    pub paths: ItemPaths,

    /// Re-download even when the destination already exists
    pub override_existing: bool,

    /// Page describing the item
    pub item_url: String,

    /// HTML of the item page once fetched
    pub item_page: Option<String>,

    pub video_url: Option<String>,
    pub audio_url: Option<String>,

    pub merged: bool,
    pub marked: bool,
}

impl TaskContext {
    pub fn new(collection: CollectionRef, item: MediaItem) -> Self {
        Self {
            collection,
            item,
            paths: ItemPaths::default(),
            override_existing: false,
            item_url: String::new(),
            item_page: None,
            video_url: None,
            audio_url: None,
            merged: false,
            marked: false,
        }
    }

    pub fn with_paths(mut self, paths: ItemPaths) -> Self {
        self.paths = paths;
        self
    }

    pub fn with_item_url(mut self, url: impl Into<String>) -> Self {
        self.item_url = url.into();
        self
    }

    pub fn with_override(mut self, override_existing: bool) -> Self {
        self.override_existing = override_existing;
        self
    }
}
