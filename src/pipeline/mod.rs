//! Per-item action pipeline
//!
//! This module contains:
//! - The gated `Action` contract and the short-circuiting `Pipeline`
//! - The per-item `TaskContext`
//! - The media actions (page fetch, URL resolution, stream download, merge, mark, clean-up)
//! - The external media processor seam
//! - The factory that assembles one pipeline per item

mod action;
mod actions;
mod context;
mod factory;
mod media;
mod playinfo;

pub use action::{call, Action, Pipeline};
pub use actions::{
    base_headers, CleanUp, DownloadStream, FetchItemPage, MarkMedia, MergeMedia, ResolveMediaUrls,
    StreamKind,
};
pub use context::{ItemPaths, TaskContext};
pub use factory::{ItemTask, MediaPipelineFactory, PipelineFactory};
pub use media::{brand, is_branded, FfmpegProcessor, MediaProcessor};
pub use playinfo::{extract_media_urls, extract_playinfo, MediaUrls};
