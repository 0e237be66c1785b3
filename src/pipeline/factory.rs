//! Builds one pipeline and context per discovered item

use crate::config::Config;
use crate::download::{ChunkedDownloader, Transport};
use crate::model::{CollectionRef, MediaItem};
use crate::pipeline::action::Pipeline;
use crate::pipeline::actions::{
    base_headers, CleanUp, DownloadStream, FetchItemPage, MarkMedia, MergeMedia, ResolveMediaUrls,
    StreamKind,
};
use crate::pipeline::context::{ItemPaths, TaskContext};
use crate::pipeline::media::MediaProcessor;
use crate::url::render_template;
use std::path::PathBuf;
use std::sync::Arc;

/// A pipeline paired with the context it runs against
pub struct ItemTask {
    pub pipeline: Pipeline,
    pub context: TaskContext,
}

impl ItemTask {
    pub fn new(pipeline: Pipeline, context: TaskContext) -> Self {
        Self { pipeline, context }
    }

    /// Runs the pipeline to completion or first failure
    pub async fn run(mut self) -> bool {
        self.pipeline.run(&mut self.context).await
    }
}

/// Creates the work for one item of a collection
pub trait PipelineFactory: Send + Sync {
    fn build(&self, collection: &CollectionRef, item: &MediaItem) -> ItemTask;
}

/// Factory for the download, merge, mark and clean-up pipeline
pub struct MediaPipelineFactory {
    config: Arc<Config>,
    transport: Arc<dyn Transport>,
    processor: Arc<dyn MediaProcessor>,
}

impl MediaPipelineFactory {
    pub fn new(
        config: Arc<Config>,
        transport: Arc<dyn Transport>,
        processor: Arc<dyn MediaProcessor>,
    ) -> Self {
        Self {
            config,
            transport,
            processor,
        }
    }

    fn item_url(&self, item: &MediaItem) -> String {
        match render_template(&self.config.source.item_url, &[("id", item.id.as_str())]) {
            Ok(url) => url.to_string(),
            Err(e) => {
                tracing::warn!("[{}] Cannot build item URL: {}", item.id, e);
                String::new()
            }
        }
    }

    fn pipeline(&self) -> Pipeline {
        let headers = base_headers(&self.config.download);
        let downloader =
            ChunkedDownloader::from_config(Arc::clone(&self.transport), &self.config.download);

        let mut pipeline = Pipeline::new()
            .then(FetchItemPage::new(Arc::clone(&self.transport), headers.clone()))
            .then(ResolveMediaUrls)
            .then(DownloadStream::new(StreamKind::Video, downloader.clone(), headers.clone()))
            .then(DownloadStream::new(StreamKind::Audio, downloader, headers))
            .then(MergeMedia::new(Arc::clone(&self.processor)));

        let media = &self.config.media;
        if media.mark {
            if let Some(&symbol) = media.mark_symbol.as_bytes().first() {
                pipeline = pipeline.then(MarkMedia::new(symbol));
            }
        }

        pipeline.then(CleanUp)
    }
}

impl PipelineFactory for MediaPipelineFactory {
    fn build(&self, collection: &CollectionRef, item: &MediaItem) -> ItemTask {
        let paths = ItemPaths::resolve(
            &PathBuf::from(&self.config.crawler.output_dir),
            collection,
            item,
            &self.config.media,
        );

        let context = TaskContext::new(collection.clone(), item.clone())
            .with_paths(paths)
            .with_item_url(self.item_url(item))
            .with_override(self.config.crawler.override_existing);

        ItemTask::new(self.pipeline(), context)
    }
}
