//! Crawl manager: runs every configured collection in turn

use crate::config::Config;
use crate::crawler::controller::{ControllerOptions, CrawlReport, PaginationController};
use crate::crawler::navigator::{ApiNavigator, PageNavigator};
use crate::download::Transport;
use crate::history::{history_path, HistoryRegistry};
use crate::model::CollectionRef;
use crate::pipeline::{base_headers, MediaPipelineFactory, MediaProcessor, PipelineFactory};
use crate::{HarvestError, Result};
use std::path::Path;
use std::sync::Arc;

type NavigatorBuilder = dyn Fn(&CollectionRef) -> Box<dyn PageNavigator> + Send + Sync;

/// Wires history, navigation and pipelines together per collection
pub struct CrawlManager {
    config: Arc<Config>,
    registry: &'static HistoryRegistry,
    factory: Arc<dyn PipelineFactory>,
    navigators: Box<NavigatorBuilder>,
}

impl CrawlManager {
    /// Manager backed by the JSON listing navigator and the media pipeline
    pub fn new(config: Arc<Config>, transport: Arc<dyn Transport>, processor: Arc<dyn MediaProcessor>) -> Self {
        let factory = Arc::new(MediaPipelineFactory::new(
            Arc::clone(&config),
            Arc::clone(&transport),
            processor,
        ));

        let listing_url = config.source.listing_url.clone();
        let headers = base_headers(&config.download);
        let navigators = Box::new(move |_: &CollectionRef| -> Box<dyn PageNavigator> {
            Box::new(ApiNavigator::new(
                Arc::clone(&transport),
                listing_url.clone(),
                headers.clone(),
            ))
        });

        Self {
            config,
            registry: HistoryRegistry::global(),
            factory,
            navigators,
        }
    }

    /// Replaces the per-item pipeline factory
    pub fn with_factory(mut self, factory: Arc<dyn PipelineFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// Replaces how navigators are created for each collection
    pub fn with_navigators<F>(mut self, build: F) -> Self
    where
        F: Fn(&CollectionRef) -> Box<dyn PageNavigator> + Send + Sync + 'static,
    {
        self.navigators = Box::new(build);
        self
    }

    /// Crawls one collection
    pub async fn run_collection(&self, collection: &CollectionRef) -> Result<CrawlReport> {
        let history = &self.config.history;
        let path = history_path(Path::new(&history.folder), collection, &history.extension);
        let store = self.registry.open(&path, &history.separator)?;

        tracing::info!(
            "Crawling {} ({} recorded items in {})",
            collection,
            store.len(),
            path.display()
        );

        let controller = PaginationController::new(
            ControllerOptions::from_config(&self.config.crawler),
            store,
            Arc::clone(&self.factory),
        );
        let mut navigator = (self.navigators)(collection);
        controller.run(collection, navigator.as_mut()).await
    }

    /// Crawls every configured collection sequentially
    ///
    /// A failing collection does not stop the others. The result is an error
    /// when at least one collection could not be enumerated.
    pub async fn run(&self) -> Result<Vec<CrawlReport>> {
        let mut reports = Vec::new();
        let mut failed = Vec::new();

        for entry in &self.config.collections {
            let collection = CollectionRef::from(entry);
            match self.run_collection(&collection).await {
                Ok(report) => reports.push(report),
                Err(e) => {
                    tracing::error!("{}: {}", collection, e);
                    failed.push(collection.to_string());
                }
            }
        }

        if failed.is_empty() {
            Ok(reports)
        } else {
            Err(HarvestError::Enumeration {
                collection: failed.join(", "),
                message: format!("{} of {} collections failed", failed.len(), self.config.collections.len()),
            })
        }
    }
}
