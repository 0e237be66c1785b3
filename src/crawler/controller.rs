//! Pagination crawl controller
//!
//! Drives one collection through the crawl state machine:
//!
//! ```text
//! Start -> FetchPage -> FilterNewItems -> DispatchItems -> Delay -> NextPage -> FetchPage ...
//!                                    \-> Delay                            \-> Stop
//!                                    \-> Stop (frontier, nothing new)
//! ```
//!
//! Items on a page are assumed to be newest first. Unless ergodic mode is
//! on, the first item already in history marks the frontier: everything
//! before it is dispatched and the crawl of the collection stops.

use crate::config::CrawlerConfig;
use crate::crawler::navigator::PageNavigator;
use crate::history::HistoryStore;
use crate::model::{CollectionRef, MediaItem, PagePayload};
use crate::pipeline::PipelineFactory;
use crate::state::CrawlState;
use crate::{HarvestError, Result};
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Tunables for one controller
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Walk every page instead of stopping at the history frontier
    pub ergodic: bool,

    /// With `ergodic`, dispatch recorded items again
    pub override_existing: bool,

    /// Minimum time between the start of consecutive page fetches
    pub page_interval: Duration,

    /// Upper bound of the random extra delay added after each page
    pub jitter: Duration,

    /// Item pipelines allowed to run at once
    pub item_workers: usize,
}

impl ControllerOptions {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            ergodic: config.ergodic,
            override_existing: config.override_existing,
            page_interval: Duration::from_secs(config.page_delay),
            jitter: Duration::from_millis(config.page_jitter_ms),
            item_workers: config.item_workers.max(1),
        }
    }
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            ergodic: false,
            override_existing: false,
            page_interval: Duration::from_secs(5),
            jitter: Duration::from_millis(500),
            item_workers: 5,
        }
    }
}

/// Summary of one collection's crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub collection: CollectionRef,

    /// Pages whose payload was received
    pub pages_visited: u32,

    /// Ids handed to pipelines, in dispatch order
    pub dispatched: Vec<String>,

    pub succeeded: usize,
    pub failed: usize,

    /// Whether an already-recorded item stopped the walk
    pub frontier_reached: bool,

    pub final_state: CrawlState,
}

impl CrawlReport {
    fn new(collection: CollectionRef) -> Self {
        Self {
            collection,
            pages_visited: 0,
            dispatched: Vec::new(),
            succeeded: 0,
            failed: 0,
            frontier_reached: false,
            final_state: CrawlState::Start,
        }
    }
}

/// Splits a page into the items to dispatch and whether the frontier was hit
///
/// Without `ergodic`, scanning stops at the first recorded item. With
/// `ergodic`, recorded items are skipped unless `override_existing` is set,
/// in which case the whole page is returned.
pub fn filter_new_items(
    items: &[MediaItem],
    history: &HistoryStore,
    ergodic: bool,
    override_existing: bool,
) -> (Vec<MediaItem>, bool) {
    let mut fresh = Vec::new();
    for item in items {
        if history.contains(&item.id) {
            match (ergodic, override_existing) {
                (false, _) => return (fresh, true),
                (true, false) => continue,
                (true, true) => {}
            }
        }
        fresh.push(item.clone());
    }
    (fresh, false)
}

/// Sleep owed after a page: the rest of the interval plus jitter
pub fn page_delay(interval: Duration, elapsed: Duration, jitter: Duration) -> Duration {
    let remaining = interval.saturating_sub(elapsed);
    let jitter_ms = u64::try_from(jitter.as_millis()).unwrap_or(u64::MAX);
    if jitter_ms == 0 {
        return remaining;
    }
    remaining + Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
}

/// Runs the pagination state machine for collections
pub struct PaginationController {
    options: ControllerOptions,
    history: Arc<HistoryStore>,
    factory: Arc<dyn PipelineFactory>,
}

impl PaginationController {
    pub fn new(options: ControllerOptions, history: Arc<HistoryStore>, factory: Arc<dyn PipelineFactory>) -> Self {
        Self {
            options,
            history,
            factory,
        }
    }

    /// Crawls one collection to completion
    ///
    /// Fails only when the collection cannot be enumerated at all (navigation
    /// or the first page failed). Later page failures end the walk early;
    /// item failures are counted in the report.
    pub async fn run(&self, collection: &CollectionRef, navigator: &mut dyn PageNavigator) -> Result<CrawlReport> {
        let mut report = CrawlReport::new(collection.clone());
        let mut state = CrawlState::Start;
        let mut page: Option<PagePayload> = None;
        let mut pending: Vec<MediaItem> = Vec::new();
        let mut page_started = Instant::now();

        loop {
            let next = match state {
                CrawlState::Start => {
                    navigator.navigate(collection).await.map_err(|e| enumeration_error(collection, e))?;
                    CrawlState::FetchPage
                }

                CrawlState::FetchPage => {
                    page_started = Instant::now();
                    match navigator.wait_page_data().await {
                        Ok(payload) => {
                            report.pages_visited += 1;
                            tracing::info!(
                                "collection={}, id={}, pages={}/{}",
                                collection.name,
                                collection.id,
                                payload.pagination.page,
                                payload.pagination.total_pages
                            );
                            page = Some(payload);
                            CrawlState::FilterNewItems
                        }
                        Err(e) if report.pages_visited == 0 => {
                            return Err(enumeration_error(collection, e));
                        }
                        Err(e) => {
                            tracing::warn!("{}: page fetch failed, stopping: {}", collection, e);
                            CrawlState::Stop
                        }
                    }
                }

                CrawlState::FilterNewItems => {
                    let items = page.take().map(|p| p.items).unwrap_or_default();
                    let (fresh, frontier) = filter_new_items(
                        &items,
                        &self.history,
                        self.options.ergodic,
                        self.options.override_existing,
                    );
                    report.frontier_reached = frontier;
                    pending = fresh;

                    if frontier {
                        tracing::info!("{}: reached the last processed item", collection);
                    }

                    match (pending.is_empty(), frontier) {
                        (false, _) => CrawlState::DispatchItems,
                        (true, true) => CrawlState::Stop,
                        (true, false) => CrawlState::Delay,
                    }
                }

                CrawlState::DispatchItems => {
                    let items = std::mem::take(&mut pending);
                    self.dispatch(collection, items, &mut report).await;
                    if report.frontier_reached {
                        CrawlState::Stop
                    } else {
                        CrawlState::Delay
                    }
                }

                CrawlState::Delay => {
                    let delay = page_delay(self.options.page_interval, page_started.elapsed(), self.options.jitter);
                    if !delay.is_zero() {
                        tracing::debug!("Sleeping for {:.1}s", delay.as_secs_f64());
                        tokio::time::sleep(delay).await;
                    }
                    CrawlState::NextPage
                }

                CrawlState::NextPage => match navigator.advance().await {
                    Ok(true) => CrawlState::FetchPage,
                    Ok(false) => {
                        tracing::debug!("{}: no further pages", collection);
                        CrawlState::Stop
                    }
                    Err(e) => {
                        tracing::warn!("{}: cannot advance, stopping: {}", collection, e);
                        CrawlState::Stop
                    }
                },

                CrawlState::Stop => break,
            };

            debug_assert!(state.can_transition_to(next), "illegal transition {} -> {}", state, next);
            tracing::trace!("{}: {} -> {}", collection, state, next);
            state = next;
        }

        report.final_state = state;
        tracing::info!(
            "{}: {} pages, {} dispatched, {} succeeded, {} failed",
            collection,
            report.pages_visited,
            report.dispatched.len(),
            report.succeeded,
            report.failed
        );
        Ok(report)
    }

    /// Runs one pipeline per item and waits for all of them
    async fn dispatch(&self, collection: &CollectionRef, items: Vec<MediaItem>, report: &mut CrawlReport) {
        let semaphore = Arc::new(Semaphore::new(self.options.item_workers));
        let mut tasks = JoinSet::new();

        for item in items {
            report.dispatched.push(item.id.clone());
            let task = self.factory.build(collection, &item);
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                let ok = match semaphore.acquire_owned().await {
                    Ok(_permit) => task.run().await,
                    Err(_) => false,
                };
                (item, ok)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((item, true)) => self.record(&item, report),
                Ok((item, false)) => {
                    tracing::warn!("[{}] {} failed, left unrecorded", item.id, item.title);
                    report.failed += 1;
                }
                Err(e) => {
                    tracing::error!("Item pipeline panicked: {}", HarvestError::Join(e));
                    report.failed += 1;
                }
            }
        }
    }

    fn record(&self, item: &MediaItem, report: &mut CrawlReport) {
        let fields = vec![item.id.clone(), item.title.clone(), chrono::Utc::now().to_rfc3339()];
        match self.history.store(fields) {
            Ok(()) => {
                tracing::info!("[{}] {} done", item.id, item.title);
                report.succeeded += 1;
            }
            Err(e) => {
                tracing::error!("[{}] completed but not recorded: {}", item.id, e);
                report.failed += 1;
            }
        }
    }
}

fn enumeration_error(collection: &CollectionRef, source: HarvestError) -> HarvestError {
    HarvestError::Enumeration {
        collection: collection.to_string(),
        message: source.to_string(),
    }
}
