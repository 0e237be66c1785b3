//! State module for tracking crawl progress
//!
//! `CrawlState` names the steps of the per-collection pagination state machine
//! driven by the crawl controller.

mod crawl_state;

pub use crawl_state::CrawlState;
