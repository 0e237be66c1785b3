/// Pagination state definitions for one collection crawl
///
/// The controller moves through these states for every listing page it visits.
use std::fmt;

/// Represents the current state of a collection crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlState {
    /// Navigation to the first listing page has not started
    Start,

    /// Waiting for the navigator to deliver the current page
    FetchPage,

    /// Comparing the page's items against the history ledger
    FilterNewItems,

    /// Running item pipelines for the new items of the page
    DispatchItems,

    /// Sleeping out the remainder of the per-page interval
    Delay,

    /// Asking the navigator for the following page
    NextPage,

    /// Nothing more to do for this collection
    Stop,
}

impl CrawlState {
    /// Returns true if this is the terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stop)
    }

    /// Returns true if `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: CrawlState) -> bool {
        use CrawlState::*;
        matches!(
            (self, next),
            (Start, FetchPage)
                | (Start, Stop)
                | (FetchPage, FilterNewItems)
                | (FetchPage, Stop)
                | (FilterNewItems, DispatchItems)
                | (FilterNewItems, Delay)
                | (FilterNewItems, Stop)
                | (DispatchItems, Delay)
                | (DispatchItems, Stop)
                | (Delay, NextPage)
                | (NextPage, FetchPage)
                | (NextPage, Stop)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::FetchPage => "fetch_page",
            Self::FilterNewItems => "filter_new_items",
            Self::DispatchItems => "dispatch_items",
            Self::Delay => "delay",
            Self::NextPage => "next_page",
            Self::Stop => "stop",
        }
    }

    /// Returns all possible crawl states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Start,
            Self::FetchPage,
            Self::FilterNewItems,
            Self::DispatchItems,
            Self::Delay,
            Self::NextPage,
            Self::Stop,
        ]
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminal() {
        for state in CrawlState::all_states() {
            assert_eq!(state.is_terminal(), state == CrawlState::Stop);
        }
    }

    #[test]
    fn test_page_cycle_is_legal() {
        let cycle = [
            CrawlState::Start,
            CrawlState::FetchPage,
            CrawlState::FilterNewItems,
            CrawlState::DispatchItems,
            CrawlState::Delay,
            CrawlState::NextPage,
            CrawlState::FetchPage,
        ];
        for pair in cycle.windows(2) {
            assert!(
                pair[0].can_transition_to(pair[1]),
                "{} -> {} should be legal",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_stop_has_no_successor() {
        for state in CrawlState::all_states() {
            assert!(!CrawlState::Stop.can_transition_to(state));
        }
    }

    #[test]
    fn test_cannot_skip_filtering() {
        assert!(!CrawlState::FetchPage.can_transition_to(CrawlState::DispatchItems));
        assert!(!CrawlState::Delay.can_transition_to(CrawlState::FetchPage));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", CrawlState::FilterNewItems), "filter_new_items");
        assert_eq!(format!("{}", CrawlState::Stop), "stop");
    }
}
