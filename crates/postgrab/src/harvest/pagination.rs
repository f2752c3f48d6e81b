//! The load-more loop as an explicit state machine.
//!
//! A click that succeeds means more content may follow. The control staying
//! absent for the whole wait means the feed is exhausted; that is the normal
//! way out. Any other browser fault is a transient failure and is retried a
//! bounded number of times before the loop gives up, so a hiccup on a slow
//! connection does not silently truncate the feed.

use crate::config::HarvestConfig;
use crate::error::BrowseResult;
use crate::progress::{ProgressEmitter, ProgressEventKind};
use crate::renderer::PageNavigator;
use serde::{Deserialize, Serialize};

/// State after one load-more attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMoreState {
    /// The control was clicked; try again after the settle time.
    MoreAvailable,
    /// The control did not appear within the wait.
    Exhausted,
    /// The click failed for another reason; `consecutive` failures so far.
    TransientFailure { consecutive: u32 },
}

/// Why the load-more loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationEnd {
    /// The load-more control went away.
    Exhausted,
    /// Too many consecutive transient failures; the feed may be incomplete.
    GaveUp,
    /// The configured click limit was reached.
    ClickLimit,
}

/// Outcome of driving a feed's pagination to the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationSummary {
    pub clicks: u32,
    pub end: PaginationEnd,
}

/// Classify a click result given the failures seen just before it.
pub fn next_state(click: &BrowseResult<()>, previous_failures: u32) -> LoadMoreState {
    match click {
        Ok(()) => LoadMoreState::MoreAvailable,
        Err(e) if e.is_timeout() => LoadMoreState::Exhausted,
        Err(_) => LoadMoreState::TransientFailure {
            consecutive: previous_failures + 1,
        },
    }
}

/// Click load-more until the feed is exhausted, the retry budget runs out,
/// or the click limit is hit.
pub async fn exhaust(
    nav: &mut dyn PageNavigator,
    config: &HarvestConfig,
    progress: &mut ProgressEmitter,
) -> PaginationSummary {
    let selector = config.site.load_more_selector.as_str();
    let timeout = config.timings.load_more_timeout();
    let settle = config.timings.load_more_settle();

    let mut clicks = 0u32;
    let mut failures = 0u32;

    let end = loop {
        if config.max_load_more_clicks.is_some_and(|max| clicks >= max) {
            tracing::info!("stopping after {clicks} load-more clicks (limit reached)");
            break PaginationEnd::ClickLimit;
        }

        let result = nav.click(selector, timeout).await;
        match next_state(&result, failures) {
            LoadMoreState::MoreAvailable => {
                clicks += 1;
                failures = 0;
                tracing::debug!("load-more click #{clicks}");
                progress.emit(ProgressEventKind::LoadMoreClicked { clicks });
                nav.wait(settle).await;
            }
            LoadMoreState::Exhausted => {
                tracing::info!("no more 'load more' control after {clicks} clicks");
                break PaginationEnd::Exhausted;
            }
            LoadMoreState::TransientFailure { consecutive } => {
                failures = consecutive;
                if let Err(e) = &result {
                    tracing::warn!(
                        "load-more attempt failed ({consecutive}/{}): {e}",
                        config.max_transient_retries + 1
                    );
                }
                if consecutive > config.max_transient_retries {
                    tracing::warn!(
                        "giving up on pagination after {clicks} clicks; the post list may be incomplete"
                    );
                    break PaginationEnd::GaveUp;
                }
                nav.wait(settle).await;
            }
        }
    };

    let summary = PaginationSummary { clicks, end };
    progress.emit(ProgressEventKind::PaginationFinished {
        clicks: summary.clicks,
        end: summary.end,
    });
    summary
}
