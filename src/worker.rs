//! Off-thread search execution
//!
//! Runs a search on tokio's blocking pool when a runtime is available, and
//! inline otherwise. Either way the ranking is the one [`SearchIndex::search`]
//! produces.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::fuzzy::{SearchIndex, SearchResult};

/// A search that is either running in the background or already done
pub enum PendingSearch {
    Background {
        handle: JoinHandle<Vec<SearchResult>>,
        index: Arc<SearchIndex>,
        term: String,
    },
    Ready(Vec<SearchResult>),
}

/// Start a search, off-thread if possible
pub fn spawn_search(index: Arc<SearchIndex>, term: &str) -> PendingSearch {
    match Handle::try_current() {
        Ok(runtime) => {
            let worker_index = Arc::clone(&index);
            let worker_term = term.to_string();
            let handle = runtime.spawn_blocking(move || worker_index.search(&worker_term));
            PendingSearch::Background {
                handle,
                index,
                term: term.to_string(),
            }
        }
        Err(_) => {
            log::debug!("No async runtime, searching inline");
            PendingSearch::Ready(index.search(term))
        }
    }
}

impl PendingSearch {
    pub fn is_background(&self) -> bool {
        matches!(self, PendingSearch::Background { .. })
    }

    /// Wait for the results, re-running inline if the worker failed
    pub async fn wait(self) -> Vec<SearchResult> {
        match self {
            PendingSearch::Ready(results) => results,
            PendingSearch::Background {
                handle,
                index,
                term,
            } => match handle.await {
                Ok(results) => results,
                Err(err) => {
                    log::warn!("Background search failed ({err}), searching inline");
                    index.search(&term)
                }
            },
        }
    }
}
