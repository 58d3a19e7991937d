//! Incremental, deduplicating pagination over a listing source
//!
//! A [`PaginatedCollector`] is seeded with the first page a caller already
//! fetched and then pulls further pages from a [`PageSource`] whenever its
//! [`VisibilityTrigger`] fires. At most one fetch is in flight at any time,
//! items are never removed, and no two items share an identifier.

pub mod trigger;

pub use trigger::{ChannelTrigger, PageBudget, VisibilityTrigger};

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracing::{debug, error, info};

/// Items that carry a stable catalog identifier
pub trait Identified {
    /// The identifier used for deduplication
    fn identifier(&self) -> &str;
}

/// Errors a page source can report
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    /// Transport or HTTP failure
    #[error("Network error: {0}")]
    Network(String),

    /// Malformed response body
    #[error("Parse error: {0}")]
    Parse(String),
}

/// One page of a listing
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult<T> {
    /// Items in source order
    pub items: Vec<T>,
    /// 1-based page number
    pub page: u32,
    /// Upper bound on pages, when the source knows it
    pub total_pages: Option<u32>,
}

/// A paginated listing the collector can pull from
#[async_trait]
pub trait PageSource<T>: Send + Sync {
    /// Fetch the given 1-based page
    async fn fetch_page(&self, page: u32) -> Result<PageResult<T>, SourceError>;
}

#[async_trait]
impl<T, S> PageSource<T> for Arc<S>
where
    T: Send + 'static,
    S: PageSource<T> + ?Sized,
{
    async fn fetch_page(&self, page: u32) -> Result<PageResult<T>, SourceError> {
        (**self).fetch_page(page).await
    }
}

/// Collector lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Ready to fetch the next page
    Idle,
    /// A fetch is in flight
    Fetching,
    /// No further unique items are obtainable; terminal
    Exhausted,
}

/// What a single `notify_visible` call did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The collector was not idle, nothing was fetched
    Ignored,
    /// New items were appended and more pages may follow
    Appended { added: usize },
    /// The fetch ended the collection, after appending `added` items
    Exhausted { added: usize },
    /// The fetch failed; the collection is now exhausted
    Failed(SourceError),
    /// The collection was closed while the fetch was in flight
    Discarded,
}

#[derive(Debug)]
struct CollectionState<T> {
    items: Vec<T>,
    seen: HashSet<String>,
    current_page: u32,
    total_pages: Option<u32>,
    phase: Phase,
    last_error: Option<SourceError>,
    closed: bool,
}

impl<T: Identified> CollectionState<T> {
    /// Append the items whose identifier has not been seen, keeping order
    fn append_unique(&mut self, items: Vec<T>) -> usize {
        let before = self.items.len();
        for item in items {
            if self.seen.insert(item.identifier().to_owned()) {
                self.items.push(item);
            }
        }
        self.items.len() - before
    }

    /// Whether `page` is the last page the source reported
    ///
    /// Checked after appending, so the items of the page that reaches the
    /// bound are kept. A listing that stopped before fetching that page
    /// would lose them.
    fn bound_reached(&self, page: u32) -> bool {
        self.total_pages.is_some_and(|total| page >= total)
    }
}

/// Accumulates pages from a [`PageSource`] into one deduplicated list
pub struct PaginatedCollector<T, S> {
    source: S,
    state: Mutex<CollectionState<T>>,
}

impl<T, S> std::fmt::Debug for PaginatedCollector<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaginatedCollector").finish_non_exhaustive()
    }
}

/// Returns the collector to `Idle` if a fetch is abandoned mid-flight
struct InFlight<'a, T> {
    state: &'a Mutex<CollectionState<T>>,
    armed: bool,
}

impl<T> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            if state.phase == Phase::Fetching {
                state.phase = Phase::Idle;
            }
        }
    }
}

impl<T, S> PaginatedCollector<T, S>
where
    T: Identified + Clone,
    S: PageSource<T>,
{
    /// Create a collector seeded with a page the caller already fetched
    pub fn new(source: S, initial_items: Vec<T>, initial_page: u32) -> Self {
        let mut state = CollectionState {
            items: Vec::with_capacity(initial_items.len()),
            seen: HashSet::with_capacity(initial_items.len()),
            current_page: initial_page,
            total_pages: None,
            phase: Phase::Idle,
            last_error: None,
            closed: false,
        };
        state.append_unique(initial_items);

        Self {
            source,
            state: Mutex::new(state),
        }
    }

    /// Set the known page bound; starts exhausted if the seed page reached it
    pub fn with_total_pages(self, total_pages: Option<u32>) -> Self {
        {
            let mut state = self.lock();
            state.total_pages = total_pages;
            if state.bound_reached(state.current_page) {
                state.phase = Phase::Exhausted;
            }
        }
        self
    }

    fn lock(&self) -> MutexGuard<'_, CollectionState<T>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Snapshot of the accumulated items
    pub fn items(&self) -> Vec<T> {
        self.lock().items.clone()
    }

    /// Number of accumulated items
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Whether no items have been accumulated
    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Take the accumulated items, consuming the collector
    pub fn into_items(self) -> Vec<T> {
        self.state
            .into_inner()
            .unwrap_or_else(|e| e.into_inner())
            .items
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase() == Phase::Fetching
    }

    pub fn is_exhausted(&self) -> bool {
        self.phase() == Phase::Exhausted
    }

    /// Last page successfully applied
    pub fn current_page(&self) -> u32 {
        self.lock().current_page
    }

    /// The error that exhausted the collection, if any
    pub fn last_error(&self) -> Option<SourceError> {
        self.lock().last_error.clone()
    }

    /// Detach the collector from its owner; late results are discarded
    pub fn close(&self) {
        self.lock().closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Handle a visibility signal by fetching the next page if idle
    ///
    /// The transition to `Fetching` happens before the first await, so a
    /// second call made while a fetch is pending is ignored.
    pub async fn notify_visible(&self) -> LoadOutcome {
        let next_page = {
            let mut state = self.lock();
            if state.closed || state.phase != Phase::Idle {
                return LoadOutcome::Ignored;
            }
            state.phase = Phase::Fetching;
            state.current_page + 1
        };

        let mut in_flight = InFlight {
            state: &self.state,
            armed: true,
        };

        debug!("Fetching page {}", next_page);
        let result = self.source.fetch_page(next_page).await;
        in_flight.armed = false;

        let mut state = self.lock();
        if state.closed {
            debug!("Collection closed, discarding page {}", next_page);
            state.phase = Phase::Exhausted;
            return LoadOutcome::Discarded;
        }

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                error!("Failed to load page {}: {}", next_page, e);
                state.phase = Phase::Exhausted;
                state.last_error = Some(e.clone());
                return LoadOutcome::Failed(e);
            }
        };

        if page.total_pages.is_some() {
            state.total_pages = page.total_pages;
        }

        if page.items.is_empty() {
            info!("Page {} is empty, listing exhausted", next_page);
            state.phase = Phase::Exhausted;
            return LoadOutcome::Exhausted { added: 0 };
        }

        state.current_page = next_page;
        let added = state.append_unique(page.items);

        if added == 0 || state.bound_reached(next_page) {
            info!(
                "Listing exhausted at page {} ({} new items)",
                next_page, added
            );
            state.phase = Phase::Exhausted;
            LoadOutcome::Exhausted { added }
        } else {
            state.phase = Phase::Idle;
            LoadOutcome::Appended { added }
        }
    }

    /// Load pages each time the trigger fires, until exhausted or closed
    pub async fn run<V>(&self, trigger: &mut V)
    where
        V: VisibilityTrigger + ?Sized,
    {
        loop {
            if self.is_exhausted() || self.is_closed() {
                break;
            }
            if !trigger.visible().await {
                break;
            }
            self.notify_visible().await;
        }
    }
}
