//! Pagination controller: drives the remote source into the store one
//! page at a time and remembers where to resume after a restart.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::api::{ApiError, ProfileSource};
use crate::store::{ProfileStore, StoreError};

#[derive(Error, Debug)]
pub enum FetchError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Page merged into the store; number of records received.
    Fetched(usize),
    /// Remote returned an empty page: pagination is permanently exhausted.
    Exhausted,
    /// A fetch was already running, or pagination is exhausted.
    Skipped,
}

pub struct Paginator {
    source: Arc<dyn ProfileSource>,
    store: ProfileStore,
    page_size: i64,
    current_page: AtomicI64,
    has_more: AtomicBool,
    fetching: AtomicBool,
}

/// Clears the busy flag on every exit path, including errors.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Paginator {
    pub fn new(source: Arc<dyn ProfileSource>, store: ProfileStore, page_size: i64) -> Self {
        Self {
            source,
            store,
            page_size,
            current_page: AtomicI64::new(1),
            has_more: AtomicBool::new(true),
            fetching: AtomicBool::new(false),
        }
    }

    pub fn current_page(&self) -> i64 {
        self.current_page.load(Ordering::SeqCst)
    }

    pub fn has_more_pages(&self) -> bool {
        self.has_more.load(Ordering::SeqCst)
    }

    pub fn is_fetching(&self) -> bool {
        self.fetching.load(Ordering::SeqCst)
    }

    /// Fetch page `page` and merge it into the store.
    ///
    /// No-op while another fetch is outstanding or once the feed is
    /// exhausted. On failure `current_page` and the exhaustion flag stay
    /// untouched so the caller can retry the same page; retry is always
    /// externally triggered.
    pub async fn fetch_page(&self, page: i64) -> Result<FetchOutcome, FetchError> {
        if !self.has_more.load(Ordering::SeqCst) {
            return Ok(FetchOutcome::Skipped);
        }
        if self
            .fetching
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(page, "Fetch already in progress, skipping");
            return Ok(FetchOutcome::Skipped);
        }
        let _busy = BusyGuard(&self.fetching);

        let results = self.source.fetch_page(page, self.page_size).await?;

        if results.is_empty() {
            debug!(page, "Empty page, feed exhausted");
            self.has_more.store(false, Ordering::SeqCst);
            return Ok(FetchOutcome::Exhausted);
        }

        self.store.upsert_page(&results, page).await?;
        self.current_page.store(page, Ordering::SeqCst);
        Ok(FetchOutcome::Fetched(results.len()))
    }

    /// Pick up where the store left off: re-request the last merged page
    /// (the idempotent merge absorbs the duplicates) or start at page 1.
    pub async fn resume_on_startup(&self) -> Result<FetchOutcome, FetchError> {
        let last = self.store.max_fetched_page().await?;
        let start = if last > 0 { last } else { 1 };
        self.current_page.store(start, Ordering::SeqCst);
        debug!(page = start, "Resuming pagination");
        self.fetch_page(start).await
    }

    pub async fn fetch_next_page(&self) -> Result<FetchOutcome, FetchError> {
        self.fetch_page(self.current_page() + 1).await
    }

    /// Back to a fresh feed, used after a full store reset.
    pub fn reset(&self) {
        self.current_page.store(1, Ordering::SeqCst);
        self.has_more.store(true, Ordering::SeqCst);
    }
}
