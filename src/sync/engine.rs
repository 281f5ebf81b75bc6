//! Sync orchestrator.
//!
//! Owns the in-memory projection handed to the presentation layer, the
//! per-profile update lock, and the choice between writing a decision
//! straight to the store or queueing it for a later flush. Reconnect
//! transitions from the connectivity monitor drive the flush.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::api::ProfileSource;
use crate::models::{MatchStatus, ProfileCard};
use crate::net::{ConnectivityMonitor, Subscription};
use crate::store::ProfileStore;

use super::lock::UpdateLock;
use super::pagination::{FetchError, FetchOutcome, Paginator};

/// Notifications pushed up to the presentation layer.
#[derive(Debug, Clone)]
pub enum FeedEvent {
    /// The projection changed; carries the full ordered list.
    ProfilesUpdated(Vec<ProfileCard>),
    /// A page fetch failed; the same page can be retried.
    FetchFailed(String),
    /// The feed returned an empty page and is exhausted.
    PageExhausted,
    /// Queued offline decisions were applied; count of profiles touched.
    PendingFlushed(u64),
}

pub struct SyncEngine {
    store: ProfileStore,
    connectivity: Arc<ConnectivityMonitor>,
    paginator: Paginator,
    projection: Mutex<Vec<ProfileCard>>,
    update_lock: UpdateLock,
    events: mpsc::UnboundedSender<FeedEvent>,
    _connectivity_sub: Subscription,
}

impl SyncEngine {
    /// Wire the engine to its collaborators. Every transition to
    /// connected triggers a flush of queued decisions on a background
    /// task; the returned receiver carries [`FeedEvent`]s for the
    /// presentation layer.
    pub fn new(
        store: ProfileStore,
        source: Arc<dyn ProfileSource>,
        connectivity: Arc<ConnectivityMonitor>,
        page_size: i64,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<FeedEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        // Transitions are forwarded over a channel so the monitor callback
        // never blocks and flushes run on the runtime.
        let (flush_tx, mut flush_rx) = mpsc::unbounded_channel::<()>();
        let subscription = connectivity.subscribe(move |connected| {
            if connected {
                let _ = flush_tx.send(());
            }
        });

        let paginator = Paginator::new(source, store.clone(), page_size);

        let engine = Arc::new(Self {
            store,
            connectivity,
            paginator,
            projection: Mutex::new(Vec::new()),
            update_lock: UpdateLock::new(),
            events: events_tx,
            _connectivity_sub: subscription,
        });

        let flush_engine = Arc::downgrade(&engine);
        tokio::spawn(async move {
            while flush_rx.recv().await.is_some() {
                match flush_engine.upgrade() {
                    Some(engine) => engine.flush_pending().await,
                    None => break,
                }
            }
        });

        (engine, events_rx)
    }

    // =========================================================================
    // Fetching
    // =========================================================================

    /// Show cached profiles first, then resume fetching from the last
    /// merged page.
    pub async fn start(&self) {
        self.reload_projection().await;
        let result = self.paginator.resume_on_startup().await;
        self.handle_fetch(result).await;
    }

    pub async fn fetch_page(&self, page: i64) {
        let result = self.paginator.fetch_page(page).await;
        self.handle_fetch(result).await;
    }

    /// Infinite-scroll heuristic: fetch the next page when the trigger is
    /// the last entry of the projection.
    pub async fn fetch_next_page_if_needed(&self, trigger_id: &str) {
        let is_last = self
            .projection()
            .last()
            .map(|card| card.id == trigger_id)
            .unwrap_or(false);

        if is_last {
            let result = self.paginator.fetch_next_page().await;
            self.handle_fetch(result).await;
        }
    }

    async fn handle_fetch(&self, result: Result<FetchOutcome, FetchError>) {
        match result {
            Ok(FetchOutcome::Fetched(count)) => {
                debug!(count, page = self.paginator.current_page(), "Page merged");
                self.reload_projection().await;
            }
            Ok(FetchOutcome::Exhausted) => {
                let _ = self.events.send(FeedEvent::PageExhausted);
            }
            Ok(FetchOutcome::Skipped) => {}
            Err(e) => {
                warn!(error = %e, "Page fetch failed");
                let _ = self.events.send(FeedEvent::FetchFailed(e.to_string()));
            }
        }
    }

    // =========================================================================
    // Decisions
    // =========================================================================

    pub async fn accept(&self, id: &str) {
        self.update_status(id, MatchStatus::Accepted).await;
    }

    pub async fn decline(&self, id: &str) {
        self.update_status(id, MatchStatus::Declined).await;
    }

    /// Record an irreversible decision for one profile.
    ///
    /// A duplicate request while one is in flight for the same id is
    /// dropped outright. The projection is updated before persistence so
    /// the presentation layer reflects the decision immediately. While
    /// connected the decision is written straight to the profile row (a
    /// remote apply endpoint is an extension point, not implemented);
    /// while disconnected the durable row stays untouched and the
    /// decision is queued until the next flush.
    pub async fn update_status(&self, id: &str, status: MatchStatus) {
        let claim = match self.update_lock.try_acquire(id) {
            Some(claim) => claim,
            None => {
                debug!(id, "Dropping duplicate status update");
                return;
            }
        };

        self.apply_to_projection(id, status);

        if self.connectivity.is_connected() {
            match self.store.write_status(id, status).await {
                Ok(()) => debug!(id, %status, "Decision persisted"),
                Err(e) => warn!(id, error = %e, "Status write failed"),
            }
        } else if let Err(e) = self.store.enqueue(id, status).await {
            warn!(id, error = %e, "Failed to queue offline decision");
        }

        // Claim lives until persistence has completed, never on a timer.
        drop(claim);
    }

    // =========================================================================
    // Pending actions
    // =========================================================================

    /// Apply queued offline decisions to their profiles. Failures leave
    /// the queue intact for the next connectivity transition.
    pub async fn flush_pending(&self) {
        match self.store.flush_pending().await {
            Ok(applied) => {
                info!(applied, "Flushed pending actions");
                let _ = self.events.send(FeedEvent::PendingFlushed(applied));
                self.reload_projection().await;
            }
            Err(e) => warn!(error = %e, "Pending flush failed"),
        }
    }

    // =========================================================================
    // Projection
    // =========================================================================

    /// Current projection, ordered by first insertion.
    pub fn snapshot(&self) -> Vec<ProfileCard> {
        self.projection().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.paginator.is_fetching()
    }

    pub fn has_more_pages(&self) -> bool {
        self.paginator.has_more_pages()
    }

    /// Drop every cached profile and start the feed over from page 1.
    pub async fn clear_all(&self) {
        if let Err(e) = self.store.clear_all().await {
            warn!(error = %e, "Clear all failed");
            return;
        }

        self.paginator.reset();
        self.projection().clear();
        let _ = self.events.send(FeedEvent::ProfilesUpdated(Vec::new()));

        self.fetch_page(1).await;
    }

    fn projection(&self) -> MutexGuard<'_, Vec<ProfileCard>> {
        self.projection.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Optimistic update: the projection reflects the decision before the
    /// store does.
    fn apply_to_projection(&self, id: &str, status: MatchStatus) {
        let snapshot = {
            let mut projection = self.projection();
            if let Some(card) = projection.iter_mut().find(|card| card.id == id) {
                card.status = status;
            }
            projection.clone()
        };
        let _ = self.events.send(FeedEvent::ProfilesUpdated(snapshot));
    }

    /// Rebuild the projection from the store. The store is the source of
    /// truth; a failed reload just leaves the projection stale until the
    /// next synchronization point.
    async fn reload_projection(&self) {
        match self.store.all_profiles().await {
            Ok(records) => {
                let cards: Vec<ProfileCard> = records.into_iter().map(ProfileCard::from).collect();
                *self.projection() = cards.clone();
                let _ = self.events.send(FeedEvent::ProfilesUpdated(cards));
            }
            Err(e) => warn!(error = %e, "Projection reload failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::testutil::{remote_profile, ScriptedSource};
    use std::time::Duration;

    async fn engine_with(
        pages: Vec<(i64, Vec<crate::models::RemoteProfile>)>,
        connected: bool,
    ) -> (
        Arc<SyncEngine>,
        mpsc::UnboundedReceiver<FeedEvent>,
        ProfileStore,
        Arc<ConnectivityMonitor>,
        Arc<ScriptedSource>,
    ) {
        let store = ProfileStore::in_memory().await.unwrap();
        let source = Arc::new(ScriptedSource::new(pages));
        let monitor = Arc::new(ConnectivityMonitor::new(connected));
        let (engine, events) =
            SyncEngine::new(store.clone(), source.clone(), Arc::clone(&monitor), 10);
        (engine, events, store, monitor, source)
    }

    #[tokio::test]
    async fn test_start_shows_cache_then_resumes_last_page() {
        let store = ProfileStore::in_memory().await.unwrap();
        store.upsert_page(&[remote_profile("old")], 3).await.unwrap();

        let source = Arc::new(ScriptedSource::new(vec![(
            3,
            vec![remote_profile("old"), remote_profile("new")],
        )]));
        let monitor = Arc::new(ConnectivityMonitor::new(true));
        let (engine, _events) =
            SyncEngine::new(store.clone(), source.clone(), monitor, 10);

        engine.start().await;

        assert_eq!(source.requested_pages(), vec![3]);
        assert_eq!(engine.snapshot().len(), 2);
    }

    #[tokio::test]
    async fn test_connected_decision_writes_through() {
        let (engine, _events, store, _monitor, _source) =
            engine_with(vec![(1, vec![remote_profile("a")])], true).await;
        engine.fetch_page(1).await;

        engine.accept("a").await;

        let record = store.profile("a").await.unwrap().unwrap();
        assert_eq!(record.status, MatchStatus::Accepted);
        assert_eq!(store.pending_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_offline_decision_queues_and_defers_the_row() {
        let (engine, _events, store, _monitor, _source) =
            engine_with(vec![(1, vec![remote_profile("a")])], false).await;
        engine.fetch_page(1).await;

        engine.accept("a").await;

        // Projection is optimistic, the durable row is not.
        assert_eq!(engine.snapshot()[0].status, MatchStatus::Accepted);
        let record = store.profile("a").await.unwrap().unwrap();
        assert_eq!(record.status, MatchStatus::Undecided);
        assert_eq!(store.pending_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_update_is_dropped_while_in_flight() {
        let (engine, _events, store, _monitor, _source) =
            engine_with(vec![(1, vec![remote_profile("a")])], true).await;
        engine.fetch_page(1).await;

        let claim = engine.update_lock.try_acquire("a").unwrap();
        engine.decline("a").await;

        let record = store.profile("a").await.unwrap().unwrap();
        assert_eq!(record.status, MatchStatus::Undecided);

        // Released lock lets a re-invocation through.
        drop(claim);
        engine.decline("a").await;
        let record = store.profile("a").await.unwrap().unwrap();
        assert_eq!(record.status, MatchStatus::Declined);
    }

    #[tokio::test]
    async fn test_scroll_trigger_fetches_only_from_last_entry() {
        let (engine, _events, _store, _monitor, source) = engine_with(
            vec![
                (1, vec![remote_profile("a"), remote_profile("b")]),
                (2, vec![remote_profile("c")]),
            ],
            true,
        )
        .await;
        engine.fetch_page(1).await;

        engine.fetch_next_page_if_needed("a").await;
        assert_eq!(source.requested_pages(), vec![1]);

        engine.fetch_next_page_if_needed("b").await;
        assert_eq!(source.requested_pages(), vec![1, 2]);
        assert_eq!(engine.snapshot().len(), 3);
    }

    #[tokio::test]
    async fn test_reconnect_flushes_queue() {
        let (engine, _events, store, monitor, _source) =
            engine_with(vec![(1, vec![remote_profile("a")])], false).await;
        // Bring the page in while "offline" - the scripted source does not
        // care - then decide on it.
        engine.fetch_page(1).await;
        engine.accept("a").await;
        assert_eq!(store.pending_count().await.unwrap(), 1);

        monitor.set_connected(true);

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            if store.pending_count().await.unwrap() == 0 {
                break;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "flush never ran after reconnect"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let record = store.profile("a").await.unwrap().unwrap();
        assert_eq!(record.status, MatchStatus::Accepted);
        // Keep the engine alive until the flush has been observed.
        drop(engine);
    }

    #[tokio::test]
    async fn test_clear_all_restarts_from_page_one() {
        let (engine, _events, store, _monitor, source) = engine_with(
            vec![(1, vec![remote_profile("a")]), (4, vec![remote_profile("z")])],
            true,
        )
        .await;
        engine.fetch_page(4).await;
        assert_eq!(store.max_fetched_page().await.unwrap(), 4);

        engine.clear_all().await;

        assert_eq!(source.requested_pages(), vec![4, 1]);
        let records = store.all_profiles().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "a");
        assert_eq!(records[0].fetched_page, 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_surfaces_an_event() {
        let (engine, mut events, _store, _monitor, source) =
            engine_with(vec![(1, vec![remote_profile("a")])], true).await;

        source.fail_next();
        engine.fetch_page(1).await;

        let mut saw_failure = false;
        while let Ok(event) = events.try_recv() {
            if matches!(event, FeedEvent::FetchFailed(_)) {
                saw_failure = true;
            }
        }
        assert!(saw_failure);
        assert!(engine.has_more_pages());
    }
}
