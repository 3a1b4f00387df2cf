//! The engine: the single serialized choke point every mutation passes
//! through, and the owner of the canonical store and its derived views.
//!
//! Mutation application and re-projection happen while holding the state
//! write lock, so no two mutations interleave and a published view
//! snapshot always reflects a store the reconciler finished with. For any
//! one event id, mutations apply in the order they reach [`Engine::apply`];
//! no ordering is promised across ids or between the local and remote echo
//! of the same edit — the mutation variants are idempotent precisely so
//! that either arrival order converges.

use mingle_core::{
    CanonicalStore, Clock, MutationEvent, MutationOutcome, SearchResults, ViewParams, ViewTab,
    Views,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, watch};

/// Engine configuration.
///
/// # Example
///
/// ```
/// use mingle_runtime::engine::EngineConfig;
/// use std::time::Duration;
///
/// let config = EngineConfig::default()
///     .with_reprojection_tick(Some(Duration::from_secs(30)))
///     .with_search_debounce(Duration::from_millis(200));
/// ```
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Interval of the timer-driven re-projection, or `None` to disable.
    ///
    /// Without the tick, an event crossing the upcoming/past boundary by
    /// wall-clock advancement alone stays in its old partition until the
    /// next mutation re-projects.
    pub reprojection_tick: Option<Duration>,
    /// Quiet period before a search query is issued.
    pub search_debounce: Duration,
}

impl EngineConfig {
    /// Sets the re-projection tick interval (`None` disables the tick).
    #[must_use]
    pub const fn with_reprojection_tick(mut self, tick: Option<Duration>) -> Self {
        self.reprojection_tick = tick;
        self
    }

    /// Sets the search debounce quiet period.
    #[must_use]
    pub const fn with_search_debounce(mut self, debounce: Duration) -> Self {
        self.search_debounce = debounce;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reprojection_tick: Some(Duration::from_secs(60)),
            search_debounce: Duration::from_millis(300),
        }
    }
}

/// Health of the push-channel connection as seen by collaborators.
///
/// Degraded connectivity is a signal, never an error: actions keep
/// working over the request path while the feed reconnects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// The change feed is delivering notifications.
    #[default]
    Connected,
    /// The change feed is down; remote mutations are being missed and a
    /// bulk reload is required once it returns.
    Degraded,
}

struct EngineState {
    store: CanonicalStore,
    tab: ViewTab,
}

struct EngineInner {
    state: RwLock<EngineState>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    views_tx: watch::Sender<Arc<Views>>,
    search_tx: watch::Sender<Option<SearchResults>>,
    connection_tx: watch::Sender<ConnectionStatus>,
}

/// Handle to one engine instance.
///
/// Cheap to clone; all clones share the same canonical store. There is no
/// ambient singleton — construct an engine and hand clones to whatever
/// needs one.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    /// Creates an engine with an empty store.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, config: EngineConfig) -> Self {
        let params = ViewParams {
            now: clock.now(),
            tab: ViewTab::default(),
        };
        let (views_tx, _) = watch::channel(Arc::new(Views::empty(params)));
        let (search_tx, _) = watch::channel(None);
        let (connection_tx, _) = watch::channel(ConnectionStatus::default());

        Self {
            inner: Arc::new(EngineInner {
                state: RwLock::new(EngineState {
                    store: CanonicalStore::new(),
                    tab: ViewTab::default(),
                }),
                clock,
                config,
                views_tx,
                search_tx,
                connection_tx,
            }),
        }
    }

    /// The engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Applies one mutation and, if the store changed, re-projects every
    /// view and publishes a fresh snapshot.
    ///
    /// This is the reconciler entry point: both the gateway's local echo
    /// and the change feed's remote echo land here, serialized by the
    /// state write lock.
    #[tracing::instrument(skip(self, mutation), fields(kind = mutation.kind(), event_id = %mutation.event_id()))]
    pub async fn apply(&self, mutation: MutationEvent) -> MutationOutcome {
        let mut state = self.inner.state.write().await;
        let outcome = mutation.apply(&mut state.store);

        match outcome {
            MutationOutcome::Applied => {
                metrics::counter!("engine.mutations.applied").increment(1);
                self.reproject_locked(&state);
                tracing::debug!("mutation applied");
            }
            MutationOutcome::NoOp => {
                // Duplicate or stale delivery, absorbed by design.
                metrics::counter!("engine.mutations.absorbed").increment(1);
                tracing::debug!("mutation absorbed as duplicate");
            }
        }
        outcome
    }

    /// Replaces the whole store with a bulk-loaded collection and
    /// re-projects.
    ///
    /// Used for the initial load and for recovery after a feed outage,
    /// since missed notifications cannot otherwise be reconstructed.
    #[tracing::instrument(skip(self, events))]
    pub async fn load_bulk(&self, events: Vec<mingle_core::Event>) {
        let mut state = self.inner.state.write().await;
        state.store.replace_all(events);
        metrics::counter!("engine.bulk_loads").increment(1);
        tracing::info!(count = state.store.len(), "bulk load applied");
        self.reproject_locked(&state);
    }

    /// Switches the top-attended tab and re-projects.
    pub async fn set_tab(&self, tab: ViewTab) {
        let mut state = self.inner.state.write().await;
        if state.tab != tab {
            state.tab = tab;
            self.reproject_locked(&state);
        }
    }

    /// Re-projects all views against the current wall clock.
    ///
    /// Named trigger for the periodic tick; also usable by a renderer
    /// that wants the boundary refreshed on demand.
    pub async fn reproject(&self) {
        let state = self.inner.state.read().await;
        self.reproject_locked(&state);
    }

    fn reproject_locked(&self, state: &EngineState) {
        let params = ViewParams {
            now: self.inner.clock.now(),
            tab: state.tab,
        };
        let views = Arc::new(Views::project(&state.store, params));
        metrics::counter!("engine.reprojections").increment(1);
        // Receivers may all be gone; publishing is still fine.
        let _ = self.inner.views_tx.send(views);
    }

    /// The latest view snapshot.
    #[must_use]
    pub fn views(&self) -> Arc<Views> {
        self.inner.views_tx.borrow().clone()
    }

    /// Subscribes to view snapshots. The receiver always holds the most
    /// recent snapshot and is notified on every re-projection.
    #[must_use]
    pub fn subscribe_views(&self) -> watch::Receiver<Arc<Views>> {
        self.inner.views_tx.subscribe()
    }

    /// The current transient search view, if any.
    #[must_use]
    pub fn search_results(&self) -> Option<SearchResults> {
        self.inner.search_tx.borrow().clone()
    }

    /// Subscribes to search view replacements.
    #[must_use]
    pub fn subscribe_search(&self) -> watch::Receiver<Option<SearchResults>> {
        self.inner.search_tx.subscribe()
    }

    /// Replaces the search view wholesale.
    pub fn set_search_results(&self, results: SearchResults) {
        let _ = self.inner.search_tx.send(Some(results));
    }

    /// Drops the search view (e.g. the user cleared the query).
    pub fn clear_search(&self) {
        let _ = self.inner.search_tx.send(None);
    }

    /// Current push-channel connectivity as seen by the engine.
    #[must_use]
    pub fn connection_status(&self) -> ConnectionStatus {
        *self.inner.connection_tx.borrow()
    }

    /// Subscribes to connectivity changes.
    #[must_use]
    pub fn subscribe_connection(&self) -> watch::Receiver<ConnectionStatus> {
        self.inner.connection_tx.subscribe()
    }

    /// Reports a connectivity change. Called by the feed subscriber.
    pub fn set_connection_status(&self, status: ConnectionStatus) {
        if *self.inner.connection_tx.borrow() != status {
            tracing::info!(?status, "connection status changed");
            metrics::counter!("engine.connection_changes").increment(1);
            let _ = self.inner.connection_tx.send(status);
        }
    }

    /// Number of events currently in the canonical store.
    pub async fn store_len(&self) -> usize {
        self.inner.state.read().await.store.len()
    }

    /// Snapshot of one event from the canonical store.
    pub async fn get_event(&self, id: &mingle_core::EventId) -> Option<mingle_core::Event> {
        self.inner.state.read().await.store.get(id).cloned()
    }

    /// Spawns the timer-driven re-projection tick, if configured.
    ///
    /// The tick bounds how stale the upcoming/past partition can get when
    /// no mutations arrive. Returns `None` when the tick is disabled.
    /// Abort the returned handle to stop the tick; it holds only a weak
    /// reference semantically (a clone of the engine), so dropping the
    /// handle without aborting leaks the task for the process lifetime,
    /// which matches the engine's own lifecycle.
    #[must_use]
    pub fn spawn_reprojection_tick(&self) -> Option<tokio::task::JoinHandle<()>> {
        let interval = self.inner.config.reprojection_tick?;
        let engine = self.clone();
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately; skip it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                tracing::trace!("periodic re-projection tick");
                engine.reproject().await;
            }
        }))
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}
