//! Debounced search dispatch with stale-result cancellation.
//!
//! Search never touches the canonical store: a completed query replaces
//! the transient search view wholesale. Rapid typing is absorbed by a
//! quiet period, and a generation counter guarantees that an in-flight
//! request superseded by a newer query can never overwrite the newer
//! result, regardless of response order.

use crate::engine::Engine;
use crate::gateway::DataService;
use mingle_core::{EngineError, SearchQuery, SearchResults};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Debounces and dispatches search queries against the data service.
#[derive(Clone)]
pub struct SearchDispatcher {
    service: Arc<dyn DataService>,
    engine: Engine,
    generation: Arc<AtomicU64>,
}

impl SearchDispatcher {
    /// Creates a dispatcher sharing the gateway's service and engine.
    #[must_use]
    pub fn new(service: Arc<dyn DataService>, engine: Engine) -> Self {
        Self {
            service,
            engine,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Debounces, issues, and publishes one search query.
    ///
    /// Waits the configured quiet period first; if another query arrives
    /// meanwhile, this one is abandoned before hitting the service.
    /// Returns `Ok(None)` when superseded (either during the quiet
    /// period or while the request was in flight) and `Ok(Some(results))`
    /// when this query's results were published.
    ///
    /// # Errors
    ///
    /// Propagates the service error. A failed query publishes nothing:
    /// the previous search view stays in place.
    #[tracing::instrument(skip(self, query), fields(text = %query.text))]
    pub async fn search(&self, query: SearchQuery) -> Result<Option<SearchResults>, EngineError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        tokio::time::sleep(self.engine.config().search_debounce).await;
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!("query superseded during debounce");
            return Ok(None);
        }

        let page = self.service.search(&query).await?;
        if self.generation.load(Ordering::SeqCst) != generation {
            // A newer query resolved (or is about to); this result is
            // stale and must be discarded.
            metrics::counter!("search.stale_results_discarded").increment(1);
            tracing::debug!("stale search result discarded");
            return Ok(None);
        }

        let results = SearchResults {
            query,
            events: page.events,
            has_more: page.has_more,
        };
        self.engine.set_search_results(results.clone());
        Ok(Some(results))
    }

    /// Clears the search view and invalidates any in-flight query.
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.engine.clear_search();
    }
}

impl std::fmt::Debug for SearchDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchDispatcher")
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
