//! The request mutation gateway: direct user actions against the remote
//! data service, echoed into the engine on success.
//!
//! Each action issues one request; on success the matching
//! [`MutationEvent`] is applied immediately (the local echo) rather than
//! waiting for the broadcast echo, and on failure the typed error is
//! surfaced with the store untouched. The gateway never retries.

use crate::engine::Engine;
use mingle_core::{
    EngineError, Event, EventId, EventPatch, MutationEvent, NewEvent, SearchQuery,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// One page of server-side search results.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    /// Matching events, capped by the service
    pub events: Vec<Event>,
    /// Whether more matches may exist beyond the cap
    #[serde(rename = "hasMore", default)]
    pub has_more: bool,
}

/// Boxed future returned by [`DataService`] methods.
pub type ServiceFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, EngineError>> + Send + 'a>>;

/// The remote data service the gateway talks to.
///
/// Uses explicit `Pin<Box<dyn Future>>` returns instead of `async fn` so
/// the trait stays dyn-compatible (`Arc<dyn DataService>` is shared
/// between the gateway and the search dispatcher).
pub trait DataService: Send + Sync {
    /// Fetches the full event collection for a bulk load.
    fn list_events(&self) -> ServiceFuture<'_, Vec<Event>>;

    /// Fetches a single event by id.
    fn get_event(&self, id: &EventId) -> ServiceFuture<'_, Event>;

    /// Creates an event; the service assigns the id and returns the
    /// resulting event.
    fn create_event(&self, event: NewEvent) -> ServiceFuture<'_, Event>;

    /// Partially updates an event and returns the merged result.
    fn update_event(&self, id: &EventId, patch: EventPatch) -> ServiceFuture<'_, Event>;

    /// Deletes an event by id.
    fn delete_event(&self, id: &EventId) -> ServiceFuture<'_, ()>;

    /// Adds the current user to the roster; returns the updated event.
    fn attend(&self, id: &EventId) -> ServiceFuture<'_, Event>;

    /// Removes the current user from the roster; returns the updated
    /// event.
    fn leave(&self, id: &EventId) -> ServiceFuture<'_, Event>;

    /// Server-side search, capped with a has-more flag.
    fn search(&self, query: &SearchQuery) -> ServiceFuture<'_, SearchPage>;
}

/// Wraps a [`DataService`] and an [`Engine`], turning successful request
/// results into mutations.
#[derive(Clone)]
pub struct Gateway {
    service: Arc<dyn DataService>,
    engine: Engine,
}

impl Gateway {
    /// Creates a gateway over the given service and engine.
    #[must_use]
    pub fn new(service: Arc<dyn DataService>, engine: Engine) -> Self {
        Self { service, engine }
    }

    /// The engine this gateway feeds.
    #[must_use]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// The data service this gateway wraps.
    #[must_use]
    pub fn service(&self) -> Arc<dyn DataService> {
        Arc::clone(&self.service)
    }

    /// Bulk-loads the full collection into the engine.
    ///
    /// The initial population path, and the recovery path after a feed
    /// outage.
    ///
    /// # Errors
    ///
    /// Propagates the service error; the store keeps its previous
    /// contents on failure.
    #[tracing::instrument(skip(self))]
    pub async fn load_all(&self) -> Result<(), EngineError> {
        let events = self.service.list_events().await?;
        self.engine.load_bulk(events).await;
        Ok(())
    }

    /// Creates an event and echoes it into the engine.
    ///
    /// # Errors
    ///
    /// [`EngineError::Validation`] for malformed payloads,
    /// [`EngineError::Unauthorized`] without a credential, or
    /// [`EngineError::Transport`] when unreachable.
    #[tracing::instrument(skip(self, event))]
    pub async fn create(&self, event: NewEvent) -> Result<Event, EngineError> {
        let created = self.service.create_event(event).await?;
        self.engine.apply(MutationEvent::Created(created.clone())).await;
        Ok(created)
    }

    /// Updates an event and echoes the merged result as a full
    /// replacement.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotFound`] for unknown ids, plus the create-path
    /// failures.
    #[tracing::instrument(skip(self, patch), fields(event_id = %id))]
    pub async fn update(&self, id: &EventId, patch: EventPatch) -> Result<Event, EngineError> {
        let updated = self.service.update_event(id, patch).await?;
        self.engine.apply(MutationEvent::Replaced(updated.clone())).await;
        Ok(updated)
    }

    /// Deletes an event and echoes the removal.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotFound`] for unknown ids.
    #[tracing::instrument(skip(self), fields(event_id = %id))]
    pub async fn delete(&self, id: &EventId) -> Result<(), EngineError> {
        self.service.delete_event(id).await?;
        self.engine.apply(MutationEvent::Deleted(id.clone())).await;
        Ok(())
    }

    /// Joins the current user to the roster and echoes the roster patch.
    ///
    /// The echo is field-restricted so it can never clobber a
    /// concurrently edited name or date.
    ///
    /// # Errors
    ///
    /// [`EngineError::Conflict`] when already attending — non-fatal;
    /// refresh the single event with [`Gateway::refresh_event`].
    #[tracing::instrument(skip(self), fields(event_id = %id))]
    pub async fn attend(&self, id: &EventId) -> Result<Event, EngineError> {
        let updated = self.service.attend(id).await?;
        self.echo_roster(&updated).await;
        Ok(updated)
    }

    /// Removes the current user from the roster and echoes the patch.
    ///
    /// # Errors
    ///
    /// [`EngineError::Conflict`] when not attending.
    #[tracing::instrument(skip(self), fields(event_id = %id))]
    pub async fn leave(&self, id: &EventId) -> Result<Event, EngineError> {
        let updated = self.service.leave(id).await?;
        self.echo_roster(&updated).await;
        Ok(updated)
    }

    /// Re-fetches one event and replaces the local copy.
    ///
    /// The recommended recovery after a [`EngineError::Conflict`]: the
    /// mismatch concerns a single event, so there is no need to reload
    /// the whole collection.
    ///
    /// # Errors
    ///
    /// [`EngineError::NotFound`] if the event vanished server-side, in
    /// which case the local copy is removed as well.
    #[tracing::instrument(skip(self), fields(event_id = %id))]
    pub async fn refresh_event(&self, id: &EventId) -> Result<Event, EngineError> {
        match self.service.get_event(id).await {
            Ok(event) => {
                self.engine.apply(MutationEvent::Replaced(event.clone())).await;
                Ok(event)
            }
            Err(EngineError::NotFound { id }) => {
                self.engine.apply(MutationEvent::Deleted(id.clone())).await;
                Err(EngineError::NotFound { id })
            }
            Err(other) => Err(other),
        }
    }

    async fn echo_roster(&self, updated: &Event) {
        self.engine
            .apply(MutationEvent::AttendanceChanged {
                id: updated.id.clone(),
                roster: updated.attendees.clone(),
            })
            .await;
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway").finish_non_exhaustive()
    }
}
