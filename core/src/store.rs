//! The canonical store: the single authoritative mapping from event id to
//! event.
//!
//! Every view is derived from this map and nothing else. Iteration order is
//! insertion order, which the top-attended projection relies on for
//! deterministic tie-breaking. All operations are synchronous and total;
//! absence is represented with `Option`, never an error.

use crate::event::{Event, EventId, Participant, dedup_roster};
use indexmap::IndexMap;

/// The authoritative in-memory collection of events.
///
/// Created empty at engine start, populated by a bulk load, and mutated
/// only through [`MutationEvent`](crate::mutation::MutationEvent)
/// application for the rest of the session.
#[derive(Clone, Debug, Default)]
pub struct CanonicalStore {
    events: IndexMap<EventId, Event>,
}

impl CanonicalStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: IndexMap::new(),
        }
    }

    /// Looks up an event by id.
    #[must_use]
    pub fn get(&self, id: &EventId) -> Option<&Event> {
        self.events.get(id)
    }

    /// Whether an event with the given id is present.
    #[must_use]
    pub fn contains(&self, id: &EventId) -> bool {
        self.events.contains_key(id)
    }

    /// Inserts or fully replaces an event by its id.
    ///
    /// Replacement is total: no fields of an existing entry survive. An
    /// insert appends to the iteration order; a replace keeps the entry's
    /// original position.
    pub fn upsert(&mut self, event: Event) {
        self.events.insert(event.id.clone(), event);
    }

    /// Merges a new attendee roster into an existing entry.
    ///
    /// Only the roster changes; every other field is left untouched. A
    /// no-op if the id is absent — a roster patch must never resurrect a
    /// deleted event. Returns whether an entry was patched.
    pub fn patch_roster(&mut self, id: &EventId, roster: Vec<Participant>) -> bool {
        match self.events.get_mut(id) {
            Some(event) => {
                event.attendees = dedup_roster(roster);
                true
            }
            None => false,
        }
    }

    /// Removes an event by id. Returns the removed event, if any.
    ///
    /// Uses a shift-removal so the insertion order of the remaining
    /// entries is preserved.
    pub fn remove(&mut self, id: &EventId) -> Option<Event> {
        self.events.shift_remove(id)
    }

    /// All events in insertion order.
    pub fn all(&self) -> impl Iterator<Item = &Event> {
        self.events.values()
    }

    /// All event ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &EventId> {
        self.events.keys()
    }

    /// Number of events in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Replaces the entire contents with a bulk-loaded collection.
    ///
    /// Later duplicates of the same id win, matching last-write-wins at
    /// the data service.
    pub fn replace_all(&mut self, events: impl IntoIterator<Item = Event>) {
        self.events.clear();
        for event in events {
            self.events.insert(event.id.clone(), event);
        }
    }
}
