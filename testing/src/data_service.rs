//! In-memory data service with the production semantics: id assignment,
//! attend/leave conflicts, capped search, and optional broadcast echoes
//! through a linked push channel.

use crate::push_channel::InMemoryPushChannel;
use indexmap::IndexMap;
use mingle_core::views::SEARCH_RESULT_LIMIT;
use mingle_core::{
    EngineError, Event, EventId, EventPatch, NewEvent, Participant, SearchQuery,
};
use mingle_runtime::feed::Notification;
use mingle_runtime::gateway::{DataService, SearchPage, ServiceFuture};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

struct ServiceState {
    events: IndexMap<EventId, Event>,
    fail_next: Option<EngineError>,
}

/// A complete in-memory [`DataService`].
///
/// Behaves like the real API: assigns ids on create, rejects a second
/// attend with a conflict, caps search at [`SEARCH_RESULT_LIMIT`] with a
/// has-more flag, and — when linked to an [`InMemoryPushChannel`] —
/// emits the broadcast echo of every successful mutation, so tests can
/// exercise the local-echo/remote-echo convergence path.
#[derive(Clone)]
pub struct InMemoryDataService {
    state: Arc<Mutex<ServiceState>>,
    current_user: Participant,
    channel: Option<InMemoryPushChannel>,
    id_seq: Arc<AtomicU64>,
}

impl InMemoryDataService {
    /// Creates an empty service acting on behalf of the given user.
    #[must_use]
    pub fn new(current_user: Participant) -> Self {
        Self {
            state: Arc::new(Mutex::new(ServiceState {
                events: IndexMap::new(),
                fail_next: None,
            })),
            current_user,
            channel: None,
            id_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Seeds the service with existing events.
    #[must_use]
    pub fn with_events(self, events: Vec<Event>) -> Self {
        {
            let mut state = self.lock();
            for event in events {
                state.events.insert(event.id.clone(), event);
            }
        }
        self
    }

    /// Links a push channel; every successful mutation emits its
    /// broadcast echo there.
    #[must_use]
    pub fn linked_to(mut self, channel: InMemoryPushChannel) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Scripts the next call to fail with the given error.
    pub fn fail_next(&self, error: EngineError) {
        self.lock().fail_next = Some(error);
    }

    /// The user this service acts on behalf of.
    #[must_use]
    pub const fn current_user(&self) -> &Participant {
        &self.current_user
    }

    /// Number of events currently held server-side.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.lock().events.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ServiceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_scripted_failure(&self) -> Result<(), EngineError> {
        match self.lock().fail_next.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn emit(&self, notification: Notification) {
        if let Some(channel) = &self.channel {
            channel.emit(notification);
        }
    }

    fn next_id(&self) -> EventId {
        // Sequential ids keep assertions readable; uniqueness comes from
        // the uuid suffix so two services never collide.
        let n = self.id_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        EventId::new(format!("evt{n}-{}", &suffix[..8]))
    }
}

impl DataService for InMemoryDataService {
    fn list_events(&self) -> ServiceFuture<'_, Vec<Event>> {
        Box::pin(async move {
            self.take_scripted_failure()?;
            Ok(self.lock().events.values().cloned().collect())
        })
    }

    fn get_event(&self, id: &EventId) -> ServiceFuture<'_, Event> {
        let id = id.clone();
        Box::pin(async move {
            self.take_scripted_failure()?;
            self.lock()
                .events
                .get(&id)
                .cloned()
                .ok_or(EngineError::NotFound { id })
        })
    }

    fn create_event(&self, event: NewEvent) -> ServiceFuture<'_, Event> {
        Box::pin(async move {
            self.take_scripted_failure()?;
            if event.name.trim().is_empty() {
                return Err(EngineError::Validation("name is required".to_owned()));
            }
            let created = Event {
                id: self.next_id(),
                name: event.name,
                description: event.description,
                date: event.date,
                category: event.category,
                location: event.location,
                image_url: event.image_url,
                creator: self.current_user.clone(),
                attendees: Vec::new(),
            };
            self.lock()
                .events
                .insert(created.id.clone(), created.clone());
            self.emit(Notification::NewEvent(created.clone()));
            Ok(created)
        })
    }

    fn update_event(&self, id: &EventId, patch: EventPatch) -> ServiceFuture<'_, Event> {
        let id = id.clone();
        Box::pin(async move {
            self.take_scripted_failure()?;
            let updated = {
                let mut state = self.lock();
                let Some(event) = state.events.get_mut(&id) else {
                    return Err(EngineError::NotFound { id });
                };
                if let Some(name) = patch.name {
                    event.name = name;
                }
                if let Some(description) = patch.description {
                    event.description = description;
                }
                if let Some(date) = patch.date {
                    event.date = date;
                }
                if let Some(category) = patch.category {
                    event.category = category;
                }
                if let Some(location) = patch.location {
                    event.location = location;
                }
                if let Some(image_url) = patch.image_url {
                    event.image_url = Some(image_url);
                }
                event.clone()
            };
            self.emit(Notification::UpdateEvent(updated.clone()));
            Ok(updated)
        })
    }

    fn delete_event(&self, id: &EventId) -> ServiceFuture<'_, ()> {
        let id = id.clone();
        Box::pin(async move {
            self.take_scripted_failure()?;
            if self.lock().events.shift_remove(&id).is_none() {
                return Err(EngineError::NotFound { id });
            }
            self.emit(Notification::DeleteEvent { event_id: id });
            Ok(())
        })
    }

    fn attend(&self, id: &EventId) -> ServiceFuture<'_, Event> {
        let id = id.clone();
        Box::pin(async move {
            self.take_scripted_failure()?;
            let updated = {
                let mut state = self.lock();
                let Some(event) = state.events.get_mut(&id) else {
                    return Err(EngineError::NotFound { id });
                };
                if event.is_attending(&self.current_user.id) {
                    return Err(EngineError::Conflict(
                        "Already attending this event".to_owned(),
                    ));
                }
                event.attendees.push(self.current_user.clone());
                event.clone()
            };
            self.emit(Notification::UpdateAttendees {
                event_id: updated.id.clone(),
                attendees: updated.attendees.clone(),
            });
            Ok(updated)
        })
    }

    fn leave(&self, id: &EventId) -> ServiceFuture<'_, Event> {
        let id = id.clone();
        Box::pin(async move {
            self.take_scripted_failure()?;
            let updated = {
                let mut state = self.lock();
                let Some(event) = state.events.get_mut(&id) else {
                    return Err(EngineError::NotFound { id });
                };
                if !event.is_attending(&self.current_user.id) {
                    return Err(EngineError::Conflict(
                        "Not attending this event".to_owned(),
                    ));
                }
                event.attendees.retain(|p| p.id != self.current_user.id);
                event.clone()
            };
            self.emit(Notification::UpdateAttendees {
                event_id: updated.id.clone(),
                attendees: updated.attendees.clone(),
            });
            Ok(updated)
        })
    }

    fn search(&self, query: &SearchQuery) -> ServiceFuture<'_, SearchPage> {
        let query = query.clone();
        Box::pin(async move {
            self.take_scripted_failure()?;
            let mut events: Vec<Event> = self
                .lock()
                .events
                .values()
                .filter(|e| query.matches(e))
                .cloned()
                .collect();
            events.sort_by_key(|e| e.date);
            events.truncate(SEARCH_RESULT_LIMIT);
            let has_more = events.len() == SEARCH_RESULT_LIMIT;
            Ok(SearchPage { events, has_more })
        })
    }
}

impl std::fmt::Debug for InMemoryDataService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryDataService")
            .field("events", &self.event_count())
            .finish_non_exhaustive()
    }
}
