//! # Mingle Core
//!
//! Pure domain layer of the Mingle multi-view synchronization engine:
//! the event entity model, the canonical store, the closed set of
//! mutation events, and the view projections derived from the store.
//!
//! Nothing in this crate performs I/O or depends on an async runtime.
//! The runtime crate wraps these pieces with serialization, re-projection
//! triggers, and the request/push-channel plumbing.
//!
//! ## Core Concepts
//!
//! - **Canonical store**: the single authoritative id → event map all
//!   views derive from.
//! - **Mutation event**: a typed description of one change, idempotent
//!   under at-least-once delivery.
//! - **Views**: upcoming, past, per-day calendar, top-attended, and
//!   transient search results — each a pure function of
//!   `(store, parameters)`.
//!
//! ## Example
//!
//! ```
//! use mingle_core::{CanonicalStore, MutationEvent, Views, ViewParams, ViewTab};
//! use mingle_core::event::{Event, EventCategory, EventId, Participant, ParticipantId};
//! use chrono::Utc;
//!
//! let mut store = CanonicalStore::new();
//! let creator = Participant::new(ParticipantId::from("p1"), "Ada", "ada@example.com");
//! let event = Event {
//!     id: EventId::from("e1"),
//!     name: "Rust meetup".into(),
//!     description: String::new(),
//!     date: Utc::now() + chrono::Duration::hours(2),
//!     category: EventCategory::Meetup,
//!     location: "Online".into(),
//!     image_url: None,
//!     creator,
//!     attendees: vec![],
//! };
//!
//! MutationEvent::Created(event).apply(&mut store);
//! let views = Views::project(&store, ViewParams { now: Utc::now(), tab: ViewTab::Upcoming });
//! assert_eq!(views.upcoming.len(), 1);
//! ```

/// Clock abstraction for injectable time
pub mod clock;
/// Error taxonomy for engine actions
pub mod error;
/// Event and participant entity model
pub mod event;
/// Mutation events and their idempotent application
pub mod mutation;
/// The canonical event store
pub mod store;
/// Pure view projection
pub mod views;

pub use clock::{Clock, SystemClock};
pub use error::EngineError;
pub use event::{Event, EventCategory, EventId, EventPatch, NewEvent, Participant, ParticipantId};
pub use mutation::{MutationEvent, MutationOutcome};
pub use store::CanonicalStore;
pub use views::{
    SEARCH_RESULT_LIMIT, SearchQuery, SearchResults, TOP_ATTENDED_LIMIT, ViewParams, ViewTab,
    Views,
};
