//! Mutation events: the closed set of changes the reconciler applies to
//! the canonical store.
//!
//! Both delivery routes — a direct request's response and the push
//! channel's broadcast echo of the same logical change — are translated
//! into the same variants, so the two routes cannot diverge. Delivery is
//! at-least-once and unordered across event ids, which forces every
//! variant to be safe under duplicate application:
//!
//! - [`Created`](MutationEvent::Created) and
//!   [`Deleted`](MutationEvent::Deleted) are absorbing: the second
//!   application of the same mutation is a no-op.
//! - [`Replaced`](MutationEvent::Replaced) and
//!   [`AttendanceChanged`](MutationEvent::AttendanceChanged) are
//!   idempotent by construction: applying the same payload twice yields
//!   the same final state.

use crate::event::{Event, EventId, Participant};
use crate::store::CanonicalStore;
use serde::{Deserialize, Serialize};

/// A typed description of a single change to the canonical store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MutationEvent {
    /// A new event exists. Ignored if the id is already present, so the
    /// create echo arriving twice cannot double-insert.
    Created(Event),
    /// Full replacement by id, applied whether or not the id is present
    /// (create-or-replace): the local optimistic echo and the remote
    /// broadcast echo of one edit must converge regardless of order.
    Replaced(Event),
    /// Roster-only patch. Never touches any other field, so a concurrent
    /// name or date edit cannot be clobbered by an attend/leave
    /// confirmation. A no-op if the id is absent.
    AttendanceChanged {
        /// The event whose roster changed
        id: EventId,
        /// The full new roster
        roster: Vec<Participant>,
    },
    /// The event no longer exists. A no-op if already absent.
    Deleted(EventId),
}

impl MutationEvent {
    /// The event id this mutation targets.
    #[must_use]
    pub const fn event_id(&self) -> &EventId {
        match self {
            Self::Created(event) | Self::Replaced(event) => &event.id,
            Self::AttendanceChanged { id, .. } | Self::Deleted(id) => id,
        }
    }

    /// A short label for logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Created(_) => "created",
            Self::Replaced(_) => "replaced",
            Self::AttendanceChanged { .. } => "attendance_changed",
            Self::Deleted(_) => "deleted",
        }
    }

    /// Applies this mutation to the store.
    ///
    /// This is the store half of reconciliation; the engine wraps it with
    /// serialization and re-projection. The outcome reports whether the
    /// store actually changed so duplicate absorption stays observable.
    pub fn apply(self, store: &mut CanonicalStore) -> MutationOutcome {
        match self {
            Self::Created(event) => {
                if store.contains(&event.id) {
                    MutationOutcome::NoOp
                } else {
                    store.upsert(event);
                    MutationOutcome::Applied
                }
            }
            Self::Replaced(event) => {
                store.upsert(event);
                MutationOutcome::Applied
            }
            Self::AttendanceChanged { id, roster } => {
                if store.patch_roster(&id, roster) {
                    MutationOutcome::Applied
                } else {
                    MutationOutcome::NoOp
                }
            }
            Self::Deleted(id) => {
                if store.remove(&id).is_some() {
                    MutationOutcome::Applied
                } else {
                    MutationOutcome::NoOp
                }
            }
        }
    }
}

/// Whether a mutation changed the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The store changed; views must be re-projected.
    Applied,
    /// Duplicate or stale delivery; the store is untouched.
    NoOp,
}

impl MutationOutcome {
    /// Whether the store changed.
    #[must_use]
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventCategory, ParticipantId};
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn participant(n: u32) -> Participant {
        Participant::new(
            ParticipantId::new(format!("p{n}")),
            format!("Person {n}"),
            format!("p{n}@example.com"),
        )
    }

    fn event(id: &str, name: &str) -> Event {
        Event {
            id: EventId::from(id),
            name: name.to_owned(),
            description: String::new(),
            date: Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).single().unwrap(),
            category: EventCategory::Meetup,
            location: "Online".to_owned(),
            image_url: None,
            creator: participant(1),
            attendees: vec![],
        }
    }

    #[test]
    fn duplicate_created_is_absorbed() {
        let mut store = CanonicalStore::new();
        let e3 = event("e3", "Launch party");

        assert!(MutationEvent::Created(e3.clone()).apply(&mut store).is_applied());
        assert_eq!(
            MutationEvent::Created(e3).apply(&mut store),
            MutationOutcome::NoOp
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn created_does_not_overwrite_existing_entry() {
        let mut store = CanonicalStore::new();
        MutationEvent::Replaced(event("e1", "Edited name")).apply(&mut store);
        MutationEvent::Created(event("e1", "Stale create echo")).apply(&mut store);

        assert_eq!(store.get(&EventId::from("e1")).unwrap().name, "Edited name");
    }

    #[test]
    fn replaced_acts_as_create_or_replace() {
        let mut store = CanonicalStore::new();
        // Broadcast echo may land before the local create echo.
        MutationEvent::Replaced(event("e1", "From broadcast")).apply(&mut store);
        assert_eq!(store.len(), 1);

        MutationEvent::Replaced(event("e1", "From response")).apply(&mut store);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&EventId::from("e1")).unwrap().name, "From response");
    }

    #[test]
    fn attendance_changed_preserves_other_fields() {
        let mut store = CanonicalStore::new();
        MutationEvent::Created(event("e1", "Original")).apply(&mut store);

        let outcome = MutationEvent::AttendanceChanged {
            id: EventId::from("e1"),
            roster: vec![participant(2), participant(3)],
        }
        .apply(&mut store);
        assert!(outcome.is_applied());

        let stored = store.get(&EventId::from("e1")).unwrap();
        assert_eq!(stored.name, "Original");
        assert_eq!(stored.location, "Online");
        assert_eq!(stored.category, EventCategory::Meetup);
        assert_eq!(stored.attendee_count(), 2);
    }

    #[test]
    fn attendance_changed_for_absent_id_is_noop() {
        let mut store = CanonicalStore::new();
        let outcome = MutationEvent::AttendanceChanged {
            id: EventId::from("ghost"),
            roster: vec![participant(2)],
        }
        .apply(&mut store);

        assert_eq!(outcome, MutationOutcome::NoOp);
        assert!(store.is_empty());
    }

    #[test]
    fn duplicate_deleted_is_absorbed() {
        let mut store = CanonicalStore::new();
        MutationEvent::Created(event("e1", "Short-lived")).apply(&mut store);

        assert!(MutationEvent::Deleted(EventId::from("e1"))
            .apply(&mut store)
            .is_applied());
        assert_eq!(
            MutationEvent::Deleted(EventId::from("e1")).apply(&mut store),
            MutationOutcome::NoOp
        );
    }

    #[test]
    fn local_echo_then_broadcast_echo_converges() {
        // attend succeeds locally, then the room broadcast delivers the
        // same roster again.
        let mut store = CanonicalStore::new();
        MutationEvent::Created(event("e2", "Meetup")).apply(&mut store);

        let roster = vec![participant(1), participant(2)];
        for _ in 0..2 {
            MutationEvent::AttendanceChanged {
                id: EventId::from("e2"),
                roster: roster.clone(),
            }
            .apply(&mut store);
        }

        let stored = store.get(&EventId::from("e2")).unwrap();
        assert_eq!(stored.attendee_count(), 2);
    }

    // Strategy over small mutation sequences touching a handful of ids.
    fn arb_mutation() -> impl Strategy<Value = MutationEvent> {
        let id = prop_oneof![Just("a"), Just("b"), Just("c")];
        prop_oneof![
            id.clone()
                .prop_map(|i| MutationEvent::Created(event(i, "created"))),
            id.clone()
                .prop_map(|i| MutationEvent::Replaced(event(i, "replaced"))),
            (id.clone(), 0_u32..4).prop_map(|(i, n)| MutationEvent::AttendanceChanged {
                id: EventId::from(i),
                roster: (0..n).map(participant).collect(),
            }),
            id.prop_map(|i| MutationEvent::Deleted(EventId::from(i))),
        ]
    }

    proptest! {
        // Applying a sequence with every element duplicated in place
        // yields the same store as applying it once: each variant is
        // individually idempotent.
        #[test]
        fn duplicated_sequence_converges(mutations in prop::collection::vec(arb_mutation(), 0..24)) {
            let mut once = CanonicalStore::new();
            let mut twice = CanonicalStore::new();

            for mutation in &mutations {
                mutation.clone().apply(&mut once);
                mutation.clone().apply(&mut twice);
                mutation.clone().apply(&mut twice);
            }

            let a: Vec<_> = once.all().cloned().collect();
            let b: Vec<_> = twice.all().cloned().collect();
            prop_assert_eq!(a, b);
        }
    }
}
