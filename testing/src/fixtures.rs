//! Deterministic fixtures for events and participants.
//!
//! Dates are expressed relative to [`BASE_TIME`], the same instant
//! [`test_clock`](crate::mocks::test_clock) returns, so "in two hours"
//! means two hours after the clock every engine under test sees.

use chrono::{DateTime, Duration, Utc};
use mingle_core::{Event, EventCategory, EventId, Participant, ParticipantId};

/// The reference instant all fixtures are relative to:
/// 2025-01-01 00:00:00 UTC.
#[allow(clippy::expect_used)]
pub static BASE_TIME: std::sync::LazyLock<DateTime<Utc>> = std::sync::LazyLock::new(|| {
    DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
        .expect("hardcoded timestamp should always parse")
        .with_timezone(&Utc)
});

/// A deterministic participant: id `p{n}`, name `Person {n}`.
#[must_use]
pub fn participant(n: u32) -> Participant {
    Participant::new(
        ParticipantId::new(format!("p{n}")),
        format!("Person {n}"),
        format!("p{n}@example.com"),
    )
}

/// Starts building an event with the given id.
#[must_use]
pub fn event(id: &str) -> EventBuilder {
    EventBuilder::new(id)
}

/// Builder for test events. Defaults: a meetup named after its id,
/// located "Online", created by [`participant`] 1, dated [`BASE_TIME`],
/// empty roster.
#[derive(Clone, Debug)]
pub struct EventBuilder {
    event: Event,
}

impl EventBuilder {
    /// Creates a builder for the given event id.
    #[must_use]
    pub fn new(id: &str) -> Self {
        Self {
            event: Event {
                id: EventId::from(id),
                name: format!("Event {id}"),
                description: String::new(),
                date: *BASE_TIME,
                category: EventCategory::Meetup,
                location: "Online".to_owned(),
                image_url: None,
                creator: participant(1),
                attendees: Vec::new(),
            },
        }
    }

    /// Sets the event name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.event.name = name.into();
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.event.description = description.into();
        self
    }

    /// Sets the location.
    #[must_use]
    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.event.location = location.into();
        self
    }

    /// Sets the category.
    #[must_use]
    pub const fn category(mut self, category: EventCategory) -> Self {
        self.event.category = category;
        self
    }

    /// Sets the absolute date.
    #[must_use]
    pub const fn at(mut self, date: DateTime<Utc>) -> Self {
        self.event.date = date;
        self
    }

    /// Dates the event `hours` after [`BASE_TIME`] (negative for past).
    #[must_use]
    pub fn starting_in_hours(mut self, hours: i64) -> Self {
        self.event.date = *BASE_TIME + Duration::hours(hours);
        self
    }

    /// Dates the event `days` after [`BASE_TIME`] (negative for past).
    #[must_use]
    pub fn starting_in_days(mut self, days: i64) -> Self {
        self.event.date = *BASE_TIME + Duration::days(days);
        self
    }

    /// Sets the creator.
    #[must_use]
    pub fn created_by(mut self, creator: Participant) -> Self {
        self.event.creator = creator;
        self
    }

    /// Replaces the roster with participants `p1..=p{count}`.
    #[must_use]
    pub fn with_attendee_count(mut self, count: u32) -> Self {
        self.event.attendees = (1..=count).map(participant).collect();
        self
    }

    /// Adds one attendee.
    #[must_use]
    pub fn attended_by(mut self, attendee: Participant) -> Self {
        self.event.attendees.push(attendee);
        self
    }

    /// Finishes the event.
    #[must_use]
    pub fn build(self) -> Event {
        self.event
    }
}
