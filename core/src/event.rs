//! Domain types for events and participants.
//!
//! Identifiers are opaque strings assigned by the remote data service; the
//! engine never mints event ids of its own. Participants are embedded by
//! value but owned elsewhere — this crate does not manage their lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for an event, assigned by the data service.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Wraps a raw identifier string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EventId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// Unique identifier for a participant.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Wraps a raw identifier string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// A user referenced by an event, either as creator or attendee.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Participant identifier
    pub id: ParticipantId,
    /// Display name
    pub name: String,
    /// Contact email
    pub email: String,
    /// Optional phone number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Optional avatar URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl Participant {
    /// Creates a participant with only the required fields.
    #[must_use]
    pub fn new(id: ParticipantId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
            phone: None,
            avatar_url: None,
        }
    }
}

/// The fixed set of event categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventCategory {
    /// Multi-track conferences
    Conference,
    /// Hands-on workshops
    Workshop,
    /// Informal meetups
    Meetup,
    /// Social gatherings
    Social,
    /// Anything else
    Other,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Conference => "conference",
            Self::Workshop => "workshop",
            Self::Meetup => "meetup",
            Self::Social => "social",
            Self::Other => "other",
        };
        write!(f, "{name}")
    }
}

/// A time-boxed event with its attendance roster.
///
/// The roster is ordered and unique by participant id. Use
/// [`Event::with_roster`] when replacing it so duplicates are dropped.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event identifier
    pub id: EventId,
    /// Event name
    pub name: String,
    /// Free-text description
    pub description: String,
    /// The single absolute instant the event takes place
    pub date: DateTime<Utc>,
    /// Event category
    pub category: EventCategory,
    /// Free-text location
    pub location: String,
    /// Optional image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// The participant who created the event
    pub creator: Participant,
    /// Ordered attendee roster, unique by participant id
    #[serde(default)]
    pub attendees: Vec<Participant>,
}

impl Event {
    /// Number of attendees on the roster.
    #[must_use]
    pub fn attendee_count(&self) -> usize {
        self.attendees.len()
    }

    /// Whether the given participant is on the roster.
    #[must_use]
    pub fn is_attending(&self, id: &ParticipantId) -> bool {
        self.attendees.iter().any(|p| &p.id == id)
    }

    /// Returns this event with the roster replaced.
    ///
    /// Duplicate participant ids are dropped, keeping the first occurrence,
    /// so an at-least-once delivered roster update cannot introduce
    /// duplicate entries.
    #[must_use]
    pub fn with_roster(mut self, roster: Vec<Participant>) -> Self {
        self.attendees = dedup_roster(roster);
        self
    }
}

/// Drops duplicate participant ids, keeping the first occurrence.
#[must_use]
pub fn dedup_roster(roster: Vec<Participant>) -> Vec<Participant> {
    let mut seen = std::collections::HashSet::new();
    roster
        .into_iter()
        .filter(|p| seen.insert(p.id.clone()))
        .collect()
}

/// Payload for creating a new event.
///
/// The data service assigns the identifier and echoes back the full
/// [`Event`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    /// Event name
    pub name: String,
    /// Free-text description
    pub description: String,
    /// When the event takes place
    pub date: DateTime<Utc>,
    /// Event category
    pub category: EventCategory,
    /// Free-text location
    pub location: String,
    /// Optional image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Partial update for an existing event.
///
/// Only the provided fields are sent; the data service merges them and
/// returns the resulting full [`Event`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EventPatch {
    /// New name, if changing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New description, if changing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// New date, if changing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    /// New category, if changing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<EventCategory>,
    /// New location, if changing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// New image URL, if changing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl EventPatch {
    /// Whether the patch carries no changes at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.date.is_none()
            && self.category.is_none()
            && self.location.is_none()
            && self.image_url.is_none()
    }
}
