//! Pure view projection: every view is a function of the canonical store
//! plus view parameters, holding no state of its own.
//!
//! Projection is O(store size) per view and deterministic: the same store
//! contents and parameters always produce the same output. The only
//! ordering source beyond the sort keys is the store's insertion order,
//! which breaks ties.

use crate::event::{Event, EventCategory};
use crate::store::CanonicalStore;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum number of entries in the top-attended view.
pub const TOP_ATTENDED_LIMIT: usize = 3;

/// Maximum number of events in a search result page.
pub const SEARCH_RESULT_LIMIT: usize = 10;

/// Which partition the top-attended ranking draws from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewTab {
    /// Events strictly after "now"
    #[default]
    Upcoming,
    /// Events at or before "now"
    Past,
}

/// Parameters the projection depends on besides the store itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewParams {
    /// The reference instant separating upcoming from past
    pub now: DateTime<Utc>,
    /// The active top-attended tab
    pub tab: ViewTab,
}

/// Events strictly after `now`, ascending by date.
///
/// The sort is stable, so events sharing an instant keep store order.
#[must_use]
pub fn upcoming(store: &CanonicalStore, now: DateTime<Utc>) -> Vec<Event> {
    let mut events: Vec<Event> = store.all().filter(|e| e.date > now).cloned().collect();
    events.sort_by_key(|e| e.date);
    events
}

/// Events at or before `now`, descending by date.
#[must_use]
pub fn past(store: &CanonicalStore, now: DateTime<Utc>) -> Vec<Event> {
    let mut events: Vec<Event> = store.all().filter(|e| e.date <= now).cloned().collect();
    events.sort_by_key(|e| std::cmp::Reverse(e.date));
    events
}

/// Partitions the store by UTC calendar day.
///
/// Every event lands in exactly one bucket; within a bucket events keep
/// store order. The reference time zone is UTC, matching how the data
/// service formats dates.
#[must_use]
pub fn calendar_index(store: &CanonicalStore) -> BTreeMap<NaiveDate, Vec<Event>> {
    let mut index: BTreeMap<NaiveDate, Vec<Event>> = BTreeMap::new();
    for event in store.all() {
        index
            .entry(event.date.date_naive())
            .or_default()
            .push(event.clone());
    }
    index
}

/// The up-to-three most attended events within the active tab's partition,
/// descending by roster size, ties broken by store order.
#[must_use]
pub fn top_attended(store: &CanonicalStore, now: DateTime<Utc>, tab: ViewTab) -> Vec<Event> {
    let mut events: Vec<Event> = store
        .all()
        .filter(|e| match tab {
            ViewTab::Upcoming => e.date > now,
            ViewTab::Past => e.date <= now,
        })
        .cloned()
        .collect();
    // Stable sort: equal roster sizes keep insertion order.
    events.sort_by_key(|e| std::cmp::Reverse(e.attendee_count()));
    events.truncate(TOP_ATTENDED_LIMIT);
    events
}

/// A free-text search request with an optional category filter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Free-text query matched against name, description, location, and
    /// creator name
    #[serde(default)]
    pub text: String,
    /// Restrict matches to a single category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<EventCategory>,
}

impl SearchQuery {
    /// A text-only query.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: None,
        }
    }

    /// Adds a category filter.
    #[must_use]
    pub const fn with_category(mut self, category: EventCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Whether the event matches this query.
    ///
    /// Text matching is case-insensitive substring over name, description,
    /// location, and creator name; an empty text matches everything. The
    /// category filter, when present, must match exactly. These semantics
    /// are shared with the data service so server-side and client-side
    /// filtering agree.
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(category) = self.category {
            if event.category != category {
                return false;
            }
        }
        if self.text.is_empty() {
            return true;
        }
        let needle = self.text.to_lowercase();
        [
            &event.name,
            &event.description,
            &event.location,
            &event.creator.name,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// A transient page of search results.
///
/// Never derived from the canonical store; replaced wholesale on every
/// completed query.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    /// The query these results answer
    pub query: SearchQuery,
    /// Matching events, capped at [`SEARCH_RESULT_LIMIT`]
    pub events: Vec<Event>,
    /// Whether more matches may exist beyond the cap
    pub has_more: bool,
}

/// A consistent snapshot of every derived view.
///
/// Recomputed as a whole whenever a mutation is applied, the tab changes,
/// or the periodic tick fires, so the views can never disagree about the
/// store contents they reflect.
#[derive(Clone, Debug, PartialEq)]
pub struct Views {
    /// Events after `now`, ascending
    pub upcoming: Vec<Event>,
    /// Events at or before `now`, descending
    pub past: Vec<Event>,
    /// Per-UTC-day index
    pub calendar: BTreeMap<NaiveDate, Vec<Event>>,
    /// Top three attended within the active tab
    pub top_attended: Vec<Event>,
    /// The parameters this snapshot was projected with
    pub params: ViewParams,
}

impl Views {
    /// Projects every view from the store.
    #[must_use]
    pub fn project(store: &CanonicalStore, params: ViewParams) -> Self {
        Self {
            upcoming: upcoming(store, params.now),
            past: past(store, params.now),
            calendar: calendar_index(store),
            top_attended: top_attended(store, params.now, params.tab),
            params,
        }
    }

    /// An empty snapshot, used before the initial bulk load completes.
    #[must_use]
    pub fn empty(params: ViewParams) -> Self {
        Self {
            upcoming: Vec::new(),
            past: Vec::new(),
            calendar: BTreeMap::new(),
            top_attended: Vec::new(),
            params,
        }
    }
}
