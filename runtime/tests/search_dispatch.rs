//! Debounce, supersede, and stale-result behavior of the search
//! dispatcher. Runs on paused time so the quiet period is deterministic.

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)] // Tests can expect

use mingle_core::{EngineError, EventCategory, SearchQuery};
use mingle_runtime::{Engine, EngineConfig, SearchDispatcher};
use mingle_testing::{InMemoryDataService, fixtures, mocks::test_clock};
use std::sync::Arc;

fn dispatcher_with(events: Vec<mingle_core::Event>) -> (SearchDispatcher, Engine) {
    mingle_testing::init_tracing();
    let engine = Engine::new(Arc::new(test_clock()), EngineConfig::default());
    let service = Arc::new(InMemoryDataService::new(fixtures::participant(1)).with_events(events));
    (SearchDispatcher::new(service, engine.clone()), engine)
}

#[tokio::test(start_paused = true)]
async fn completed_search_replaces_the_search_view() {
    let (dispatcher, engine) = dispatcher_with(vec![
        fixtures::event("e1").name("Rust meetup").build(),
        fixtures::event("e2").name("Garden party").build(),
    ]);

    let results = dispatcher
        .search(SearchQuery::text("rust"))
        .await
        .unwrap()
        .expect("not superseded");
    assert_eq!(results.events.len(), 1);
    assert!(!results.has_more);
    assert_eq!(engine.search_results().unwrap().events.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn superseded_query_never_publishes() {
    let (dispatcher, engine) = dispatcher_with(vec![
        fixtures::event("e1").name("Rust meetup").build(),
        fixtures::event("e2").name("Garden party").build(),
    ]);

    // Two keystrokes in quick succession: the first is abandoned during
    // its quiet period, only the second reaches the service.
    let (first, second) = futures::join!(
        dispatcher.search(SearchQuery::text("rust")),
        dispatcher.search(SearchQuery::text("garden")),
    );
    assert!(first.unwrap().is_none());

    let results = second.unwrap().expect("latest query wins");
    assert_eq!(results.events[0].name, "Garden party");
    assert_eq!(engine.search_results().unwrap().query.text, "garden");
}

#[tokio::test(start_paused = true)]
async fn clear_invalidates_an_in_flight_query() {
    let (dispatcher, engine) = dispatcher_with(vec![fixtures::event("e1").build()]);

    let in_flight = tokio::spawn({
        let dispatcher = dispatcher.clone();
        async move { dispatcher.search(SearchQuery::text("event")).await }
    });
    // Let the query enter its quiet period, then clear before it wakes.
    tokio::task::yield_now().await;
    dispatcher.clear();

    assert!(in_flight.await.unwrap().unwrap().is_none());
    assert!(engine.search_results().is_none());
}

#[tokio::test(start_paused = true)]
async fn failed_search_keeps_the_previous_view()  {
    let service = Arc::new(
        InMemoryDataService::new(fixtures::participant(1))
            .with_events(vec![fixtures::event("e1").name("Rust meetup").build()]),
    );
    let engine = Engine::new(Arc::new(test_clock()), EngineConfig::default());
    let dispatcher = SearchDispatcher::new(service.clone(), engine.clone());

    dispatcher
        .search(SearchQuery::text("rust"))
        .await
        .unwrap();
    service.fail_next(EngineError::Transport("offline".to_owned()));

    let err = dispatcher.search(SearchQuery::text("meetup")).await.unwrap_err();
    assert!(matches!(err, EngineError::Transport(_)));
    // The last successful results are still showing.
    assert_eq!(engine.search_results().unwrap().query.text, "rust");
}

#[tokio::test(start_paused = true)]
async fn category_filter_is_exact() {
    let (dispatcher, _engine) = dispatcher_with(vec![
        fixtures::event("w").name("Intro workshop").category(EventCategory::Workshop).build(),
        fixtures::event("m").name("Workshop planning meetup").category(EventCategory::Meetup).build(),
    ]);

    let results = dispatcher
        .search(SearchQuery::text("workshop").with_category(EventCategory::Workshop))
        .await
        .unwrap()
        .expect("not superseded");
    assert_eq!(results.events.len(), 1);
    assert_eq!(results.events[0].category, EventCategory::Workshop);
}
