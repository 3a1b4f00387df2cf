//! End-to-end flows through the engine and gateway: bulk load, local
//! echo, duplicate-echo convergence, and view maintenance.

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)] // Tests can expect

use mingle_core::{EventId, EventPatch, MutationEvent, MutationOutcome, NewEvent, ViewTab};
use mingle_runtime::{DataService, Engine, EngineConfig, Gateway};
use mingle_testing::{InMemoryDataService, SteppingClock, fixtures, mocks::test_clock};
use std::sync::Arc;
use std::time::Duration;

fn engine() -> Engine {
    mingle_testing::init_tracing();
    Engine::new(Arc::new(test_clock()), EngineConfig::default())
}

fn gateway_with(events: Vec<mingle_core::Event>) -> Gateway {
    let service = InMemoryDataService::new(fixtures::participant(1)).with_events(events);
    Gateway::new(Arc::new(service), engine())
}

#[tokio::test]
async fn bulk_load_partitions_by_the_clock() {
    let gateway = gateway_with(vec![
        fixtures::event("future").starting_in_hours(2).build(),
        fixtures::event("past").starting_in_hours(-3).build(),
    ]);
    gateway.load_all().await.unwrap();

    let views = gateway.engine().views();
    assert_eq!(views.upcoming.len(), 1);
    assert_eq!(views.upcoming[0].id, EventId::from("future"));
    assert_eq!(views.past.len(), 1);
    assert_eq!(views.past[0].id, EventId::from("past"));
    assert_eq!(views.calendar.len(), 2);
}

#[tokio::test]
async fn create_echoes_into_views_immediately() {
    let gateway = gateway_with(vec![]);

    let created = gateway
        .create(NewEvent {
            name: "Launch party".to_owned(),
            description: String::new(),
            date: *fixtures::BASE_TIME + chrono::Duration::hours(4),
            category: mingle_core::EventCategory::Social,
            location: "Rooftop".to_owned(),
            image_url: None,
        })
        .await
        .unwrap();

    let views = gateway.engine().views();
    assert_eq!(views.upcoming.len(), 1);
    assert_eq!(views.upcoming[0].id, created.id);
}

#[tokio::test]
async fn duplicate_broadcast_echo_converges() {
    let gateway = gateway_with(vec![fixtures::event("e1").starting_in_hours(1).build()]);
    gateway.load_all().await.unwrap();

    let updated = gateway.attend(&EventId::from("e1")).await.unwrap();
    assert_eq!(updated.attendee_count(), 1);

    // The broadcast echo of the same action arrives later, carrying the
    // same roster; it must be absorbed, never double-applied.
    let outcome = gateway
        .engine()
        .apply(MutationEvent::AttendanceChanged {
            id: updated.id.clone(),
            roster: updated.attendees.clone(),
        })
        .await;
    assert_eq!(outcome, MutationOutcome::NoOp);

    let event = gateway.engine().get_event(&updated.id).await.unwrap();
    assert_eq!(event.attendee_count(), 1);
}

#[tokio::test]
async fn roster_echo_never_clobbers_other_fields() {
    let gateway = gateway_with(vec![fixtures::event("e1").starting_in_hours(1).build()]);
    gateway.load_all().await.unwrap();
    let id = EventId::from("e1");

    // Simulate a concurrent remote rename landing between the attend
    // request and its echo.
    let mut renamed = gateway.engine().get_event(&id).await.unwrap();
    renamed.name = "Renamed remotely".to_owned();

    let updated = gateway.attend(&id).await.unwrap();
    gateway
        .engine()
        .apply(MutationEvent::Replaced(renamed))
        .await;
    gateway
        .engine()
        .apply(MutationEvent::AttendanceChanged {
            id: id.clone(),
            roster: updated.attendees.clone(),
        })
        .await;

    let event = gateway.engine().get_event(&id).await.unwrap();
    assert_eq!(event.name, "Renamed remotely");
    assert_eq!(event.attendee_count(), 1);
}

#[tokio::test]
async fn conflict_leaves_store_untouched_and_refresh_recovers() {
    let service =
        InMemoryDataService::new(fixtures::participant(1)).with_events(vec![
            fixtures::event("e1").starting_in_hours(1).build(),
        ]);
    let gateway = Gateway::new(Arc::new(service.clone()), engine());
    gateway.load_all().await.unwrap();
    let id = EventId::from("e1");

    gateway.attend(&id).await.unwrap();
    let err = gateway.attend(&id).await.unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(
        gateway.engine().get_event(&id).await.unwrap().attendee_count(),
        1
    );

    // Single-event refresh, not a full reload.
    let refreshed = gateway.refresh_event(&id).await.unwrap();
    assert_eq!(refreshed.attendee_count(), 1);
}

#[tokio::test]
async fn refresh_of_a_vanished_event_removes_it_locally() {
    let service =
        InMemoryDataService::new(fixtures::participant(1)).with_events(vec![
            fixtures::event("e1").starting_in_hours(1).build(),
        ]);
    let gateway = Gateway::new(Arc::new(service.clone()), engine());
    gateway.load_all().await.unwrap();
    let id = EventId::from("e1");

    // Deleted server-side behind our back.
    service.delete_event(&id).await.unwrap();

    let err = gateway.refresh_event(&id).await.unwrap_err();
    assert!(matches!(err, mingle_core::EngineError::NotFound { .. }));
    assert!(gateway.engine().get_event(&id).await.is_none());
    assert!(gateway.engine().views().upcoming.is_empty());
}

#[tokio::test]
async fn update_moves_an_event_across_the_boundary() {
    let gateway = gateway_with(vec![fixtures::event("e1").starting_in_hours(2).build()]);
    gateway.load_all().await.unwrap();
    let id = EventId::from("e1");
    assert_eq!(gateway.engine().views().upcoming.len(), 1);

    let patch = EventPatch {
        date: Some(*fixtures::BASE_TIME - chrono::Duration::hours(2)),
        ..EventPatch::default()
    };
    gateway.update(&id, patch).await.unwrap();

    let views = gateway.engine().views();
    assert!(views.upcoming.is_empty());
    assert_eq!(views.past.len(), 1);
}

#[tokio::test]
async fn delete_removes_from_every_view() {
    let gateway = gateway_with(vec![
        fixtures::event("e1").starting_in_hours(2).with_attendee_count(3).build(),
        fixtures::event("e2").starting_in_hours(3).build(),
    ]);
    gateway.load_all().await.unwrap();

    gateway.delete(&EventId::from("e1")).await.unwrap();

    let views = gateway.engine().views();
    assert_eq!(views.upcoming.len(), 1);
    assert_eq!(views.calendar.len(), 1);
    assert!(views.top_attended.iter().all(|e| e.id != EventId::from("e1")));
}

#[tokio::test]
async fn tab_switch_reprojects_top_attended() {
    let gateway = gateway_with(vec![
        fixtures::event("up").starting_in_hours(2).with_attendee_count(2).build(),
        fixtures::event("gone").starting_in_hours(-2).with_attendee_count(5).build(),
    ]);
    gateway.load_all().await.unwrap();

    let views = gateway.engine().views();
    assert_eq!(views.top_attended.len(), 1);
    assert_eq!(views.top_attended[0].id, EventId::from("up"));

    gateway.engine().set_tab(ViewTab::Past).await;
    let views = gateway.engine().views();
    assert_eq!(views.top_attended.len(), 1);
    assert_eq!(views.top_attended[0].id, EventId::from("gone"));
}

#[tokio::test(start_paused = true)]
async fn reprojection_tick_moves_events_across_the_boundary() {
    mingle_testing::init_tracing();
    let clock = SteppingClock::new(*fixtures::BASE_TIME);
    let engine = Engine::new(
        Arc::new(clock.clone()),
        EngineConfig::default().with_reprojection_tick(Some(Duration::from_secs(60))),
    );
    engine
        .load_bulk(vec![fixtures::event("soon").starting_in_hours(1).build()])
        .await;
    assert_eq!(engine.views().upcoming.len(), 1);

    let tick = engine.spawn_reprojection_tick().expect("tick configured");
    let mut rx = engine.subscribe_views();
    rx.borrow_and_update();

    // The event's start passes with no mutation arriving; only the next
    // tick can move it into the past partition.
    clock.advance(chrono::Duration::hours(2));
    tokio::time::sleep(Duration::from_secs(61)).await;
    rx.changed().await.unwrap();

    let views = engine.views();
    assert!(views.upcoming.is_empty());
    assert_eq!(views.past.len(), 1);
    tick.abort();
}

#[tokio::test]
async fn views_watch_notifies_on_every_applied_mutation() {
    let gateway = gateway_with(vec![fixtures::event("e1").starting_in_hours(1).build()]);
    let mut rx = gateway.engine().subscribe_views();

    gateway.load_all().await.unwrap();
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().upcoming.len(), 1);

    // An absorbed duplicate publishes nothing.
    let event = gateway.engine().get_event(&EventId::from("e1")).await.unwrap();
    gateway.engine().apply(MutationEvent::Created(event)).await;
    assert!(!rx.has_changed().unwrap());
}
