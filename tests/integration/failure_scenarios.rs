//! Failure handling and alert transitions across a fleet

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use site_watch::actors::coordinator::CoordinatorHandle;
use site_watch::{AlertKind, Fleet, Window};

use super::helpers::*;

#[tokio::test(start_paused = true)]
async fn test_endpoints_do_not_contaminate_each_other() {
    let mut fleet = Fleet::new(test_config(10, 60), Arc::new(ByName));
    fleet.register("https://up.example/", Duration::from_secs(1));
    fleet.register("https://down.example/", Duration::from_secs(1));

    tokio::time::sleep(Duration::from_millis(5500)).await;

    let events = fleet.refresh(Window::Long);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].endpoint, "https://down.example/");
    assert_eq!(events[0].kind, AlertKind::Down { availability: 0.0 });

    let snapshot = fleet.snapshot();
    assert_eq!(snapshot.len(), 2);

    let up = &snapshot[0];
    assert_eq!(up.endpoint, "https://up.example/");
    assert_eq!(up.long.availability, 1.0);
    assert!(!up.long.is_down);
    assert_eq!(up.long.metrics.status_codes.get(&200), Some(&6));

    let down = &snapshot[1];
    assert_eq!(down.endpoint, "https://down.example/");
    assert_eq!(down.long.availability, 0.0);
    assert!(down.long.is_down);
    assert_eq!(down.long.metrics.avg_connect, None);

    fleet.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_down_then_recovered_once() {
    let probe = Arc::new(Switchable::default());
    let mut fleet = Fleet::new(test_config(2, 10), probe.clone());
    fleet.register("https://flaky.example/", Duration::from_secs(1));

    tokio::time::sleep(Duration::from_millis(2500)).await;
    let events = fleet.refresh(Window::Short);
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0].kind, AlertKind::Down { .. }));
    assert_eq!(events[0].window, Window::Short);

    // still down, no new event
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(fleet.refresh(Window::Short).is_empty());
    assert!(fleet.snapshot()[0].short.is_down);

    probe.set_healthy(true);
    tokio::time::sleep(Duration::from_secs(2)).await;

    let events = fleet.refresh(Window::Short);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, AlertKind::Recovered { availability: 1.0 });
    assert!(fleet.snapshot()[0].short.has_recovered);

    // the recovered flag is one-shot
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(fleet.refresh(Window::Short).is_empty());
    let snapshot = fleet.snapshot();
    assert!(!snapshot[0].short.has_recovered);
    assert!(!snapshot[0].short.is_down);

    fleet.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_registration_ignored() {
    let mut fleet = Fleet::new(test_config(10, 60), Arc::new(ByName));
    fleet.register("https://up.example/", Duration::from_secs(1));
    fleet.register("https://up.example/", Duration::from_secs(5));

    assert_eq!(fleet.len(), 1);
    assert_eq!(
        fleet.snapshot()[0].polling_interval,
        Duration::from_secs(1)
    );

    fleet.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_coordinator_serves_refresh_and_snapshot() {
    let mut fleet = Fleet::new(test_config(10, 60), Arc::new(ByName));
    for name in ["a", "b", "down-c"] {
        fleet.register(&format!("https://{name}.example/"), Duration::from_secs(2));
    }
    let coordinator = CoordinatorHandle::spawn(fleet);

    tokio::time::sleep(Duration::from_millis(4500)).await;

    let outcome = coordinator.refresh(Window::Short).await.unwrap();
    assert_eq!(outcome.window, Window::Short);
    assert_eq!(outcome.snapshot.len(), 3);
    assert_eq!(outcome.events.len(), 1);
    assert_eq!(outcome.events[0].endpoint, "https://down-c.example/");

    let snapshot = coordinator.snapshot().await.unwrap();
    assert_eq!(snapshot, outcome.snapshot);
    assert!(snapshot.iter().all(|e| e.history_len == 3));

    coordinator.shutdown().await.unwrap();

    // once stopped the handle reports an error instead of hanging
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(coordinator.snapshot().await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_unusable_intervals_are_skipped() {
    let mut fleet = Fleet::new(test_config(10, 60), Arc::new(ByName));
    fleet.register("https://zero.example/", Duration::ZERO);
    fleet.register("https://tiny.example/", Duration::from_nanos(1));
    fleet.register("https://up.example/", Duration::from_secs(1));

    assert_eq!(fleet.len(), 1);

    tokio::time::sleep(Duration::from_millis(1500)).await;
    fleet.refresh(Window::Short);
    let snapshot = fleet.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].endpoint, "https://up.example/");
    assert_eq!(snapshot[0].history_len, 2);

    fleet.shutdown().await;
}
