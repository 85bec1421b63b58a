//! Failures of the rendering task must not reach the probing core

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use pretty_assertions::assert_eq;
use site_watch::actors::coordinator::CoordinatorHandle;
use site_watch::supervisor::{Supervised, supervise};
use site_watch::{AlertKind, Fleet, Window};

use super::helpers::*;

#[tokio::test(start_paused = true)]
async fn test_panicking_task_leaves_coordinator_running() {
    let mut fleet = Fleet::new(test_config(10, 60), Arc::new(ByName));
    fleet.register("https://up.example/", Duration::from_secs(1));
    fleet.register("https://down.example/", Duration::from_secs(1));
    let coordinator = CoordinatorHandle::spawn(fleet);

    let starts = Arc::new(AtomicUsize::new(0));
    let failures = AtomicUsize::new(0);

    let outcome = supervise(
        "dashboard",
        2,
        || {
            let coordinator = coordinator.clone();
            let starts = Arc::clone(&starts);
            async move {
                starts.fetch_add(1, Ordering::SeqCst);
                let outcome = coordinator.refresh(Window::Short).await?;
                if !outcome.snapshot.is_empty() {
                    panic!("render failed");
                }
                Ok::<(), anyhow::Error>(())
            }
        },
        || {
            failures.fetch_add(1, Ordering::SeqCst);
        },
    )
    .await;

    assert!(matches!(outcome, Supervised::GaveUp { failure } if failure.contains("panicked")));
    assert_eq!(starts.load(Ordering::SeqCst), 3);
    assert_eq!(failures.load(Ordering::SeqCst), 3);

    // probers keep feeding the coordinator after the task is gone
    tokio::time::sleep(Duration::from_millis(3500)).await;
    let outcome = coordinator.refresh(Window::Short).await.unwrap();
    assert_eq!(outcome.snapshot.len(), 2);
    assert!(outcome.snapshot.iter().all(|e| e.history_len == 4));
    assert_eq!(outcome.snapshot[1].short.availability, 0.0);

    coordinator.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_task_restarted_until_it_completes() {
    let starts = Arc::new(AtomicUsize::new(0));

    let outcome = supervise(
        "dashboard",
        3,
        || {
            let starts = Arc::clone(&starts);
            async move {
                if starts.fetch_add(1, Ordering::SeqCst) == 0 {
                    anyhow::bail!("terminal went away");
                }
                Ok(())
            }
        },
        || {},
    )
    .await;

    assert_eq!(outcome, Supervised::Completed);
    assert_eq!(starts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_error_reported_when_giving_up() {
    let outcome = supervise(
        "dashboard",
        0,
        || async { Err::<(), _>(anyhow::anyhow!("no terminal")) },
        || {},
    )
    .await;

    assert_eq!(
        outcome,
        Supervised::GaveUp {
            failure: "no terminal".to_string()
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_alert_timeline_outlives_dashboard() {
    let mut fleet = Fleet::new(test_config(10, 60), Arc::new(ByName));
    fleet.register("https://down.example/", Duration::from_secs(1));
    let coordinator = CoordinatorHandle::spawn(fleet);

    tokio::time::sleep(Duration::from_millis(1500)).await;
    let outcome = coordinator.refresh(Window::Long).await.unwrap();
    assert_eq!(outcome.events.len(), 1);

    // a dashboard attaching later still sees the earlier transition
    let alerts = coordinator.recent_alerts().await.unwrap();
    assert_eq!(alerts, outcome.events);
    assert_eq!(alerts[0].kind, AlertKind::Down { availability: 0.0 });

    coordinator.shutdown().await.unwrap();
}
