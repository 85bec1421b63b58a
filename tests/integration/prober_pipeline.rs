//! Prober → report channel → stats
//!
//! These tests run on a paused clock so tick counts are exact.

use std::sync::Arc;
use std::time::Duration;

use site_watch::actors::messages::NO_RESPONSE;
use site_watch::actors::prober::ProberHandle;
use site_watch::stats::{EndpointStats, Window};
use tokio::sync::broadcast;

use super::helpers::*;

const ENDPOINT: &str = "https://example.com/";

#[tokio::test(start_paused = true)]
async fn test_one_report_per_tick_when_probe_always_fails() {
    let (report_tx, mut report_rx) = broadcast::channel(64);
    let handle = ProberHandle::spawn(
        ENDPOINT.to_string(),
        Duration::from_secs(1),
        Duration::from_secs(10),
        Arc::new(AlwaysFails),
        report_tx,
    );

    // ticks at 0s, 1s, 2s and 3s
    tokio::time::sleep(Duration::from_millis(3500)).await;

    let mut reports = Vec::new();
    while let Ok(report) = report_rx.try_recv() {
        reports.push(report);
    }

    assert_eq!(reports.len(), 4);
    for report in &reports {
        assert_eq!(report.endpoint, ENDPOINT);
        assert_eq!(report.status_code, NO_RESPONSE);
        assert_eq!(report.connect_duration, None);
        assert_eq!(report.first_byte_duration, None);
        assert!(!report.is_success());
        assert!(report.error.as_deref().unwrap().contains("connection refused"));
    }

    // reports arrive in issue order
    assert!(reports.windows(2).all(|w| w[0].issued_at <= w[1].issued_at));

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_prober_stops_after_shutdown() {
    let (report_tx, mut report_rx) = broadcast::channel(64);
    let handle = ProberHandle::spawn(
        ENDPOINT.to_string(),
        Duration::from_secs(1),
        Duration::from_secs(10),
        Arc::new(AlwaysFails),
        report_tx,
    );

    tokio::time::sleep(Duration::from_millis(1500)).await;
    handle.shutdown().await;

    tokio::time::sleep(Duration::from_secs(10)).await;

    let mut count = 0;
    while report_rx.try_recv().is_ok() {
        count += 1;
    }
    assert_eq!(count, 2);
}

#[tokio::test(start_paused = true)]
async fn test_prober_feeds_stats() {
    let config = test_config(2, 4);
    let mut stats = EndpointStats::new(ENDPOINT, Duration::from_secs(1), &config);

    let (report_tx, mut report_rx) = broadcast::channel(stats.capacity());
    let handle = ProberHandle::spawn(
        ENDPOINT.to_string(),
        Duration::from_secs(1),
        Duration::from_secs(10),
        Arc::new(AlwaysFails),
        report_tx,
    );

    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(stats.drain(&mut report_rx), 3);

    stats.recompute(Window::Short);
    assert_eq!(stats.availability(Window::Short), 0.0);
    assert!(stats.is_down(Window::Short));

    // the channel may overflow while nobody drains, the history stays bounded
    tokio::time::sleep(Duration::from_secs(20)).await;
    stats.drain(&mut report_rx);
    assert_eq!(stats.history_len(), stats.capacity());

    handle.shutdown().await;
}
