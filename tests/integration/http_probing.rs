//! Real HTTP probing against a mock server

use std::sync::Arc;
use std::time::Duration;

use site_watch::actors::messages::NO_RESPONSE;
use site_watch::actors::prober::execute_probe;
use site_watch::probe::{HttpProbe, Probe};
use site_watch::{Fleet, Window};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::helpers::*;

async fn server_with(status: u16, delay: Option<Duration>) -> MockServer {
    let mock_server = MockServer::start().await;
    let mut response = ResponseTemplate::new(status).set_body_string("hello");
    if let Some(delay) = delay {
        response = response.set_delay(delay);
    }
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(response)
        .mount(&mock_server)
        .await;
    mock_server
}

#[tokio::test]
async fn test_http_probe_success() {
    let mock_server = server_with(200, None).await;
    let probe = HttpProbe::new(Duration::from_secs(5)).unwrap();

    let timing = probe
        .probe(&format!("{}/health", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(timing.status_code, 200);
    assert!(timing.connect_duration < Duration::from_secs(5));
}

#[tokio::test]
async fn test_http_probe_server_error_is_a_response() {
    let mock_server = server_with(500, None).await;
    let probe = HttpProbe::new(Duration::from_secs(5)).unwrap();

    let report = execute_probe(
        &probe,
        &format!("{}/health", mock_server.uri()),
        Duration::from_secs(1),
        Duration::from_secs(5),
    )
    .await;

    assert_eq!(report.status_code, 500);
    assert!(!report.is_success());
    assert!(report.connect_duration.is_some());
    assert!(report.first_byte_duration.is_some());
}

#[tokio::test]
async fn test_http_probe_timeout() {
    let mock_server = server_with(200, Some(Duration::from_secs(3))).await;
    let probe = HttpProbe::new(Duration::from_secs(1)).unwrap();

    let report = execute_probe(
        &probe,
        &format!("{}/health", mock_server.uri()),
        Duration::from_secs(1),
        Duration::from_secs(1),
    )
    .await;

    assert_eq!(report.status_code, NO_RESPONSE);
    assert_eq!(report.first_byte_duration, None);
    assert!(report.error.is_some());
}

#[tokio::test]
async fn test_fleet_against_mock_server() {
    let healthy = server_with(200, None).await;
    let broken = server_with(404, None).await;

    let config = test_config(10, 60);
    let probe = Arc::new(HttpProbe::new(config.request_timeout).unwrap());
    let mut fleet = Fleet::new(config, probe);
    fleet.register(&format!("{}/health", healthy.uri()), Duration::from_secs(1));
    fleet.register(&format!("{}/health", broken.uri()), Duration::from_secs(1));

    tokio::time::sleep(Duration::from_millis(1500)).await;

    let events = fleet.refresh(Window::Short);
    let snapshot = fleet.snapshot();

    assert!(snapshot[0].short.metrics.samples >= 1);
    assert_eq!(snapshot[0].short.availability, 1.0);
    assert_eq!(snapshot[1].short.availability, 0.0);
    assert_eq!(snapshot[1].short.metrics.status_codes.get(&404).copied(), Some(snapshot[1].short.metrics.samples));
    assert_eq!(events.len(), 1);

    fleet.shutdown().await;
}
