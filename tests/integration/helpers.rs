//! Helper probes and configuration for integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use site_watch::config::ResolvedConfig;
use site_watch::probe::{Probe, ProbeError, ProbeTiming};

pub fn ok_timing(status_code: u16) -> ProbeTiming {
    ProbeTiming {
        status_code,
        connect_duration: Duration::from_millis(5),
        first_byte_duration: Duration::from_millis(20),
    }
}

pub fn test_config(short_window_secs: u64, long_window_secs: u64) -> Arc<ResolvedConfig> {
    Arc::new(ResolvedConfig {
        short_window: Duration::from_secs(short_window_secs),
        long_window: Duration::from_secs(long_window_secs),
        ..Default::default()
    })
}

/// Never gets a response
pub struct AlwaysFails;

#[async_trait]
impl Probe for AlwaysFails {
    async fn probe(&self, _endpoint: &str) -> Result<ProbeTiming, ProbeError> {
        Err(ProbeError::Connect("connection refused".to_string()))
    }
}

/// Fails for every endpoint containing `down`, answers 200 otherwise
pub struct ByName;

#[async_trait]
impl Probe for ByName {
    async fn probe(&self, endpoint: &str) -> Result<ProbeTiming, ProbeError> {
        if endpoint.contains("down") {
            Err(ProbeError::Connect("connection refused".to_string()))
        } else {
            Ok(ok_timing(200))
        }
    }
}

/// Answers 200 or 503 depending on a switch flipped by the test
#[derive(Default)]
pub struct Switchable {
    healthy: AtomicBool,
}

impl Switchable {
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }
}

#[async_trait]
impl Probe for Switchable {
    async fn probe(&self, _endpoint: &str) -> Result<ProbeTiming, ProbeError> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(ok_timing(200))
        } else {
            Ok(ok_timing(503))
        }
    }
}

/// Takes `delay` to answer and records how many probes run at the same time
pub struct Slow {
    pub delay: Duration,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl Slow {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Probe for Slow {
    async fn probe(&self, _endpoint: &str) -> Result<ProbeTiming, ProbeError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(ok_timing(200))
    }
}
