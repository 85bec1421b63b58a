//! Fleet coordinator
//!
//! Owns one prober, one report channel and one [`EndpointStats`] per endpoint.
//! Refreshes are driven from outside (the dashboard or the headless loop); the
//! fleet never schedules itself and never mixes data of different endpoints.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::actors::messages::{AlertEvent, Report};
use crate::actors::prober::ProberHandle;
use crate::config::{ResolvedConfig, history_capacity};
use crate::probe::Probe;
use crate::stats::{EndpointStats, Window, WindowMetrics};

/// Read-only view of one window of an endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSnapshot {
    pub availability: f64,
    pub is_down: bool,
    pub has_recovered: bool,
    pub metrics: WindowMetrics,
}

/// Read-only view of one endpoint, handed to the rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointSnapshot {
    pub endpoint: String,
    pub polling_interval: Duration,
    pub history_len: usize,
    pub short: WindowSnapshot,
    pub long: WindowSnapshot,
}

impl EndpointSnapshot {
    fn of(stats: &EndpointStats) -> Self {
        let view = |window| WindowSnapshot {
            availability: stats.availability(window),
            is_down: stats.is_down(window),
            has_recovered: stats.has_recovered(window),
            metrics: stats.metrics(window).clone(),
        };

        Self {
            endpoint: stats.endpoint().to_string(),
            polling_interval: stats.polling_interval(),
            history_len: stats.history_len(),
            short: view(Window::Short),
            long: view(Window::Long),
        }
    }

    pub fn window(&self, window: Window) -> &WindowSnapshot {
        match window {
            Window::Short => &self.short,
            Window::Long => &self.long,
        }
    }
}

/// Result of one refresh: the alert transitions it produced and the state afterwards.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub window: Window,
    pub events: Vec<AlertEvent>,
    pub snapshot: Vec<EndpointSnapshot>,
}

struct Monitored {
    prober: ProberHandle,
    reports: broadcast::Receiver<Report>,
    stats: EndpointStats,
}

/// All monitored endpoints, in registration order.
pub struct Fleet {
    config: Arc<ResolvedConfig>,
    probe: Arc<dyn Probe>,
    endpoints: Vec<Monitored>,
}

impl Fleet {
    pub fn new(config: Arc<ResolvedConfig>, probe: Arc<dyn Probe>) -> Self {
        Self {
            config,
            probe,
            endpoints: Vec::new(),
        }
    }

    /// Create a fleet and register every endpoint of `config`.
    pub fn from_config(config: Arc<ResolvedConfig>, probe: Arc<dyn Probe>) -> Self {
        let mut fleet = Self::new(Arc::clone(&config), probe);
        for endpoint in &config.endpoints {
            fleet.register(&endpoint.endpoint, endpoint.polling_interval);
        }
        fleet
    }

    /// Start monitoring `endpoint`.
    ///
    /// Registering an endpoint twice is ignored, as is an interval the history cannot
    /// be sized for (zero, or too many reports per long window).
    pub fn register(&mut self, endpoint: &str, polling_interval: Duration) {
        if self.endpoints.iter().any(|m| m.stats.endpoint() == endpoint) {
            warn!("{endpoint}: already registered");
            return;
        }

        if let Err(e) = history_capacity(endpoint, polling_interval, self.config.long_window) {
            warn!("{endpoint}: not monitored: {e}");
            return;
        }

        let stats = EndpointStats::new(endpoint, polling_interval, &self.config);
        let (report_tx, reports) = broadcast::channel(stats.capacity());

        let prober = ProberHandle::spawn(
            endpoint.to_string(),
            polling_interval,
            self.config.request_timeout,
            Arc::clone(&self.probe),
            report_tx,
        );

        info!(
            "monitoring {endpoint} every {polling_interval:?} (history of {} reports)",
            stats.capacity()
        );

        self.endpoints.push(Monitored {
            prober,
            reports,
            stats,
        });
    }

    /// Drain pending reports and recompute `window` for every endpoint.
    pub fn refresh(&mut self, window: Window) -> Vec<AlertEvent> {
        let timestamp = Utc::now();
        let mut events = Vec::new();

        for monitored in &mut self.endpoints {
            monitored.stats.drain(&mut monitored.reports);
            if let Some(kind) = monitored.stats.recompute(window) {
                events.push(AlertEvent {
                    endpoint: monitored.stats.endpoint().to_string(),
                    window,
                    kind,
                    timestamp,
                });
            }
        }

        debug!(
            "{window} refresh of {} endpoints produced {} alert events",
            self.endpoints.len(),
            events.len()
        );

        events
    }

    pub fn snapshot(&self) -> Vec<EndpointSnapshot> {
        self.endpoints
            .iter()
            .map(|m| EndpointSnapshot::of(&m.stats))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Stop every prober. Probes already in flight are abandoned.
    pub async fn shutdown(self) {
        for monitored in self.endpoints {
            monitored.prober.shutdown().await;
        }
        debug!("fleet stopped");
    }
}
