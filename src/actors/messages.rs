//! Message types for actor communication
//!
//! Probers publish [`Report`]s on their per-endpoint report channel. The
//! coordinator answers refresh and snapshot requests through oneshot channels.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::oneshot;

use crate::fleet::{EndpointSnapshot, RefreshOutcome};
use crate::probe::{ProbeError, ProbeTiming};
use crate::stats::Window;

/// Status code recorded when a probe did not receive any response.
pub const NO_RESPONSE: u16 = 0;

/// Outcome of a single probe attempt
///
/// Reports are immutable once built. A probe that failed to complete carries
/// [`NO_RESPONSE`] as status code and no timings.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// Normalized URL of the probed endpoint
    pub endpoint: String,

    /// Polling interval of the prober that issued the probe
    pub polling_interval: Duration,

    /// When the probe attempt started
    pub issued_at: DateTime<Utc>,

    /// HTTP status code, or [`NO_RESPONSE`]
    pub status_code: u16,

    /// Time needed to establish the TCP connection
    pub connect_duration: Option<Duration>,

    /// Time until the response headers arrived
    pub first_byte_duration: Option<Duration>,

    /// Why the probe failed to complete
    pub error: Option<String>,
}

impl Report {
    /// Build the report for a finished probe attempt.
    pub fn from_outcome(
        endpoint: impl Into<String>,
        polling_interval: Duration,
        issued_at: DateTime<Utc>,
        outcome: Result<ProbeTiming, ProbeError>,
    ) -> Self {
        let endpoint = endpoint.into();
        match outcome {
            Ok(timing) => Self {
                endpoint,
                polling_interval,
                issued_at,
                status_code: timing.status_code,
                connect_duration: Some(timing.connect_duration),
                first_byte_duration: Some(timing.first_byte_duration),
                error: None,
            },
            Err(e) => Self {
                endpoint,
                polling_interval,
                issued_at,
                status_code: NO_RESPONSE,
                connect_duration: None,
                first_byte_duration: None,
                error: Some(e.to_string()),
            },
        }
    }

    /// Whether this report counts as available (any 2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Commands that can be sent to a ProberActor
#[derive(Debug)]
pub enum ProberCommand {
    /// Probe immediately (bypassing the interval timer)
    ///
    /// The report is published on the report channel as usual and also sent back.
    ProbeNow { respond_to: oneshot::Sender<Report> },

    /// Stop the ticker
    ///
    /// Probes already in flight run to completion on their own.
    Shutdown,
}

/// Commands that can be sent to the CoordinatorActor
#[derive(Debug)]
pub enum CoordinatorCommand {
    /// Drain pending reports and recompute the given window for every endpoint
    Refresh {
        window: Window,
        respond_to: oneshot::Sender<RefreshOutcome>,
    },

    /// Read the current state without touching it
    Snapshot {
        respond_to: oneshot::Sender<Vec<EndpointSnapshot>>,
    },

    /// Most recent alert events, oldest first
    RecentAlerts {
        respond_to: oneshot::Sender<Vec<AlertEvent>>,
    },

    /// Shut down all probers and the coordinator itself
    Shutdown,
}

/// Kind of an alert transition
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlertKind {
    /// Availability dropped below the critical threshold
    Down { availability: f64 },

    /// Availability is back at or above the critical threshold
    Recovered { availability: f64 },
}

/// Alert transition produced by a refresh
#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    pub endpoint: String,
    pub window: Window,
    pub kind: AlertKind,
    pub timestamp: DateTime<Utc>,
}
