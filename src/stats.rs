//! Per-endpoint statistics and alerting
//!
//! [`EndpointStats`] keeps a bounded history of the most recent reports of one
//! endpoint and derives two independent views from it, one per [`Window`].
//!
//! ## Alert state machine
//!
//! Each view runs a two-state, edge-triggered detector:
//!
//! ```text
//! availability <  threshold  → Down
//! availability >= threshold  → Up
//!
//! Down → Up   : has_recovered is set for exactly this one update
//! Up   → Down : a Down alert is raised
//! ```
//!
//! There is no flapping suppression; every update re-evaluates from scratch.
//!
//! ## Windows
//!
//! A window covers the most recent `ceil(window / polling_interval)` reports.
//! The history holds exactly as many reports as the long window needs, oldest
//! evicted first.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::time::Duration;

use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, trace, warn};

use crate::actors::messages::{AlertKind, Report};
use crate::config::ResolvedConfig;

/// The two time resolutions availability is tracked at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Window {
    Short,
    Long,
}

impl Window {
    pub fn label(&self) -> &'static str {
        match self {
            Window::Short => "short",
            Window::Long => "long",
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Edge-triggered down/recovered detector fed with availability values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertState {
    availability: f64,
    is_down: bool,
    has_recovered: bool,
    previous_is_down: bool,
}

impl Default for AlertState {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertState {
    pub fn new() -> Self {
        Self {
            availability: 1.0,
            is_down: false,
            has_recovered: false,
            previous_is_down: false,
        }
    }

    /// Replace the availability the next [`AlertState::update`] evaluates.
    pub fn set_availability(&mut self, availability: f64) {
        self.availability = availability;
    }

    /// Run one alert transition against `threshold`.
    ///
    /// Returns the transition, if this update produced one.
    pub fn update(&mut self, threshold: f64) -> Option<AlertKind> {
        let current_is_down = self.availability < threshold;

        self.has_recovered = self.previous_is_down && !current_is_down;
        self.is_down = current_is_down;
        let went_down = current_is_down && !self.previous_is_down;
        self.previous_is_down = current_is_down;

        if went_down {
            Some(AlertKind::Down {
                availability: self.availability,
            })
        } else if self.has_recovered {
            Some(AlertKind::Recovered {
                availability: self.availability,
            })
        } else {
            None
        }
    }

    pub fn availability(&self) -> f64 {
        self.availability
    }

    pub fn is_down(&self) -> bool {
        self.is_down
    }

    pub fn has_recovered(&self) -> bool {
        self.has_recovered
    }
}

/// Aggregates computed over one window slice of the history.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowMetrics {
    /// Number of reports in the slice
    pub samples: usize,

    /// Share of successful reports, `1.0` for an empty slice
    pub availability: f64,

    pub avg_connect: Option<Duration>,
    pub max_connect: Option<Duration>,
    pub avg_first_byte: Option<Duration>,
    pub max_first_byte: Option<Duration>,

    /// Reports per status code, failed probes are counted under `0`
    pub status_codes: BTreeMap<u16, usize>,
}

impl Default for WindowMetrics {
    fn default() -> Self {
        Self {
            samples: 0,
            availability: 1.0,
            avg_connect: None,
            max_connect: None,
            avg_first_byte: None,
            max_first_byte: None,
            status_codes: BTreeMap::new(),
        }
    }
}

impl WindowMetrics {
    pub fn from_reports<'a>(reports: impl IntoIterator<Item = &'a Report>) -> Self {
        let mut samples = 0usize;
        let mut successes = 0usize;
        let mut connects = Vec::new();
        let mut first_bytes = Vec::new();
        let mut status_codes = BTreeMap::new();

        for report in reports {
            samples += 1;
            if report.is_success() {
                successes += 1;
            }
            connects.extend(report.connect_duration);
            first_bytes.extend(report.first_byte_duration);
            *status_codes.entry(report.status_code).or_insert(0) += 1;
        }

        let availability = if samples == 0 {
            1.0
        } else {
            successes as f64 / samples as f64
        };

        Self {
            samples,
            availability,
            avg_connect: average(&connects),
            max_connect: connects.iter().max().copied(),
            avg_first_byte: average(&first_bytes),
            max_first_byte: first_bytes.iter().max().copied(),
            status_codes,
        }
    }
}

fn average(durations: &[Duration]) -> Option<Duration> {
    if durations.is_empty() {
        return None;
    }
    let total: Duration = durations.iter().sum();
    Some(total / durations.len() as u32)
}

#[derive(Debug, Clone, Default)]
struct WindowView {
    metrics: WindowMetrics,
    alert: AlertState,
}

/// Upper bound for the history of a single endpoint.
///
/// 100k reports cover a day at a polling interval of one second.
pub const MAX_HISTORY_REPORTS: usize = 100_000;

/// Number of reports a window of `window` covers at `polling_interval`, at least one.
///
/// Saturates at `usize::MAX`.
pub fn reports_per_window(window: Duration, polling_interval: Duration) -> usize {
    let polling = polling_interval.as_nanos().max(1);
    usize::try_from(window.as_nanos().div_ceil(polling))
        .unwrap_or(usize::MAX)
        .max(1)
}

/// Rolling statistics of a single endpoint.
///
/// Only the coordinator mutates instances of this type.
#[derive(Debug, Clone)]
pub struct EndpointStats {
    endpoint: String,
    polling_interval: Duration,
    short_window: Duration,
    long_window: Duration,
    critical_availability: f64,
    history: VecDeque<Report>,
    capacity: usize,
    short: WindowView,
    long: WindowView,
}

impl EndpointStats {
    pub fn new(
        endpoint: impl Into<String>,
        polling_interval: Duration,
        config: &ResolvedConfig,
    ) -> Self {
        let capacity = reports_per_window(config.long_window, polling_interval);
        Self {
            endpoint: endpoint.into(),
            polling_interval,
            short_window: config.short_window,
            long_window: config.long_window,
            critical_availability: config.critical_availability,
            history: VecDeque::with_capacity(capacity),
            capacity,
            short: WindowView::default(),
            long: WindowView::default(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn polling_interval(&self) -> Duration {
        self.polling_interval
    }

    /// Maximum number of reports kept in the history.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Reports currently held, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &Report> {
        self.history.iter()
    }

    /// Append a report, evicting the oldest one when full.
    pub fn push(&mut self, report: Report) {
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(report);
    }

    /// Move every report waiting on the report channel into the history.
    ///
    /// Returns how many reports were taken.
    pub fn drain(&mut self, reports: &mut broadcast::Receiver<Report>) -> usize {
        let mut drained = 0;
        loop {
            match reports.try_recv() {
                Ok(report) => {
                    self.push(report);
                    drained += 1;
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(
                        "{}: report channel overflowed, dropped {skipped} oldest reports",
                        self.endpoint
                    );
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Closed) => {
                    debug!("{}: report channel closed", self.endpoint);
                    break;
                }
            }
        }
        trace!("{}: drained {drained} reports", self.endpoint);
        drained
    }

    /// Number of most recent reports `window` covers.
    pub fn window_len(&self, window: Window) -> usize {
        let duration = match window {
            Window::Short => self.short_window,
            Window::Long => self.long_window,
        };
        reports_per_window(duration, self.polling_interval).min(self.capacity)
    }

    /// Recompute the metrics of `window` from the history and run its alert transition.
    pub fn recompute(&mut self, window: Window) -> Option<AlertKind> {
        let len = self.window_len(window);
        let skip = self.history.len().saturating_sub(len);
        let metrics = WindowMetrics::from_reports(self.history.iter().skip(skip));

        trace!(
            "{} ({window}): {}/{} samples, availability {:.3}",
            self.endpoint, metrics.samples, len, metrics.availability
        );

        let availability = metrics.availability;
        self.view_mut(window).metrics = metrics;
        self.set_availability(window, availability);
        self.update_alerting(window)
    }

    /// Overwrite the availability of `window` without touching the history.
    pub fn set_availability(&mut self, window: Window, availability: f64) {
        self.view_mut(window).alert.set_availability(availability);
    }

    /// Run the alert transition of `window` on its current availability.
    pub fn update_alerting(&mut self, window: Window) -> Option<AlertKind> {
        let threshold = self.critical_availability;
        let transition = self.view_mut(window).alert.update(threshold);
        if let Some(kind) = transition {
            debug!("{} ({window}): {kind:?}", self.endpoint);
        }
        transition
    }

    pub fn availability(&self, window: Window) -> f64 {
        self.view(window).alert.availability()
    }

    pub fn is_down(&self, window: Window) -> bool {
        self.view(window).alert.is_down()
    }

    pub fn has_recovered(&self, window: Window) -> bool {
        self.view(window).alert.has_recovered()
    }

    pub fn metrics(&self, window: Window) -> &WindowMetrics {
        &self.view(window).metrics
    }

    fn view(&self, window: Window) -> &WindowView {
        match window {
            Window::Short => &self.short,
            Window::Long => &self.long,
        }
    }

    fn view_mut(&mut self, window: Window) -> &mut WindowView {
        match window {
            Window::Short => &mut self.short,
            Window::Long => &mut self.long,
        }
    }
}
