//! Application state management

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::actors::messages::{AlertEvent, AlertKind};
use crate::fleet::{EndpointSnapshot, RefreshOutcome};
use crate::stats::Window;

/// Maximum number of alerts to keep in memory
const MAX_ALERTS_BUFFER: usize = 500;

/// Application state
pub struct AppState {
    /// Latest snapshot of every endpoint
    pub endpoints: Vec<EndpointSnapshot>,

    /// Alert timeline, oldest first
    pub alerts: VecDeque<AlertEvent>,

    /// Selected alert row, `None` until the first alert arrives
    pub selected_alert: Option<usize>,

    /// Number of alert rows visible at once
    pub page_height: usize,

    /// Window and time of the last refresh
    pub last_refresh: Option<(Window, DateTime<Utc>)>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            endpoints: Vec::new(),
            alerts: VecDeque::new(),
            selected_alert: None,
            page_height: 10,
            last_refresh: None,
        }
    }

    /// Take over the result of a refresh
    pub fn apply_refresh(&mut self, outcome: RefreshOutcome) {
        self.endpoints = outcome.snapshot;
        self.push_alerts(outcome.events);
        self.last_refresh = Some((outcome.window, Utc::now()));
    }

    /// Append alerts, following the tail if the last row was selected
    pub fn push_alerts(&mut self, events: Vec<AlertEvent>) {
        if events.is_empty() {
            return;
        }

        let follow = match self.selected_alert {
            None => true,
            Some(selected) => selected + 1 >= self.alerts.len(),
        };

        self.alerts.extend(events);

        // Trim to max buffer size
        while self.alerts.len() > MAX_ALERTS_BUFFER {
            self.alerts.pop_front();
            self.selected_alert = self.selected_alert.map(|s| s.saturating_sub(1));
        }

        if follow {
            self.scroll_bottom();
        }
    }

    pub fn scroll_down(&mut self) {
        self.scroll_by(1);
    }

    pub fn scroll_up(&mut self) {
        self.scroll_by(-1);
    }

    pub fn scroll_half_page_down(&mut self) {
        self.scroll_by((self.page_height / 2).max(1) as isize);
    }

    pub fn scroll_half_page_up(&mut self) {
        self.scroll_by(-((self.page_height / 2).max(1) as isize));
    }

    pub fn scroll_page_down(&mut self) {
        self.scroll_by(self.page_height.max(1) as isize);
    }

    pub fn scroll_page_up(&mut self) {
        self.scroll_by(-(self.page_height.max(1) as isize));
    }

    pub fn scroll_top(&mut self) {
        if !self.alerts.is_empty() {
            self.selected_alert = Some(0);
        }
    }

    pub fn scroll_bottom(&mut self) {
        if !self.alerts.is_empty() {
            self.selected_alert = Some(self.alerts.len() - 1);
        }
    }

    fn scroll_by(&mut self, delta: isize) {
        if self.alerts.is_empty() {
            return;
        }
        let last = self.alerts.len() - 1;
        let current = self.selected_alert.unwrap_or(last);
        let target = current.saturating_add_signed(delta).min(last);
        self.selected_alert = Some(target);
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// One-line description of an alert, as shown in the timeline
pub fn describe_alert(alert: &AlertEvent) -> String {
    let time = alert.timestamp.format("%H:%M:%S");
    match alert.kind {
        AlertKind::Down { availability } => format!(
            "Website {} is down ({} window). availability={:.2}, time={}",
            alert.endpoint, alert.window, availability, time
        ),
        AlertKind::Recovered { availability } => format!(
            "Website {} recovered ({} window). availability={:.2}, time={}",
            alert.endpoint, alert.window, availability, time
        ),
    }
}
