//! ProberActor - Probes a single endpoint at a fixed interval
//!
//! ## Message Flow
//!
//! ```text
//! Timer tick → spawn probe → Report → report channel → [Fleet coordinator]
//!     ↑
//!     └─── Commands (ProbeNow, Shutdown)
//! ```
//!
//! Probes are fire-and-forget relative to the ticker: a slow endpoint never delays
//! the next tick, so several probes of the same endpoint may be in flight at once.
//! Each of them produces exactly one immutable [`Report`].
//!
//! The report channel is a `broadcast` channel. Sending never blocks; when the
//! consumer falls behind by more than the channel capacity the oldest reports are
//! overwritten and the consumer observes the gap on its next drain.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, instrument, trace, warn};

use crate::probe::{Probe, ProbeError};

use super::messages::{ProberCommand, Report};

/// Actor that probes a single endpoint
pub struct ProberActor {
    /// Normalized endpoint URL
    endpoint: String,

    /// Period of the ticker
    polling_interval: Duration,

    /// Upper bound for a single probe attempt
    request_timeout: Duration,

    /// Transport performing the actual request
    probe: Arc<dyn Probe>,

    /// Command receiver for control messages
    command_rx: mpsc::Receiver<ProberCommand>,

    /// Report channel towards the coordinator
    report_tx: broadcast::Sender<Report>,
}

impl ProberActor {
    pub fn new(
        endpoint: String,
        polling_interval: Duration,
        request_timeout: Duration,
        probe: Arc<dyn Probe>,
        command_rx: mpsc::Receiver<ProberCommand>,
        report_tx: broadcast::Sender<Report>,
    ) -> Self {
        Self {
            endpoint,
            polling_interval,
            request_timeout,
            probe,
            command_rx,
            report_tx,
        }
    }

    /// Run the actor's main loop
    ///
    /// Runs until a Shutdown command is received or every handle has been dropped.
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn run(mut self) {
        debug!(
            "starting prober with interval {:?}",
            self.polling_interval
        );

        let mut ticker = interval(self.polling_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.launch_probe(None);
                }

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(ProberCommand::ProbeNow { respond_to }) => {
                            debug!("received ProbeNow command");
                            self.launch_probe(Some(respond_to));
                        }

                        Some(ProberCommand::Shutdown) => {
                            debug!("received shutdown command");
                            break;
                        }

                        None => {
                            debug!("all handles dropped, shutting down");
                            break;
                        }
                    }
                }
            }
        }

        debug!("prober stopped");
    }

    /// Spawn one probe attempt without waiting for it.
    ///
    /// The report is published and, for on-demand probes, also sent to `respond_to`.
    fn launch_probe(&self, respond_to: Option<oneshot::Sender<Report>>) {
        let probe = Arc::clone(&self.probe);
        let endpoint = self.endpoint.clone();
        let polling_interval = self.polling_interval;
        let request_timeout = self.request_timeout;
        let report_tx = self.report_tx.clone();

        tokio::spawn(async move {
            let report =
                execute_probe(probe.as_ref(), &endpoint, polling_interval, request_timeout).await;
            match respond_to {
                Some(respond_to) => {
                    publish(&report_tx, report.clone());
                    let _ = respond_to.send(report);
                }
                None => publish(&report_tx, report),
            }
        });
    }
}

/// Perform a single probe attempt bounded by `request_timeout`.
///
/// Every outcome, including timeouts and transport errors, is folded into a report.
pub async fn execute_probe(
    probe: &dyn Probe,
    endpoint: &str,
    polling_interval: Duration,
    request_timeout: Duration,
) -> Report {
    let issued_at = Utc::now();

    let outcome = match tokio::time::timeout(request_timeout, probe.probe(endpoint)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(ProbeError::Timeout(request_timeout)),
    };

    if let Err(e) = &outcome {
        trace!("{endpoint}: probe failed: {e}");
    }

    Report::from_outcome(endpoint, polling_interval, issued_at, outcome)
}

fn publish(report_tx: &broadcast::Sender<Report>, report: Report) {
    if report_tx.send(report).is_err() {
        // Only happens once the coordinator dropped the receiving side.
        trace!("no receiver for report");
    }
}

/// Handle for controlling a ProberActor
#[derive(Clone)]
pub struct ProberHandle {
    sender: mpsc::Sender<ProberCommand>,
    endpoint: String,
}

impl ProberHandle {
    /// Spawn a new prober actor publishing on `report_tx`
    pub fn spawn(
        endpoint: String,
        polling_interval: Duration,
        request_timeout: Duration,
        probe: Arc<dyn Probe>,
        report_tx: broadcast::Sender<Report>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(8);

        let actor = ProberActor::new(
            endpoint.clone(),
            polling_interval,
            request_timeout,
            probe,
            cmd_rx,
            report_tx,
        );

        tokio::spawn(actor.run());

        Self {
            sender: cmd_tx,
            endpoint,
        }
    }

    /// Probe immediately and wait for the resulting report
    pub async fn probe_now(&self) -> Result<Report> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(ProberCommand::ProbeNow { respond_to: tx })
            .await
            .context("prober is not running")?;

        rx.await.context("prober stopped before answering")
    }

    /// Stop the prober
    pub async fn shutdown(self) {
        if self.sender.send(ProberCommand::Shutdown).await.is_err() {
            warn!("{}: prober already stopped", self.endpoint);
        }
    }

    /// Get the endpoint probed by this prober
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
