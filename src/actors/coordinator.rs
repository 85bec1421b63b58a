//! CoordinatorActor - Sole owner of the fleet
//!
//! Every [`EndpointStats`](crate::stats::EndpointStats) is mutated from this task
//! only, so no locking is needed around the statistics. The rendering layer talks
//! to it through a [`CoordinatorHandle`] and therefore cannot take the probers
//! down with it when it fails.
//!
//! ```text
//! [Dashboard / headless loop] --Refresh/Snapshot--> CoordinatorActor --owns--> Fleet
//!                                                                   └── ProberActor × N
//! ```

use std::collections::VecDeque;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, instrument};

use crate::fleet::{EndpointSnapshot, Fleet, RefreshOutcome};
use crate::stats::Window;

use super::messages::{AlertEvent, CoordinatorCommand};

/// Number of alert events kept for dashboards that (re)attach
const ALERT_LOG_CAPACITY: usize = 500;

pub struct CoordinatorActor {
    fleet: Fleet,
    alerts: VecDeque<AlertEvent>,
    command_rx: mpsc::Receiver<CoordinatorCommand>,
}

impl CoordinatorActor {
    pub fn new(fleet: Fleet, command_rx: mpsc::Receiver<CoordinatorCommand>) -> Self {
        Self {
            fleet,
            alerts: VecDeque::new(),
            command_rx,
        }
    }

    fn record_alerts(&mut self, events: &[AlertEvent]) {
        self.alerts.extend(events.iter().cloned());
        let excess = self.alerts.len().saturating_sub(ALERT_LOG_CAPACITY);
        self.alerts.drain(..excess);
    }

    /// Run the actor's main loop
    ///
    /// Commands are handled strictly one after the other.
    #[instrument(skip(self), fields(endpoints = self.fleet.len()))]
    pub async fn run(mut self) {
        debug!("starting coordinator actor");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                CoordinatorCommand::Refresh { window, respond_to } => {
                    let events = self.fleet.refresh(window);
                    self.record_alerts(&events);
                    let _ = respond_to.send(RefreshOutcome {
                        window,
                        events,
                        snapshot: self.fleet.snapshot(),
                    });
                }

                CoordinatorCommand::Snapshot { respond_to } => {
                    let _ = respond_to.send(self.fleet.snapshot());
                }

                CoordinatorCommand::RecentAlerts { respond_to } => {
                    let _ = respond_to.send(self.alerts.iter().cloned().collect());
                }

                CoordinatorCommand::Shutdown => {
                    debug!("received shutdown command");
                    break;
                }
            }
        }

        self.fleet.shutdown().await;
        debug!("coordinator actor stopped");
    }
}

/// Handle for talking to the CoordinatorActor
#[derive(Clone)]
pub struct CoordinatorHandle {
    sender: mpsc::Sender<CoordinatorCommand>,
}

impl CoordinatorHandle {
    /// Spawn the coordinator, taking ownership of `fleet`
    pub fn spawn(fleet: Fleet) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        tokio::spawn(CoordinatorActor::new(fleet, cmd_rx).run());

        Self { sender: cmd_tx }
    }

    /// Drain pending reports and recompute `window` for every endpoint
    pub async fn refresh(&self, window: Window) -> Result<RefreshOutcome> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(CoordinatorCommand::Refresh {
                window,
                respond_to: tx,
            })
            .await
            .context("coordinator is not running")?;

        rx.await.context("coordinator stopped before answering")
    }

    /// Current state of every endpoint, in registration order
    pub async fn snapshot(&self) -> Result<Vec<EndpointSnapshot>> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(CoordinatorCommand::Snapshot { respond_to: tx })
            .await
            .context("coordinator is not running")?;

        rx.await.context("coordinator stopped before answering")
    }

    /// Alert events of earlier refreshes, oldest first
    pub async fn recent_alerts(&self) -> Result<Vec<AlertEvent>> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(CoordinatorCommand::RecentAlerts { respond_to: tx })
            .await
            .context("coordinator is not running")?;

        rx.await.context("coordinator stopped before answering")
    }

    /// Stop the coordinator and all probers
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(CoordinatorCommand::Shutdown)
            .await
            .context("coordinator is not running")?;
        Ok(())
    }
}
