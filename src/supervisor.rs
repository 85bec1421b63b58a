//! Restart loop for tasks living in their own failure domain
//!
//! The dashboard runs under [`supervise`]: an error or a panic inside it ends only
//! its own task, the probers and the coordinator keep running.

use std::future::Future;

use tracing::{error, warn};

/// How a supervised task ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Supervised {
    /// The task returned `Ok(())`
    Completed,

    /// The task failed more often than allowed, `failure` describes the last failure
    GaveUp { failure: String },
}

/// Run the task produced by `start` in its own tokio task and restart it when it
/// returns an error or panics.
///
/// `on_failure` runs after every failure, before any restart. After
/// `max_restarts` restarts the next failure ends supervision.
pub async fn supervise<S, Fut, H>(
    name: &str,
    max_restarts: usize,
    mut start: S,
    mut on_failure: H,
) -> Supervised
where
    S: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    H: FnMut(),
{
    let mut restarts = 0;

    loop {
        let failure = match tokio::spawn(start()).await {
            Ok(Ok(())) => return Supervised::Completed,
            Ok(Err(e)) => format!("{e:#}"),
            Err(e) if e.is_panic() => format!("{name} panicked: {e}"),
            Err(e) => format!("{name} task failed: {e}"),
        };

        on_failure();
        error!("{name} failed: {failure}");

        if restarts == max_restarts {
            return Supervised::GaveUp { failure };
        }

        restarts += 1;
        warn!("restarting {name} ({restarts}/{max_restarts})");
    }
}
