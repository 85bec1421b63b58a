//! site-watch
//!
//! Probes every configured endpoint at its own interval and shows availability,
//! response times and down/recovered alerts in a terminal dashboard, or logs them
//! in headless mode.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use site_watch::{
    AlertKind, Fleet, Window,
    actors::coordinator::CoordinatorHandle,
    config::{Config, ResolvedConfig, parse_endpoint_pairs, read_config_file},
    fleet::RefreshOutcome,
    probe::HttpProbe,
};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "dashboard")]
use site_watch::{
    supervisor::{Supervised, supervise},
    viewer::{App, restore_terminal},
};

/// How often a crashed dashboard is brought back before falling back to headless mode
#[cfg(feature = "dashboard")]
const MAX_DASHBOARD_RESTARTS: usize = 3;

#[derive(Debug, Clone, Parser)]
#[command(name = "site-watch")]
#[command(about = "Monitor availability and response times of websites", long_about = None)]
struct Args {
    /// JSON configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Short UI refresh interval
    #[arg(long, value_name = "SECONDS")]
    sui: Option<u64>,

    /// Long UI refresh interval
    #[arg(long, value_name = "SECONDS")]
    lui: Option<u64>,

    /// Short statistics window
    #[arg(long, value_name = "SECONDS")]
    sstats: Option<u64>,

    /// Long statistics window
    #[arg(long, value_name = "SECONDS")]
    lstats: Option<u64>,

    /// Timeout of a single probe
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Availability below which an endpoint is considered down
    #[arg(long, value_name = "RATIO")]
    threshold: Option<f64>,

    /// Log alerts instead of showing the dashboard
    #[arg(long)]
    headless: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Endpoints with their polling interval in seconds
    #[arg(value_name = "URL INTERVAL")]
    targets: Vec<String>,
}

impl Args {
    fn level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::INFO,
            1 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }
}

fn init_stderr_logging(level: LevelFilter) {
    let filter = filter::Targets::new().with_target("site_watch", level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

/// Log into a file while the dashboard owns the terminal
#[cfg(feature = "dashboard")]
fn init_file_logging(level: LevelFilter) {
    let log_path = dirs::data_dir()
        .or_else(|| std::env::current_dir().ok())
        .map(|dir| dir.join("site-watch").join("monitor.log"));

    let log_file = log_path.and_then(|path| {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .ok()
    });

    match log_file {
        Some(file) => {
            tracing_subscriber::fmt()
                .with_target(false)
                .with_level(true)
                .with_max_level(level)
                .with_writer(file)
                .init();
        }
        None => {
            // If we can't create a log file, use a minimal stderr logger that only shows errors
            tracing_subscriber::fmt()
                .with_target(false)
                .with_level(true)
                .with_max_level(tracing::Level::ERROR)
                .init();
        }
    }
}

#[cfg(feature = "dashboard")]
fn init_logging(level: LevelFilter, headless: bool) {
    if headless {
        init_stderr_logging(level);
    } else {
        init_file_logging(level);
    }
}

#[cfg(not(feature = "dashboard"))]
fn init_logging(level: LevelFilter, _headless: bool) {
    init_stderr_logging(level);
}

fn build_config(args: &Args) -> Result<ResolvedConfig> {
    let mut config = match &args.config {
        Some(path) => read_config_file(path)
            .with_context(|| format!("failed to load config file {path}"))?,
        None => Config::default(),
    };

    config.endpoints.extend(parse_endpoint_pairs(&args.targets)?);
    config.short_refresh = args.sui.or(config.short_refresh);
    config.long_refresh = args.lui.or(config.long_refresh);
    config.short_window = args.sstats.or(config.short_window);
    config.long_window = args.lstats.or(config.long_window);
    config.request_timeout = args.timeout.or(config.request_timeout);
    config.critical_availability = args.threshold.or(config.critical_availability);

    Ok(config.resolve()?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let headless = args.headless || cfg!(not(feature = "dashboard"));

    init_logging(args.level(), headless);

    trace!("started with args: {args:?}");

    // Configuration errors are fatal, nothing has been started yet
    let config = Arc::new(build_config(&args)?);
    let probe = Arc::new(HttpProbe::new(config.request_timeout)?);

    let fleet = Fleet::from_config(Arc::clone(&config), probe);
    let coordinator = CoordinatorHandle::spawn(fleet);

    if headless {
        run_headless(&coordinator, &config).await?;
    } else {
        #[cfg(feature = "dashboard")]
        supervise_dashboard(&coordinator, &config).await?;
    }

    coordinator.shutdown().await?;
    Ok(())
}

/// Run the dashboard in its own task and bring it back when it fails
///
/// Probers and statistics live in the coordinator, so they keep running while the
/// dashboard restarts.
#[cfg(feature = "dashboard")]
async fn supervise_dashboard(coordinator: &CoordinatorHandle, config: &ResolvedConfig) -> Result<()> {
    let outcome = supervise(
        "dashboard",
        MAX_DASHBOARD_RESTARTS,
        || {
            let mut app = App::new(coordinator.clone(), config);
            async move { app.run().await }
        },
        || {
            if let Err(e) = restore_terminal() {
                tracing::error!("failed to restore terminal: {e:#}");
            }
        },
    )
    .await;

    match outcome {
        Supervised::Completed => Ok(()),
        Supervised::GaveUp { failure } => {
            eprintln!("dashboard failed repeatedly ({failure}), continuing headless");
            run_headless(coordinator, config).await
        }
    }
}

/// Refresh on both cadences and log alert transitions until Ctrl-C
async fn run_headless(coordinator: &CoordinatorHandle, config: &ResolvedConfig) -> Result<()> {
    info!(
        "monitoring {} endpoints (short refresh {:?}, long refresh {:?})",
        config.endpoints.len(),
        config.short_refresh,
        config.long_refresh
    );

    let mut short_tick = interval(config.short_refresh);
    let mut long_tick = interval(config.long_refresh);
    short_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    long_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                info!("received Ctrl-C, shutting down");
                break;
            }

            _ = long_tick.tick() => {
                log_refresh(&coordinator.refresh(Window::Long).await?);
            }

            _ = short_tick.tick() => {
                log_refresh(&coordinator.refresh(Window::Short).await?);
            }
        }
    }

    Ok(())
}

fn log_refresh(outcome: &RefreshOutcome) {
    for event in &outcome.events {
        match event.kind {
            AlertKind::Down { availability } => warn!(
                "Website {} is down ({} window). availability={availability:.2}",
                event.endpoint, event.window
            ),
            AlertKind::Recovered { availability } => info!(
                "Website {} recovered ({} window). availability={availability:.2}",
                event.endpoint, event.window
            ),
        }
    }

    for endpoint in &outcome.snapshot {
        let window = endpoint.window(outcome.window);
        debug!(
            "{} ({}): availability {:.3} over {} samples, avg first byte {:?}",
            endpoint.endpoint,
            outcome.window,
            window.availability,
            window.metrics.samples,
            window.metrics.avg_first_byte
        );
    }
}
