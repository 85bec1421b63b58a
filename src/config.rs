use std::collections::HashSet;
use std::time::Duration;

use thiserror::Error;
use tracing::trace;

use crate::stats::{MAX_HISTORY_REPORTS, reports_per_window};
use crate::util::normalize_endpoint;

/// Errors detected while turning raw configuration into a [`ResolvedConfig`].
///
/// All of them are fatal: nothing is probed until the configuration resolves.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("no endpoints configured")]
    NoEndpoints,

    #[error("invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("endpoint '{0}' is configured more than once")]
    DuplicateEndpoint(String),

    #[error("polling interval of '{0}' must be at least one second")]
    MissingInterval(String),

    #[error("'{0}' must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("short {what} ({short:?}) must not exceed long {what} ({long:?})")]
    InvertedWindows {
        what: &'static str,
        short: Duration,
        long: Duration,
    },

    #[error("critical availability must be within [0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error(
        "history of '{endpoint}' would hold {reports} reports (at most {max}), \
         raise its interval or shorten the long window",
        max = MAX_HISTORY_REPORTS
    )]
    HistoryTooLarge { endpoint: String, reports: usize },
}

/// Raw configuration as read from a file or assembled from CLI flags.
///
/// Every duration is given in seconds.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,

    pub short_refresh: Option<u64>,
    pub long_refresh: Option<u64>,
    pub short_window: Option<u64>,
    pub long_window: Option<u64>,
    pub request_timeout: Option<u64>,
    pub critical_availability: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct EndpointConfig {
    pub url: String,
    pub interval: u64,
}

fn default_short_refresh() -> u64 {
    2
}

fn default_long_refresh() -> u64 {
    10
}

fn default_short_window() -> u64 {
    10
}

fn default_long_window() -> u64 {
    60
}

fn default_request_timeout() -> u64 {
    10
}

pub const DEFAULT_CRITICAL_AVAILABILITY: f64 = 0.8;

/// A single endpoint after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEndpoint {
    /// Normalized URL, used as the endpoint identifier.
    pub endpoint: String,
    pub polling_interval: Duration,
}

/// Immutable configuration, built once at startup and shared by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub endpoints: Vec<ResolvedEndpoint>,
    pub short_refresh: Duration,
    pub long_refresh: Duration,
    pub short_window: Duration,
    pub long_window: Duration,
    pub request_timeout: Duration,
    pub critical_availability: f64,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
            short_refresh: Duration::from_secs(default_short_refresh()),
            long_refresh: Duration::from_secs(default_long_refresh()),
            short_window: Duration::from_secs(default_short_window()),
            long_window: Duration::from_secs(default_long_window()),
            request_timeout: Duration::from_secs(default_request_timeout()),
            critical_availability: DEFAULT_CRITICAL_AVAILABILITY,
        }
    }
}

impl Config {
    /// Validate the raw values and produce the configuration the monitor runs with.
    pub fn resolve(&self) -> Result<ResolvedConfig, ConfigError> {
        if self.endpoints.is_empty() {
            return Err(ConfigError::NoEndpoints);
        }

        let mut seen = HashSet::new();
        let mut endpoints = Vec::with_capacity(self.endpoints.len());
        for EndpointConfig { url, interval } in &self.endpoints {
            let endpoint = normalize_endpoint(url)?;
            if *interval == 0 {
                return Err(ConfigError::MissingInterval(endpoint));
            }
            if !seen.insert(endpoint.clone()) {
                return Err(ConfigError::DuplicateEndpoint(endpoint));
            }
            endpoints.push(ResolvedEndpoint {
                endpoint,
                polling_interval: Duration::from_secs(*interval),
            });
        }

        let short_refresh = seconds(
            "short_refresh",
            self.short_refresh.unwrap_or_else(default_short_refresh),
        )?;
        let long_refresh = seconds(
            "long_refresh",
            self.long_refresh.unwrap_or_else(default_long_refresh),
        )?;
        let short_window = seconds(
            "short_window",
            self.short_window.unwrap_or_else(default_short_window),
        )?;
        let long_window = seconds(
            "long_window",
            self.long_window.unwrap_or_else(default_long_window),
        )?;
        let request_timeout = seconds(
            "request_timeout",
            self.request_timeout.unwrap_or_else(default_request_timeout),
        )?;

        if short_refresh > long_refresh {
            return Err(ConfigError::InvertedWindows {
                what: "refresh",
                short: short_refresh,
                long: long_refresh,
            });
        }
        if short_window > long_window {
            return Err(ConfigError::InvertedWindows {
                what: "window",
                short: short_window,
                long: long_window,
            });
        }

        for endpoint in &endpoints {
            history_capacity(&endpoint.endpoint, endpoint.polling_interval, long_window)?;
        }

        let critical_availability = self
            .critical_availability
            .unwrap_or(DEFAULT_CRITICAL_AVAILABILITY);
        if !(0.0..=1.0).contains(&critical_availability) {
            return Err(ConfigError::InvalidThreshold(critical_availability));
        }

        Ok(ResolvedConfig {
            endpoints,
            short_refresh,
            long_refresh,
            short_window,
            long_window,
            request_timeout,
            critical_availability,
        })
    }
}

/// Number of reports kept for an endpoint polled every `polling_interval`.
///
/// Fails for a zero interval and for histories above [`MAX_HISTORY_REPORTS`].
pub fn history_capacity(
    endpoint: &str,
    polling_interval: Duration,
    long_window: Duration,
) -> Result<usize, ConfigError> {
    if polling_interval.is_zero() {
        return Err(ConfigError::MissingInterval(endpoint.to_string()));
    }

    let reports = reports_per_window(long_window, polling_interval);
    if reports > MAX_HISTORY_REPORTS {
        return Err(ConfigError::HistoryTooLarge {
            endpoint: endpoint.to_string(),
            reports,
        });
    }
    Ok(reports)
}

fn seconds(name: &'static str, value: u64) -> Result<Duration, ConfigError> {
    if value == 0 {
        return Err(ConfigError::ZeroDuration(name));
    }
    Ok(Duration::from_secs(value))
}

/// Parse trailing `URL INTERVAL` pairs from the command line.
pub fn parse_endpoint_pairs(args: &[String]) -> Result<Vec<EndpointConfig>, ConfigError> {
    if args.len() % 2 != 0 {
        return Err(ConfigError::MissingInterval(
            args.last().cloned().unwrap_or_default(),
        ));
    }

    args.chunks_exact(2)
        .map(|pair| {
            let interval = pair[1]
                .parse::<u64>()
                .map_err(|_| ConfigError::MissingInterval(pair[0].clone()))?;
            Ok(EndpointConfig {
                url: pair[0].clone(),
                interval,
            })
        })
        .collect()
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)?;
    serde_json::from_str(&file_content)
        .map_err(|e| anyhow::anyhow!("Invalid configuration file provided: {e}"))
        .inspect(|config| trace!("loaded config: {config:?}"))
}
