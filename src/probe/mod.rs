//! Probe transport
//!
//! A probe performs one request against an endpoint and reports the status code
//! together with the timing breakdown. Failures to complete are returned as
//! [`ProbeError`] and turned into failed reports by the prober.

mod http;

pub use http::HttpProbe;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Probe error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Timing breakdown of a probe that received a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeTiming {
    pub status_code: u16,
    pub connect_duration: Duration,
    pub first_byte_duration: Duration,
}

/// Transport used by the probers.
///
/// Any response, whatever its status code, is `Ok`.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, endpoint: &str) -> Result<ProbeTiming, ProbeError>;
}
