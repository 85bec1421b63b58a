//! HTTP probe implementation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::net::TcpStream;
use tracing::trace;
use url::Url;

use super::{Probe, ProbeError, ProbeTiming};

/// Probes endpoints with a plain GET request.
///
/// The connect duration comes from a separate TCP handshake against the endpoint's
/// host and port, the first byte duration spans from sending the request until the
/// response headers arrive.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProbeError::Request(e.to_string()))?;

        Ok(Self { client, timeout })
    }

    async fn connect(&self, url: &Url) -> Result<Duration, ProbeError> {
        let host = url
            .host_str()
            .ok_or_else(|| ProbeError::InvalidEndpoint(format!("{url} has no host")))?;
        let port = url
            .port_or_known_default()
            .ok_or_else(|| ProbeError::InvalidEndpoint(format!("{url} has no port")))?;

        let start = Instant::now();
        match tokio::time::timeout(self.timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(_stream)) => Ok(start.elapsed()),
            Ok(Err(e)) => Err(ProbeError::Connect(e.to_string())),
            Err(_) => Err(ProbeError::Timeout(self.timeout)),
        }
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, endpoint: &str) -> Result<ProbeTiming, ProbeError> {
        let url = Url::parse(endpoint).map_err(|e| ProbeError::InvalidEndpoint(e.to_string()))?;

        let connect_duration = self.connect(&url).await?;

        let start = Instant::now();
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ProbeError::Timeout(self.timeout)
            } else if e.is_connect() {
                ProbeError::Connect(e.to_string())
            } else {
                ProbeError::Request(e.to_string())
            }
        })?;
        let first_byte_duration = start.elapsed();

        let status_code = response.status().as_u16();
        trace!(
            "{endpoint}: {status_code} (connect {connect_duration:?}, first byte {first_byte_duration:?})"
        );

        Ok(ProbeTiming {
            status_code,
            connect_duration,
            first_byte_duration,
        })
    }
}
