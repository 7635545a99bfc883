//! Link check used for reconnect attempts.
//!
//! A TCP connect to the weather endpoint's host stands in for the radio
//! association the panel firmware waits on.

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpStream;
use url::Url;

#[derive(Debug, Clone)]
pub struct LinkProbe {
    host: String,
    port: u16,
    timeout: Duration,
}

impl LinkProbe {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
        }
    }

    /// Probe the host and port the weather endpoint points at.
    pub fn for_endpoint(endpoint: &str, timeout: Duration) -> Result<Self> {
        let url = Url::parse(endpoint).context("Invalid weather endpoint URL")?;
        let host = url
            .host_str()
            .context("Weather endpoint has no host")?
            .to_string();
        let port = url
            .port_or_known_default()
            .context("Weather endpoint has no port")?;
        Ok(Self::new(host, port, timeout))
    }

    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// True when a TCP connection opens within the timeout.
    pub async fn probe(&self) -> bool {
        let connect = TcpStream::connect((self.host.as_str(), self.port));
        match tokio::time::timeout(self.timeout, connect).await {
            Ok(Ok(_stream)) => true,
            Ok(Err(e)) => {
                tracing::debug!("Link probe to {} failed: {}", self.target(), e);
                false
            }
            Err(_) => {
                tracing::debug!("Link probe to {} timed out", self.target());
                false
            }
        }
    }
}
