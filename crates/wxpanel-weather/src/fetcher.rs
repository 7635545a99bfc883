//! One request/parse cycle against the weather endpoint.
//!
//! No retries here: the scheduler decides when to call again.

use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;
use wxpanel_core::error::ReqwestErrorExt;
use wxpanel_core::{AppError, NetworkError, TemperatureUnit, WeatherConfig, WeatherError};

use crate::connectivity::ConnectivityState;
use crate::types::WeatherSnapshot;

const USER_AGENT: &str = concat!("wxpanel/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Not connected")]
    NotConnected,

    #[error("HTTP status {0}")]
    Http(u16),

    #[error("Missing or malformed field: {0}")]
    Parse(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Transport error: {0}")]
    Network(String),

    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

impl FetchError {
    /// Short text for the status line.
    pub fn user_message(&self) -> &'static str {
        match self {
            FetchError::NotConnected => NetworkError::LinkDown.user_message(),
            FetchError::Http(401 | 403) => WeatherError::InvalidApiKey.user_message(),
            FetchError::Http(status) => NetworkError::ServerError {
                status: *status,
                message: String::new(),
            }
            .user_message(),
            FetchError::Parse(field) => WeatherError::MalformedField(field.clone()).user_message(),
            FetchError::Timeout => NetworkError::Timeout.user_message(),
            FetchError::Network(msg) => NetworkError::ConnectionFailed(msg.clone()).user_message(),
            FetchError::Client(_) => "Weather client unavailable",
        }
    }

    /// True when the transport saw the link drop during the attempt.
    pub fn is_link_failure(&self) -> bool {
        matches!(self, FetchError::Network(_))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        match err.into_network_error() {
            NetworkError::Timeout => FetchError::Timeout,
            NetworkError::ServerError { status, .. } => FetchError::Http(status),
            NetworkError::InvalidResponse(_) => FetchError::Parse("body".to_string()),
            other => FetchError::Network(other.to_string()),
        }
    }
}

impl From<FetchError> for AppError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::NotConnected => AppError::Network(NetworkError::LinkDown),
            FetchError::Http(401 | 403) => AppError::Weather(WeatherError::InvalidApiKey),
            FetchError::Http(status) => AppError::Network(NetworkError::ServerError {
                status,
                message: format!("HTTP status {status}"),
            }),
            FetchError::Parse(field) => AppError::Weather(WeatherError::MalformedField(field)),
            FetchError::Timeout => AppError::Network(NetworkError::Timeout),
            FetchError::Network(msg) => AppError::Network(NetworkError::ConnectionFailed(msg)),
            FetchError::Client(msg) => AppError::Other(anyhow::anyhow!(msg)),
        }
    }
}

/// Error body the provider sends alongside 4xx statuses.
#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderError,
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    code: Option<i64>,
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WeatherFetcher {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    location: String,
    timeout: Duration,
}

impl WeatherFetcher {
    pub fn new(config: &WeatherConfig) -> Result<Self, FetchError> {
        let timeout = config.request_timeout();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            location: config.location.clone(),
            timeout,
        })
    }

    /// Perform exactly one request/parse cycle.
    ///
    /// Returns `NotConnected` without touching the network when the link is down.
    #[instrument(skip(self, link), fields(location = %self.location), level = "info")]
    pub async fn fetch(&self, link: &ConnectivityState) -> Result<WeatherSnapshot, FetchError> {
        if !link.is_connected() {
            tracing::debug!("Skipping fetch: link is {}", link.state().as_str());
            return Err(FetchError::NotConnected);
        }

        tracing::debug!("Fetching weather from {}", self.endpoint);

        // The request timeout bounds the whole cycle, body read included.
        let body = match tokio::time::timeout(self.timeout, self.request()).await {
            Ok(result) => result?,
            Err(_) => return Err(FetchError::Timeout),
        };

        let snapshot = WeatherSnapshot::from_payload(&body, Utc::now())?;

        tracing::info!(
            code = snapshot.condition_code,
            condition = %snapshot.condition_text,
            temp = %snapshot.temperature_string(TemperatureUnit::Celsius),
            low_c = snapshot.temp_low_c,
            high_c = snapshot.temp_high_c,
            humidity = snapshot.humidity_pct,
            aqi = snapshot.air_quality_index,
            "Weather updated"
        );

        Ok(snapshot)
    }

    async fn request(&self) -> Result<String, FetchError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", self.location.as_str()),
                ("days", "1"),
                ("aqi", "yes"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            match serde_json::from_str::<ProviderErrorBody>(&text) {
                Ok(body) => tracing::warn!(
                    status = status.as_u16(),
                    provider_code = body.error.code,
                    "Weather request rejected: {}",
                    body.error.message.unwrap_or_default()
                ),
                Err(_) => tracing::warn!("Weather request failed with status {}", status),
            }
            return Err(FetchError::Http(status.as_u16()));
        }

        Ok(response.text().await?)
    }
}
