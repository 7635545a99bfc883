//! Centralized error types for the weather panel.
//!
//! This module provides a typed error hierarchy that:
//! - Keeps every failure non-fatal to the render loop
//! - Provides short messages suitable for the panel's status line
//! - Preserves full error context for logging

use thiserror::Error;

/// Top-level application error type.
///
/// Use `user_message()` to get text short enough for the status line.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Weather service error: {0}")]
    Weather(#[from] WeatherError),

    #[error("Display error: {0}")]
    Display(#[from] DisplayError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a short message suitable for the panel's status line.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Weather(e) => e.user_message(),
            AppError::Display(e) => e.user_message(),
            AppError::Io(_) => "Storage read failed",
            AppError::Other(_) => "Unexpected error",
        }
    }
}

/// Network-related errors (HTTP, connectivity).
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Link down")]
    LinkDown,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::LinkDown => "Offline",
            NetworkError::ConnectionFailed(_) => "Cannot reach weather service",
            NetworkError::Timeout => "Weather request timed out",
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "Weather service unavailable"
            }
            NetworkError::ServerError { status: 429, .. } => "Rate limited, retrying later",
            NetworkError::ServerError { .. } => "Weather request rejected",
            NetworkError::InvalidResponse(_) => "Unexpected weather data",
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Invalid configuration",
            ConfigError::ParseError(_) => "Config file is malformed",
        }
    }
}

/// Weather payload errors.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Missing or malformed field: {0}")]
    MalformedField(String),

    #[error("Invalid API key")]
    InvalidApiKey,
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::MalformedField(_) => "Unexpected weather data",
            WeatherError::InvalidApiKey => "Weather API key invalid",
        }
    }
}

/// Display collaborator errors (surface updates and asset reads).
#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    #[error("Asset read failed: {name}: {message}")]
    AssetRead { name: String, message: String },

    #[error("Image rejected by display: {0}")]
    ImageRejected(String),

    #[error("Display update failed: {0}")]
    UpdateFailed(String),
}

impl DisplayError {
    pub fn user_message(&self) -> &'static str {
        match self {
            DisplayError::AssetNotFound(_) | DisplayError::AssetRead { .. } => "Icon unavailable",
            DisplayError::ImageRejected(_) => "Icon unavailable",
            DisplayError::UpdateFailed(_) => "Display update failed",
        }
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            NetworkError::Timeout
        } else if self.is_connect() {
            NetworkError::ConnectionFailed(self.to_string())
        } else if let Some(status) = self.status() {
            NetworkError::ServerError {
                status: status.as_u16(),
                message: self.to_string(),
            }
        } else if self.is_decode() || self.is_body() {
            NetworkError::InvalidResponse(self.to_string())
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}
