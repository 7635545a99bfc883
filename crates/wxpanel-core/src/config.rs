use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::error::ConfigError;

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "WXPANEL_CONFIG";

/// Environment variable that overrides `weather.api_key`.
pub const API_KEY_ENV: &str = "WXPANEL_API_KEY";

const API_KEY_PLACEHOLDER: &str = "YOUR_WEATHERAPI_KEY";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a single line summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote weather endpoint and refresh policy
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Link retry policy
    #[serde(default)]
    pub connectivity: ConnectivityConfig,

    /// Presentation settings
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Temperature unit preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn symbol(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Forecast endpoint; `key`, `q`, `days` and `aqi` are appended as query parameters
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Provider API key (can be set via `WXPANEL_API_KEY`)
    #[serde(default = "default_api_key")]
    pub api_key: String,

    /// Provider location query (city name, "lat,lon", postcode, ...)
    #[serde(default = "default_location")]
    pub location: String,

    /// Minimum time between successful refreshes
    #[serde(default = "default_update_interval_secs")]
    pub update_interval_secs: u64,

    /// Upper bound on a single request/parse cycle
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// First pause after a failed fetch; 0 disables failure pacing
    #[serde(default = "default_failure_backoff_secs")]
    pub failure_backoff_secs: u64,

    /// Cap for the doubling failure pause
    #[serde(default = "default_max_failure_backoff_secs")]
    pub max_failure_backoff_secs: u64,

    #[serde(default)]
    pub temperature_unit: TemperatureUnit,
}

fn default_endpoint() -> String {
    "https://api.weatherapi.com/v1/forecast.json".to_string()
}

fn default_api_key() -> String {
    API_KEY_PLACEHOLDER.to_string()
}

fn default_location() -> String {
    "London".to_string()
}

fn default_update_interval_secs() -> u64 {
    600
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_failure_backoff_secs() -> u64 {
    15
}

fn default_max_failure_backoff_secs() -> u64 {
    300
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: default_api_key(),
            location: default_location(),
            update_interval_secs: default_update_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            failure_backoff_secs: default_failure_backoff_secs(),
            max_failure_backoff_secs: default_max_failure_backoff_secs(),
            temperature_unit: TemperatureUnit::default(),
        }
    }
}

impl WeatherConfig {
    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn failure_backoff(&self) -> Duration {
        Duration::from_secs(self.failure_backoff_secs)
    }

    pub fn max_failure_backoff(&self) -> Duration {
        Duration::from_secs(self.max_failure_backoff_secs)
    }

    /// Check if the API key is configured (not the placeholder)
    pub fn has_api_key(&self) -> bool {
        !self.api_key.is_empty() && self.api_key != API_KEY_PLACEHOLDER
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectivityConfig {
    /// Wait between reconnect attempts after the first failure
    #[serde(default = "default_retry_interval_secs")]
    pub retry_interval_secs: u64,

    /// Cap for the doubling reconnect wait (equal to the base = fixed interval)
    #[serde(default = "default_max_retry_interval_secs")]
    pub max_retry_interval_secs: u64,

    /// Timeout for a single reachability probe
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,

    /// Period of the update worker loop
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
}

fn default_retry_interval_secs() -> u64 {
    30
}

fn default_max_retry_interval_secs() -> u64 {
    30
}

fn default_probe_timeout_secs() -> u64 {
    5
}

fn default_tick_millis() -> u64 {
    1000
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            retry_interval_secs: default_retry_interval_secs(),
            max_retry_interval_secs: default_max_retry_interval_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
            tick_millis: default_tick_millis(),
        }
    }
}

impl ConnectivityConfig {
    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }

    pub fn max_retry_interval(&self) -> Duration {
        Duration::from_secs(self.max_retry_interval_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// IANA zone used for day/night and the refresh timestamp
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Period of the render loop
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,

    /// Directory holding condition icons
    #[serde(default = "default_asset_dir")]
    pub asset_dir: PathBuf,

    /// File extension of icon assets
    #[serde(default = "default_asset_extension")]
    pub asset_extension: String,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_refresh_secs() -> u64 {
    30
}

fn default_asset_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("wxpanel").join("icons"))
        .unwrap_or_else(|| PathBuf::from("icons"))
}

fn default_asset_extension() -> String {
    "bin".to_string()
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            refresh_secs: default_refresh_secs(),
            asset_dir: default_asset_dir(),
            asset_extension: default_asset_extension(),
        }
    }
}

impl DisplayConfig {
    pub fn refresh(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }

    /// Parsed timezone, falling back to UTC when the name is unknown.
    pub fn tz(&self) -> chrono_tz::Tz {
        self.timezone.parse().unwrap_or(chrono_tz::UTC)
    }
}

impl Config {
    /// Load configuration from the default location, creating it if it doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from `path`, writing defaults there if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str::<Config>(&contents)
                .map_err(|e| ConfigError::ParseError(e.to_string()))
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            let config = Self::default();
            config.save_to(path)?;
            tracing::info!("Wrote default config to {}", path.display());
            config
        };

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                config.weather.api_key = key.trim().to_string();
            }
        }

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.weather.endpoint, "weather.endpoint", &mut result);

        if !self.weather.has_api_key() {
            result.add_warning(
                "weather.api_key",
                format!("API key not configured; set it in the file or via {API_KEY_ENV}"),
            );
        }

        if self.weather.location.trim().is_empty() {
            result.add_error("weather.location", "Location must not be empty");
        }

        if self.weather.update_interval_secs == 0 {
            result.add_error(
                "weather.update_interval_secs",
                "Update interval must be greater than 0",
            );
        } else if self.weather.update_interval_secs < 60 {
            result.add_warning(
                "weather.update_interval_secs",
                "Refreshing more than once a minute may exceed the provider rate limit",
            );
        }

        if self.weather.request_timeout_secs == 0 {
            result.add_error(
                "weather.request_timeout_secs",
                "Request timeout must be greater than 0",
            );
        }

        if self.weather.failure_backoff_secs > self.weather.max_failure_backoff_secs {
            result.add_error(
                "weather.max_failure_backoff_secs",
                "Maximum failure backoff is below the initial backoff",
            );
        }

        if self.connectivity.retry_interval_secs == 0 {
            result.add_error(
                "connectivity.retry_interval_secs",
                "Retry interval must be greater than 0",
            );
        }

        if self.connectivity.max_retry_interval_secs < self.connectivity.retry_interval_secs {
            result.add_error(
                "connectivity.max_retry_interval_secs",
                "Maximum retry interval is below the base retry interval",
            );
        }

        if self.connectivity.tick_millis == 0 {
            result.add_error("connectivity.tick_millis", "Tick period must be greater than 0");
        }

        if self.display.timezone.parse::<chrono_tz::Tz>().is_err() {
            result.add_error(
                "display.timezone",
                format!("Unknown timezone: {}", self.display.timezone),
            );
        }

        if self.display.refresh_secs == 0 {
            result.add_error("display.refresh_secs", "Refresh period must be greater than 0");
        }

        if !self.display.asset_dir.is_dir() {
            result.add_warning(
                "display.asset_dir",
                format!(
                    "Icon directory does not exist: {}",
                    self.display.asset_dir.display()
                ),
            );
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }

                if url.port() == Some(0) {
                    result.add_error(field_name, "Port cannot be 0");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("wxpanel");

        Ok(config_dir.join("config.toml"))
    }
}
