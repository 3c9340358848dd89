//! Configuration management for the AQI forecast service
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::AqiError;
use crate::history::HISTORY_DAYS;
use crate::models::Coordinates;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AqiConfig {
    /// HTTP listener settings
    pub server: ServerConfig,
    /// Upstream air quality APIs
    pub sources: SourcesConfig,
    /// Regression model artifact
    pub model: ModelConfig,
    /// Request defaults
    pub defaults: DefaultsConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Upstream air quality API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Base URL of the Open-Meteo air-quality API
    pub air_quality_base_url: String,
    /// Base URL of the OpenAQ API
    pub measurements_base_url: String,
    /// Optional OpenAQ API key
    pub openaq_api_key: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_seconds: u64,
    /// OpenAQ search radius in meters
    pub radius_meters: u32,
    /// Maximum number of OpenAQ measurements per request
    pub measurement_limit: u32,
    /// Days of trailing history fetched per request
    pub history_days: usize,
}

/// Regression model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path of the JSON model artifact
    pub path: PathBuf,
    /// Number of input features the model was trained with
    pub input_width: usize,
}

/// Defaults applied when a request omits parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (pretty or json)
    pub format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            air_quality_base_url: "https://air-quality-api.open-meteo.com/v1".to_string(),
            measurements_base_url: "https://api.openaq.org/v3".to_string(),
            openaq_api_key: None,
            timeout_seconds: 10,
            radius_meters: 10_000,
            measurement_limit: 1_000,
            history_days: HISTORY_DAYS,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("models/aqi_model.json"),
            input_width: 15,
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            city: "Karachi".to_string(),
            latitude: 24.8607,
            longitude: 67.0011,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AqiConfig {
    /// Load configuration from file and environment variables.
    ///
    /// The file is taken from `AQI_CONFIG` when set.
    pub fn load() -> Result<Self> {
        Self::load_from_path(std::env::var_os("AQI_CONFIG").map(PathBuf::from))
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path()
                .filter(|path| path.exists())
                .unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. AQI_SERVER__PORT=9000
        builder = builder.add_source(
            Environment::with_prefix("AQI")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: AqiConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_port_override(std::env::var("PORT").ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("aqi-forecast").join("config.toml"))
    }

    /// Apply a hosting platform's `PORT` variable
    pub fn apply_port_override(&mut self, port: Option<String>) -> Result<()> {
        if let Some(port) = port {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid PORT value '{port}'"))?;
        }
        Ok(())
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.sources.timeout_seconds == 0 || self.sources.timeout_seconds > 300 {
            return Err(
                AqiError::config("Source timeout must be between 1 and 300 seconds").into(),
            );
        }

        if self.sources.history_days != HISTORY_DAYS {
            return Err(AqiError::config(format!(
                "History must span exactly {HISTORY_DAYS} days, got {}",
                self.sources.history_days
            ))
            .into());
        }

        if self.model.input_width < 6 {
            return Err(AqiError::config(
                "Model input width must hold at least the six pollutant features",
            )
            .into());
        }

        if !Coordinates::new(self.defaults.latitude, self.defaults.longitude).is_valid() {
            return Err(AqiError::config("Default coordinates are out of range").into());
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(AqiError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(AqiError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for url in [
            &self.sources.air_quality_base_url,
            &self.sources.measurements_base_url,
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(AqiError::config(format!(
                    "Source base URL '{url}' must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        if self.defaults.city.trim().is_empty() {
            return Err(AqiError::config("Default city cannot be empty").into());
        }

        Ok(())
    }
}
