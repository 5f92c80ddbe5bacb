//! Configuration management for routecast
//!
//! Handles loading configuration from a TOML file and `ROUTECAST_`-prefixed
//! environment variables, and validates everything at process start. Missing
//! credentials are a startup failure, not a runtime surprise.

use crate::error::ForecastError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the routecast application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutecastConfig {
    /// Weather provider configuration
    pub provider: ProviderConfig,
    /// Chat bot configuration
    pub bot: BotConfig,
    /// Dashboard web server configuration
    #[serde(default)]
    pub web: WebConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Weather provider API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the provider API
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Path suffix of the geoposition-search endpoint
    #[serde(default = "default_geo_search_path")]
    pub geo_search_path: String,
    /// Path suffix of the 5-day forecast endpoint; the location key is appended
    #[serde(default = "default_forecast_path")]
    pub forecast_path: String,
    /// Provider API key
    #[serde(default)]
    pub api_key: String,
    /// Language code for localized forecast texts
    #[serde(default = "default_language")]
    pub language: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
}

/// Chat bot transport settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Bot transport credential
    #[serde(default)]
    pub token: String,
    /// Long-poll timeout in seconds
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_seconds: u32,
}

/// Dashboard web server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    /// Port the dashboard API listens on
    #[serde(default = "default_web_port")]
    pub port: u16,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions
fn default_base_url() -> String {
    "http://dataservice.accuweather.com".to_string()
}

fn default_geo_search_path() -> String {
    "/locations/v1/cities/geoposition/search".to_string()
}

fn default_forecast_path() -> String {
    "/forecasts/v1/daily/5day/".to_string()
}

fn default_language() -> String {
    "en-us".to_string()
}

fn default_timeout() -> u32 {
    30
}

fn default_poll_timeout() -> u32 {
    25
}

fn default_web_port() -> u16 {
    8050
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: default_web_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for RoutecastConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig {
                base_url: default_base_url(),
                geo_search_path: default_geo_search_path(),
                forecast_path: default_forecast_path(),
                api_key: String::new(),
                language: default_language(),
                timeout_seconds: default_timeout(),
            },
            bot: BotConfig {
                token: String::new(),
                poll_timeout_seconds: default_poll_timeout(),
            },
            web: WebConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl RoutecastConfig {
    /// Load configuration from `config.toml` and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from the specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| PathBuf::from("config.toml"));
        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides, e.g. ROUTECAST_PROVIDER__API_KEY
        builder = builder.add_source(
            Environment::with_prefix("ROUTECAST")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let config: RoutecastConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_credentials()?;
        self.validate_provider()?;

        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(ForecastError::validation(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        Ok(())
    }

    /// Validate API keys and credentials
    fn validate_credentials(&self) -> Result<()> {
        if self.provider.api_key.is_empty() {
            return Err(ForecastError::validation(
                "Provider API key is missing. Set provider.api_key or ROUTECAST_PROVIDER__API_KEY.",
            )
            .into());
        }

        if self.bot.token.is_empty() {
            return Err(ForecastError::validation(
                "Bot token is missing. Set bot.token or ROUTECAST_BOT__TOKEN.",
            )
            .into());
        }

        Ok(())
    }

    /// Validate provider endpoint settings
    fn validate_provider(&self) -> Result<()> {
        if !self.provider.base_url.starts_with("http://")
            && !self.provider.base_url.starts_with("https://")
        {
            return Err(ForecastError::validation(
                "Provider base URL must be a valid HTTP or HTTPS URL",
            )
            .into());
        }

        if self.provider.timeout_seconds == 0 || self.provider.timeout_seconds > 300 {
            return Err(ForecastError::validation(
                "Provider timeout must be between 1 and 300 seconds",
            )
            .into());
        }

        Ok(())
    }
}
