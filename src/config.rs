//! Configuration management for the `CineSky` application
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::CineSkyError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure for the `CineSky` application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CineSkyConfig {
    /// Weather API configuration
    pub weather: WeatherConfig,
    /// Cache configuration
    pub cache: CacheConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// HTTP server and session configuration
    pub server: ServerConfig,
    /// Default application settings
    pub defaults: DefaultsConfig,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// API key, passed as a query parameter to the upstream services
    pub api_key: Option<String>,
    /// Base URL for the current-conditions API (OpenWeatherMap-style)
    #[serde(default = "default_conditions_base_url")]
    pub conditions_base_url: String,
    /// Base URL for the geocoding API
    #[serde(default = "default_geocoding_base_url")]
    pub geocoding_base_url: String,
    /// Base URL for the daily-forecast API (WeatherXu-style)
    #[serde(default = "default_forecast_base_url")]
    pub forecast_base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_weather_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for failed requests
    #[serde(default = "default_weather_max_retries")]
    pub max_retries: u32,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Forecast cache TTL in hours
    #[serde(default = "default_cache_ttl")]
    pub ttl_hours: u32,
    /// Cache directory location
    #[serde(default = "default_cache_location")]
    pub location: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// HTTP server and session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port the API server listens on
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Session lifetime in hours
    #[serde(default = "default_session_ttl")]
    pub session_ttl_hours: u32,
    /// Background refresh interval for current conditions, in minutes
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_minutes: u32,
}

/// Default application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Fallback latitude used when a request carries no position
    #[serde(default = "default_latitude")]
    pub latitude: f64,
    /// Fallback longitude used when a request carries no position
    #[serde(default = "default_longitude")]
    pub longitude: f64,
    /// Number of forecast days to request
    #[serde(default = "default_forecast_days")]
    pub forecast_days: u32,
    /// Maximum number of search-history entries kept per user
    #[serde(default = "default_max_history")]
    pub max_history_entries: u32,
}

// Default value functions
fn default_conditions_base_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_geocoding_base_url() -> String {
    "https://api.openweathermap.org/geo/1.0".to_string()
}

fn default_forecast_base_url() -> String {
    "https://api.weatherxu.com/v1".to_string()
}

fn default_weather_timeout() -> u32 {
    30
}

fn default_weather_max_retries() -> u32 {
    3
}

fn default_cache_ttl() -> u32 {
    6
}

fn default_cache_location() -> String {
    "~/.cache/cinesky".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_session_ttl() -> u32 {
    72
}

fn default_refresh_interval() -> u32 {
    10
}

fn default_latitude() -> f64 {
    28.67
}

fn default_longitude() -> f64 {
    77.22
}

fn default_forecast_days() -> u32 {
    7
}

fn default_max_history() -> u32 {
    50
}

impl Default for CineSkyConfig {
    fn default() -> Self {
        Self {
            weather: WeatherConfig {
                api_key: None,
                conditions_base_url: default_conditions_base_url(),
                geocoding_base_url: default_geocoding_base_url(),
                forecast_base_url: default_forecast_base_url(),
                timeout_seconds: default_weather_timeout(),
                max_retries: default_weather_max_retries(),
            },
            cache: CacheConfig {
                ttl_hours: default_cache_ttl(),
                location: default_cache_location(),
            },
            logging: LoggingConfig {
                level: default_log_level(),
                format: default_log_format(),
            },
            server: ServerConfig {
                port: default_server_port(),
                session_ttl_hours: default_session_ttl(),
                refresh_interval_minutes: default_refresh_interval(),
            },
            defaults: DefaultsConfig {
                latitude: default_latitude(),
                longitude: default_longitude(),
                forecast_days: default_forecast_days(),
                max_history_entries: default_max_history(),
            },
        }
    }
}

impl CineSkyConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Add environment variable overrides with CINESKY_ prefix
        builder = builder.add_source(
            Environment::with_prefix("CINESKY")
                .separator("_")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: CineSkyConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        // Apply defaults for missing values
        config.apply_defaults();

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("cinesky").join("config.toml"))
    }

    /// Resolve the cache directory, expanding a leading `~`
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        if let Some(rest) = self.cache.location.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(&self.cache.location)
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.weather.conditions_base_url.is_empty() {
            self.weather.conditions_base_url = default_conditions_base_url();
        }
        if self.weather.geocoding_base_url.is_empty() {
            self.weather.geocoding_base_url = default_geocoding_base_url();
        }
        if self.weather.forecast_base_url.is_empty() {
            self.weather.forecast_base_url = default_forecast_base_url();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_weather_timeout();
        }
        if self.weather.max_retries == 0 {
            self.weather.max_retries = default_weather_max_retries();
        }
        if self.cache.ttl_hours == 0 {
            self.cache.ttl_hours = default_cache_ttl();
        }
        if self.cache.location.is_empty() {
            self.cache.location = default_cache_location();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.server.port == 0 {
            self.server.port = default_server_port();
        }
        if self.server.session_ttl_hours == 0 {
            self.server.session_ttl_hours = default_session_ttl();
        }
        if self.server.refresh_interval_minutes == 0 {
            self.server.refresh_interval_minutes = default_refresh_interval();
        }
        if self.defaults.forecast_days == 0 {
            self.defaults.forecast_days = default_forecast_days();
        }
        if self.defaults.max_history_entries == 0 {
            self.defaults.max_history_entries = default_max_history();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        if let Some(api_key) = &self.weather.api_key {
            if api_key.is_empty() {
                return Err(CineSkyError::config(
                    "Weather API key cannot be empty if provided. Either remove it or provide a valid key."
                ).into());
            }

            if api_key.len() < 8 {
                return Err(CineSkyError::config(
                    "Weather API key appears to be invalid (too short). Please check your API key."
                ).into());
            }

            if api_key.len() > 100 {
                return Err(CineSkyError::config(
                    "Weather API key appears to be invalid (too long). Please check your API key."
                ).into());
            }
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.weather.timeout_seconds > 300 {
            return Err(CineSkyError::config(
                "Weather API timeout cannot exceed 300 seconds"
            ).into());
        }

        if self.weather.max_retries > 10 {
            return Err(CineSkyError::config(
                "Weather API max retries cannot exceed 10"
            ).into());
        }

        if self.cache.ttl_hours > 168 {
            return Err(CineSkyError::config(
                "Cache TTL cannot exceed 168 hours (1 week)"
            ).into());
        }

        if self.server.session_ttl_hours > 720 {
            return Err(CineSkyError::config(
                "Session TTL cannot exceed 720 hours (30 days)"
            ).into());
        }

        if !(-90.0..=90.0).contains(&self.defaults.latitude) {
            return Err(CineSkyError::config(
                "Default latitude must be between -90 and 90"
            ).into());
        }

        if !(-180.0..=180.0).contains(&self.defaults.longitude) {
            return Err(CineSkyError::config(
                "Default longitude must be between -180 and 180"
            ).into());
        }

        if self.defaults.forecast_days > 16 {
            return Err(CineSkyError::config(
                "Forecast days cannot exceed 16"
            ).into());
        }

        if self.defaults.max_history_entries > 1000 {
            return Err(CineSkyError::config(
                "History cannot keep more than 1000 entries per user"
            ).into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(CineSkyError::config(
                format!("Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    valid_log_levels.join(", ")
                )
            ).into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(CineSkyError::config(
                format!("Invalid log format '{}'. Must be one of: {}",
                    self.logging.format,
                    valid_log_formats.join(", ")
                )
            ).into());
        }

        for url in [
            &self.weather.conditions_base_url,
            &self.weather.geocoding_base_url,
            &self.weather.forecast_base_url,
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(CineSkyError::config(
                    "Weather API base URLs must be valid HTTP or HTTPS URLs"
                ).into());
            }
        }

        Ok(())
    }

    /// Create configuration directory if it doesn't exist
    pub fn ensure_config_dir() -> Result<PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            let cinesky_config_dir = config_dir.join("cinesky");
            std::fs::create_dir_all(&cinesky_config_dir)
                .with_context(|| format!("Failed to create config directory: {}", cinesky_config_dir.display()))?;
            Ok(cinesky_config_dir)
        } else {
            Err(CineSkyError::config("Unable to determine config directory").into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CineSkyConfig::default();
        assert_eq!(
            config.weather.conditions_base_url,
            "https://api.openweathermap.org/data/2.5"
        );
        assert_eq!(config.weather.timeout_seconds, 30);
        assert_eq!(config.cache.ttl_hours, 6);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.refresh_interval_minutes, 10);
        assert_eq!(config.defaults.latitude, 28.67);
        assert_eq!(config.defaults.longitude, 77.22);
        assert!(config.weather.api_key.is_none());
    }

    #[test]
    fn test_config_validation_missing_api_key() {
        // The key is optional at config level; requests without one fail upstream
        let config = CineSkyConfig::default();
        assert!(config.validate_api_keys().is_ok());
    }

    #[test]
    fn test_config_validation_short_api_key() {
        let mut config = CineSkyConfig::default();
        config.weather.api_key = Some("short".to_string());
        assert!(config.validate_api_keys().is_err());
    }

    #[test]
    fn test_config_validation_valid_api_key() {
        let mut config = CineSkyConfig::default();
        config.weather.api_key = Some("valid_api_key_123".to_string());
        assert!(config.validate_api_keys().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = CineSkyConfig::default();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = CineSkyConfig::default();
        config.weather.timeout_seconds = 500; // Invalid - too high
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));
    }

    #[test]
    fn test_config_validation_default_coordinates() {
        let mut config = CineSkyConfig::default();
        config.defaults.latitude = 91.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_path_generation() {
        let path = CineSkyConfig::get_config_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("cinesky"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_cache_dir_expands_tilde() {
        let config = CineSkyConfig::default();
        let dir = config.cache_dir();
        assert!(!dir.to_string_lossy().starts_with('~'));
        assert!(dir.to_string_lossy().contains("cinesky"));
    }
}
