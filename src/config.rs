//! Configuration management for the weather journal
//!
//! Handles loading configuration from a TOML file and environment variables
//! and validates every setting before the server or client starts.

use crate::JournalError;
use anyhow::{Context, Result};
use config::{Config, Environment, File, Map};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JournalConfig {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Query journal storage
    #[serde(default)]
    pub storage: StorageConfig,
    /// Weather and geocoding services
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Settings used by the command line client
    #[serde(default)]
    pub client: ClientConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
}

/// Query journal storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the journal database
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

/// Weather service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default = "default_geocode_url")]
    pub geocode_url: String,
    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,
    #[serde(default = "default_reverse_geocode_url")]
    pub reverse_geocode_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_weather_timeout")]
    pub timeout_seconds: u32,
}

/// Command line client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the journal API
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_client_timeout")]
    pub timeout_seconds: u32,
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

// Default value functions
fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8000
}

fn default_storage_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("weather-journal").join("journal"))
        .unwrap_or_else(|| PathBuf::from("weather-journal-data"))
}

fn default_geocode_url() -> String {
    "https://geocoding-api.open-meteo.com/v1/search".to_string()
}

fn default_forecast_url() -> String {
    "https://api.open-meteo.com/v1/forecast".to_string()
}

fn default_reverse_geocode_url() -> String {
    "https://nominatim.openstreetmap.org/reverse".to_string()
}

fn default_weather_timeout() -> u32 {
    30
}

fn default_api_base() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_client_timeout() -> u32 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            geocode_url: default_geocode_url(),
            forecast_url: default_forecast_url(),
            reverse_geocode_url: default_reverse_geocode_url(),
            timeout_seconds: default_weather_timeout(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            timeout_seconds: default_client_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl JournalConfig {
    /// Load the TOML file (given, or the per-user default) and overlay
    /// `WEATHER_JOURNAL_*` environment variables
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        Self::load_layered(config_path, None)
    }

    /// `env` replaces the process environment when given
    fn load_layered(
        config_path: Option<PathBuf>,
        env: Option<Map<String, String>>,
    ) -> Result<Self> {
        let mut builder = Config::builder();

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

        // WEATHER_JOURNAL_SERVER__PORT=9000 and friends
        builder = builder.add_source(
            Environment::with_prefix("WEATHER_JOURNAL")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true)
                .source(env),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: JournalConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("weather-journal").join("config.toml"))
    }

    /// Replace empty values left by partial sources
    pub fn apply_defaults(&mut self) {
        if self.server.host.is_empty() {
            self.server.host = default_server_host();
        }
        if self.storage.path.as_os_str().is_empty() {
            self.storage.path = default_storage_path();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_weather_timeout();
        }
        if self.client.api_base.is_empty() {
            self.client.api_base = default_api_base();
        }
        if self.client.timeout_seconds == 0 {
            self.client.timeout_seconds = default_client_timeout();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> crate::Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> crate::Result<()> {
        if self.server.port == 0 {
            return Err(JournalError::config("Server port must not be 0"));
        }

        if self.weather.timeout_seconds > 300 {
            return Err(JournalError::config(
                "Weather API timeout cannot exceed 300 seconds",
            ));
        }

        if self.client.timeout_seconds > 300 {
            return Err(JournalError::config(
                "Client timeout cannot exceed 300 seconds",
            ));
        }

        Ok(())
    }

    fn validate_string_values(&self) -> crate::Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(JournalError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(JournalError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            )));
        }

        let urls = [
            ("weather.geocode_url", &self.weather.geocode_url),
            ("weather.forecast_url", &self.weather.forecast_url),
            ("weather.reverse_geocode_url", &self.weather.reverse_geocode_url),
            ("client.api_base", &self.client.api_base),
        ];
        for (key, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(JournalError::config(format!(
                    "{key} must be a valid HTTP or HTTPS URL"
                )));
            }
        }

        Ok(())
    }

    /// Address the server binds to
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = JournalConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.bind_address(), "127.0.0.1:8000");
        assert_eq!(
            config.weather.forecast_url,
            "https://api.open-meteo.com/v1/forecast"
        );
        assert_eq!(config.client.api_base, "http://127.0.0.1:8000");
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = JournalConfig::default();
        config.logging.level = "loud".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = JournalConfig::default();
        config.weather.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));

        let mut config = JournalConfig::default();
        config.server.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_urls() {
        let mut config = JournalConfig::default();
        config.client.api_base = "localhost:8000".to_string();
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("client.api_base"));
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[server]\nport = 9123\n\n[logging]\nformat = \"json\"\n\n[storage]\npath = \"/tmp/journal-test\""
        )
        .unwrap();

        let config = JournalConfig::load_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.server.port, 9123);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.storage.path, PathBuf::from("/tmp/journal-test"));
        assert_eq!(config.weather.timeout_seconds, 30);
    }

    #[test]
    fn test_environment_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[server]\nport = 9123\nhost = \"0.0.0.0\"").unwrap();

        let env = Map::from([
            ("WEATHER_JOURNAL_SERVER__PORT".to_string(), "9200".to_string()),
            ("WEATHER_JOURNAL_LOGGING__LEVEL".to_string(), "debug".to_string()),
            ("WEATHER_JOURNAL_CLIENT__API_BASE".to_string(), "http://journal.local:9200".to_string()),
            ("OTHER_APP_SERVER__PORT".to_string(), "1".to_string()),
        ]);
        let config =
            JournalConfig::load_layered(Some(file.path().to_path_buf()), Some(env)).unwrap();

        assert_eq!(config.server.port, 9200);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.client.api_base, "http://journal.local:9200");
    }

    #[test]
    fn test_environment_values_are_validated() {
        let env = Map::from([(
            "WEATHER_JOURNAL_LOGGING__FORMAT".to_string(),
            "xml".to_string(),
        )]);
        let result = JournalConfig::load_layered(
            Some(PathBuf::from("/nonexistent/weather-journal.toml")),
            Some(env),
        );
        assert!(format!("{:#}", result.unwrap_err()).contains("Invalid log format"));
    }

    #[test]
    fn test_config_path_generation() {
        if let Some(path) = JournalConfig::get_config_path() {
            assert!(path.to_string_lossy().contains("weather-journal"));
            assert!(path.to_string_lossy().ends_with("config.toml"));
        }
    }
}
