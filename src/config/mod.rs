//! Configuration management for docpager
//!
//! This module handles loading, parsing, and managing configuration from various sources:
//! - Configuration files (TOML format)
//! - Environment variables
//! - Command-line arguments
//!
//! Configuration precedence (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file
//! 4. Default values

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};
use crate::query::DEFAULT_PAGE_SIZE;

/// Prefix of the environment variables read by [`Config::apply_env`].
pub const ENV_PREFIX: &str = "DOCPAGER_";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Connection configuration
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Reader configuration
    #[serde(default)]
    pub reader: ReaderConfig,

    /// Display configuration
    #[serde(default)]
    pub display: DisplayConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Default MongoDB connection URI
    #[serde(default = "default_uri")]
    pub default_uri: String,

    /// Database to read from
    #[serde(default = "default_database")]
    pub database: String,

    /// Connection and server selection timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Maximum pool size
    #[serde(default = "default_max_pool_size")]
    pub max_pool_size: u32,

    /// Minimum pool size
    #[serde(default = "default_min_pool_size")]
    pub min_pool_size: u32,
}

/// Pagination defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Records per page when none is given
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Pages fetched by one CLI invocation
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

/// Display and output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Output format (json, json-pretty, compact)
    #[serde(default = "default_format")]
    pub format: OutputFormat,

    /// Enable colored output
    #[serde(default = "default_color_output")]
    pub color_output: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// One compact JSON object per record, one record per line
    Json,

    /// Pretty-printed JSON array per page
    JsonPretty,

    /// Summary only: record count and next cursor
    Compact,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Enable timestamps in logs
    #[serde(default = "default_log_timestamps")]
    pub timestamps: bool,
}

/// Log level options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

// Default value functions
fn default_uri() -> String {
    "mongodb://localhost:27017".to_string()
}

fn default_database() -> String {
    "test".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_pool_size() -> u32 {
    10
}

fn default_min_pool_size() -> u32 {
    0
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_max_pages() -> u32 {
    1
}

fn default_format() -> OutputFormat {
    OutputFormat::Json
}

fn default_color_output() -> bool {
    true
}

fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

fn default_log_timestamps() -> bool {
    true
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            default_uri: default_uri(),
            database: default_database(),
            timeout: default_timeout(),
            max_pool_size: default_max_pool_size(),
            min_pool_size: default_min_pool_size(),
        }
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_pages: default_max_pages(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            color_output: default_color_output(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timestamps: default_log_timestamps(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ConfigError::InvalidFormat(e.to_string()).into())
    }

    /// Load configuration from a file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file (TOML format)
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist. Without one, the default path is used
    /// if present and defaults otherwise. Environment variables are applied
    /// on top.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Self::default_path();
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Override values from `DOCPAGER_*` variables
    ///
    /// `lookup` resolves a variable name to its value, which keeps this
    /// testable without touching the process environment.
    ///
    /// Recognized: `DOCPAGER_URI`, `DOCPAGER_DATABASE`, `DOCPAGER_PAGE_SIZE`,
    /// `DOCPAGER_TIMEOUT`, `DOCPAGER_LOG_LEVEL`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(uri) = var("URI") {
            self.connection.default_uri = uri;
        }
        if let Some(database) = var("DATABASE") {
            self.connection.database = database;
        }
        if let Some(size) = var("PAGE_SIZE") {
            self.reader.page_size = parse_env_value("PAGE_SIZE", &size)?;
        }
        if let Some(timeout) = var("TIMEOUT") {
            self.connection.timeout = parse_env_value("TIMEOUT", &timeout)?;
        }
        if let Some(level) = var("LOG_LEVEL") {
            self.logging.level = level.parse()?;
        }
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".docpager")
            .join("config.toml")
    }

    /// Render the configuration as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidFormat(e.to_string()).into())
    }

    /// Validate the configuration
    ///
    /// # Returns
    /// * `Result<()>` - Ok if valid, error otherwise
    pub fn validate(&self) -> Result<()> {
        self.connection.validate_uri()?;

        if self.connection.database.trim().is_empty() {
            return Err(ConfigError::MissingField("connection.database".to_string()).into());
        }
        if self.connection.timeout == 0 {
            return Err(invalid("connection.timeout", self.connection.timeout));
        }
        if self.reader.page_size == 0 {
            return Err(invalid("reader.page_size", self.reader.page_size));
        }
        if self.connection.min_pool_size > self.connection.max_pool_size {
            return Err(invalid(
                "connection.min_pool_size",
                self.connection.min_pool_size,
            ));
        }
        Ok(())
    }

    /// Get connection timeout as Duration
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection.timeout)
    }
}

impl ConnectionConfig {
    /// Check that the URI uses a MongoDB scheme
    pub fn validate_uri(&self) -> Result<()> {
        let uri = self.default_uri.trim();
        if uri.starts_with("mongodb://") || uri.starts_with("mongodb+srv://") {
            Ok(())
        } else {
            Err(invalid("connection.default_uri", uri))
        }
    }
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "json-pretty" | "pretty" => Ok(OutputFormat::JsonPretty),
            "compact" => Ok(OutputFormat::Compact),
            _ => Err(ConfigError::InvalidValue {
                field: "display.format".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

fn invalid(field: &str, value: impl ToString) -> crate::error::PagerError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
    .into()
}

fn parse_env_value<N: std::str::FromStr>(name: &str, raw: &str) -> Result<N> {
    raw.trim().parse().map_err(|_| invalid(&format!("{ENV_PREFIX}{name}"), raw))
}
