//! Configuration management for the HDO tariff service
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files with support for environment variable overrides.

use crate::error::{HdoError, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

mod defaults;

/// Environment variable pointing at an explicit configuration file
pub const CONFIG_PATH_ENV: &str = "HDO_CONFIG";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Web server binding configuration
    pub web: WebConfig,

    /// On-disk tariff cache configuration
    pub cache: CacheConfig,

    /// External fetch process configuration
    pub fetcher: FetcherConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// IANA timezone deciding which calendar day "today" is for cache keys
    /// and how offset-less timestamps are interpreted
    pub timezone: String,
}

/// Web server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Bind address
    pub host: String,

    /// TCP port
    pub port: u16,
}

/// Tariff cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding one JSON file per (command, date, days)
    pub directory: PathBuf,
}

/// External fetch process configuration
///
/// The process is invoked as `<program> <args...> <command> <days>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Executable to run (resolved through `PATH` when not absolute)
    pub program: String,

    /// Leading arguments, e.g. the fetch script path
    pub args: Vec<String>,

    /// Working directory for the process; inherits ours when unset
    pub working_dir: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Optional console-specific level
    pub console_level: Option<String>,

    /// Optional file-specific level
    pub file_level: Option<String>,

    /// Path to log file (its parent directory is used for rotation)
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from `HDO_CONFIG` or the default locations,
    /// then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = if let Ok(explicit) = std::env::var(CONFIG_PATH_ENV) {
            Self::from_file(&explicit)?
        } else {
            let default_paths = ["hdo_config.yaml", "/etc/hdo-tariffs/config.yaml"];
            match default_paths.iter().find(|p| Path::new(p).exists()) {
                Some(path) => Self::from_file(path)?,
                // Fall back to default configuration
                None => Self::default(),
            }
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Override selected settings from `HDO_*` environment variables
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("HDO_CACHE_DIR") {
            self.cache.directory = PathBuf::from(dir);
        }
        if let Some(program) = lookup("HDO_FETCH_PROGRAM") {
            self.fetcher.program = program;
        }
        if let Some(host) = lookup("HDO_WEB_HOST") {
            self.web.host = host;
        }
        if let Some(port) = lookup("HDO_WEB_PORT") {
            self.web.port = port.trim().parse().map_err(|_| {
                HdoError::validation("web.port", "HDO_WEB_PORT is not a valid port")
            })?;
        }
        if let Some(tz) = lookup("HDO_TIMEZONE") {
            self.timezone = tz;
        }
        Ok(())
    }

    /// Parsed timezone
    pub fn tz(&self) -> Result<Tz> {
        self.timezone.parse::<Tz>().map_err(|_| {
            HdoError::validation(
                "timezone",
                format!("Unknown timezone '{}'", self.timezone).as_str(),
            )
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.web.host.is_empty() {
            return Err(HdoError::validation("web.host", "Host cannot be empty"));
        }

        if self.web.port == 0 {
            return Err(HdoError::validation(
                "web.port",
                "Port must be greater than 0",
            ));
        }

        if self.cache.directory.as_os_str().is_empty() {
            return Err(HdoError::validation(
                "cache.directory",
                "Cache directory cannot be empty",
            ));
        }

        if self.fetcher.program.trim().is_empty() {
            return Err(HdoError::validation(
                "fetcher.program",
                "Fetch program cannot be empty",
            ));
        }

        crate::logging::parse_log_level(&self.logging.level)?;
        self.tz()?;

        Ok(())
    }
}
