//! Configuration loading and resolution
//!
//! Settings are resolved once at start-up in this priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Tiers 1 and 2 arrive together as [`ConfigOverrides`] (the binary's CLI
//! parser reads both); this module layers them over the TOML file.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATABASE_PATH: &str = "songbook.db";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Bootstrap configuration file contents
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TomlConfig {
    pub server: ServerSection,
    pub database: DatabaseSection,
    pub logging: LoggingConfig,
}

/// `[server]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// `[database]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseSection {
    /// Path to SQLite database file (relative or absolute)
    pub path: PathBuf,
    pub max_connections: u32,
    /// Upper bound on waiting for a pooled connection
    pub acquire_timeout_secs: u64,
    /// Upper bound on a single store round trip
    pub query_timeout_secs: u64,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DATABASE_PATH),
            max_connections: 5,
            acquire_timeout_secs: 5,
            query_timeout_secs: 5,
        }
    }
}

/// `[logging]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl TomlConfig {
    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Read and parse a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Read config file {} failed: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }
}

/// Values taken from the command line or the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<PathBuf>,
    pub log_level: Option<String>,
}

/// Store connection settings
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub query_timeout: Duration,
}

/// Fully resolved configuration, immutable after start-up
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database: DatabaseConfig,
    pub log_level: String,
}

impl Config {
    /// Resolve configuration from overrides, the TOML file and defaults.
    ///
    /// An explicitly named config file must exist; the platform default file
    /// is optional.
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self> {
        let file = match &overrides.config_file {
            Some(path) => {
                info!("Loading config file {}", path.display());
                TomlConfig::load(path)?
            }
            None => match default_config_path() {
                Some(path) if path.exists() => {
                    info!("Loading config file {}", path.display());
                    TomlConfig::load(&path)?
                }
                _ => {
                    debug!("No config file found, using defaults");
                    TomlConfig::default()
                }
            },
        };

        let config = Self::merge(file, overrides);
        config.validate()?;
        Ok(config)
    }

    /// Layer overrides on top of file values
    pub fn merge(file: TomlConfig, overrides: ConfigOverrides) -> Self {
        Self {
            host: overrides.host.unwrap_or(file.server.host),
            port: overrides.port.unwrap_or(file.server.port),
            database: DatabaseConfig {
                path: overrides.database.unwrap_or(file.database.path),
                max_connections: file.database.max_connections,
                acquire_timeout: Duration::from_secs(file.database.acquire_timeout_secs),
                query_timeout: Duration::from_secs(file.database.query_timeout_secs),
            },
            log_level: overrides.log_level.unwrap_or(file.logging.level),
        }
    }

    /// Reject values that would leave the service unable to make progress
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::Config("server host must not be empty".to_string()));
        }
        if self.database.max_connections == 0 {
            return Err(Error::Config(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        if self.database.acquire_timeout.is_zero() || self.database.query_timeout.is_zero() {
            return Err(Error::Config(
                "database timeouts must be at least one second".to_string(),
            ));
        }
        Ok(())
    }

    /// `host:port` string for binding the listener
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Platform config file location (`~/.config/songbook/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("songbook").join("config.toml"))
}
