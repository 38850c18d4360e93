//! Configuration loading
//!
//! Each setting is resolved in priority order:
//! 1. Command-line argument
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (optional settings only)
//!
//! The first two tiers arrive together as [`ConfigOverrides`] (clap reads
//! both). The database path has no default; startup fails without it.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default bind host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 8080;

/// Default cap on uploaded CSV size (10 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub db_path: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub max_upload_bytes: Option<usize>,
    /// Explicit config file; when absent the platform locations are tried
    pub config_file: Option<PathBuf>,
}

/// Contents of `config.toml`
///
/// ```toml
/// [database]
/// path = "/var/lib/roster/roster.db"
///
/// [server]
/// host = "0.0.0.0"
/// port = 8080
/// max_upload_bytes = 10485760
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub server: ServerSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseSection {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub max_upload_bytes: Option<usize>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterConfig {
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

impl RosterConfig {
    /// Resolve configuration from overrides plus the config file, if any
    ///
    /// An explicitly named config file must exist and parse. The platform
    /// default locations are optional.
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self> {
        let file = match &overrides.config_file {
            Some(path) => load_toml_config(path)?,
            None => match default_config_file() {
                Some(path) => load_toml_config(&path)?,
                None => TomlConfig::default(),
            },
        };

        Self::merge(overrides, file)
    }

    /// Combine both tiers, overrides winning
    pub fn merge(overrides: ConfigOverrides, file: TomlConfig) -> Result<Self> {
        let db_path = overrides.db_path.or(file.database.path).ok_or_else(|| {
            Error::Config(
                "Database path not set (use --db-path, DB_PATH, or [database].path in config.toml)"
                    .to_string(),
            )
        })?;

        if db_path.as_os_str().is_empty() {
            return Err(Error::Config("Database path is empty".to_string()));
        }

        let max_upload_bytes = overrides
            .max_upload_bytes
            .or(file.server.max_upload_bytes)
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        if max_upload_bytes == 0 {
            return Err(Error::Config("max_upload_bytes must be positive".to_string()));
        }

        Ok(Self {
            db_path,
            host: overrides
                .host
                .or(file.server.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: overrides.port.or(file.server.port).unwrap_or(DEFAULT_PORT),
            max_upload_bytes,
        })
    }
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
    })?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
}

/// First existing platform config file, if any
fn default_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("roster").join("config.toml"));

    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/roster/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}
