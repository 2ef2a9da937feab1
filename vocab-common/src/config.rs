//! Configuration file loading and data folder resolution
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument / environment variable (highest priority)
//! 2. TOML config file
//! 3. OS-dependent compiled default (fallback)
//!
//! A missing TOML file is not an error: the service logs a warning and runs
//! on defaults. A TOML file that exists but cannot be parsed is an error.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "VOCAB_CONFIG";

/// Database file name inside the data folder
pub const DATABASE_FILE_NAME: &str = "vocab.db";

/// TOML configuration file contents
///
/// Every field is optional; absent values fall back to compiled defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Folder holding the SQLite database
    pub data_folder: Option<PathBuf>,

    /// Listen address (IP only)
    pub bind: Option<String>,

    /// Listen port
    pub port: Option<u16>,

    /// Reference zone offset east of UTC, in minutes
    pub utc_offset_minutes: Option<i32>,

    /// Secret gesture pattern for login; unset disables authentication
    pub login_pattern: Option<String>,

    /// Mark the session cookie `Secure`
    pub secure_cookies: Option<bool>,

    /// Text-generation provider settings
    pub ai: AiToml,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// `[ai]` table of the TOML file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AiToml {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub gloss_language: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub stream_buffer: Option<usize>,
}

/// `[logging]` table of the TOML file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl TomlConfig {
    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Load configuration from the first available source
    ///
    /// Looks at `explicit` (from the command line), then `VOCAB_CONFIG`, then
    /// the platform config directory. Returns defaults when no file exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from))
            .or_else(default_config_path);

        let Some(path) = path else {
            warn!("Could not determine config directory, using defaults");
            return Ok(Self::default());
        };

        if !path.exists() {
            warn!("Config file not found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}

/// Default config file location: `<config_dir>/vocab/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("vocab").join("config.toml"))
}

/// Resolve the data folder: CLI/env value → TOML value → OS default
pub fn resolve_data_folder(cli_or_env: Option<&Path>, toml: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_or_env {
        return path.to_path_buf();
    }

    if let Some(path) = &toml.data_folder {
        return path.clone();
    }

    default_data_folder()
}

/// OS-dependent default data folder
///
/// `~/.local/share/vocab` on Linux, `~/Library/Application Support/vocab`
/// on macOS, `%LOCALAPPDATA%\vocab` on Windows.
pub fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("vocab"))
        .unwrap_or_else(|| PathBuf::from("./vocab_data"))
}

/// Create the data folder if missing and return the database path inside it
pub fn prepare_data_folder(folder: &Path) -> Result<PathBuf> {
    if !folder.exists() {
        std::fs::create_dir_all(folder)?;
        info!("Created data folder: {}", folder.display());
    }

    Ok(folder.join(DATABASE_FILE_NAME))
}

/// Treat empty or whitespace-only strings as unset
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}
