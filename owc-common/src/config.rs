//! Bootstrap configuration loading and root folder resolution
//!
//! TOML is bootstrap only: it is read once at startup and the process must be
//! restarted to pick up changes.
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`OWC_ROOT_FOLDER`)
//! 3. TOML config file (`root_folder`)
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "OWC_ROOT_FOLDER";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlConfig {
    /// Folder holding the collector database (optional)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Collection pipeline settings
    #[serde(default)]
    pub collector: CollectorSection,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// `[collector]` table of the TOML file
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CollectorSection {
    /// Upstream API credential (overridden by `OWC_API_KEY`)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Upstream API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Ordered city identifiers collected for every job
    #[serde(default)]
    pub target_set: Vec<i64>,

    /// JSON file with an array of city identifiers, appended after `target_set`
    #[serde(default)]
    pub target_set_file: Option<PathBuf>,

    /// Requests issued concurrently per wave
    #[serde(default = "default_wave_width")]
    pub wave_width: usize,

    /// Minimum wall-clock seconds consumed by one wave
    #[serde(default = "default_min_wave_duration_secs")]
    pub min_wave_duration_secs: f64,

    /// Per-request upstream timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for CollectorSection {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            target_set: Vec::new(),
            target_set_file: None,
            wave_width: default_wave_width(),
            min_wave_duration_secs: default_min_wave_duration_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_base_url() -> String {
    "https://api.openweathermap.org".to_string()
}

fn default_wave_width() -> usize {
    10
}

fn default_min_wave_duration_secs() -> f64 {
    11.0
}

fn default_request_timeout_secs() -> u64 {
    5
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Load configuration from a file
    ///
    /// A missing file is not fatal: a warning is logged and defaults are used.
    /// A file that exists but cannot be read or parsed is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(
                "Config file not found at {}, using built-in defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}

/// Default configuration file location (`<config dir>/owc/owc-collector.toml`)
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("owc").join("owc-collector.toml"))
        .unwrap_or_else(|| PathBuf::from("owc-collector.toml"))
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("owc"))
        .unwrap_or_else(|| PathBuf::from("./owc_data"))
}

/// Resolve the root folder following the documented priority order
pub fn resolve_root_folder(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &toml_config.root_folder {
        return path.clone();
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// Create the root folder if missing and return the database path inside it
pub fn prepare_root_folder(root_folder: &Path) -> Result<PathBuf> {
    if !root_folder.exists() {
        std::fs::create_dir_all(root_folder)?;
        info!("Created root folder: {}", root_folder.display());
    }
    Ok(root_folder.join("owc.db"))
}
