// SPDX-License-Identifier: PMPL-1.0-or-later
//! Configuration handling for the socdash CLI.
//!
//! Supports loading configuration from:
//! - Default locations (~/.config/socdash/config.toml)
//! - Home directory (~/.socdash.toml)
//! - Project-local files (.socdash.toml, .socdash.yaml, .socdash.json)
//! - Environment variables (SOCDASH_*)
//! - Command-line arguments (--config)

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use alerts::TimeRange;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

const QUALIFIER: &str = "dev";
const ORGANIZATION: &str = "socdash";
const APPLICATION: &str = "socdash";

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    /// Console backend connection
    pub backend: BackendConfig,

    /// Alert view defaults
    pub alerts: AlertsConfig,

    pub bulk: BulkConfig,

    pub output: OutputConfig,

    /// Custom settings (key-value pairs)
    #[serde(flatten)]
    pub custom: HashMap<String, toml::Value>,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Data directory (session token lives here)
    pub data_dir: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            data_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the console API (without the /api suffix)
    pub url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Bearer token; normally read from the session file instead
    pub token: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000".to_string(),
            timeout_secs: 15,
            token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    /// Maximum number of alerts fetched per refresh
    pub limit: u32,

    /// Time window applied when --since is not given
    pub default_time_range: TimeRange,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            limit: 200,
            default_time_range: TimeRange::All,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BulkConfig {
    /// Concurrent PATCH requests per bulk action
    pub max_in_flight: usize,
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            max_in_flight: alerts::bulk::DEFAULT_MAX_IN_FLIGHT,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format
    pub format: String,

    /// Use colors
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "plain".to_string(),
            color: true,
        }
    }
}

impl Config {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        let mut config = Config::default();

        // Try to load from XDG config directory
        if let Some(proj_dirs) = ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION) {
            let config_file = proj_dirs.config_dir().join("config.toml");
            if config_file.exists() {
                config = Config::from_file(&config_file)?;
                debug!("Loaded config from: {}", config_file.display());
            }
        }

        // Try to load from home directory
        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".socdash.toml");
            if home_config.exists() {
                config = config.merge_file(&home_config)?;
                debug!("Merged config from: {}", home_config.display());
            }
        }

        // Try to load from current directory
        let local_configs = [".socdash.toml", ".socdash.yaml", ".socdash.json"];
        for filename in &local_configs {
            let local_config = PathBuf::from(filename);
            if local_config.exists() {
                config = config.merge_file(&local_config)?;
                debug!("Merged config from: {}", local_config.display());
                break;
            }
        }

        config.apply_env_vars()
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&content).with_context(|| "Failed to parse TOML config"),
            "yaml" | "yml" => {
                serde_yaml::from_str(&content).with_context(|| "Failed to parse YAML config")
            }
            "json" => {
                serde_json::from_str(&content).with_context(|| "Failed to parse JSON config")
            }
            _ => {
                // Try TOML first, then YAML, then JSON
                if let Ok(config) = toml::from_str(&content) {
                    return Ok(config);
                }
                if let Ok(config) = serde_yaml::from_str(&content) {
                    return Ok(config);
                }
                serde_json::from_str(&content).with_context(|| "Failed to parse config file")
            }
        }
    }

    /// Merge configuration from a file
    pub fn merge_file(self, path: &Path) -> Result<Self> {
        let other = Config::from_file(path)?;
        Ok(self.merge(other))
    }

    /// Merge two configurations (other takes precedence where it differs from the defaults)
    pub fn merge(mut self, other: Config) -> Self {
        let defaults = Config::default();

        if other.general.log_level != defaults.general.log_level {
            self.general.log_level = other.general.log_level;
        }
        if other.general.data_dir.is_some() {
            self.general.data_dir = other.general.data_dir;
        }

        if other.backend.url != defaults.backend.url {
            self.backend.url = other.backend.url;
        }
        if other.backend.timeout_secs != defaults.backend.timeout_secs {
            self.backend.timeout_secs = other.backend.timeout_secs;
        }
        if other.backend.token.is_some() {
            self.backend.token = other.backend.token;
        }

        if other.alerts.limit != defaults.alerts.limit {
            self.alerts.limit = other.alerts.limit;
        }
        if other.alerts.default_time_range != defaults.alerts.default_time_range {
            self.alerts.default_time_range = other.alerts.default_time_range;
        }

        if other.bulk.max_in_flight != defaults.bulk.max_in_flight {
            self.bulk.max_in_flight = other.bulk.max_in_flight;
        }

        if other.output.format != defaults.output.format {
            self.output.format = other.output.format;
        }
        if !other.output.color {
            self.output.color = false;
        }

        self.custom.extend(other.custom);

        self
    }

    /// Apply environment variables
    pub fn apply_env_vars(mut self) -> Result<Self> {
        if let Ok(url) = std::env::var("SOCDASH_BACKEND_URL") {
            self.backend.url = url;
        }

        if let Ok(timeout) = std::env::var("SOCDASH_TIMEOUT_SECS") {
            self.backend.timeout_secs = timeout
                .parse()
                .with_context(|| format!("Invalid SOCDASH_TIMEOUT_SECS: {}", timeout))?;
        }

        if let Ok(token) = std::env::var("SOCDASH_TOKEN") {
            self.backend.token = Some(token);
        }

        if let Ok(level) = std::env::var("SOCDASH_LOG_LEVEL") {
            self.general.log_level = level;
        }

        if let Ok(format) = std::env::var("SOCDASH_OUTPUT_FORMAT") {
            self.output.format = format;
        }

        if std::env::var("SOCDASH_NO_COLOR").is_ok() || std::env::var("NO_COLOR").is_ok() {
            self.output.color = false;
        }

        if let Ok(dir) = std::env::var("SOCDASH_DATA_DIR") {
            self.general.data_dir = Some(PathBuf::from(dir));
        }

        Ok(self)
    }

    /// Initialize default configuration file
    pub fn init_default() -> Result<PathBuf> {
        let config_file = Self::default_path()?;
        if let Some(config_dir) = config_file.parent() {
            std::fs::create_dir_all(config_dir).with_context(|| {
                format!("Failed to create config directory: {}", config_dir.display())
            })?;
        }

        let default_content = r#"# SPDX-License-Identifier: PMPL-1.0-or-later
# socdash CLI Configuration

[general]
# Log level: trace, debug, info, warn, error
log_level = "warn"

# Data directory (default: ~/.local/share/socdash)
# data_dir = "~/.local/share/socdash"

[backend]
# Console API base URL
url = "http://localhost:8000"

# Per-request timeout in seconds
timeout_secs = 15

# Prefer `socdash session set` over storing a token here
# token = ""

[alerts]
# Alerts fetched per refresh
limit = 200

# Default time window: all, 24h, 7d, 30d
default_time_range = "all"

[bulk]
# Concurrent status updates per bulk action
max_in_flight = 16

[output]
# Default output format: plain, json, yaml, table
format = "plain"

# Use colored output
color = true
"#;

        std::fs::write(&config_file, default_content)
            .with_context(|| format!("Failed to write config file: {}", config_file.display()))?;

        Ok(config_file)
    }

    /// Save configuration to default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    fn default_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
            .context("Could not determine config directory")?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Get a configuration value by dot-separated key
    pub fn get(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["general", "log_level"] => Some(self.general.log_level.clone()),
            ["general", "data_dir"] => Some(self.data_dir().display().to_string()),
            ["backend", "url"] => Some(self.backend.url.clone()),
            ["backend", "timeout_secs"] => Some(self.backend.timeout_secs.to_string()),
            ["backend", "token"] => self.backend.token.as_ref().map(|_| "<set>".to_string()),
            ["alerts", "limit"] => Some(self.alerts.limit.to_string()),
            ["alerts", "default_time_range"] => Some(self.alerts.default_time_range.to_string()),
            ["bulk", "max_in_flight"] => Some(self.bulk.max_in_flight.to_string()),
            ["output", "format"] => Some(self.output.format.clone()),
            ["output", "color"] => Some(self.output.color.to_string()),
            _ => self.custom.get(key).map(|value| value.to_string()),
        }
    }

    /// Set a configuration value by dot-separated key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["general", "log_level"] => {
                self.general.log_level = value.to_string();
            }
            ["general", "data_dir"] => {
                self.general.data_dir = Some(PathBuf::from(value));
            }
            ["backend", "url"] => {
                self.backend.url = value.to_string();
            }
            ["backend", "timeout_secs"] => {
                self.backend.timeout_secs = value.parse().context("Invalid integer value")?;
            }
            ["backend", "token"] => {
                self.backend.token = Some(value.to_string()).filter(|t| !t.is_empty());
            }
            ["alerts", "limit"] => {
                self.alerts.limit = value.parse().context("Invalid integer value")?;
            }
            ["alerts", "default_time_range"] => {
                self.alerts.default_time_range = value
                    .parse()
                    .map_err(|e: String| anyhow::anyhow!(e))?;
            }
            ["bulk", "max_in_flight"] => {
                self.bulk.max_in_flight = value.parse().context("Invalid integer value")?;
            }
            ["output", "format"] => {
                self.output.format = value.to_string();
            }
            ["output", "color"] => {
                self.output.color = value.parse().context("Invalid boolean value")?;
            }
            _ => {
                // Store as custom setting
                self.custom
                    .insert(key.to_string(), toml::Value::String(value.to_string()));
            }
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_secs.max(1))
    }

    /// Get the data directory
    pub fn data_dir(&self) -> PathBuf {
        self.general.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join(APPLICATION))
                .unwrap_or_else(|| PathBuf::from(".local/share/socdash"))
        })
    }

    /// Where the session token is stored
    pub fn session_file(&self) -> PathBuf {
        self.data_dir().join("session.token")
    }
}
