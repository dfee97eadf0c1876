//! Settings file management
//!
//! Handles TOML parsing, validation, and atomic updates of `settings.toml`.

use crate::constants::{
    APP_NAME, DEFAULT_POLL_INTERVAL, LISTS_FILE_NAME, POLL_INTERVAL_MAX, POLL_INTERVAL_MIN,
    SETTINGS_FILE_NAME,
};
use crate::models::ConfigError;
use crate::store::write_atomically;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main settings structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub monitor: MonitorSettings,
    #[serde(default)]
    pub storage: StorageSettings,
}

/// Monitor loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorSettings {
    /// Polling interval in seconds (0.1-300.0)
    #[serde(default = "default_poll_interval")]
    pub poll_interval: f64,
}

/// Where the membership lists are stored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Lists file; defaults to the platform data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lists_path: Option<PathBuf>,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
        }
    }
}

fn default_poll_interval() -> f64 {
    DEFAULT_POLL_INTERVAL.as_secs_f64()
}

/// Check a polling interval in seconds against the allowed bounds
pub fn validate_interval(seconds: f64) -> Result<Duration, ConfigError> {
    if !(POLL_INTERVAL_MIN..=POLL_INTERVAL_MAX).contains(&seconds) {
        return Err(ConfigError::InvalidInterval(seconds));
    }
    Ok(Duration::from_secs_f64(seconds))
}

impl Settings {
    /// `<config dir>/procguard/settings.toml`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let dir = dirs::config_dir().ok_or(ConfigError::NoDirectory("config"))?;
        Ok(dir.join(APP_NAME).join(SETTINGS_FILE_NAME))
    }

    /// Parse and validate a settings file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let settings: Settings = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        settings.validate()?;
        Ok(settings)
    }

    /// Load `path` (or the default path). A missing file yields defaults;
    /// a present but invalid file is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Ok(p) => p,
                Err(_) => return Ok(Self::default()),
            },
        };

        if path.exists() {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write the settings atomically (temp file + rename)
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;
        let content = toml::to_string_pretty(self)?;
        write_atomically(path, content.as_bytes()).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_interval(self.monitor.poll_interval).map(|_| ())
    }

    pub fn polling_duration(&self) -> Duration {
        validate_interval(self.monitor.poll_interval).unwrap_or(DEFAULT_POLL_INTERVAL)
    }

    /// Configured lists path, or `<data dir>/procguard/process_config.json`
    pub fn lists_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.storage.lists_path {
            return Ok(path.clone());
        }
        let dir = dirs::data_dir().ok_or(ConfigError::NoDirectory("data"))?;
        Ok(dir.join(APP_NAME).join(LISTS_FILE_NAME))
    }
}
