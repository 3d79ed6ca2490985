//! Configuration management for the lecture player
//!
//! This module handles loading and managing application configuration
//! from config files and environment variables.

use crate::player::PlayerConfig;
use crate::utils::error::{LecturePlayerError, Result, ResultExt};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix for environment variable overrides
const ENV_PREFIX: &str = "LECTURE_PLAYER_";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Playback behaviour
    pub player: PlayerConfig,

    /// Preference storage
    pub storage: StorageConfig,

    /// General application settings
    pub general: GeneralConfig,
}

/// Which key-value backend holds user preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Volatile, process-local map
    Memory,

    /// JSON file on disk
    File,
}

/// Preference storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend selection
    pub backend: StorageBackend,

    /// Override for the preferences file location
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// General application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            path: None,
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl StorageConfig {
    /// Resolve the preferences file path, falling back to the user config dir
    pub fn resolved_path(&self) -> Option<PathBuf> {
        self.path.clone().or_else(|| {
            dirs::config_dir().map(|p| p.join("lecture-player").join("preferences.json"))
        })
    }
}

impl Config {
    /// Load configuration from various sources
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. Default values
    /// 2. System config file (/etc/lecture-player/config.toml on Linux)
    /// 3. User config file (~/.config/lecture-player/config.toml on Linux)
    /// 4. Environment variables (LECTURE_PLAYER_* prefix)
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(system_path) = Self::system_config_path() {
            if system_path.exists() {
                config = Self::from_file(&system_path)?;
            }
        }

        if let Some(user_path) = Self::user_config_path() {
            if user_path.exists() {
                config = Self::from_file(&user_path)?;
            }
        }

        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Load an explicit configuration file, then apply environment overrides
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to user config file
    pub fn save(&self) -> Result<()> {
        let path = Self::user_config_path()
            .ok_or_else(|| LecturePlayerError::Config("Cannot determine user config path".to_string()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).config_err("Failed to create config directory")?;
        }

        let toml = toml::to_string_pretty(self).config_err("Failed to serialize config")?;
        std::fs::write(&path, toml).config_err("Failed to write config file")?;

        Ok(())
    }

    /// Parse a TOML file. Missing sections and fields keep their defaults.
    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).config_err("Failed to read config file")?;
        toml::from_str(&contents).config_err("Failed to parse config file")
    }

    /// Apply overrides looked up by variable name
    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| lookup(&format!("{}{}", ENV_PREFIX, suffix));

        if let Some(volume) = var("DEFAULT_VOLUME") {
            self.player.default_volume = volume
                .parse()
                .map_err(|_| LecturePlayerError::Config("Invalid LECTURE_PLAYER_DEFAULT_VOLUME".to_string()))?;
        }

        if let Some(delay) = var("AUTO_ADVANCE_MS") {
            self.player.auto_advance_delay_ms = delay
                .parse()
                .map_err(|_| LecturePlayerError::Config("Invalid LECTURE_PLAYER_AUTO_ADVANCE_MS".to_string()))?;
        }

        if let Some(backend) = var("STORAGE") {
            self.storage.backend = match backend.as_str() {
                "memory" => StorageBackend::Memory,
                "file" => StorageBackend::File,
                other => {
                    return Err(LecturePlayerError::Config(format!(
                        "Invalid LECTURE_PLAYER_STORAGE '{}'",
                        other
                    )))
                }
            };
        }

        if let Some(path) = var("PREFERENCES_PATH") {
            self.storage.path = Some(PathBuf::from(path));
        }

        if let Some(log_level) = var("LOG_LEVEL") {
            self.general.log_level = log_level;
        }

        Ok(())
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        self.player.validate()?;

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.general.log_level.as_str()) {
            return Err(LecturePlayerError::Config(format!(
                "Invalid log level '{}', must be one of: {:?}",
                self.general.log_level, valid_log_levels
            )));
        }

        Ok(())
    }

    /// Get system config file path
    fn system_config_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        return Some(PathBuf::from("/etc/lecture-player/config.toml"));

        #[cfg(target_os = "windows")]
        return std::env::var("PROGRAMDATA")
            .ok()
            .map(|p| PathBuf::from(p).join("LecturePlayer").join("config.toml"));

        #[cfg(target_os = "macos")]
        return Some(PathBuf::from("/Library/Application Support/LecturePlayer/config.toml"));

        #[allow(unreachable_code)]
        None
    }

    /// Get user config file path
    fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("lecture-player").join("config.toml"))
    }
}
