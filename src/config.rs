//! Configuration file support for keysense.
//!
//! This module handles loading and validating user settings from the
//! configuration file located at `~/.config/keysense/config.toml`. The only
//! tunable today is the dismiss timeout of the navigation detector.
//!
//! If no config file exists, sensible defaults are used automatically.

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure containing all user settings.
///
/// This is the root configuration type that gets deserialized from the TOML
/// file. All fields have sensible defaults and will use those if not
/// specified in the config file.
///
/// # Example TOML
/// ```toml
/// [navigation]
/// dismiss_timeout_ms = 500
/// ```
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    /// Navigation detector tuning
    #[serde(default)]
    pub navigation: NavigationConfig,
}

/// Navigation detector settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationConfig {
    /// How long after Escape the keyboard navigation mode is dismissed,
    /// provided focus has not moved in the meantime, in milliseconds.
    #[serde(default = "default_dismiss_timeout_ms")]
    pub dismiss_timeout_ms: u64,
}

fn default_dismiss_timeout_ms() -> u64 {
    500
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            dismiss_timeout_ms: default_dismiss_timeout_ms(),
        }
    }
}

impl NavigationConfig {
    pub fn dismiss_timeout(&self) -> Duration {
        Duration::from_millis(self.dismiss_timeout_ms)
    }
}

impl Config {
    /// Validates and clamps all configuration values to acceptable ranges.
    ///
    /// Invalid values are clamped to the nearest valid value and a warning
    /// is logged.
    ///
    /// Validated ranges:
    /// - `dismiss_timeout_ms`: 50 - 10000
    fn validate_and_clamp(&mut self) {
        if !(50..=10_000).contains(&self.navigation.dismiss_timeout_ms) {
            log::warn!(
                "Invalid dismiss_timeout_ms {}, clamping to 50-10000 range",
                self.navigation.dismiss_timeout_ms
            );
            self.navigation.dismiss_timeout_ms =
                self.navigation.dismiss_timeout_ms.clamp(50, 10_000);
        }
    }

    /// Returns the path to the configuration file.
    ///
    /// The config file is located at `~/.config/keysense/config.toml`.
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be determined
    /// (e.g., HOME not set).
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("keysense");

        Ok(config_dir.join("config.toml"))
    }

    /// Loads configuration from file, or returns defaults if not found.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The config directory path cannot be determined
    /// - The file exists but cannot be read
    /// - The file exists but contains invalid TOML syntax
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            info!("Config file not found, using defaults");
            debug!("Expected config at: {}", config_path.display());
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    /// Loads and validates configuration from an explicit path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        let config_str = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let mut config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;

        config.validate_and_clamp();

        info!("Loaded config from {}", path.display());
        debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Saves the current configuration to file.
    ///
    /// # Errors
    /// Returns an error if the config directory cannot be created or the
    /// file cannot be written.
    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)
    }

    /// Serializes the config to TOML and writes it to an explicit path,
    /// creating the parent directory if needed.
    ///
    /// # Errors
    /// Returns an error if serialization or the write fails.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let config_str = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, config_str)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;

        info!("Saved config to {}", path.display());
        Ok(())
    }
}
