//! Configuration management

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Audio playback configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Directory containing alarm sound files (empty = platform data dir)
    #[serde(default)]
    pub sounds_dir: String,
    /// How long to wait for the audio surface's ready signal, in milliseconds
    #[serde(default = "default_ready_timeout")]
    pub ready_timeout_ms: u64,
}

fn default_ready_timeout() -> u64 {
    5000
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sounds_dir: String::new(),
            ready_timeout_ms: default_ready_timeout(),
        }
    }
}

impl AudioConfig {
    /// Resolve the sounds directory, falling back to `<data dir>/sounds`
    pub fn sounds_dir(&self) -> Result<PathBuf> {
        if !self.sounds_dir.is_empty() {
            return Ok(PathBuf::from(&self.sounds_dir));
        }
        let proj_dirs = ProjectDirs::from("com", "clocktray", "Clocktray")
            .context("Failed to determine data directory")?;
        Ok(proj_dirs.data_dir().join("sounds"))
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Audio playback configuration
    #[serde(default)]
    pub audio: AudioConfig,
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;
            Ok(config)
        } else {
            // Return default config if file doesn't exist
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        // Create parent directories if needed
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "clocktray", "Clocktray")
            .context("Failed to determine config directory")?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }
}
