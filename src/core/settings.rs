//! Persisted user settings
//!
//! Icon color, clock window size, and the two alarm slots. The alarm path
//! re-reads these at fire time and never writes them back; only the command
//! surface (set/clear alarm) and a settings UI mutate them.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default hand/dot color for the tray clock face
pub const DEFAULT_ICON_COLOR: &str = "#FFFFFF";

/// Default clock window width
pub const DEFAULT_WINDOW_WIDTH: u32 = 320;

/// Default clock window height
pub const DEFAULT_WINDOW_HEIGHT: u32 = 220;

/// Default ring duration in seconds when a slot has none configured
pub const DEFAULT_RING_DURATION_SECS: u64 = 5;

/// The two fixed alarm slots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmSlot {
    Alarm1,
    Alarm2,
}

impl AlarmSlot {
    /// Timer name used to register this slot with the timer service
    pub fn timer_name(self) -> &'static str {
        match self {
            AlarmSlot::Alarm1 => "alarm-1",
            AlarmSlot::Alarm2 => "alarm-2",
        }
    }

    /// Map a fired timer name back to a slot. "alarm-1" maps to the first
    /// slot, anything else to the second.
    pub fn from_timer_name(name: &str) -> Self {
        if name == "alarm-1" {
            AlarmSlot::Alarm1
        } else {
            AlarmSlot::Alarm2
        }
    }

    pub fn all() -> [AlarmSlot; 2] {
        [AlarmSlot::Alarm1, AlarmSlot::Alarm2]
    }
}

/// One alarm slot's configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlarmSettings {
    /// Whether this alarm plays a sound when it fires
    #[serde(default)]
    pub enabled: bool,

    /// Sound identifier, resolved to `<sounds_dir>/<sound>.mp3`
    #[serde(default = "default_alarm_sound")]
    pub sound: String,

    /// Ring duration in seconds
    #[serde(default = "default_alarm_duration")]
    pub duration: u64,

    /// Scheduled instant, if the alarm is currently set
    #[serde(default)]
    pub when: Option<DateTime<Local>>,
}

fn default_alarm_sound() -> String {
    "bell".to_string()
}

fn default_alarm_duration() -> u64 {
    DEFAULT_RING_DURATION_SECS
}

impl Default for AlarmSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            sound: default_alarm_sound(),
            duration: default_alarm_duration(),
            when: None,
        }
    }
}

/// User-facing persisted settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Hand/dot color for the tray clock face, "#RRGGBB"
    #[serde(default = "default_icon_color")]
    pub icon_color: String,

    /// Clock window width
    #[serde(default = "default_window_width")]
    pub window_width: u32,

    /// Clock window height
    #[serde(default = "default_window_height")]
    pub window_height: u32,

    /// First alarm slot
    #[serde(default)]
    pub alarm1: AlarmSettings,

    /// Second alarm slot
    #[serde(default)]
    pub alarm2: AlarmSettings,
}

fn default_icon_color() -> String {
    DEFAULT_ICON_COLOR.to_string()
}

fn default_window_width() -> u32 {
    DEFAULT_WINDOW_WIDTH
}

fn default_window_height() -> u32 {
    DEFAULT_WINDOW_HEIGHT
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            icon_color: default_icon_color(),
            window_width: default_window_width(),
            window_height: default_window_height(),
            alarm1: AlarmSettings::default(),
            alarm2: AlarmSettings::default(),
        }
    }
}

impl Settings {
    /// Settings for one slot
    pub fn slot(&self, slot: AlarmSlot) -> &AlarmSettings {
        match slot {
            AlarmSlot::Alarm1 => &self.alarm1,
            AlarmSlot::Alarm2 => &self.alarm2,
        }
    }

    /// Mutable settings for one slot
    pub fn slot_mut(&mut self, slot: AlarmSlot) -> &mut AlarmSettings {
        match slot {
            AlarmSlot::Alarm1 => &mut self.alarm1,
            AlarmSlot::Alarm2 => &mut self.alarm2,
        }
    }

    /// Get the default settings file path
    pub fn settings_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "clocktray", "Clocktray")
            .context("Failed to determine settings directory")?;
        Ok(proj_dirs.config_dir().join("settings.toml"))
    }
}

/// Handle to the settings file. Cheap to clone; every `load` re-reads the
/// file so callers always observe the latest persisted state.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Store backed by the platform config directory
    pub fn at_default_location() -> Result<Self> {
        Ok(Self {
            path: Settings::settings_path()?,
        })
    }

    /// Store backed by an explicit path
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load settings, returning defaults if the file doesn't exist yet
    pub fn load(&self) -> Result<Settings> {
        if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)
                .with_context(|| format!("Failed to read settings file: {:?}", self.path))?;
            let settings: Settings = toml::from_str(&content)
                .with_context(|| format!("Failed to parse settings file: {:?}", self.path))?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to file
    pub fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create settings directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(settings).context("Failed to serialize settings")?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write settings file: {:?}", self.path))?;

        Ok(())
    }
}
