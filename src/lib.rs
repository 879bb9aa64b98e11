//! Clocktray - desktop alarm clock companion
//!
//! A background daemon that keeps a clock-face icon in the system tray,
//! manages a single popup clock window, and rings two named alarms
//! ("alarm-1" / "alarm-2") at scheduled instants.
//!
//! # Features
//! - Clock-face tray icon redrawn every minute
//! - Singleton popup clock window anchored to the primary display
//! - Two persisted alarm slots with per-alarm sound and ring duration
//! - Looping alarm playback on a lazily created audio surface
//! - Alarms survive daemon restarts (re-armed from persisted settings)

pub mod alarm;
pub mod audio;
pub mod core;
pub mod host;
pub mod tray;
pub mod window;

pub use alarm::AlarmOrchestrator;
pub use audio::AudioSurfaceManager;
pub use core::config::Config;
pub use core::events::{AppEvent, Command, CommandAck, CommandHandle, EventSender};
pub use core::settings::{AlarmSettings, AlarmSlot, Settings, SettingsStore};
pub use window::WindowRegistry;
