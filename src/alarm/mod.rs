//! Alarm orchestrator
//!
//! Reacts to timer fire events: resolves the slot's settings, surfaces and
//! focuses the clock window, notifies its clock view, and starts sound
//! playback when the slot is enabled. Also services the command surface
//! (set/clear alarm, stop sound) and re-arms persisted alarms at startup.

use crate::audio::AudioSurfaceManager;
use crate::core::events::{Command, CommandAck};
use crate::core::settings::{AlarmSlot, SettingsStore};
use crate::host::timer::{TimerSchedule, TimerService};
use crate::host::window::{ViewMessage, WindowHost};
use crate::window::WindowRegistry;
use chrono::{DateTime, Local};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Name of the recurring icon-redraw timer. Fires of this timer belong to
/// the icon renderer, not the alarm path.
pub const UPDATE_ICON_TIMER: &str = "update-icon";

/// Cadence of the icon-redraw timer
pub const ICON_REFRESH_PERIOD: Duration = Duration::from_secs(60);

/// Coordinates timers, the clock window, and alarm playback
pub struct AlarmOrchestrator {
    timers: Arc<dyn TimerService>,
    registry: Arc<WindowRegistry>,
    windows: Arc<dyn WindowHost>,
    audio: Arc<AudioSurfaceManager>,
    settings: SettingsStore,
}

impl AlarmOrchestrator {
    pub fn new(
        timers: Arc<dyn TimerService>,
        registry: Arc<WindowRegistry>,
        windows: Arc<dyn WindowHost>,
        audio: Arc<AudioSurfaceManager>,
        settings: SettingsStore,
    ) -> Self {
        Self {
            timers,
            registry,
            windows,
            audio,
            settings,
        }
    }

    /// Register the recurring icon-redraw timer
    pub async fn schedule_icon_refresh(&self) {
        self.timers
            .register(UPDATE_ICON_TIMER, TimerSchedule::Period(ICON_REFRESH_PERIOD))
            .await;
    }

    /// Re-register alarms whose persisted instant is still in the future.
    /// Instants that passed while the daemon was down are dropped rather
    /// than fired late.
    pub async fn rearm_persisted_alarms(&self) {
        let mut settings = match self.settings.load() {
            Ok(s) => s,
            Err(e) => {
                warn!("failed to load settings, skipping alarm re-arm: {:#}", e);
                return;
            }
        };

        let mut dropped_stale = false;
        for slot in AlarmSlot::all() {
            let Some(when) = settings.slot(slot).when else {
                continue;
            };
            if when > Local::now() {
                info!(alarm = slot.timer_name(), %when, "re-arming persisted alarm");
                self.timers
                    .register(slot.timer_name(), TimerSchedule::At(when))
                    .await;
            } else {
                debug!(alarm = slot.timer_name(), %when, "dropping alarm that expired while down");
                settings.slot_mut(slot).when = None;
                dropped_stale = true;
            }
        }

        if dropped_stale {
            if let Err(e) = self.settings.save(&settings) {
                warn!("failed to persist cleared alarms: {:#}", e);
            }
        }
    }

    /// Handle a timer fire event. Icon-update fires are ignored here;
    /// alarm fires surface the clock window and start playback.
    pub async fn handle_timer_fired(&self, name: &str) {
        if name == UPDATE_ICON_TIMER {
            return;
        }

        let slot = AlarmSlot::from_timer_name(name);
        let alarm = self.settings.load().unwrap_or_default().slot(slot).clone();
        info!(alarm = name, enabled = alarm.enabled, "alarm fired");

        // Window first, then sound; a missing window or view only skips
        // the visual indicator
        if let Some(id) = self.registry.ensure_visible().await {
            let _ = self.windows.focus(id).await;
            if let Err(e) = self
                .windows
                .notify_view(
                    id,
                    ViewMessage::AlarmTriggered {
                        duration: alarm.duration,
                    },
                )
                .await
            {
                debug!(window = %id, "no clock view to notify: {}", e);
            }
        }

        if alarm.enabled {
            if let Err(e) = self.audio.play(&alarm.sound, alarm.duration).await {
                warn!(alarm = name, "alarm playback failed: {}", e);
            }
        }
    }

    /// Handle an inbound UI command, returning its acknowledgment
    pub async fn handle_command(&self, command: Command) -> CommandAck {
        match command {
            Command::SetAlarm { alarm_name, when } => {
                let slot = AlarmSlot::from_timer_name(&alarm_name);
                self.timers
                    .register(slot.timer_name(), TimerSchedule::At(when))
                    .await;
                self.persist_when(slot, Some(when));
                CommandAck::new("Alarm set")
            }
            Command::ClearAlarm { alarm_name } => {
                let slot = AlarmSlot::from_timer_name(&alarm_name);
                self.timers.cancel(slot.timer_name()).await;
                self.persist_when(slot, None);
                CommandAck::new("Alarm cleared")
            }
            Command::StopAlarmSound => {
                if let Err(e) = self.audio.stop().await {
                    warn!("failed to stop alarm sound: {}", e);
                }
                CommandAck::new("Sound stopped")
            }
        }
    }

    /// Persist a slot's scheduled instant so it survives daemon restarts
    fn persist_when(&self, slot: AlarmSlot, when: Option<DateTime<Local>>) {
        let result = self.settings.load().and_then(|mut settings| {
            settings.slot_mut(slot).when = when;
            self.settings.save(&settings)
        });
        if let Err(e) = result {
            warn!(alarm = slot.timer_name(), "failed to persist alarm schedule: {:#}", e);
        }
    }
}
