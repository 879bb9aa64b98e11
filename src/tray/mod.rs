//! System tray icon and menu

pub mod icon;

use crate::core::events::{AppEvent, EventSender};
use crate::core::settings::SettingsStore;
use anyhow::{Context, Result};
use chrono::{Local, Timelike};
use tray_icon::{
    menu::{Menu, MenuEvent, MenuId, MenuItem, PredefinedMenuItem},
    MouseButton, MouseButtonState, TrayIcon as TrayIconHandle, TrayIconBuilder, TrayIconEvent,
};
use tracing::{debug, error, info};

/// Tray actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayAction {
    /// Show the clock window if hidden, close it if shown
    ToggleClockWindow,
    /// Set alarm-1 five minutes from now
    QuickAlarm,
    /// Silence alarm playback
    StopAlarmSound,
    /// Quit the daemon
    Quit,
}

/// Tray manager. Must live on the main thread.
pub struct TrayManager {
    tray: TrayIconHandle,
    settings: SettingsStore,
}

impl TrayManager {
    /// Create the tray icon with its menu and start the event forwarding
    /// threads
    pub fn new(event_tx: EventSender, settings: SettingsStore) -> Result<Self> {
        let menu = Menu::new();

        let toggle_item = MenuItem::new("Show/Hide Clock", true, None);
        let toggle_id = toggle_item.id().clone();

        let quick_alarm_item = MenuItem::new("Alarm in 5 Minutes", true, None);
        let quick_alarm_id = quick_alarm_item.id().clone();

        let stop_item = MenuItem::new("Stop Alarm Sound", true, None);
        let stop_id = stop_item.id().clone();

        let quit_item = MenuItem::new("Quit", true, None);
        let quit_id = quit_item.id().clone();

        menu.append(&toggle_item)?;
        menu.append(&PredefinedMenuItem::separator())?;
        menu.append(&quick_alarm_item)?;
        menu.append(&stop_item)?;
        menu.append(&PredefinedMenuItem::separator())?;
        menu.append(&quit_item)?;

        let now = Local::now();
        let initial_icon = icon::clock_face_icon(
            now.hour(),
            now.minute(),
            current_icon_color(&settings),
        )
        .context("Failed to render initial tray icon")?;

        let tray = TrayIconBuilder::new()
            .with_menu(Box::new(menu))
            .with_tooltip(format!("Clocktray - {}", now.format("%H:%M")))
            .with_icon(initial_icon)
            .build()
            .context("Failed to create tray icon")?;

        info!("Tray icon created");

        let manager = Self { tray, settings };
        manager.start_menu_handler(event_tx.clone(), toggle_id, quick_alarm_id, stop_id, quit_id);
        manager.start_click_handler(event_tx);

        Ok(manager)
    }

    /// Forward menu events to the application event channel
    fn start_menu_handler(
        &self,
        event_tx: EventSender,
        toggle_id: MenuId,
        quick_alarm_id: MenuId,
        stop_id: MenuId,
        quit_id: MenuId,
    ) {
        std::thread::spawn(move || {
            let receiver = MenuEvent::receiver();

            loop {
                if let Ok(event) = receiver.recv() {
                    debug!("Menu event: {:?}", event);

                    let action = if event.id == toggle_id {
                        Some(TrayAction::ToggleClockWindow)
                    } else if event.id == quick_alarm_id {
                        Some(TrayAction::QuickAlarm)
                    } else if event.id == stop_id {
                        Some(TrayAction::StopAlarmSound)
                    } else if event.id == quit_id {
                        Some(TrayAction::Quit)
                    } else {
                        None
                    };

                    if let Some(action) = action {
                        if let Err(e) = event_tx.send(AppEvent::TrayAction(action)) {
                            error!("Failed to send tray action: {}", e);
                        }
                    }
                }
            }
        });
    }

    /// A plain left click on the tray icon toggles the clock window
    fn start_click_handler(&self, event_tx: EventSender) {
        std::thread::spawn(move || {
            let receiver = TrayIconEvent::receiver();

            loop {
                if let Ok(event) = receiver.recv() {
                    if let TrayIconEvent::Click {
                        button: MouseButton::Left,
                        button_state: MouseButtonState::Up,
                        ..
                    } = event
                    {
                        if let Err(e) =
                            event_tx.send(AppEvent::TrayAction(TrayAction::ToggleClockWindow))
                        {
                            error!("Failed to send tray action: {}", e);
                        }
                    }
                }
            }
        });
    }

    /// Redraw the clock face for the current local time
    pub fn refresh_clock_face(&mut self) {
        let now = Local::now();
        let color = current_icon_color(&self.settings);

        match icon::clock_face_icon(now.hour(), now.minute(), color) {
            Ok(new_icon) => {
                if let Err(e) = self.tray.set_icon(Some(new_icon)) {
                    error!("Failed to set tray icon: {}", e);
                }
                if let Err(e) = self
                    .tray
                    .set_tooltip(Some(format!("Clocktray - {}", now.format("%H:%M"))))
                {
                    error!("Failed to set tray tooltip: {}", e);
                }
            }
            Err(e) => debug!("skipping icon redraw: {:#}", e),
        }
    }
}

/// Persisted icon color, falling back to white
fn current_icon_color(settings: &SettingsStore) -> [u8; 3] {
    settings
        .load()
        .ok()
        .and_then(|s| icon::parse_icon_color(&s.icon_color))
        .unwrap_or(icon::FALLBACK_COLOR)
}
