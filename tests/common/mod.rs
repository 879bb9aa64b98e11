//! Mock host facilities shared by the integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use clocktray::core::events::{AppEvent, EventSender};
use clocktray::core::settings::SettingsStore;
use clocktray::host::audio::{AudioError, AudioHost, AudioMessage};
use clocktray::host::display::{DisplayBounds, DisplayHost, DisplayInfo};
use clocktray::host::timer::{TimerSchedule, TimerService};
use clocktray::host::window::{
    ViewMessage, WindowGeometry, WindowHost, WindowHostError, WindowId, WindowParams, WindowRecord,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use tempfile::TempDir;

/// Settings store backed by a throwaway directory
pub fn temp_settings() -> (TempDir, SettingsStore) {
    let dir = TempDir::new().expect("temp dir");
    let store = SettingsStore::new(dir.path().join("settings.toml"));
    (dir, store)
}

/// In-memory window host that records every call
#[derive(Default)]
pub struct MockWindowHost {
    next_id: AtomicU32,
    windows: Mutex<HashMap<u32, WindowGeometry>>,
    pub created: Mutex<Vec<WindowParams>>,
    pub focused: Mutex<Vec<WindowId>>,
    pub removed: Mutex<Vec<WindowId>>,
    pub notified: Mutex<Vec<(WindowId, ViewMessage)>>,
    pub fail_create: AtomicBool,
}

impl MockWindowHost {
    pub fn window_count(&self) -> usize {
        self.windows.lock().len()
    }

    pub fn contains(&self, id: WindowId) -> bool {
        self.windows.lock().contains_key(&id.0)
    }

    /// Drop a window without going through `remove`, as if the user
    /// closed it from the desktop
    pub fn close_externally(&self, id: WindowId) {
        self.windows.lock().remove(&id.0);
    }
}

#[async_trait]
impl WindowHost for MockWindowHost {
    async fn list_all(&self) -> Vec<WindowRecord> {
        self.windows
            .lock()
            .iter()
            .map(|(id, geometry)| WindowRecord {
                id: WindowId(*id),
                geometry: *geometry,
            })
            .collect()
    }

    async fn create(&self, params: WindowParams) -> Option<WindowId> {
        self.created.lock().push(params);
        if self.fail_create.load(Ordering::SeqCst) {
            return None;
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.windows.lock().insert(id, params.geometry);
        Some(WindowId(id))
    }

    async fn get(&self, id: WindowId) -> Result<WindowRecord, WindowHostError> {
        self.windows
            .lock()
            .get(&id.0)
            .map(|geometry| WindowRecord {
                id,
                geometry: *geometry,
            })
            .ok_or(WindowHostError::NotFound(id))
    }

    async fn focus(&self, id: WindowId) -> Result<(), WindowHostError> {
        if !self.contains(id) {
            return Err(WindowHostError::NotFound(id));
        }
        self.focused.lock().push(id);
        Ok(())
    }

    async fn remove(&self, id: WindowId) -> Result<(), WindowHostError> {
        if self.windows.lock().remove(&id.0).is_none() {
            return Err(WindowHostError::NotFound(id));
        }
        self.removed.lock().push(id);
        Ok(())
    }

    async fn notify_view(&self, id: WindowId, message: ViewMessage) -> Result<(), WindowHostError> {
        if !self.contains(id) {
            return Err(WindowHostError::NotFound(id));
        }
        self.notified.lock().push((id, message));
        Ok(())
    }
}

/// Fixed display list
pub struct MockDisplayHost {
    pub displays: Vec<DisplayInfo>,
}

impl MockDisplayHost {
    /// A single 1920x1080 primary display at the desktop origin
    pub fn single_primary() -> Self {
        Self {
            displays: vec![DisplayInfo {
                bounds: DisplayBounds {
                    left: 0,
                    top: 0,
                    width: 1920,
                    height: 1080,
                },
                is_primary: true,
            }],
        }
    }

    pub fn none() -> Self {
        Self { displays: vec![] }
    }
}

#[async_trait]
impl DisplayHost for MockDisplayHost {
    async fn displays(&self) -> Vec<DisplayInfo> {
        self.displays.clone()
    }
}

/// Timer service that records registrations instead of scheduling
#[derive(Default)]
pub struct MockTimerService {
    pub registered: Mutex<Vec<(String, TimerSchedule)>>,
    pub cancelled: Mutex<Vec<String>>,
}

#[async_trait]
impl TimerService for MockTimerService {
    async fn register(&self, name: &str, schedule: TimerSchedule) {
        self.registered.lock().push((name.to_string(), schedule));
    }

    async fn cancel(&self, name: &str) {
        self.cancelled.lock().push(name.to_string());
    }
}

/// Audio surface host with scripted existence, creation outcome, and
/// ready signalling
pub struct MockAudioHost {
    exists: AtomicBool,
    fail_create: AtomicBool,
    signal_ready: AtomicBool,
    pub creations: AtomicUsize,
    pub sent: Mutex<Vec<AudioMessage>>,
    events: Option<EventSender>,
}

impl MockAudioHost {
    pub fn new() -> Self {
        Self {
            exists: AtomicBool::new(false),
            fail_create: AtomicBool::new(false),
            signal_ready: AtomicBool::new(true),
            creations: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
            events: None,
        }
    }

    /// Host that announces surface readiness through `events`
    pub fn with_events(events: EventSender) -> Self {
        Self {
            events: Some(events),
            ..Self::new()
        }
    }

    pub fn set_exists(&self, exists: bool) {
        self.exists.store(exists, Ordering::SeqCst);
    }

    pub fn set_fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn set_signal_ready(&self, signal: bool) {
        self.signal_ready.store(signal, Ordering::SeqCst);
    }

    pub fn creation_count(&self) -> usize {
        self.creations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioHost for MockAudioHost {
    async fn has_surface(&self) -> bool {
        self.exists.load(Ordering::SeqCst)
    }

    async fn create_surface(&self) -> Result<(), AudioError> {
        self.creations.fetch_add(1, Ordering::SeqCst);
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(AudioError::CreationFailed("scripted failure".to_string()));
        }
        self.exists.store(true, Ordering::SeqCst);
        if self.signal_ready.load(Ordering::SeqCst) {
            if let Some(events) = &self.events {
                let _ = events.send(AppEvent::AudioSurfaceReady);
            }
        }
        Ok(())
    }

    async fn send(&self, message: AudioMessage) -> Result<(), AudioError> {
        self.sent.lock().push(message);
        Ok(())
    }
}
