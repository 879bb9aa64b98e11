//! Application event and command surface definitions

use crate::host::window::WindowId;
use crate::tray::TrayAction;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

/// Sender for application events - wraps a tokio unbounded channel consumed
/// by the async dispatch loop.
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl EventSender {
    pub fn new(tx: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self { tx }
    }

    pub fn send(&self, event: AppEvent) -> Result<(), mpsc::error::SendError<AppEvent>> {
        self.tx.send(event)
    }
}

/// Application-wide events for inter-module communication
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// A registered timer reached its target time
    TimerFired { name: String },

    /// A clock window was closed (by us or externally by the user/OS)
    WindowRemoved { id: WindowId },

    /// The audio surface finished initializing and can receive commands
    AudioSurfaceReady,

    /// Tray menu or icon action triggered
    TrayAction(TrayAction),
}

/// Inbound requests from UI surfaces, acknowledged synchronously
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Command {
    /// Schedule a named alarm at an absolute instant
    #[serde(rename_all = "camelCase")]
    SetAlarm {
        alarm_name: String,
        when: DateTime<Local>,
    },

    /// Cancel a named alarm
    #[serde(rename_all = "camelCase")]
    ClearAlarm { alarm_name: String },

    /// Silence alarm playback immediately
    StopAlarmSound,
}

/// Acknowledgment returned for every command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandAck {
    pub status: String,
}

impl CommandAck {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
        }
    }
}

/// A command paired with its acknowledgment channel
pub type CommandRequest = (Command, oneshot::Sender<CommandAck>);

/// Handle for submitting commands to the running daemon
#[derive(Clone)]
pub struct CommandHandle {
    tx: mpsc::UnboundedSender<CommandRequest>,
}

impl CommandHandle {
    /// Submit a command and wait for its acknowledgment.
    /// Returns `None` if the daemon is shutting down.
    pub async fn submit(&self, command: Command) -> Option<CommandAck> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx.send((command, ack_tx)).ok()?;
        ack_rx.await.ok()
    }
}

/// Create the command channel pair
pub fn command_channel() -> (CommandHandle, mpsc::UnboundedReceiver<CommandRequest>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (CommandHandle { tx }, rx)
}
