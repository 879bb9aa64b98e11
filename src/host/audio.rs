//! Audio surface facility and its message protocol

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Routing target carried on every surface-bound message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioTarget {
    Offscreen,
}

/// Playback command understood by the audio surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum AudioCommand {
    /// Loop `sound` for `duration` seconds, then silence automatically
    PlayAlarmSound { sound: String, duration: u64 },
    /// Silence immediately and cancel any pending auto-stop
    StopAlarmSound,
}

/// Envelope for surface-bound messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioMessage {
    pub target: AudioTarget,
    #[serde(flatten)]
    pub command: AudioCommand,
}

impl AudioMessage {
    pub fn play(sound: impl Into<String>, duration: u64) -> Self {
        Self {
            target: AudioTarget::Offscreen,
            command: AudioCommand::PlayAlarmSound {
                sound: sound.into(),
                duration,
            },
        }
    }

    pub fn stop() -> Self {
        Self {
            target: AudioTarget::Offscreen,
            command: AudioCommand::StopAlarmSound,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AudioError {
    #[error("audio surface creation failed: {0}")]
    CreationFailed(String),
    #[error("audio surface did not signal ready within {0:?}")]
    ReadyTimeout(Duration),
    #[error("audio surface unreachable: {0}")]
    Unreachable(String),
}

/// Audio surface facility.
///
/// The surface's lifetime is owned by the host and may outlive or predate
/// the orchestrating process, so existence is discovered with `has_surface`
/// on every call rather than cached. `create_surface` only starts creation;
/// the surface signals readiness separately with
/// `AppEvent::AudioSurfaceReady` once its playback element is initialized.
#[async_trait]
pub trait AudioHost: Send + Sync {
    async fn has_surface(&self) -> bool;
    async fn create_surface(&self) -> Result<(), AudioError>;
    async fn send(&self, message: AudioMessage) -> Result<(), AudioError>;
}
