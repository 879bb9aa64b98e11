//! Window management facility

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Identity of a host-managed window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowId(pub u32);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Window position and size in display coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowGeometry {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

/// Parameters for creating a clock window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowParams {
    pub geometry: WindowGeometry,
    pub focused: bool,
}

/// A live window known to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowRecord {
    pub id: WindowId,
    pub geometry: WindowGeometry,
}

/// Message dispatched to the clock view hosted in a window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum ViewMessage {
    /// An alarm fired; the view should show its visual indicator for
    /// `duration` seconds.
    AlarmTriggered { duration: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WindowHostError {
    #[error("window {0} not found")]
    NotFound(WindowId),
    #[error("window host unavailable: {0}")]
    Unavailable(String),
}

/// Window management facility consumed by the registry and orchestrator.
///
/// `get` on an unknown id fails with `NotFound`; callers treat that as a
/// stale reference, never as a fatal error.
#[async_trait]
pub trait WindowHost: Send + Sync {
    /// All windows currently attributable to this application
    async fn list_all(&self) -> Vec<WindowRecord>;

    /// Create a window. Returns `None` on any creation failure.
    async fn create(&self, params: WindowParams) -> Option<WindowId>;

    /// Look up a window by identity
    async fn get(&self, id: WindowId) -> Result<WindowRecord, WindowHostError>;

    /// Bring a window to the front
    async fn focus(&self, id: WindowId) -> Result<(), WindowHostError>;

    /// Close a window
    async fn remove(&self, id: WindowId) -> Result<(), WindowHostError>;

    /// Deliver a message to the clock view hosted in a window
    async fn notify_view(&self, id: WindowId, message: ViewMessage) -> Result<(), WindowHostError>;
}
