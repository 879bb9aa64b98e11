//! Clock window registry
//!
//! Tracks at most one clock window by identity. The tracked reference can
//! go stale when the user or the OS closes the window behind our back;
//! every operation verifies liveness with the window host before acting
//! and treats "not found" as stale, never as an error.

use crate::core::settings::SettingsStore;
use crate::host::display::{DisplayBounds, DisplayHost};
use crate::host::window::{WindowGeometry, WindowHost, WindowId, WindowParams};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

/// Gap between the clock window and the display's bottom-right corner
const SCREEN_EDGE_MARGIN: i32 = 20;

/// Singleton clock window tracker
pub struct WindowRegistry {
    windows: Arc<dyn WindowHost>,
    displays: Arc<dyn DisplayHost>,
    settings: SettingsStore,
    tracked: Mutex<Option<WindowId>>,
}

impl WindowRegistry {
    pub fn new(
        windows: Arc<dyn WindowHost>,
        displays: Arc<dyn DisplayHost>,
        settings: SettingsStore,
    ) -> Self {
        Self {
            windows,
            displays,
            settings,
            tracked: Mutex::new(None),
        }
    }

    /// The currently tracked window, if any
    pub fn tracked(&self) -> Option<WindowId> {
        *self.tracked.lock()
    }

    /// Show the clock window if none exists, close it if one does.
    /// A stale tracked reference counts as "none exists".
    pub async fn toggle(&self) {
        if let Some(id) = self.tracked() {
            if self.windows.get(id).await.is_ok() {
                // Ignore removal failure - the window may have closed
                // between the liveness check and here
                if let Err(e) = self.windows.remove(id).await {
                    debug!(window = %id, "removal failed: {}", e);
                }
                self.clear_tracked(id);
                return;
            }
            debug!(window = %id, "tracked clock window is stale");
            self.clear_tracked(id);
        }
        self.create().await;
    }

    /// Make sure a clock window is present and focused. Unlike `toggle`,
    /// this never removes a window; the alarm path depends on that.
    pub async fn ensure_visible(&self) -> Option<WindowId> {
        if let Some(id) = self.tracked() {
            if self.windows.get(id).await.is_ok() {
                let _ = self.windows.focus(id).await;
                return Some(id);
            }
            debug!(window = %id, "tracked clock window is stale");
            self.clear_tracked(id);
        }
        self.create().await
    }

    /// Create a new clock window anchored to the bottom-right corner of
    /// the primary display. Returns `None` on any failure.
    pub async fn create(&self) -> Option<WindowId> {
        let settings = self.settings.load().unwrap_or_default();
        let (width, height) = (settings.window_width, settings.window_height);

        let displays = self.displays.displays().await;
        let display = displays.iter().find(|d| d.is_primary).or_else(|| displays.first())?;
        let geometry = anchor_bottom_right(display.bounds, width, height);

        let id = self
            .windows
            .create(WindowParams {
                geometry,
                focused: true,
            })
            .await?;
        info!(window = %id, "clock window created");
        *self.tracked.lock() = Some(id);
        Some(id)
    }

    /// React to a window-removed notification from the host. Clears the
    /// tracked reference only when the removed identity matches.
    pub fn handle_removed(&self, id: WindowId) {
        let mut tracked = self.tracked.lock();
        if *tracked == Some(id) {
            debug!(window = %id, "tracked clock window closed externally");
            *tracked = None;
        }
    }

    fn clear_tracked(&self, id: WindowId) {
        let mut tracked = self.tracked.lock();
        if *tracked == Some(id) {
            *tracked = None;
        }
    }
}

/// Position a window of the given size in the bottom-right corner of
/// `bounds`, with a fixed margin, clamped so it never leaves the display.
fn anchor_bottom_right(bounds: DisplayBounds, width: u32, height: u32) -> WindowGeometry {
    let left_offset = (bounds.width as i32 - width as i32 - SCREEN_EDGE_MARGIN).max(0);
    let top_offset = (bounds.height as i32 - height as i32 - SCREEN_EDGE_MARGIN).max(0);
    WindowGeometry {
        left: bounds.left + left_offset,
        top: bounds.top + top_offset,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_bottom_right() {
        let bounds = DisplayBounds {
            left: 0,
            top: 0,
            width: 1920,
            height: 1080,
        };
        let geometry = anchor_bottom_right(bounds, 320, 220);
        assert_eq!(geometry.left, 1920 - 320 - 20);
        assert_eq!(geometry.top, 1080 - 220 - 20);
        assert_eq!(geometry.width, 320);
        assert_eq!(geometry.height, 220);
    }

    #[test]
    fn test_anchor_respects_display_origin() {
        let bounds = DisplayBounds {
            left: 1920,
            top: 100,
            width: 1280,
            height: 720,
        };
        let geometry = anchor_bottom_right(bounds, 320, 220);
        assert_eq!(geometry.left, 1920 + 1280 - 320 - 20);
        assert_eq!(geometry.top, 100 + 720 - 220 - 20);
    }

    #[test]
    fn test_anchor_clamps_on_tiny_display() {
        let bounds = DisplayBounds {
            left: 0,
            top: 0,
            width: 200,
            height: 100,
        };
        let geometry = anchor_bottom_right(bounds, 320, 220);
        assert_eq!(geometry.left, 0);
        assert_eq!(geometry.top, 0);
    }
}
