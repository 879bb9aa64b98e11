//! Display information query

use async_trait::async_trait;

/// One display's bounds in global desktop coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayBounds {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

/// One attached display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayInfo {
    pub bounds: DisplayBounds,
    pub is_primary: bool,
}

/// Display enumeration facility. An empty result means no display
/// information is available.
#[async_trait]
pub trait DisplayHost: Send + Sync {
    async fn displays(&self) -> Vec<DisplayInfo>;
}
