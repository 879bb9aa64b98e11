//! Host facility seams
//!
//! The scheduling core talks to the desktop through these traits: named
//! timers, window management, display enumeration, and the audio surface.
//! The binary wires real implementations (winit, rodio, tokio timers);
//! tests substitute in-memory fakes.

pub mod audio;
pub mod display;
pub mod timer;
pub mod window;

pub use audio::{AudioCommand, AudioError, AudioHost, AudioMessage, AudioTarget};
pub use display::{DisplayBounds, DisplayHost, DisplayInfo};
pub use timer::{TimerSchedule, TimerService, TokioTimerService};
pub use window::{
    ViewMessage, WindowGeometry, WindowHost, WindowHostError, WindowId, WindowParams, WindowRecord,
};
