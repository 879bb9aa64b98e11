//! Core module - configuration, settings, and event definitions

pub mod config;
pub mod events;
pub mod settings;
