//! Core application setup and state management.
//!
//! Handles application lifecycle, window configuration, the device
//! performance profile and the host command queue for both native and WASM
//! targets.

/// Application setup and plugin configuration for the Bevy engine.
///
/// Creates the main app with the render loop, manifest loading and RPC bridge.
pub mod app_setup;

/// Viewer phase state machine.
pub mod app_state;

/// Host commands and the queue they are drained from once per frame.
pub mod commands;

/// Device-tier render settings derived from core count and pixel ratio.
///
/// Decides shadow resolution, antialiasing, rim lights and the rain particle budget.
pub mod performance_profile;

/// Host-facing viewer inputs and their dirty flags.
pub mod viewer_state;

/// Platform-specific window configuration for native and WASM builds.
///
/// Configures canvas integration for web targets and the pixel ratio override.
pub mod window_config;
