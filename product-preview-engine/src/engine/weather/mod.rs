//! Weather presets and the environment they drive.
//!
//! A preset maps to a fixed lighting, fog, background and rain recipe. The
//! controller applies a recipe only when the preset or its sky image changes.

/// Weather transitions and skybox attachment.
pub mod controller;

/// Falling streak simulation with a fixed particle pool.
pub mod rain;

/// Rain line mesh ownership and per-frame updates.
pub mod rain_system;

/// Lighting, fog and colour values per weather state.
pub mod recipe;

/// Weather states and per-state sky image URLs.
pub mod state;
