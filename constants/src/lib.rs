//! Shared tuning constants for the product preview engine.

pub mod measurement;
pub mod path;
pub mod rain;
pub mod render_settings;
