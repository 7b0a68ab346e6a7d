//! Orbit camera framing the current product model.

/// Damped orbit controls and the camera controller system.
pub mod orbit_controls;
