//! GPU resource ownership.
//!
//! Every mesh, material, image and entity a subsystem creates is tracked in a
//! `ResourceScope` and released in one place when that subsystem is replaced.

/// Monotonic request counter used to reject stale async results.
pub mod generation;

/// Browser object URLs revoked on drop.
pub mod object_url;

/// Resource scopes and the sinks that release them.
pub mod scope;
