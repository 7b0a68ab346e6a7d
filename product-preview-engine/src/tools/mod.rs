//! Measurement tools for the product preview.
//!
//! Resolves product dimensions, draws dimension indicators around the model
//! and keeps their labels pinned to world-space anchors.
//!
//! ## Dimension Precedence
//!
//! Dimensions supplied by the host always win. Without them the raw model
//! extent is converted through the assumed authoring unit, which is
//! persisted per model URL:
//!
//! ```text
//! set_dimensions(Some) ──> authoritative mm
//! set_dimensions(None) ──> raw bounds × assumed unit ──> computed mm
//! ```

/// Length units, formatting and dimension resolution.
pub mod dimensions;

/// World-anchored UI labels projected through the viewer camera.
pub mod labels;

/// Dimension indicators and the measurement overlay lifecycle.
pub mod measure;

/// Persisted assumed-unit preference per model URL.
///
/// Backed by `localStorage` in the browser and a JSON file natively.
pub mod unit_store;
