//! Data describing product models and the viewer mount.
//!
//! Holds model formats and bounds, the CPU-side parse result handed to the
//! scene, and the JSON manifest a host page mounts the viewer with.

/// Axis-aligned bounds in model or world space.
pub mod bounds;

/// Parsed meshes, materials and textures before GPU upload.
pub mod loaded_model;

/// Model URL, detected format and assumed authoring unit.
///
/// Format detection ignores query strings so signed storage URLs resolve like plain paths.
pub mod model_asset;

/// Initial mount manifest loaded from JSON.
pub mod viewer_manifest;
