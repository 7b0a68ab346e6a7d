//! Asset loading for product models and the mount manifest.
//!
//! Fetches model bytes off the frame loop, parses FBX and glTF/GLB into
//! CPU-side meshes, and attaches the newest result to the scene while
//! discarding superseded ones.

/// Typed failures for fetching and parsing models.
pub mod error;

/// Binary FBX node reader and geometry extraction.
pub mod fbx;

/// Byte fetching for URLs and local paths with the query-less blob fallback.
pub mod fetch;

/// glTF and GLB parsing through the `gltf` crate.
///
/// Relative buffer and image URIs are resolved against the model's own directory.
pub mod gltf_loader;

/// Mount manifest loading and command seeding.
pub mod manifest_loader;

/// Format dispatch and content sniffing for extensionless URLs.
pub mod model_loader;

/// Model load requests, attachment and the assumed unit override.
pub mod model_spawner;

/// Loading progress flags and the on-screen loading indicator.
pub mod progress;

/// Background task spawning and the inbox results are posted to.
pub mod tasks;
