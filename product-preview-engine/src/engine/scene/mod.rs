//! Scene lighting, sky and model placement.

/// Sun, fill and rim lights driven by the weather recipe.
pub mod lighting;

/// Uniform scale and ground placement for loaded models.
pub mod normalize;

/// Equirectangular sky images baked into cubemaps.
///
/// Decoding and face projection run on the CPU before the single GPU upload.
pub mod skybox;
