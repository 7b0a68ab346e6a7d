use crate::engine::assets::loaded_model::LoadedModel;
use crate::engine::assets::model_asset::ModelFormat;
use crate::engine::loading::error::LoadError;
use crate::engine::loading::fbx::{extract_meshes, is_binary_fbx, parse_fbx};
use crate::engine::loading::fetch::fetch_with_fallback;
use crate::engine::loading::gltf_loader::{is_glb, load_gltf};
use crate::engine::resources::object_url::PendingObjectUrls;
use bevy::prelude::*;

fn looks_like_json(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'{')
}

/// Whether the payload plausibly belongs to `format`; used when the URL gave no hint.
fn payload_matches(format: ModelFormat, bytes: &[u8]) -> bool {
    match format {
        ModelFormat::Fbx => is_binary_fbx(bytes),
        ModelFormat::Gltf | ModelFormat::Glb => is_glb(bytes) || looks_like_json(bytes),
    }
}

async fn parse_as(
    url: &str,
    format: ModelFormat,
    bytes: &[u8],
    pending: &PendingObjectUrls,
) -> Result<LoadedModel, LoadError> {
    let (format, meshes) = match format {
        ModelFormat::Fbx => {
            let document = parse_fbx(bytes).map_err(|e| LoadError::parse(url, format, e))?;
            let meshes = extract_meshes(&document).map_err(|e| LoadError::parse(url, format, e))?;
            (ModelFormat::Fbx, meshes)
        }
        ModelFormat::Gltf | ModelFormat::Glb => {
            let actual = if is_glb(bytes) {
                ModelFormat::Glb
            } else {
                ModelFormat::Gltf
            };
            (actual, load_gltf(url, bytes, pending).await?)
        }
    };

    let model = LoadedModel::new(format, meshes);
    if model.is_empty() || !model.raw_bounds.is_valid() {
        return Err(LoadError::parse(url, format, "no renderable geometry"));
    }
    Ok(model)
}

/// Parse already-fetched bytes, dispatching on the URL's format candidates.
pub async fn parse_model(
    url: &str,
    bytes: &[u8],
    pending: &PendingObjectUrls,
) -> Result<LoadedModel, LoadError> {
    if let Some(format) = ModelFormat::from_url(url) {
        return parse_as(url, format, bytes, pending).await;
    }

    for format in ModelFormat::candidates(url) {
        if payload_matches(format, bytes) {
            debug!("{} has no known extension; parsing as {}", url, format);
            return parse_as(url, format, bytes, pending).await;
        }
    }
    Err(LoadError::UnsupportedFormat {
        url: url.to_string(),
    })
}

/// Fetch and parse a model. The blob fallback is only tried for formats that allow it.
pub async fn load_model(url: &str, pending: &PendingObjectUrls) -> Result<LoadedModel, LoadError> {
    let allow_blob = ModelFormat::candidates(url)
        .first()
        .is_some_and(|format| format.supports_blob_fallback());
    let bytes = fetch_with_fallback(url, allow_blob, pending).await?;
    info!("Fetched {} ({} bytes)", url, bytes.len());
    parse_model(url, &bytes, pending).await
}
