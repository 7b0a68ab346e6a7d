use crate::engine::assets::loaded_model::{
    LoadedMaterial, LoadedMesh, LoadedTexture, TextureColorSpace,
};
use crate::engine::assets::model_asset::{ModelFormat, resolve_side_file};
use crate::engine::loading::error::LoadError;
use crate::engine::loading::fetch::{decode_data_uri, fetch_with_fallback};
use crate::engine::resources::object_url::PendingObjectUrls;
use bevy::prelude::*;
use gltf::Gltf;
use std::collections::{HashMap, HashSet};

const GLB_MAGIC: &[u8] = b"glTF";

pub fn is_glb(bytes: &[u8]) -> bool {
    bytes.starts_with(GLB_MAGIC)
}

/// Point relative `buffers[].uri` and `images[].uri` at the document's own directory.
pub fn rewrite_relative_uris(document: &mut serde_json::Value, document_url: &str) -> usize {
    let mut rewritten = 0;
    for section in ["buffers", "images"] {
        let Some(entries) = document.get_mut(section).and_then(|v| v.as_array_mut()) else {
            continue;
        };
        for entry in entries {
            let Some(uri) = entry.get("uri").and_then(|u| u.as_str()) else {
                continue;
            };
            let resolved = resolve_side_file(document_url, uri);
            if resolved != uri {
                entry["uri"] = serde_json::Value::String(resolved);
                rewritten += 1;
            }
        }
    }
    rewritten
}

fn parse_document(url: &str, bytes: &[u8]) -> Result<Gltf, LoadError> {
    let format = if is_glb(bytes) {
        ModelFormat::Glb
    } else {
        ModelFormat::Gltf
    };

    if format == ModelFormat::Glb {
        return Gltf::from_slice(bytes).map_err(|e| LoadError::parse(url, format, e));
    }

    let mut json: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| LoadError::parse(url, format, e))?;
    let rewritten = rewrite_relative_uris(&mut json, url);
    if rewritten > 0 {
        debug!("Rewrote {} side-file URIs in {}", rewritten, url);
    }
    let normalised = serde_json::to_vec(&json).map_err(|e| LoadError::parse(url, format, e))?;
    Gltf::from_slice(&normalised).map_err(|e| LoadError::parse(url, format, e))
}

async fn fetch_uri(
    document_url: &str,
    uri: &str,
    pending: &PendingObjectUrls,
) -> Result<Vec<u8>, LoadError> {
    if uri.starts_with("data:") {
        return decode_data_uri(uri)
            .ok_or_else(|| LoadError::parse(document_url, ModelFormat::Gltf, "bad data URI"));
    }
    fetch_with_fallback(&resolve_side_file(document_url, uri), false, pending).await
}

async fn load_buffers(
    url: &str,
    gltf: &Gltf,
    pending: &PendingObjectUrls,
) -> Result<Vec<Vec<u8>>, LoadError> {
    let mut buffers = Vec::new();
    for buffer in gltf.buffers() {
        let mut data = match buffer.source() {
            gltf::buffer::Source::Bin => gltf.blob.clone().ok_or_else(|| {
                LoadError::parse(url, ModelFormat::Glb, "missing binary chunk")
            })?,
            gltf::buffer::Source::Uri(uri) => fetch_uri(url, uri, pending).await?,
        };
        if data.len() < buffer.length() {
            return Err(LoadError::parse(
                url,
                ModelFormat::Gltf,
                format!("buffer {} is shorter than declared", buffer.index()),
            ));
        }
        // Padding beyond the declared length is allowed by the format.
        data.truncate(buffer.length());
        buffers.push(data);
    }
    Ok(buffers)
}

/// Bytes of a buffer view, or `None` when the range does not fit the buffer.
fn buffer_view_slice(
    buffers: &[Vec<u8>],
    buffer: usize,
    offset: usize,
    length: usize,
) -> Option<&[u8]> {
    let end = offset.checked_add(length)?;
    buffers.get(buffer)?.get(offset..end)
}

/// Images referenced as colour maps by any material.
fn colour_map_images(gltf: &Gltf) -> HashSet<usize> {
    let mut used = HashSet::new();
    for material in gltf.materials() {
        if let Some(info) = material.pbr_metallic_roughness().base_color_texture() {
            used.insert(info.texture().source().index());
        }
        if let Some(info) = material.emissive_texture() {
            used.insert(info.texture().source().index());
        }
    }
    used
}

async fn load_textures(
    url: &str,
    gltf: &Gltf,
    buffers: &[Vec<u8>],
    pending: &PendingObjectUrls,
) -> HashMap<usize, LoadedTexture> {
    let used = colour_map_images(gltf);
    let mut textures = HashMap::new();

    for image in gltf.images().filter(|image| used.contains(&image.index())) {
        let encoded = match image.source() {
            gltf::image::Source::View { view, .. } => {
                let slice = buffer_view_slice(
                    buffers,
                    view.buffer().index(),
                    view.offset(),
                    view.length(),
                );
                if slice.is_none() {
                    warn!("Texture {} points outside its buffer", image.index());
                }
                slice.map(<[u8]>::to_vec)
            }
            gltf::image::Source::Uri { uri, .. } => match fetch_uri(url, uri, pending).await {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    warn!("Texture {} unavailable: {}", image.index(), e);
                    None
                }
            },
        };

        let Some(encoded) = encoded else {
            continue;
        };
        match image::load_from_memory(&encoded) {
            Ok(decoded) => {
                let rgba = decoded.to_rgba8();
                textures.insert(
                    image.index(),
                    LoadedTexture {
                        width: rgba.width(),
                        height: rgba.height(),
                        rgba: rgba.into_raw(),
                        color_space: TextureColorSpace::Srgb,
                    },
                );
            }
            Err(e) => warn!("Texture {} could not be decoded: {}", image.index(), e),
        }
    }
    textures
}

fn read_material(
    material: gltf::Material<'_>,
    textures: &HashMap<usize, LoadedTexture>,
) -> LoadedMaterial {
    let pbr = material.pbr_metallic_roughness();
    let texture_for = |info: Option<gltf::texture::Info<'_>>| {
        info.and_then(|info| textures.get(&info.texture().source().index()).cloned())
    };
    LoadedMaterial {
        base_color: pbr.base_color_factor(),
        metallic: pbr.metallic_factor(),
        roughness: pbr.roughness_factor(),
        emissive: material.emissive_factor(),
        base_color_texture: texture_for(pbr.base_color_texture()),
        emissive_texture: texture_for(material.emissive_texture()),
        double_sided: material.double_sided(),
        alpha_blend: material.alpha_mode() == gltf::material::AlphaMode::Blend,
    }
}

fn collect_node(
    node: gltf::Node<'_>,
    parent: Mat4,
    buffers: &[Vec<u8>],
    textures: &HashMap<usize, LoadedTexture>,
    out: &mut Vec<LoadedMesh>,
) {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        let name = mesh
            .name()
            .or(node.name())
            .unwrap_or("mesh")
            .to_string();
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                continue;
            }
            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(Vec::as_slice));
            let Some(positions) = reader.read_positions() else {
                continue;
            };
            let positions: Vec<[f32; 3]> = positions.collect();
            let normals = reader
                .read_normals()
                .map(|n| n.collect())
                .unwrap_or_default();
            let uvs = reader
                .read_tex_coords(0)
                .map(|uv| uv.into_f32().collect());
            let indices = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };

            out.push(LoadedMesh {
                name: name.clone(),
                positions,
                normals,
                uvs,
                indices,
                transform: world,
                material: read_material(primitive.material(), textures),
            });
        }
    }

    for child in node.children() {
        collect_node(child, world, buffers, textures, out);
    }
}

/// Parse a glTF or GLB document and resolve everything it references.
pub async fn load_gltf(
    url: &str,
    bytes: &[u8],
    pending: &PendingObjectUrls,
) -> Result<Vec<LoadedMesh>, LoadError> {
    let gltf = parse_document(url, bytes)?;
    let buffers = load_buffers(url, &gltf, pending).await?;
    let textures = load_textures(url, &gltf, &buffers, pending).await;

    let mut meshes = Vec::new();
    match gltf.default_scene().or_else(|| gltf.scenes().next()) {
        Some(scene) => {
            for node in scene.nodes() {
                collect_node(node, Mat4::IDENTITY, &buffers, &textures, &mut meshes);
            }
        }
        None => {
            let roots: Vec<_> = gltf.nodes().collect();
            let children: HashSet<usize> = roots
                .iter()
                .flat_map(|n| n.children().map(|c| c.index()))
                .collect();
            for node in roots.into_iter().filter(|n| !children.contains(&n.index())) {
                collect_node(node, Mat4::IDENTITY, &buffers, &textures, &mut meshes);
            }
        }
    }

    if meshes.is_empty() {
        let format = if is_glb(bytes) {
            ModelFormat::Glb
        } else {
            ModelFormat::Gltf
        };
        return Err(LoadError::parse(url, format, "document contains no triangle meshes"));
    }
    Ok(meshes)
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Minimal GLB writer for fixtures.

    /// A single-triangle-list box of the given size with a node scale applied.
    pub fn box_glb(size: [f32; 3], node_scale: f32) -> Vec<u8> {
        let [w, h, d] = size;
        let corners: [[f32; 3]; 8] = [
            [0.0, 0.0, 0.0],
            [w, 0.0, 0.0],
            [w, h, 0.0],
            [0.0, h, 0.0],
            [0.0, 0.0, d],
            [w, 0.0, d],
            [w, h, d],
            [0.0, h, d],
        ];
        let indices: [u16; 36] = [
            0, 2, 1, 0, 3, 2, 4, 5, 6, 4, 6, 7, 0, 1, 5, 0, 5, 4, 1, 2, 6, 1, 6, 5, 2, 3, 7, 2, 7,
            6, 3, 0, 4, 3, 4, 7,
        ];

        let mut bin = Vec::new();
        for c in corners {
            for v in c {
                bin.extend_from_slice(&v.to_le_bytes());
            }
        }
        let index_offset = bin.len();
        for i in indices {
            bin.extend_from_slice(&i.to_le_bytes());
        }
        while bin.len() % 4 != 0 {
            bin.push(0);
        }

        let json = serde_json::json!({
            "asset": {"version": "2.0"},
            "scene": 0,
            "scenes": [{"nodes": [0]}],
            "nodes": [{"mesh": 0, "scale": [node_scale, node_scale, node_scale]}],
            "meshes": [{"name": "box", "primitives": [{
                "attributes": {"POSITION": 0},
                "indices": 1
            }]}],
            "buffers": [{"byteLength": bin.len()}],
            "bufferViews": [
                {"buffer": 0, "byteOffset": 0, "byteLength": index_offset},
                {"buffer": 0, "byteOffset": index_offset, "byteLength": indices.len() * 2}
            ],
            "accessors": [
                {"bufferView": 0, "componentType": 5126, "count": 8, "type": "VEC3",
                 "min": [0.0, 0.0, 0.0], "max": [w, h, d]},
                {"bufferView": 1, "componentType": 5123, "count": 36, "type": "SCALAR"}
            ]
        });
        let mut json_bytes = serde_json::to_vec(&json).unwrap();
        while json_bytes.len() % 4 != 0 {
            json_bytes.push(b' ');
        }

        let total = 12 + 8 + json_bytes.len() + 8 + bin.len();
        let mut out = Vec::with_capacity(total);
        out.extend_from_slice(b"glTF");
        out.extend_from_slice(&2u32.to_le_bytes());
        out.extend_from_slice(&(total as u32).to_le_bytes());
        out.extend_from_slice(&(json_bytes.len() as u32).to_le_bytes());
        out.extend_from_slice(b"JSON");
        out.extend_from_slice(&json_bytes);
        out.extend_from_slice(&(bin.len() as u32).to_le_bytes());
        out.extend_from_slice(b"BIN\0");
        out.extend_from_slice(&bin);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::box_glb;
    use super::*;

    #[test]
    fn test_rewrites_only_relative_uris() {
        let mut doc = serde_json::json!({
            "buffers": [{"uri": "frame.bin"}, {"uri": "data:application/octet-stream;base64,AA=="}],
            "images": [{"uri": "textures/oak.jpg"}, {"bufferView": 2}]
        });
        let count = rewrite_relative_uris(&mut doc, "https://cdn.example.com/w/window.gltf?sig=1");
        assert_eq!(count, 2);
        assert_eq!(doc["buffers"][0]["uri"], "https://cdn.example.com/w/frame.bin");
        assert_eq!(
            doc["images"][0]["uri"],
            "https://cdn.example.com/w/textures/oak.jpg"
        );
        assert!(doc["buffers"][1]["uri"].as_str().unwrap().starts_with("data:"));
    }

    #[test]
    fn test_glb_box_loads_with_node_scale() {
        let bytes = box_glb([1.0, 2.0, 0.5], 2.0);
        assert!(is_glb(&bytes));
        let pending = PendingObjectUrls::default();
        let meshes = pollster::block_on(load_gltf("box.glb", &bytes, &pending)).unwrap();
        assert_eq!(meshes.len(), 1);
        assert_eq!(meshes[0].indices.len(), 36);
        let size = meshes[0].bounds().size();
        assert!((size - Vec3::new(2.0, 4.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn test_buffer_view_range_is_checked() {
        let buffers = vec![vec![1u8, 2, 3, 4]];
        assert_eq!(buffer_view_slice(&buffers, 0, 1, 2), Some(&[2u8, 3][..]));
        assert_eq!(buffer_view_slice(&buffers, 0, 3, 2), None);
        assert_eq!(buffer_view_slice(&buffers, 0, usize::MAX, 2), None);
        assert_eq!(buffer_view_slice(&buffers, 1, 0, 1), None);
    }

    #[test]
    fn test_garbage_is_a_parse_error() {
        let pending = PendingObjectUrls::default();
        let result = pollster::block_on(load_gltf("x.gltf", b"{not json", &pending));
        assert!(matches!(result, Err(LoadError::Parse { .. })));
    }
}
