use crate::engine::assets::bounds::RawBounds;
use crate::engine::assets::model_asset::ModelFormat;
use bevy::prelude::*;

/// How a decoded texture should be sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureColorSpace {
    /// Colour maps (base colour, emissive).
    Srgb,
    /// Data maps (normals, roughness).
    Linear,
}

/// Decoded RGBA8 texture ready for upload.
#[derive(Debug, Clone)]
pub struct LoadedTexture {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
    pub color_space: TextureColorSpace,
}

#[derive(Debug, Clone)]
pub struct LoadedMaterial {
    pub base_color: [f32; 4],
    pub metallic: f32,
    pub roughness: f32,
    pub emissive: [f32; 3],
    pub base_color_texture: Option<LoadedTexture>,
    pub emissive_texture: Option<LoadedTexture>,
    pub double_sided: bool,
    pub alpha_blend: bool,
}

impl Default for LoadedMaterial {
    fn default() -> Self {
        Self {
            base_color: [0.8, 0.8, 0.8, 1.0],
            metallic: 0.0,
            roughness: 0.6,
            emissive: [0.0; 3],
            base_color_texture: None,
            emissive_texture: None,
            double_sided: false,
            alpha_blend: false,
        }
    }
}

/// One triangle list with its placement inside the model.
#[derive(Debug, Clone)]
pub struct LoadedMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Option<Vec<[f32; 2]>>,
    pub indices: Vec<u32>,
    pub transform: Mat4,
    pub material: LoadedMaterial,
}

impl LoadedMesh {
    /// Model-space bounds of this mesh after its node transform.
    pub fn bounds(&self) -> RawBounds {
        let mut bounds = RawBounds::empty();
        for p in &self.positions {
            bounds.include(self.transform.transform_point3(Vec3::from_array(*p)));
        }
        bounds
    }

    /// Fill in smooth normals when the source carried none.
    pub fn ensure_normals(&mut self) {
        if self.normals.len() != self.positions.len() {
            self.normals = compute_smooth_normals(&self.positions, &self.indices);
        }
    }
}

/// CPU-side result of parsing a model file.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub format: ModelFormat,
    pub meshes: Vec<LoadedMesh>,
    pub raw_bounds: RawBounds,
}

impl LoadedModel {
    pub fn new(format: ModelFormat, mut meshes: Vec<LoadedMesh>) -> Self {
        meshes.retain(|mesh| !mesh.positions.is_empty() && !mesh.indices.is_empty());
        for mesh in &mut meshes {
            mesh.ensure_normals();
        }
        let raw_bounds = meshes
            .iter()
            .map(LoadedMesh::bounds)
            .fold(RawBounds::empty(), |acc, b| acc.union(&b));
        Self {
            format,
            meshes,
            raw_bounds,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

/// Area-weighted vertex normals for an indexed triangle list.
pub fn compute_smooth_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut accum = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if a >= positions.len() || b >= positions.len() || c >= positions.len() {
            continue;
        }
        let pa = Vec3::from_array(positions[a]);
        let pb = Vec3::from_array(positions[b]);
        let pc = Vec3::from_array(positions[c]);
        let face = (pb - pa).cross(pc - pa);
        accum[a] += face;
        accum[b] += face;
        accum[c] += face;
    }
    accum
        .into_iter()
        .map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> LoadedMesh {
        LoadedMesh {
            name: "quad".into(),
            positions: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            normals: Vec::new(),
            uvs: None,
            indices: vec![0, 1, 2, 0, 2, 3],
            transform: Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0)),
            material: LoadedMaterial::default(),
        }
    }

    #[test]
    fn test_missing_normals_are_computed() {
        let model = LoadedModel::new(ModelFormat::Glb, vec![quad()]);
        let normals = &model.meshes[0].normals;
        assert_eq!(normals.len(), 4);
        for n in normals {
            assert!((Vec3::from_array(*n) - Vec3::Z).length() < 1e-5);
        }
    }

    #[test]
    fn test_bounds_include_node_transform() {
        let model = LoadedModel::new(ModelFormat::Fbx, vec![quad()]);
        assert_eq!(model.raw_bounds.min, Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(model.raw_bounds.max, Vec3::new(1.0, 3.0, 0.0));
    }

    #[test]
    fn test_empty_meshes_are_dropped() {
        let mut empty = quad();
        empty.indices.clear();
        let model = LoadedModel::new(ModelFormat::Gltf, vec![empty]);
        assert!(model.is_empty());
        assert!(!model.raw_bounds.is_valid());
    }
}
