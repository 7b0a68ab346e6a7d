//! Binary FBX reader: node tree decoding plus mesh extraction.
use crate::engine::assets::loaded_model::{LoadedMaterial, LoadedMesh};
use bevy::math::{EulerRot, Mat4, Quat, Vec3};
use nom::{
    IResult, Parser,
    bytes::complete::{tag, take},
    multi::count,
    number::complete::{le_f32, le_f64, le_i32, le_i64, le_u8, le_u32, le_u64},
};
use std::borrow::Cow;
use std::collections::HashMap;
use thiserror::Error;

const FBX_MAGIC: &[u8] = b"Kaydara FBX Binary  \x00\x1a\x00";
/// Versions from 7.5 use 64-bit record offsets.
const WIDE_RECORD_VERSION: u32 = 7500;
const MAX_PARENT_DEPTH: usize = 64;

#[derive(Debug, Error)]
pub enum FbxError {
    #[error("not a binary FBX file")]
    NotBinaryFbx,
    #[error("malformed FBX data near byte {0}")]
    Malformed(usize),
    #[error("unknown property type '{0}' near byte {1}")]
    UnknownProperty(char, usize),
    #[error("unsupported array encoding {0}")]
    UnsupportedEncoding(u32),
    #[error("failed to inflate array: {0}")]
    Inflate(String),
    #[error("FBX file contains no mesh geometry")]
    NoGeometry,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FbxProperty {
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    BoolArray(Vec<bool>),
    I32Array(Vec<i32>),
    I64Array(Vec<i64>),
    F32Array(Vec<f32>),
    F64Array(Vec<f64>),
    String(String),
    /// Bool, short, raw and bool-array values; nothing downstream reads them.
    Skipped,
}

impl FbxProperty {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FbxProperty::I32(v) => Some(*v as i64),
            FbxProperty::I64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FbxProperty::F32(v) => Some(*v as f64),
            FbxProperty::F64(v) => Some(*v),
            FbxProperty::I32(v) => Some(*v as f64),
            FbxProperty::I64(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FbxProperty::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_f64_vec(&self) -> Option<Vec<f64>> {
        match self {
            FbxProperty::F64Array(v) => Some(v.clone()),
            FbxProperty::F32Array(v) => Some(v.iter().map(|x| *x as f64).collect()),
            _ => None,
        }
    }

    pub fn to_i32_vec(&self) -> Option<Vec<i32>> {
        match self {
            FbxProperty::I32Array(v) => Some(v.clone()),
            FbxProperty::I64Array(v) => Some(v.iter().map(|x| *x as i32).collect()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FbxNode {
    pub name: String,
    pub properties: Vec<FbxProperty>,
    pub children: Vec<FbxNode>,
}

impl FbxNode {
    pub fn child(&self, name: &str) -> Option<&FbxNode> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FbxNode> {
        self.children.iter().filter(move |c| c.name == name)
    }

    fn prop(&self, index: usize) -> Option<&FbxProperty> {
        self.properties.get(index)
    }

    /// First property of a named child, e.g. `Vertices: *N { a: ... }`.
    fn child_prop(&self, name: &str) -> Option<&FbxProperty> {
        self.child(name)?.prop(0)
    }

    fn child_str(&self, name: &str) -> Option<&str> {
        self.child_prop(name)?.as_str()
    }

    /// Vector value from a `Properties70` entry.
    fn p70_vec3(&self, name: &str) -> Option<Vec3> {
        let entry = self
            .child("Properties70")?
            .children_named("P")
            .find(|p| p.prop(0).and_then(FbxProperty::as_str) == Some(name))?;
        Some(Vec3::new(
            entry.prop(4)?.as_f64()? as f32,
            entry.prop(5)?.as_f64()? as f32,
            entry.prop(6)?.as_f64()? as f32,
        ))
    }

    fn p70_f64(&self, name: &str) -> Option<f64> {
        let entry = self
            .child("Properties70")?
            .children_named("P")
            .find(|p| p.prop(0).and_then(FbxProperty::as_str) == Some(name))?;
        entry.prop(4)?.as_f64()
    }

    /// Object display name; FBX stores `Name\0\x01Class`.
    fn object_name(&self) -> String {
        self.prop(1)
            .and_then(FbxProperty::as_str)
            .map(|s| s.split("\u{0}\u{1}").next().unwrap_or(s).to_string())
            .unwrap_or_default()
    }

    fn object_id(&self) -> Option<i64> {
        self.prop(0)?.as_i64()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FbxDocument {
    pub version: u32,
    pub nodes: Vec<FbxNode>,
}

impl FbxDocument {
    pub fn node(&self, name: &str) -> Option<&FbxNode> {
        self.nodes.iter().find(|n| n.name == name)
    }
}

pub fn is_binary_fbx(bytes: &[u8]) -> bool {
    bytes.starts_with(FBX_MAGIC)
}

type PResult<'a, T> = Result<(&'a [u8], T), FbxError>;

struct RecordReader<'a> {
    file: &'a [u8],
    wide: bool,
}

impl<'a> RecordReader<'a> {
    fn offset(&self, at: &[u8]) -> usize {
        self.file.len() - at.len()
    }

    fn lift<O>(&self, at: &'a [u8], result: IResult<&'a [u8], O>) -> PResult<'a, O> {
        result.map_err(|_| FbxError::Malformed(self.offset(at)))
    }

    fn record_field(&self, input: &'a [u8]) -> PResult<'a, u64> {
        if self.wide {
            self.lift(input, le_u64(input))
        } else {
            let (rest, value) = self.lift(input, le_u32(input))?;
            Ok((rest, value as u64))
        }
    }

    fn node(&self, input: &'a [u8]) -> PResult<'a, Option<FbxNode>> {
        let start = input;
        let (input, end_offset) = self.record_field(input)?;
        let (input, num_properties) = self.record_field(input)?;
        let (input, _property_list_len) = self.record_field(input)?;
        let (input, name_len) = self.lift(input, le_u8(input))?;

        if end_offset == 0 {
            return Ok((input, None));
        }
        let end_offset = end_offset as usize;
        if end_offset > self.file.len() || end_offset <= self.offset(start) {
            return Err(FbxError::Malformed(self.offset(start)));
        }

        let (mut input, name) = self.lift(input, take(name_len)(input))?;
        let mut properties = Vec::with_capacity((num_properties as usize).min(64));
        for _ in 0..num_properties {
            let (rest, property) = self.property(input)?;
            properties.push(property);
            input = rest;
        }

        let mut children = Vec::new();
        while self.offset(input) < end_offset {
            let (rest, child) = self.node(input)?;
            input = rest;
            match child {
                Some(child) => children.push(child),
                None => break,
            }
        }

        Ok((
            &self.file[end_offset..],
            Some(FbxNode {
                name: String::from_utf8_lossy(name).into_owned(),
                properties,
                children,
            }),
        ))
    }

    fn property(&self, input: &'a [u8]) -> PResult<'a, FbxProperty> {
        let at = input;
        let (input, code) = self.lift(input, le_u8(input))?;
        match code {
            b'Y' => self
                .lift(input, take(2usize)(input))
                .map(|(i, _)| (i, FbxProperty::Skipped)),
            b'C' => self
                .lift(input, take(1usize)(input))
                .map(|(i, _)| (i, FbxProperty::Skipped)),
            b'I' => self
                .lift(input, le_i32(input))
                .map(|(i, v)| (i, FbxProperty::I32(v))),
            b'F' => self
                .lift(input, le_f32(input))
                .map(|(i, v)| (i, FbxProperty::F32(v))),
            b'D' => self
                .lift(input, le_f64(input))
                .map(|(i, v)| (i, FbxProperty::F64(v))),
            b'L' => self
                .lift(input, le_i64(input))
                .map(|(i, v)| (i, FbxProperty::I64(v))),
            b'f' => {
                let (input, data, n) = self.array_data(input, 4)?;
                let values = self.elements(at, &data, n, le_f32)?;
                Ok((input, FbxProperty::F32Array(values)))
            }
            b'd' => {
                let (input, data, n) = self.array_data(input, 8)?;
                let values = self.elements(at, &data, n, le_f64)?;
                Ok((input, FbxProperty::F64Array(values)))
            }
            b'i' => {
                let (input, data, n) = self.array_data(input, 4)?;
                let values = self.elements(at, &data, n, le_i32)?;
                Ok((input, FbxProperty::I32Array(values)))
            }
            b'l' => {
                let (input, data, n) = self.array_data(input, 8)?;
                let values = self.elements(at, &data, n, le_i64)?;
                Ok((input, FbxProperty::I64Array(values)))
            }
            b'b' => {
                let (input, _, _) = self.array_data(input, 1)?;
                Ok((input, FbxProperty::Skipped))
            }
            b'S' | b'R' => {
                let (input, len) = self.lift(input, le_u32(input))?;
                let (input, bytes) = self.lift(input, take(len)(input))?;
                let property = if code == b'S' {
                    FbxProperty::String(String::from_utf8_lossy(bytes).into_owned())
                } else {
                    FbxProperty::Skipped
                };
                Ok((input, property))
            }
            other => Err(FbxError::UnknownProperty(other as char, self.offset(at))),
        }
    }

    /// Array header plus payload, inflated when zlib-encoded.
    fn array_data(
        &self,
        input: &'a [u8],
        element_size: usize,
    ) -> Result<(&'a [u8], Cow<'a, [u8]>, usize), FbxError> {
        let at = input;
        let (input, length) = self.lift(input, le_u32(input))?;
        let (input, encoding) = self.lift(input, le_u32(input))?;
        let (input, stored_len) = self.lift(input, le_u32(input))?;
        let (input, raw) = self.lift(input, take(stored_len)(input))?;

        let data: Cow<'a, [u8]> = match encoding {
            0 => Cow::Borrowed(raw),
            1 => Cow::Owned(inflate(raw)?),
            other => return Err(FbxError::UnsupportedEncoding(other)),
        };

        let length = length as usize;
        if data.len() < length.saturating_mul(element_size) {
            return Err(FbxError::Malformed(self.offset(at)));
        }
        Ok((input, data, length))
    }

    fn elements<'d, O, F>(
        &self,
        at: &'a [u8],
        data: &'d [u8],
        length: usize,
        element: F,
    ) -> Result<Vec<O>, FbxError>
    where
        F: Parser<&'d [u8], O, nom::error::Error<&'d [u8]>>,
    {
        count(element, length)(data)
            .map(|(_, values)| values)
            .map_err(|_| FbxError::Malformed(self.offset(at)))
    }
}

fn inflate(data: &[u8]) -> Result<Vec<u8>, FbxError> {
    use flate2::read::ZlibDecoder;
    use std::io::Read;

    let mut decoder = ZlibDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| FbxError::Inflate(e.to_string()))?;
    Ok(decompressed)
}

/// Decode the node tree of a binary FBX file.
pub fn parse_fbx(bytes: &[u8]) -> Result<FbxDocument, FbxError> {
    let header: IResult<&[u8], &[u8]> = tag(FBX_MAGIC)(bytes);
    let (input, _) = header.map_err(|_| FbxError::NotBinaryFbx)?;
    let version: IResult<&[u8], u32> = le_u32(input);
    let (mut input, version) = version.map_err(|_| FbxError::Malformed(FBX_MAGIC.len()))?;

    let reader = RecordReader {
        file: bytes,
        wide: version >= WIDE_RECORD_VERSION,
    };
    let null_record_len = if reader.wide { 25 } else { 13 };

    let mut nodes = Vec::new();
    while input.len() >= null_record_len {
        let (rest, node) = reader.node(input)?;
        match node {
            Some(node) => nodes.push(node),
            None => break,
        }
        input = rest;
    }

    Ok(FbxDocument { version, nodes })
}

/// Per-element data attached to a geometry (normals, UVs).
struct LayerElement {
    values: Vec<f64>,
    indices: Option<Vec<i32>>,
    by_polygon_vertex: bool,
    all_same: bool,
}

impl LayerElement {
    fn read(geometry: &FbxNode, layer: &str, values: &str, indices: &str) -> Option<Self> {
        let node = geometry.child(layer)?;
        let mapping = node.child_str("MappingInformationType").unwrap_or("ByPolygonVertex");
        let reference = node.child_str("ReferenceInformationType").unwrap_or("Direct");
        let indexed = reference == "IndexToDirect" || reference == "Index";
        Some(Self {
            values: node.child_prop(values)?.to_f64_vec()?,
            indices: if indexed {
                Some(node.child_prop(indices)?.to_i32_vec()?)
            } else {
                None
            },
            by_polygon_vertex: mapping == "ByPolygonVertex",
            all_same: mapping == "AllSame",
        })
    }

    fn element(&self, polygon_vertex: usize, control_point: usize) -> Option<usize> {
        let key = if self.all_same {
            0
        } else if self.by_polygon_vertex {
            polygon_vertex
        } else {
            control_point
        };
        match &self.indices {
            Some(indices) => usize::try_from(*indices.get(key)?).ok(),
            None => Some(key),
        }
    }

    fn vec3(&self, polygon_vertex: usize, control_point: usize) -> Option<[f32; 3]> {
        let i = self.element(polygon_vertex, control_point)? * 3;
        let v = self.values.get(i..i + 3)?;
        Some([v[0] as f32, v[1] as f32, v[2] as f32])
    }

    fn uv(&self, polygon_vertex: usize, control_point: usize) -> Option<[f32; 2]> {
        let i = self.element(polygon_vertex, control_point)? * 2;
        let v = self.values.get(i..i + 2)?;
        Some([v[0] as f32, 1.0 - v[1] as f32])
    }
}

/// Unroll polygons into per-corner vertices and fan-triangulate them.
fn build_geometry(geometry: &FbxNode) -> Option<LoadedMesh> {
    let vertices = geometry.child_prop("Vertices")?.to_f64_vec()?;
    let polygon_indices = geometry.child_prop("PolygonVertexIndex")?.to_i32_vec()?;
    let normals = LayerElement::read(geometry, "LayerElementNormal", "Normals", "NormalsIndex");
    let uvs = LayerElement::read(geometry, "LayerElementUV", "UV", "UVIndex");

    let mut positions = Vec::with_capacity(polygon_indices.len());
    let mut out_normals = Vec::new();
    let mut out_uvs = Vec::new();
    let mut indices = Vec::new();
    let mut polygon_start = 0u32;

    for (polygon_vertex, raw) in polygon_indices.iter().enumerate() {
        let is_last = *raw < 0;
        let control_point = (if is_last { !*raw } else { *raw }) as usize;
        let p = vertices.get(control_point * 3..control_point * 3 + 3)?;
        positions.push([p[0] as f32, p[1] as f32, p[2] as f32]);

        if let Some(layer) = &normals {
            out_normals.push(layer.vec3(polygon_vertex, control_point).unwrap_or([0.0, 1.0, 0.0]));
        }
        if let Some(layer) = &uvs {
            out_uvs.push(layer.uv(polygon_vertex, control_point).unwrap_or([0.0, 0.0]));
        }

        if is_last {
            let polygon_end = positions.len() as u32;
            for corner in polygon_start + 1..polygon_end.saturating_sub(1) {
                indices.extend_from_slice(&[polygon_start, corner, corner + 1]);
            }
            polygon_start = polygon_end;
        }
    }

    Some(LoadedMesh {
        name: geometry.object_name(),
        positions,
        normals: out_normals,
        uvs: if out_uvs.is_empty() { None } else { Some(out_uvs) },
        indices,
        transform: Mat4::IDENTITY,
        material: LoadedMaterial::default(),
    })
}

fn local_transform(model: &FbxNode) -> Mat4 {
    let translation = model.p70_vec3("Lcl Translation").unwrap_or(Vec3::ZERO);
    let rotation = model.p70_vec3("Lcl Rotation").unwrap_or(Vec3::ZERO);
    let scale = model.p70_vec3("Lcl Scaling").unwrap_or(Vec3::ONE);
    // FBX default rotation order applies X, then Y, then Z.
    let rotation = Quat::from_euler(
        EulerRot::ZYX,
        rotation.z.to_radians(),
        rotation.y.to_radians(),
        rotation.x.to_radians(),
    );
    Mat4::from_scale_rotation_translation(scale, rotation, translation)
}

fn read_material(material: &FbxNode) -> LoadedMaterial {
    let mut out = LoadedMaterial::default();
    let diffuse = material
        .p70_vec3("DiffuseColor")
        .or_else(|| material.p70_vec3("Diffuse"));
    if let Some(c) = diffuse {
        let factor = material.p70_f64("DiffuseFactor").unwrap_or(1.0) as f32;
        out.base_color = [c.x * factor, c.y * factor, c.z * factor, 1.0];
    }
    if let Some(opacity) = material.p70_f64("Opacity") {
        out.base_color[3] = opacity as f32;
        out.alpha_blend = opacity < 1.0;
    }
    if let Some(e) = material.p70_vec3("EmissiveColor") {
        let factor = material.p70_f64("EmissiveFactor").unwrap_or(1.0) as f32;
        out.emissive = [e.x * factor, e.y * factor, e.z * factor];
    }
    out
}

/// Meshes of every `Geometry` object, placed by its owning model chain.
pub fn extract_meshes(document: &FbxDocument) -> Result<Vec<LoadedMesh>, FbxError> {
    let objects = document.node("Objects").ok_or(FbxError::NoGeometry)?;

    let mut models: HashMap<i64, &FbxNode> = HashMap::new();
    let mut materials: HashMap<i64, &FbxNode> = HashMap::new();
    for node in &objects.children {
        let Some(id) = node.object_id() else {
            continue;
        };
        match node.name.as_str() {
            "Model" => {
                models.insert(id, node);
            }
            "Material" => {
                materials.insert(id, node);
            }
            _ => {}
        }
    }

    // Object-to-object links: child id -> parent ids.
    let mut parents: HashMap<i64, Vec<i64>> = HashMap::new();
    if let Some(connections) = document.node("Connections") {
        for link in connections.children_named("C") {
            if link.prop(0).and_then(FbxProperty::as_str) != Some("OO") {
                continue;
            }
            if let (Some(child), Some(parent)) = (
                link.prop(1).and_then(FbxProperty::as_i64),
                link.prop(2).and_then(FbxProperty::as_i64),
            ) {
                parents.entry(child).or_default().push(parent);
            }
        }
    }

    let model_of = |id: i64| -> Option<i64> {
        parents
            .get(&id)?
            .iter()
            .copied()
            .find(|p| models.contains_key(p))
    };

    let world_transform = |model_id: i64| -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = Some(model_id);
        let mut depth = 0;
        while let Some(id) = current {
            let Some(model) = models.get(&id) else {
                break;
            };
            matrix = local_transform(model) * matrix;
            depth += 1;
            if depth >= MAX_PARENT_DEPTH {
                break;
            }
            current = model_of(id);
        }
        matrix
    };

    let mut material_of_model: HashMap<i64, i64> = HashMap::new();
    for (child, parent_ids) in &parents {
        if materials.contains_key(child) {
            for parent in parent_ids {
                material_of_model.entry(*parent).or_insert(*child);
            }
        }
    }

    let mut meshes = Vec::new();
    for geometry in objects.children_named("Geometry") {
        let Some(mut mesh) = build_geometry(geometry) else {
            continue;
        };
        if let Some(model_id) = geometry.object_id().and_then(&model_of) {
            mesh.transform = world_transform(model_id);
            if let Some(material) = material_of_model
                .get(&model_id)
                .and_then(|id| materials.get(id))
            {
                mesh.material = read_material(material);
            }
            if mesh.name.is_empty() {
                if let Some(model) = models.get(&model_id) {
                    mesh.name = model.object_name();
                }
            }
        }
        meshes.push(mesh);
    }

    if meshes.is_empty() {
        return Err(FbxError::NoGeometry);
    }
    Ok(meshes)
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Minimal binary FBX writer for fixtures.

    pub enum Prop {
        I64(i64),
        F64(f64),
        Str(String),
        F64s(Vec<f64>),
        I32s(Vec<i32>),
        ZippedF64s(Vec<f64>),
        Flag(bool),
        Bytes(Vec<u8>),
    }

    pub struct Node {
        pub name: &'static str,
        pub props: Vec<Prop>,
        pub children: Vec<Node>,
    }

    pub fn node(name: &'static str, props: Vec<Prop>, children: Vec<Node>) -> Node {
        Node {
            name,
            props,
            children,
        }
    }

    fn write_field(out: &mut Vec<u8>, wide: bool, value: u64) {
        if wide {
            out.extend_from_slice(&value.to_le_bytes());
        } else {
            out.extend_from_slice(&(value as u32).to_le_bytes());
        }
    }

    fn write_prop(out: &mut Vec<u8>, prop: &Prop) {
        match prop {
            Prop::I64(v) => {
                out.push(b'L');
                out.extend_from_slice(&v.to_le_bytes());
            }
            Prop::F64(v) => {
                out.push(b'D');
                out.extend_from_slice(&v.to_le_bytes());
            }
            Prop::Str(s) => {
                out.push(b'S');
                out.extend_from_slice(&(s.len() as u32).to_le_bytes());
                out.extend_from_slice(s.as_bytes());
            }
            Prop::F64s(values) => {
                out.push(b'd');
                out.extend_from_slice(&(values.len() as u32).to_le_bytes());
                out.extend_from_slice(&0u32.to_le_bytes());
                out.extend_from_slice(&((values.len() * 8) as u32).to_le_bytes());
                for v in values {
                    out.extend_from_slice(&v.to_le_bytes());
                }
            }
            Prop::I32s(values) => {
                out.push(b'i');
                out.extend_from_slice(&(values.len() as u32).to_le_bytes());
                out.extend_from_slice(&0u32.to_le_bytes());
                out.extend_from_slice(&((values.len() * 4) as u32).to_le_bytes());
                for v in values {
                    out.extend_from_slice(&v.to_le_bytes());
                }
            }
            Prop::ZippedF64s(values) => {
                use flate2::Compression;
                use flate2::write::ZlibEncoder;
                use std::io::Write;

                let mut raw = Vec::new();
                for v in values {
                    raw.extend_from_slice(&v.to_le_bytes());
                }
                let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(&raw).unwrap();
                let zipped = encoder.finish().unwrap();
                out.push(b'd');
                out.extend_from_slice(&(values.len() as u32).to_le_bytes());
                out.extend_from_slice(&1u32.to_le_bytes());
                out.extend_from_slice(&(zipped.len() as u32).to_le_bytes());
                out.extend_from_slice(&zipped);
            }
            Prop::Flag(v) => out.extend_from_slice(&[b'C', *v as u8]),
            Prop::Bytes(bytes) => {
                out.push(b'R');
                out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
                out.extend_from_slice(bytes);
            }
        }
    }

    fn write_node(out: &mut Vec<u8>, wide: bool, node: &Node) {
        let mut props = Vec::new();
        for prop in &node.props {
            write_prop(&mut props, prop);
        }

        let header_at = out.len();
        write_field(out, wide, 0);
        write_field(out, wide, node.props.len() as u64);
        write_field(out, wide, props.len() as u64);
        out.push(node.name.len() as u8);
        out.extend_from_slice(node.name.as_bytes());
        out.extend_from_slice(&props);
        for child in &node.children {
            write_node(out, wide, child);
        }
        if !node.children.is_empty() {
            out.extend(std::iter::repeat_n(0u8, if wide { 25 } else { 13 }));
        }

        let end = out.len() as u64;
        if wide {
            out[header_at..header_at + 8].copy_from_slice(&end.to_le_bytes());
        } else {
            out[header_at..header_at + 4].copy_from_slice(&(end as u32).to_le_bytes());
        }
    }

    pub fn encode(version: u32, nodes: &[Node]) -> Vec<u8> {
        let wide = version >= super::WIDE_RECORD_VERSION;
        let mut out = super::FBX_MAGIC.to_vec();
        out.extend_from_slice(&version.to_le_bytes());
        for node in nodes {
            write_node(&mut out, wide, node);
        }
        out.extend(std::iter::repeat_n(0u8, if wide { 25 } else { 13 }));
        out
    }

    fn p70(name: &str, x: f64, y: f64, z: f64) -> Node {
        node(
            "P",
            vec![
                Prop::Str(name.into()),
                Prop::Str("Lcl".into()),
                Prop::Str("".into()),
                Prop::Str("A".into()),
                Prop::F64(x),
                Prop::F64(y),
                Prop::F64(z),
            ],
            vec![],
        )
    }

    /// A 900 x 2100 x 40 slab authored in millimetres, as one FBX model.
    pub fn door_slab(version: u32, compressed: bool) -> Vec<u8> {
        let (w, h, t) = (900.0, 2100.0, 40.0);
        let mut vertices = Vec::new();
        for z in [0.0, t] {
            for (x, y) in [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)] {
                vertices.extend_from_slice(&[x, y, z]);
            }
        }
        // Six quads, last index of each polygon bit-inverted.
        let quads: [[i32; 4]; 6] = [
            [0, 3, 2, 1],
            [4, 5, 6, 7],
            [0, 1, 5, 4],
            [1, 2, 6, 5],
            [2, 3, 7, 6],
            [3, 0, 4, 7],
        ];
        let mut polygon = Vec::new();
        for q in quads {
            polygon.extend_from_slice(&[q[0], q[1], q[2], !q[3]]);
        }

        let vertex_prop = if compressed {
            Prop::ZippedF64s(vertices)
        } else {
            Prop::F64s(vertices)
        };

        encode(
            version,
            &[
                node(
                    "FBXHeaderExtension",
                    vec![],
                    vec![node("FBXVersion", vec![Prop::I64(version as i64)], vec![])],
                ),
                node(
                    "Objects",
                    vec![],
                    vec![
                        node(
                            "Geometry",
                            vec![
                                Prop::I64(100),
                                Prop::Str("Slab\u{0}\u{1}Geometry".into()),
                                Prop::Str("Mesh".into()),
                            ],
                            vec![
                                node("Vertices", vec![vertex_prop], vec![]),
                                node("PolygonVertexIndex", vec![Prop::I32s(polygon)], vec![]),
                            ],
                        ),
                        node(
                            "Model",
                            vec![
                                Prop::I64(200),
                                Prop::Str("Door\u{0}\u{1}Model".into()),
                                Prop::Str("Mesh".into()),
                            ],
                            vec![node(
                                "Properties70",
                                vec![],
                                vec![
                                    p70("Lcl Translation", 10.0, 0.0, 0.0),
                                    p70("Lcl Scaling", 1.0, 1.0, 1.0),
                                ],
                            )],
                        ),
                    ],
                ),
                node(
                    "Connections",
                    vec![],
                    vec![
                        node(
                            "C",
                            vec![Prop::Str("OO".into()), Prop::I64(100), Prop::I64(200)],
                            vec![],
                        ),
                        node(
                            "C",
                            vec![Prop::Str("OO".into()), Prop::I64(200), Prop::I64(0)],
                            vec![],
                        ),
                    ],
                ),
            ],
        )
    }
}
