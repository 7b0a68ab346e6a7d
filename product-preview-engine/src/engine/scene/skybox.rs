use crate::engine::loading::error::LoadError;
use crate::engine::loading::fetch::fetch_with_fallback;
use crate::engine::resources::object_url::PendingObjectUrls;
use bevy::prelude::*;
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::{
    Extent3d, TextureDimension, TextureFormat, TextureViewDescriptor, TextureViewDimension,
};
use image::RgbaImage;
use std::f32::consts::PI;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SkyboxError {
    #[error(transparent)]
    Fetch(#[from] LoadError),
    #[error("could not decode sky image {url}: {reason}")]
    Decode { url: String, reason: String },
}

/// Six square RGBA8 faces in +X, -X, +Y, -Y, +Z, -Z order.
#[derive(Debug, Clone)]
pub struct CubemapFaces {
    pub face_size: u32,
    pub data: Vec<u8>,
}

#[cfg(test)]
impl CubemapFaces {
    fn face(&self, index: usize) -> Option<&[u8]> {
        let len = (self.face_size * self.face_size * 4) as usize;
        let start = index.checked_mul(len)?;
        self.data.get(start..start.checked_add(len)?)
    }
}

/// Direction through texel (`u`, `v`) of `face`, both in [-1, 1].
fn face_direction(face: usize, u: f32, v: f32) -> Vec3 {
    match face {
        0 => Vec3::new(1.0, -v, -u),
        1 => Vec3::new(-1.0, -v, u),
        2 => Vec3::new(u, 1.0, v),
        3 => Vec3::new(u, -1.0, -v),
        4 => Vec3::new(u, -v, 1.0),
        _ => Vec3::new(-u, -v, -1.0),
    }
}

pub fn equirect_to_cubemap(source: &RgbaImage, face_size: u32) -> CubemapFaces {
    let face_size = face_size.max(1);
    let (width, height) = source.dimensions();
    let mut data = Vec::with_capacity((face_size * face_size * 4 * 6) as usize);

    for face in 0..6 {
        for y in 0..face_size {
            for x in 0..face_size {
                let u = 2.0 * (x as f32 + 0.5) / face_size as f32 - 1.0;
                let v = 2.0 * (y as f32 + 0.5) / face_size as f32 - 1.0;
                let dir = face_direction(face, u, v).normalize();

                let longitude = dir.z.atan2(dir.x);
                let latitude = dir.y.clamp(-1.0, 1.0).asin();
                let sx = ((longitude / (2.0 * PI) + 0.5) * width as f32) as u32;
                let sy = ((0.5 - latitude / PI) * height as f32) as u32;

                let texel = source.get_pixel(sx.min(width - 1), sy.min(height - 1));
                data.extend_from_slice(&texel.0);
            }
        }
    }

    CubemapFaces { face_size, data }
}

pub fn cubemap_image(faces: CubemapFaces) -> Image {
    let mut image = Image::new(
        Extent3d {
            width: faces.face_size,
            height: faces.face_size,
            depth_or_array_layers: 6,
        },
        TextureDimension::D2,
        faces.data,
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::default(),
    );
    image.texture_view_descriptor = Some(TextureViewDescriptor {
        dimension: Some(TextureViewDimension::Cube),
        ..default()
    });
    image
}

/// Fetch an equirectangular sky image and bake it into cubemap faces.
pub async fn load_skybox(
    url: &str,
    face_size: u32,
    pending: &PendingObjectUrls,
) -> Result<CubemapFaces, SkyboxError> {
    let bytes = fetch_with_fallback(url, false, pending).await?;
    let decoded = image::load_from_memory(&bytes).map_err(|e| SkyboxError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    if decoded.width() == 0 || decoded.height() == 0 {
        return Err(SkyboxError::Decode {
            url: url.to_string(),
            reason: "empty image".into(),
        });
    }
    Ok(equirect_to_cubemap(&decoded.to_rgba8(), face_size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn split_sky() -> RgbaImage {
        RgbaImage::from_fn(64, 32, |_, y| {
            if y < 16 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        })
    }

    #[test]
    fn test_top_half_maps_to_positive_y_face() {
        let faces = equirect_to_cubemap(&split_sky(), 8);
        assert_eq!(faces.data.len(), 8 * 8 * 4 * 6);
        assert!(faces.face(2).unwrap().chunks(4).all(|px| px[0] == 255));
        assert!(faces.face(3).unwrap().chunks(4).all(|px| px[0] == 0));
        assert!(faces.face(6).is_none());
    }

    #[test]
    fn test_side_faces_split_at_horizon() {
        let faces = equirect_to_cubemap(&split_sky(), 8);
        let front = faces.face(4).unwrap();
        // First row looks up, last row looks down.
        assert_eq!(front[0], 255);
        assert_eq!(front[front.len() - 4], 0);
    }

    #[test]
    fn test_image_is_cube_view() {
        let image = cubemap_image(equirect_to_cubemap(&split_sky(), 4));
        assert_eq!(image.texture_descriptor.size.depth_or_array_layers, 6);
        assert_eq!(
            image.texture_view_descriptor.as_ref().and_then(|d| d.dimension),
            Some(TextureViewDimension::Cube)
        );
    }

    #[test]
    fn test_undecodable_bytes_are_decode_error() {
        let path = std::env::temp_dir().join("preview_sky_garbage.hdr");
        std::fs::write(&path, b"not an image").unwrap();
        let pending = PendingObjectUrls::default();
        let result = pollster::block_on(load_skybox(&path.display().to_string(), 4, &pending));
        assert!(matches!(result, Err(SkyboxError::Decode { .. })));
    }
}
