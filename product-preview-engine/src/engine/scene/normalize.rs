use crate::engine::assets::bounds::RawBounds;
use bevy::prelude::*;
use constants::render_settings::CANONICAL_MODEL_SIZE;

/// Uniform scale plus offset that stands a model on the origin at canonical size.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct ModelNormalization {
    pub scale: f32,
    pub translation: Vec3,
}

impl ModelNormalization {
    pub fn for_bounds(bounds: &RawBounds) -> Self {
        let max_dimension = bounds.max_dimension();
        let scale = if bounds.is_valid() && max_dimension > f32::EPSILON {
            CANONICAL_MODEL_SIZE / max_dimension
        } else {
            1.0
        };
        Self {
            scale,
            translation: -bounds.bottom_center() * scale,
        }
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.translation).with_scale(Vec3::splat(self.scale))
    }

    /// Bounds after normalization, in world space.
    pub fn apply(&self, bounds: &RawBounds) -> RawBounds {
        RawBounds::new(
            bounds.min * self.scale + self.translation,
            bounds.max * self.scale + self.translation,
        )
    }
}
