use bevy::prelude::*;

/// Axis-aligned bounds of a model in its own, unscaled units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl RawBounds {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Inverted bounds that any point will expand.
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a [f32; 3]>) -> Self {
        let mut bounds = Self::empty();
        for p in points {
            bounds.include(Vec3::from_array(*p));
        }
        bounds
    }

    pub fn include(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn union(&self, other: &RawBounds) -> RawBounds {
        RawBounds {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min.cmple(self.max).all()
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn max_dimension(&self) -> f32 {
        self.size().max_element()
    }

    /// Centre of the bottom face, used as the model's floor anchor.
    pub fn bottom_center(&self) -> Vec3 {
        Vec3::new(
            (self.min.x + self.max.x) * 0.5,
            self.min.y,
            (self.min.z + self.max.z) * 0.5,
        )
    }

    /// Bounds of the eight transformed corners.
    pub fn transformed(&self, matrix: &Mat4) -> RawBounds {
        let mut out = RawBounds::empty();
        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            out.include(matrix.transform_point3(corner));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points_and_helpers() {
        let points = [[1.0, 2.0, 3.0], [-1.0, 0.0, 5.0], [0.0, 4.0, 4.0]];
        let bounds = RawBounds::from_points(points.iter());
        assert_eq!(bounds.min, Vec3::new(-1.0, 0.0, 3.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 4.0, 5.0));
        assert_eq!(bounds.max_dimension(), 4.0);
        assert_eq!(bounds.bottom_center(), Vec3::new(0.0, 0.0, 4.0));
        assert!(bounds.is_valid());
        assert!(!RawBounds::empty().is_valid());
    }

    #[test]
    fn test_transformed_rotation_swaps_axes() {
        let bounds = RawBounds::new(Vec3::ZERO, Vec3::new(2.0, 1.0, 1.0));
        let rotated = bounds.transformed(&Mat4::from_rotation_z(std::f32::consts::FRAC_PI_2));
        let size = rotated.size();
        assert!((size.x - 1.0).abs() < 1e-5);
        assert!((size.y - 2.0).abs() < 1e-5);
    }
}
