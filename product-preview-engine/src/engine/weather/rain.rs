use crate::engine::assets::bounds::RawBounds;
use bevy::prelude::*;
use constants::rain::{
    RAIN_DEFAULT_CEILING, RAIN_DEFAULT_HALF_EXTENT, RAIN_DRIFT_MAX, RAIN_FALL_SPEED_MAX,
    RAIN_FALL_SPEED_MIN, RAIN_HARD_CAP, RAIN_SEGMENT_MAX, RAIN_SEGMENT_MIN,
    RAIN_SWIRL_RADIUS_MAX, RAIN_SWIRL_SPEED, RAIN_VOLUME_FLOOR, RAIN_VOLUME_HEIGHT_FACTOR,
    RAIN_VOLUME_SPREAD,
};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum RainError {
    #[error("segment buffer holds {actual} vertices, expected {expected}")]
    BufferMismatch { expected: usize, actual: usize },
    #[error("invalid timestep {0}")]
    InvalidTimestep(f32),
    #[error("particle {0} left the simulation domain")]
    NonFinite(usize),
}

/// Axis-aligned box particles live in; they respawn at the top once below `min.y`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RainVolume {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for RainVolume {
    fn default() -> Self {
        Self {
            min: Vec3::new(
                -RAIN_DEFAULT_HALF_EXTENT,
                RAIN_VOLUME_FLOOR,
                -RAIN_DEFAULT_HALF_EXTENT,
            ),
            max: Vec3::new(
                RAIN_DEFAULT_HALF_EXTENT,
                RAIN_DEFAULT_CEILING,
                RAIN_DEFAULT_HALF_EXTENT,
            ),
        }
    }
}

impl RainVolume {
    /// A volume wrapping world-space model bounds with room to spare.
    pub fn around(bounds: &RawBounds) -> Self {
        if !bounds.is_valid() {
            return Self::default();
        }
        let centre = bounds.center();
        let size = bounds.size();
        let half = (size.x.max(size.z) * 0.5 * RAIN_VOLUME_SPREAD).max(1.0);
        let ceiling = (bounds.max.y * RAIN_VOLUME_HEIGHT_FACTOR).max(bounds.min.y + 1.0);
        Self {
            min: Vec3::new(centre.x - half, bounds.min.y + RAIN_VOLUME_FLOOR, centre.z - half),
            max: Vec3::new(centre.x + half, ceiling, centre.z + half),
        }
    }

    pub fn contains_xz(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.z >= self.min.z
            && point.z <= self.max.z
    }
}

#[derive(Debug, Clone, Copy)]
struct RainParticle {
    head: Vec3,
    /// x: horizontal drift, y: fall speed (both per second).
    velocity: Vec2,
    swirl_phase: f32,
    swirl_radius: f32,
    segment_length: f32,
}

/// Fixed-size pool of falling streaks. Particles are recycled in place.
pub struct RainField {
    particles: Vec<RainParticle>,
    volume: RainVolume,
    rng: SmallRng,
    frames: u32,
    pending_dt: f32,
}

impl RainField {
    pub fn new(count: usize, volume: RainVolume, seed: u64) -> Self {
        let count = count.min(RAIN_HARD_CAP);
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut particles = Vec::with_capacity(count);
        for _ in 0..count {
            let mut particle = RainParticle {
                head: Vec3::ZERO,
                velocity: Vec2::ZERO,
                swirl_phase: 0.0,
                swirl_radius: 0.0,
                segment_length: 0.0,
            };
            respawn(&mut particle, &volume, &mut rng, false);
            particles.push(particle);
        }
        Self {
            particles,
            volume,
            rng,
            frames: 0,
            pending_dt: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Vertices needed by `write_segments`.
    pub fn vertex_count(&self) -> usize {
        self.particles.len() * 2
    }

    pub fn volume(&self) -> RainVolume {
        self.volume
    }

    /// Move to a new volume, scattering particles through it.
    pub fn set_volume(&mut self, volume: RainVolume) {
        self.volume = volume;
        for particle in &mut self.particles {
            respawn(particle, &volume, &mut self.rng, false);
        }
    }

    pub fn step(&mut self, dt: f32) -> Result<(), RainError> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(RainError::InvalidTimestep(dt));
        }
        let volume = self.volume;
        for (index, particle) in self.particles.iter_mut().enumerate() {
            particle.head.y -= particle.velocity.y * dt;
            particle.head.x += particle.velocity.x * dt;
            particle.swirl_phase = (particle.swirl_phase + RAIN_SWIRL_SPEED * dt)
                % std::f32::consts::TAU;

            if !particle.head.is_finite() {
                return Err(RainError::NonFinite(index));
            }
            if particle.head.y < volume.min.y || !volume.contains_xz(particle.head) {
                respawn(particle, &volume, &mut self.rng, true);
            }
        }
        Ok(())
    }

    /// Advance on every `interval`th call, stepping by the time accumulated since the last step.
    pub fn advance(&mut self, dt: f32, interval: u32) -> Result<bool, RainError> {
        self.frames = self.frames.wrapping_add(1);
        self.pending_dt += dt;
        if self.frames % interval.max(1) != 0 {
            return Ok(false);
        }
        let elapsed = std::mem::take(&mut self.pending_dt);
        self.step(elapsed)?;
        Ok(true)
    }

    /// Head/tail pairs for a line list, written into an existing buffer.
    pub fn write_segments(&self, out: &mut [[f32; 3]]) -> Result<(), RainError> {
        if out.len() != self.vertex_count() {
            return Err(RainError::BufferMismatch {
                expected: self.vertex_count(),
                actual: out.len(),
            });
        }
        for (particle, pair) in self.particles.iter().zip(out.chunks_exact_mut(2)) {
            let swirl = Vec3::new(
                particle.swirl_phase.cos() * particle.swirl_radius,
                0.0,
                particle.swirl_phase.sin() * particle.swirl_radius,
            );
            let head = particle.head + swirl;
            let trail =
                Vec3::new(-particle.velocity.x, particle.velocity.y, 0.0).normalize_or(Vec3::Y);
            let tail = head + trail * particle.segment_length;
            pair[0] = head.to_array();
            pair[1] = tail.to_array();
        }
        Ok(())
    }
}

fn respawn(particle: &mut RainParticle, volume: &RainVolume, rng: &mut SmallRng, at_top: bool) {
    let y = if at_top {
        volume.max.y
    } else {
        rng.random_range(volume.min.y..=volume.max.y)
    };
    particle.head = Vec3::new(
        rng.random_range(volume.min.x..=volume.max.x),
        y,
        rng.random_range(volume.min.z..=volume.max.z),
    );
    particle.velocity = Vec2::new(
        rng.random_range(-RAIN_DRIFT_MAX..=RAIN_DRIFT_MAX),
        rng.random_range(RAIN_FALL_SPEED_MIN..=RAIN_FALL_SPEED_MAX),
    );
    particle.swirl_phase = rng.random_range(0.0..std::f32::consts::TAU);
    particle.swirl_radius = rng.random_range(0.0..=RAIN_SWIRL_RADIUS_MAX);
    particle.segment_length = rng.random_range(RAIN_SEGMENT_MIN..=RAIN_SEGMENT_MAX);
}
