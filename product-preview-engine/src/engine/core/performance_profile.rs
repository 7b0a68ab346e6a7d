use bevy::prelude::*;
use bevy::render::settings::PowerPreference;
use constants::rain::{RAIN_BASE_BUDGET, RAIN_HARD_CAP, RAIN_LOW_END_BUDGET};
use constants::render_settings::{
    HIGH_END_CONCURRENCY, LOW_END_FACTOR_THRESHOLD, LOW_END_PIXEL_RATIO_CAP,
    LOW_END_SKYBOX_FACE_SIZE, PIXEL_RATIO_CAP, REFERENCE_CONCURRENCY, REFERENCE_PIXEL_RATIO,
    SHADOW_MAP_SIZE, SHADOW_MAP_SIZE_HIGH, SHADOW_MAP_SIZE_LOW, SKYBOX_FACE_SIZE,
};

/// Raw device signals the profile is derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceCaps {
    pub hardware_concurrency: u32,
    pub device_pixel_ratio: f32,
}

impl DeviceCaps {
    #[cfg(target_arch = "wasm32")]
    pub fn detect() -> Self {
        let Some(window) = web_sys::window() else {
            return Self::fallback();
        };
        let concurrency = window.navigator().hardware_concurrency();
        Self {
            hardware_concurrency: if concurrency.is_finite() && concurrency >= 1.0 {
                concurrency as u32
            } else {
                2
            },
            device_pixel_ratio: window.device_pixel_ratio() as f32,
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn detect() -> Self {
        Self {
            hardware_concurrency: std::thread::available_parallelism()
                .map(|n| n.get() as u32)
                .unwrap_or(2),
            device_pixel_ratio: 1.0,
        }
    }

    #[cfg(target_arch = "wasm32")]
    fn fallback() -> Self {
        Self {
            hardware_concurrency: 2,
            device_pixel_ratio: 1.0,
        }
    }
}

/// Device-tier render settings, computed once before the app is built.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct PerformanceProfile {
    pub is_low_end: bool,
    pub clamped_pixel_ratio: f32,
    pub shadow_map_size: usize,
    pub antialias: bool,
    pub high_performance_gpu: bool,
    pub particle_budget: usize,
}

impl PerformanceProfile {
    pub fn from_caps(caps: DeviceCaps) -> Self {
        let concurrency = caps.hardware_concurrency.max(1);
        let pixel_ratio = if caps.device_pixel_ratio.is_finite() && caps.device_pixel_ratio > 0.0 {
            caps.device_pixel_ratio
        } else {
            1.0
        };

        let factor = (concurrency as f32 / REFERENCE_CONCURRENCY).min(1.0)
            / pixel_ratio.min(REFERENCE_PIXEL_RATIO);
        let is_low_end = (concurrency as f32) < REFERENCE_CONCURRENCY
            || factor < LOW_END_FACTOR_THRESHOLD;

        let shadow_map_size = if is_low_end {
            SHADOW_MAP_SIZE_LOW
        } else if concurrency >= HIGH_END_CONCURRENCY && pixel_ratio <= PIXEL_RATIO_CAP {
            SHADOW_MAP_SIZE_HIGH
        } else {
            SHADOW_MAP_SIZE
        };

        let cap = if is_low_end {
            LOW_END_PIXEL_RATIO_CAP
        } else {
            PIXEL_RATIO_CAP
        };

        let particle_budget = if is_low_end {
            RAIN_LOW_END_BUDGET
        } else {
            (RAIN_BASE_BUDGET as f32 * factor.min(1.0)).round() as usize
        }
        .min(RAIN_HARD_CAP);

        Self {
            is_low_end,
            clamped_pixel_ratio: pixel_ratio.min(cap),
            shadow_map_size,
            antialias: !is_low_end,
            high_performance_gpu: !is_low_end,
            particle_budget,
        }
    }

    pub fn detect() -> Self {
        let caps = DeviceCaps::detect();
        let profile = Self::from_caps(caps);
        info!("Device caps {:?} -> {:?}", caps, profile);
        profile
    }

    /// Rim lights and fill-light shadows are reserved for capable devices.
    pub fn rim_lights(&self) -> bool {
        !self.is_low_end
    }

    pub fn fill_shadows(&self) -> bool {
        !self.is_low_end
    }

    pub fn msaa(&self) -> Msaa {
        if self.antialias { Msaa::Sample4 } else { Msaa::Off }
    }

    pub fn skybox_face_size(&self) -> u32 {
        if self.is_low_end {
            LOW_END_SKYBOX_FACE_SIZE
        } else {
            SKYBOX_FACE_SIZE
        }
    }

    pub fn power_preference(&self) -> PowerPreference {
        if self.high_performance_gpu {
            PowerPreference::HighPerformance
        } else {
            PowerPreference::LowPower
        }
    }
}
