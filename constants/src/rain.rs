/// Upper bound on rain particles regardless of device.
pub const RAIN_HARD_CAP: usize = 4000;
pub const RAIN_BASE_BUDGET: usize = 2500;
pub const RAIN_LOW_END_BUDGET: usize = 700;

/// Step the simulation on every Nth frame on low-end devices.
pub const LOW_END_RAIN_FRAME_INTERVAL: u32 = 3;

pub const RAIN_FALL_SPEED_MIN: f32 = 7.0;
pub const RAIN_FALL_SPEED_MAX: f32 = 11.0;
pub const RAIN_DRIFT_MAX: f32 = 0.6;
pub const RAIN_SEGMENT_MIN: f32 = 0.12;
pub const RAIN_SEGMENT_MAX: f32 = 0.28;
pub const RAIN_SWIRL_RADIUS_MAX: f32 = 0.05;
pub const RAIN_SWIRL_SPEED: f32 = 2.5;

/// Horizontal padding around the model bounds, as a multiple of its footprint.
pub const RAIN_VOLUME_SPREAD: f32 = 2.5;
pub const RAIN_VOLUME_HEIGHT_FACTOR: f32 = 1.8;
pub const RAIN_VOLUME_FLOOR: f32 = -0.25;

/// Volume used before any model is attached.
pub const RAIN_DEFAULT_HALF_EXTENT: f32 = 5.0;
pub const RAIN_DEFAULT_CEILING: f32 = 8.0;

pub const RAIN_SEED: u64 = 0x5eed_0f_4a1d;
