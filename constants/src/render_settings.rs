/// Largest dimension of every model after normalisation, in world units.
pub const CANONICAL_MODEL_SIZE: f32 = 4.0;

/// Camera distance as a multiple of the scaled model's largest dimension.
pub const CAMERA_DISTANCE_FACTOR: f32 = 1.5;

/// Zoom limits relative to the framing distance.
pub const MIN_ZOOM_FACTOR: f32 = 0.3;
pub const MAX_ZOOM_FACTOR: f32 = 4.0;

/// Fraction of the remaining orbit velocity applied per frame.
pub const ORBIT_DAMPING: f32 = 0.08;
pub const ORBIT_YAW_SENSITIVITY: f32 = 0.0035;
pub const ORBIT_PITCH_SENSITIVITY: f32 = 0.0030;
pub const ORBIT_PITCH_LIMIT: f32 = 1.45;
pub const ORBIT_ZOOM_STEP: f32 = 0.1;
pub const ORBIT_DEFAULT_PITCH: f32 = -0.35;
pub const ORBIT_DEFAULT_YAW: f32 = 0.6;

pub const PIXEL_RATIO_CAP: f32 = 2.0;
pub const LOW_END_PIXEL_RATIO_CAP: f32 = 1.25;

/// Reference core count and pixel ratio used by the device performance factor.
pub const REFERENCE_CONCURRENCY: f32 = 4.0;
pub const REFERENCE_PIXEL_RATIO: f32 = 1.5;
pub const LOW_END_FACTOR_THRESHOLD: f32 = 0.5;
pub const HIGH_END_CONCURRENCY: u32 = 8;

pub const SHADOW_MAP_SIZE_LOW: usize = 1024;
pub const SHADOW_MAP_SIZE: usize = 2048;
pub const SHADOW_MAP_SIZE_HIGH: usize = 4096;

pub const SKYBOX_FACE_SIZE: u32 = 512;
pub const LOW_END_SKYBOX_FACE_SIZE: u32 = 256;
pub const SKYBOX_BRIGHTNESS: f32 = 1000.0;
pub const ENVIRONMENT_MAP_INTENSITY: f32 = 600.0;
