use crate::engine::assets::bounds::RawBounds;
use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use constants::render_settings::{
    CAMERA_DISTANCE_FACTOR, CANONICAL_MODEL_SIZE, MAX_ZOOM_FACTOR, MIN_ZOOM_FACTOR,
    ORBIT_DAMPING, ORBIT_DEFAULT_PITCH, ORBIT_DEFAULT_YAW, ORBIT_PITCH_LIMIT,
    ORBIT_PITCH_SENSITIVITY, ORBIT_YAW_SENSITIVITY, ORBIT_ZOOM_STEP,
};

#[derive(Component)]
pub struct ViewerCamera;

/// Damped orbit around a target point.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct OrbitControls {
    pub target: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub yaw_velocity: f32,
    pub pitch_velocity: f32,
    pub zoom_velocity: f32,
    pub damping: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        let distance = CANONICAL_MODEL_SIZE * CAMERA_DISTANCE_FACTOR;
        Self {
            target: Vec3::new(0.0, CANONICAL_MODEL_SIZE * 0.5, 0.0),
            yaw: ORBIT_DEFAULT_YAW,
            pitch: ORBIT_DEFAULT_PITCH,
            distance,
            min_distance: distance * MIN_ZOOM_FACTOR,
            max_distance: distance * MAX_ZOOM_FACTOR,
            yaw_velocity: 0.0,
            pitch_velocity: 0.0,
            zoom_velocity: 0.0,
            damping: ORBIT_DAMPING,
        }
    }
}

impl OrbitControls {
    /// Aim at the centre of world-space `bounds` from a distance proportional to its size.
    pub fn frame(&mut self, bounds: &RawBounds) {
        let max_dimension = bounds.max_dimension().max(f32::EPSILON);
        let distance = max_dimension * CAMERA_DISTANCE_FACTOR;
        self.target = bounds.center();
        self.distance = distance;
        self.min_distance = distance * MIN_ZOOM_FACTOR;
        self.max_distance = distance * MAX_ZOOM_FACTOR;
        self.yaw = ORBIT_DEFAULT_YAW;
        self.pitch = ORBIT_DEFAULT_PITCH;
        self.yaw_velocity = 0.0;
        self.pitch_velocity = 0.0;
        self.zoom_velocity = 0.0;
    }

    pub fn rotate(&mut self, mouse_delta: Vec2) {
        self.yaw_velocity -= mouse_delta.x * ORBIT_YAW_SENSITIVITY;
        self.pitch_velocity -= mouse_delta.y * ORBIT_PITCH_SENSITIVITY;
    }

    /// Positive `steps` zoom in.
    pub fn zoom(&mut self, steps: f32) {
        self.zoom_velocity -= steps * ORBIT_ZOOM_STEP;
    }

    /// Integrate velocities and bleed them off; `frames` is elapsed time in 60 Hz frames.
    pub fn step(&mut self, frames: f32) {
        self.yaw += self.yaw_velocity * frames;
        self.pitch = (self.pitch + self.pitch_velocity * frames)
            .clamp(-ORBIT_PITCH_LIMIT, ORBIT_PITCH_LIMIT);
        self.distance = (self.distance * (self.zoom_velocity * frames).exp())
            .clamp(self.min_distance, self.max_distance);

        let keep = (1.0 - self.damping).max(0.0).powf(frames);
        self.yaw_velocity *= keep;
        self.pitch_velocity *= keep;
        self.zoom_velocity *= keep;
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    pub fn eye_position(&self) -> Vec3 {
        self.target + self.rotation() * Vec3::Z * self.distance
    }

    pub fn camera_transform(&self) -> Transform {
        Transform::from_translation(self.eye_position()).looking_at(self.target, Vec3::Y)
    }
}

pub fn orbit_camera_controller(
    mut controls: ResMut<OrbitControls>,
    mut camera_query: Query<&mut Transform, With<ViewerCamera>>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut scroll_events: EventReader<MouseWheel>,
    time: Res<Time>,
) {
    let mouse_delta: Vec2 = mouse_motion.read().map(|m| m.delta).sum();
    if mouse_button.pressed(MouseButton::Left) && mouse_delta != Vec2::ZERO {
        controls.rotate(mouse_delta);
    }

    let mut scroll_accum = 0.0;
    for ev in scroll_events.read() {
        scroll_accum += match ev.unit {
            MouseScrollUnit::Line => ev.y,
            MouseScrollUnit::Pixel => ev.y * 0.05,
        };
    }
    if scroll_accum.abs() > f32::EPSILON {
        controls.zoom(scroll_accum);
    }

    controls.step(time.delta_secs() * 60.0);

    if let Ok(mut transform) = camera_query.single_mut() {
        *transform = controls.camera_transform();
    }
}
