use crate::engine::core::performance_profile::PerformanceProfile;
use bevy::prelude::*;
use bevy::window::{PresentMode, WindowResolution};

pub fn create_window_config(profile: &PerformanceProfile) -> Window {
    #[cfg(target_arch = "wasm32")]
    {
        Window {
            canvas: Some("#bevy".into()),
            fit_canvas_to_parent: true,
            prevent_default_event_handling: false,
            present_mode: PresentMode::AutoVsync,
            resolution: WindowResolution::default()
                .with_scale_factor_override(profile.clamped_pixel_ratio),
            ..default()
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        Window {
            title: "Product Preview".into(),
            present_mode: PresentMode::AutoVsync,
            resolution: WindowResolution::new(1280.0, 800.0)
                .with_scale_factor_override(profile.clamped_pixel_ratio),
            ..default()
        }
    }
}
