use crate::engine::camera::orbit_controls::orbit_camera_controller;
use crate::engine::core::app_state::ViewerPhase;
use crate::engine::core::commands::{drain_viewer_commands, teardown_requested};
use crate::engine::loading::model_spawner::{
    apply_assumed_unit_override, attach_loaded_models, request_model_load,
};
use crate::engine::loading::progress::update_loading_indicator;
use crate::engine::systems::keyboard::keyboard_shortcuts;
use crate::engine::systems::teardown::teardown_viewer;
use crate::engine::weather::controller::{apply_weather, attach_skybox};
use crate::engine::weather::rain_system::advance_rain;
use crate::tools::labels::project_anchored_labels;
use crate::tools::measure::{apply_measurement_visibility, rebuild_overlay, refresh_label_text};
use bevy::prelude::*;

/// Per-frame stages, run in declaration order.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewerSet {
    Commands,
    Loading,
    Environment,
    Simulation,
    Overlay,
    Camera,
    Labels,
}

/// Register the frame loop. Everything but teardown is gated on `ViewerPhase::Running`.
pub fn configure_render_loop(app: &mut App) {
    app.configure_sets(
        Update,
        (
            ViewerSet::Commands,
            ViewerSet::Loading,
            ViewerSet::Environment,
            ViewerSet::Simulation,
            ViewerSet::Overlay,
            ViewerSet::Camera,
            ViewerSet::Labels,
        )
            .chain()
            .run_if(in_state(ViewerPhase::Running)),
    );

    app.add_systems(
        Update,
        (
            (keyboard_shortcuts, drain_viewer_commands)
                .chain()
                .in_set(ViewerSet::Commands),
            (
                request_model_load,
                attach_loaded_models,
                apply_assumed_unit_override,
                update_loading_indicator,
            )
                .chain()
                .in_set(ViewerSet::Loading),
            (apply_weather, attach_skybox)
                .chain()
                .in_set(ViewerSet::Environment),
            advance_rain.in_set(ViewerSet::Simulation),
            (
                rebuild_overlay,
                refresh_label_text,
                apply_measurement_visibility,
            )
                .chain()
                .in_set(ViewerSet::Overlay),
            orbit_camera_controller.in_set(ViewerSet::Camera),
            project_anchored_labels.in_set(ViewerSet::Labels),
        ),
    );

    app.add_systems(
        Update,
        teardown_viewer
            .after(ViewerSet::Labels)
            .run_if(in_state(ViewerPhase::Running).and(teardown_requested)),
    );
}
