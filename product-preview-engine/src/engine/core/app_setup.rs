use bevy::asset::AssetMetaCheck;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::render::RenderPlugin;
use bevy::render::settings::{RenderCreation, WgpuSettings};
use bevy_common_assets::json::JsonAssetPlugin;
// Crate engine modules
use crate::engine::assets::viewer_manifest::{ViewerManifest, ViewerSettings};
use crate::engine::camera::orbit_controls::{OrbitControls, ViewerCamera};
use crate::engine::core::app_state::{ViewerPhase, transition_to_running};
use crate::engine::core::performance_profile::PerformanceProfile;
use crate::engine::core::viewer_state::ViewerState;
use crate::engine::core::window_config::create_window_config;
use crate::engine::loading::manifest_loader::{ManifestLoader, load_manifest_system, start_loading};
use crate::engine::loading::model_spawner::{ActiveModel, ModelLoadResult};
use crate::engine::loading::progress::{LoadingProgress, spawn_loading_indicator};
use crate::engine::loading::tasks::Inbox;
use crate::engine::resources::object_url::PendingObjectUrls;
use crate::engine::scene::lighting::spawn_lighting;
use crate::engine::systems::render_loop::configure_render_loop;
use crate::engine::weather::controller::{SkyboxResult, WeatherController};
use crate::engine::weather::rain_system::RainSystem;
// Crate tools modules
use crate::tools::labels::spawn_label_layer;
use crate::tools::measure::MeasurementOverlay;
use crate::tools::unit_store::AssumedUnitStore;
// Web RPC
use crate::rpc::web_rpc::WebRpcPlugin;

const LOG_FILTER: &str = "wgpu=error,naga=warn,product_preview_engine=info";

/// Build the viewer for a device profile measured before the window exists.
pub fn create_app(profile: PerformanceProfile) -> App {
    let mut app = App::new();

    app.add_plugins(create_default_plugins(&profile))
        .init_state::<ViewerPhase>()
        // Registers ViewerManifest as a loadable asset type from JSON files.
        .add_plugins(JsonAssetPlugin::<ViewerManifest>::new(&["json"]))
        .add_plugins(WebRpcPlugin);

    // Initialise resources early
    app.insert_resource(profile)
        .insert_resource(RainSystem::for_profile(&profile))
        .insert_resource(AssumedUnitStore::platform_default())
        .insert_resource(ClearColor(Color::BLACK))
        .init_resource::<LoadingProgress>()
        .init_resource::<ManifestLoader>()
        .init_resource::<ViewerSettings>()
        .init_resource::<ViewerState>()
        .init_resource::<OrbitControls>()
        .init_resource::<ActiveModel>()
        .init_resource::<WeatherController>()
        .init_resource::<MeasurementOverlay>()
        .init_resource::<PendingObjectUrls>()
        .init_resource::<Inbox<ModelLoadResult>>()
        .init_resource::<Inbox<SkyboxResult>>();

    // State-based system scheduling
    app.add_systems(Startup, (setup, start_loading).chain())
        .add_systems(
            Update,
            (load_manifest_system, transition_to_running)
                .chain()
                .run_if(in_state(ViewerPhase::Booting)),
        );

    configure_render_loop(&mut app);

    app
}

fn spawn_camera(commands: &mut Commands, profile: &PerformanceProfile, controls: &OrbitControls) {
    commands.spawn((
        Camera3d::default(),
        controls.camera_transform(),
        profile.msaa(),
        ViewerCamera,
    ));
}

// Startup system that only handles basic initialisation
fn setup(mut commands: Commands, profile: Res<PerformanceProfile>, controls: Res<OrbitControls>) {
    spawn_camera(&mut commands, &profile, &controls);
    spawn_lighting(&mut commands, &profile);
    spawn_label_layer(&mut commands);
    spawn_loading_indicator(&mut commands);
    info!(
        "Viewer ready: low end {}, shadow map {}, particle budget {}",
        profile.is_low_end, profile.shadow_map_size, profile.particle_budget
    );
}

fn create_default_plugins(profile: &PerformanceProfile) -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(create_window_config(profile)),
        ..default()
    };

    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    let log_config = LogPlugin {
        filter: LOG_FILTER.to_string(),
        ..default()
    };

    let render_config = RenderPlugin {
        render_creation: RenderCreation::Automatic(WgpuSettings {
            power_preference: profile.power_preference(),
            ..default()
        }),
        ..default()
    };

    DefaultPlugins
        .set(window_config)
        .set(asset_config)
        .set(log_config)
        .set(render_config)
}
