use crate::engine::camera::orbit_controls::ViewerCamera;
use crate::engine::core::performance_profile::PerformanceProfile;
use crate::engine::core::viewer_state::ViewerState;
use crate::engine::loading::progress::LoadingProgress;
use crate::engine::loading::tasks::{Inbox, spawn_task};
use crate::engine::resources::generation::{Generation, GenerationToken};
use crate::engine::resources::object_url::PendingObjectUrls;
use crate::engine::resources::scope::{
    DisposeSink, ResourceScope, SceneAssets, ScopeReport, close_scope,
};
use crate::engine::scene::lighting::SceneLights;
use crate::engine::scene::skybox::{CubemapFaces, SkyboxError, cubemap_image, load_skybox};
use crate::engine::weather::rain_system::RainSystem;
use crate::engine::weather::recipe::WeatherRecipe;
use crate::engine::weather::state::{SkyboxSet, WeatherState};
use bevy::core_pipeline::Skybox;
use bevy::pbr::environment_map::EnvironmentMapLight;
use bevy::prelude::*;
use constants::render_settings::{ENVIRONMENT_MAP_INTENSITY, SKYBOX_BRIGHTNESS};

#[derive(Debug, Clone, PartialEq)]
pub enum WeatherPlan {
    Unchanged,
    Transition {
        state: WeatherState,
        skybox_url: Option<String>,
    },
}

/// Decoded sky posted back from a background load.
pub struct SkyboxResult {
    pub token: GenerationToken,
    pub url: String,
    pub outcome: Result<CubemapFaces, SkyboxError>,
}

#[derive(Resource, Default)]
pub struct WeatherController {
    active: Option<(WeatherState, Option<String>)>,
    generation: Generation,
    skybox_scope: Option<ResourceScope>,
}

impl WeatherController {
    /// `Unchanged` when the (state, sky image) pair is already on screen.
    pub fn plan(&self, state: WeatherState, skyboxes: &SkyboxSet) -> WeatherPlan {
        let skybox_url = skyboxes.url_for(state).map(str::to_string);
        match &self.active {
            Some((active_state, active_url))
                if *active_state == state && *active_url == skybox_url =>
            {
                WeatherPlan::Unchanged
            }
            _ => WeatherPlan::Transition { state, skybox_url },
        }
    }

    pub fn active_state(&self) -> Option<WeatherState> {
        self.active.as_ref().map(|(state, _)| *state)
    }

    pub fn skybox_handle_count(&self) -> usize {
        self.skybox_scope
            .as_ref()
            .map(ResourceScope::handle_count)
            .unwrap_or(0)
    }

    pub fn is_current(&self, token: GenerationToken) -> bool {
        self.generation.is_current(token)
    }

    /// Release the sky image and invalidate any load still in flight.
    pub fn close_skybox(&mut self, sink: &mut impl DisposeSink) -> ScopeReport {
        self.generation.bump();
        close_scope(&mut self.skybox_scope, sink)
    }

    fn commit(&mut self, state: WeatherState, skybox_url: Option<String>) {
        self.active = Some((state, skybox_url));
    }
}

/// Re-apply weather when the requested state or sky image changed.
pub fn apply_weather(
    mut state: ResMut<ViewerState>,
    mut controller: ResMut<WeatherController>,
    mut rain: ResMut<RainSystem>,
    mut scene: SceneAssets,
    mut lights: SceneLights,
    mut clear_colour: ResMut<ClearColor>,
    cameras: Query<Entity, With<ViewerCamera>>,
    profile: Res<PerformanceProfile>,
    inbox: Res<Inbox<SkyboxResult>>,
    pending: Res<PendingObjectUrls>,
    mut progress: ResMut<LoadingProgress>,
) {
    if !state.dirty.weather {
        return;
    }
    state.dirty.weather = false;

    let (weather, skybox_url) = match controller.plan(state.weather, &state.skyboxes) {
        WeatherPlan::Unchanged => {
            debug!("Weather {} already applied", state.weather);
            return;
        }
        WeatherPlan::Transition { state, skybox_url } => (state, skybox_url),
    };
    let recipe = WeatherRecipe::for_state(weather);
    let camera = cameras.single().ok();

    rain.stop(&mut scene);
    if let Some(camera) = camera {
        scene
            .commands
            .entity(camera)
            .remove::<(DistanceFog, Skybox, EnvironmentMapLight)>();
    }
    controller.close_skybox(&mut scene);

    clear_colour.0 = recipe.background;
    lights.apply(&recipe);

    if let (Some(fog), Some(camera)) = (recipe.fog, camera) {
        scene.commands.entity(camera).insert(DistanceFog {
            color: fog.color,
            falloff: FogFalloff::ExponentialSquared {
                density: fog.density,
            },
            ..default()
        });
    }

    if recipe.rain {
        rain.start(&mut scene);
    }

    progress.skybox_in_flight = skybox_url.is_some();
    if let Some(url) = skybox_url.clone() {
        let token = controller.generation.current();
        let sender = inbox.clone();
        let pending = pending.clone();
        let face_size = profile.skybox_face_size();
        spawn_task(move || async move {
            let outcome = load_skybox(&url, face_size, &pending).await;
            sender.push(SkyboxResult {
                token,
                url,
                outcome,
            });
        });
    }

    info!("Weather → {}", weather);
    controller.commit(weather, skybox_url);
}

/// Attach finished sky images; results from superseded requests never reach the GPU.
pub fn attach_skybox(
    inbox: Res<Inbox<SkyboxResult>>,
    mut controller: ResMut<WeatherController>,
    mut scene: SceneAssets,
    cameras: Query<Entity, With<ViewerCamera>>,
    mut progress: ResMut<LoadingProgress>,
) {
    for result in inbox.drain() {
        if !controller.is_current(result.token) {
            debug!("Discarding stale skybox {}", result.url);
            continue;
        }
        progress.skybox_in_flight = false;

        let faces = match result.outcome {
            Ok(faces) => faces,
            Err(e) => {
                warn!("Skybox unavailable, keeping solid background: {}", e);
                continue;
            }
        };
        let Ok(camera) = cameras.single() else {
            continue;
        };

        close_scope(&mut controller.skybox_scope, &mut scene);
        let mut scope = ResourceScope::new("skybox");
        let image = scope.track_image(scene.images.add(cubemap_image(faces)));
        scene.commands.entity(camera).insert((
            Skybox {
                image: image.clone(),
                brightness: SKYBOX_BRIGHTNESS,
                ..default()
            },
            EnvironmentMapLight {
                diffuse_map: image.clone(),
                specular_map: image,
                intensity: ENVIRONMENT_MAP_INTENSITY,
                ..default()
            },
        ));
        controller.skybox_scope = Some(scope);
        info!("Skybox attached from {}", result.url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::core::commands::ViewerCommand;
    use crate::engine::core::performance_profile::DeviceCaps;
    use crate::engine::scene::lighting::spawn_lighting;
    use crate::engine::weather::recipe::SKY_BLUE;

    #[test]
    fn test_plan_is_idempotent() {
        let mut controller = WeatherController::default();
        let mut skyboxes = SkyboxSet::default();
        skyboxes.insert(WeatherState::Night, "night.hdr");

        let plan = controller.plan(WeatherState::Night, &skyboxes);
        assert_eq!(
            plan,
            WeatherPlan::Transition {
                state: WeatherState::Night,
                skybox_url: Some("night.hdr".into())
            }
        );
        controller.commit(WeatherState::Night, Some("night.hdr".into()));
        assert_eq!(controller.plan(WeatherState::Night, &skyboxes), WeatherPlan::Unchanged);

        skyboxes.insert(WeatherState::Night, "night-2.hdr");
        assert!(matches!(
            controller.plan(WeatherState::Night, &skyboxes),
            WeatherPlan::Transition { .. }
        ));
    }

    fn weather_app() -> App {
        let profile = PerformanceProfile::from_caps(DeviceCaps {
            hardware_concurrency: 8,
            device_pixel_ratio: 1.0,
        });
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .init_resource::<Assets<Mesh>>()
            .init_resource::<Assets<StandardMaterial>>()
            .init_resource::<Assets<Image>>()
            .init_resource::<AmbientLight>()
            .init_resource::<ClearColor>()
            .init_resource::<ViewerState>()
            .init_resource::<WeatherController>()
            .init_resource::<Inbox<SkyboxResult>>()
            .init_resource::<PendingObjectUrls>()
            .init_resource::<LoadingProgress>()
            .insert_resource(RainSystem::for_profile(&profile))
            .insert_resource(profile)
            .add_systems(Update, (apply_weather, attach_skybox).chain());
        app.world_mut().spawn((ViewerCamera, Transform::default()));
        let mut commands = app.world_mut().commands();
        spawn_lighting(&mut commands, &profile);
        app.world_mut().flush();
        app
    }

    fn set_weather(app: &mut App, weather: WeatherState) {
        app.world_mut()
            .resource_mut::<ViewerState>()
            .apply(ViewerCommand::SetWeather(weather));
        app.update();
    }

    fn camera_has<C: Component>(app: &mut App) -> bool {
        let mut query = app.world_mut().query_filtered::<Has<C>, With<ViewerCamera>>();
        query.single(app.world()).unwrap()
    }

    #[test]
    fn test_sunny_without_skybox_is_sky_blue_and_dry() {
        let mut app = weather_app();
        app.update();
        assert_eq!(app.world().resource::<ClearColor>().0, SKY_BLUE);
        assert_eq!(app.world().resource::<RainSystem>().handle_count(), 0);
        assert!(!camera_has::<DistanceFog>(&mut app));
        assert!(!camera_has::<Skybox>(&mut app));
    }

    #[test]
    fn test_rainy_then_sunny_releases_rain() {
        let mut app = weather_app();
        set_weather(&mut app, WeatherState::Rainy);
        assert!(app.world().resource::<RainSystem>().handle_count() > 0);
        assert!(camera_has::<DistanceFog>(&mut app));

        set_weather(&mut app, WeatherState::Sunny);
        assert_eq!(app.world().resource::<RainSystem>().handle_count(), 0);
        assert_eq!(app.world().resource::<Assets<Mesh>>().len(), 0);
        assert!(!camera_has::<DistanceFog>(&mut app));
    }

    #[test]
    fn test_repeated_rainy_does_not_rebuild() {
        let mut app = weather_app();
        set_weather(&mut app, WeatherState::Rainy);
        set_weather(&mut app, WeatherState::Rainy);
        set_weather(&mut app, WeatherState::Rainy);
        assert_eq!(app.world().resource::<Assets<Mesh>>().len(), 1);
    }

    fn faces() -> CubemapFaces {
        CubemapFaces {
            face_size: 1,
            data: vec![128; 4 * 6],
        }
    }

    #[test]
    fn test_stale_skybox_is_dropped() {
        let mut app = weather_app();
        app.update();
        let stale = app.world().resource::<WeatherController>().generation.current();
        set_weather(&mut app, WeatherState::Night);

        app.world().resource::<Inbox<SkyboxResult>>().push(SkyboxResult {
            token: stale,
            url: "old.hdr".into(),
            outcome: Ok(faces()),
        });
        app.update();
        assert!(!camera_has::<Skybox>(&mut app));
        assert_eq!(app.world().resource::<Assets<Image>>().len(), 0);
    }

    #[test]
    fn test_current_skybox_attaches_and_is_released_on_change() {
        let mut app = weather_app();
        app.update();
        let token = app.world().resource::<WeatherController>().generation.current();
        app.world().resource::<Inbox<SkyboxResult>>().push(SkyboxResult {
            token,
            url: "sunny.hdr".into(),
            outcome: Ok(faces()),
        });
        app.update();
        assert!(camera_has::<Skybox>(&mut app));
        assert!(camera_has::<EnvironmentMapLight>(&mut app));
        assert_eq!(app.world().resource::<WeatherController>().skybox_handle_count(), 1);

        set_weather(&mut app, WeatherState::Foggy);
        assert!(!camera_has::<Skybox>(&mut app));
        assert_eq!(app.world().resource::<Assets<Image>>().len(), 0);
    }

    #[test]
    fn test_failed_skybox_keeps_solid_colour() {
        let mut app = weather_app();
        app.update();
        let token = app.world().resource::<WeatherController>().generation.current();
        app.world().resource::<Inbox<SkyboxResult>>().push(SkyboxResult {
            token,
            url: "missing.hdr".into(),
            outcome: Err(SkyboxError::Decode {
                url: "missing.hdr".into(),
                reason: "truncated".into(),
            }),
        });
        app.update();
        assert!(!camera_has::<Skybox>(&mut app));
        assert_eq!(app.world().resource::<ClearColor>().0, SKY_BLUE);
    }
}
