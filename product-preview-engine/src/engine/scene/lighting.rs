use crate::engine::core::performance_profile::PerformanceProfile;
use crate::engine::weather::recipe::{LightSpec, WeatherRecipe};
use bevy::ecs::system::SystemParam;
use bevy::pbr::DirectionalLightShadowMap;
use bevy::prelude::*;

#[derive(Component)]
pub struct SunLight;

#[derive(Component)]
pub struct FillLight;

#[derive(Component)]
pub struct RimLight(pub usize);

fn aimed_at_origin(spec: &LightSpec) -> Transform {
    Transform::from_translation(spec.position).looking_at(Vec3::ZERO, Vec3::Y)
}

pub fn spawn_lighting(commands: &mut Commands, profile: &PerformanceProfile) {
    commands.insert_resource(DirectionalLightShadowMap {
        size: profile.shadow_map_size,
    });

    commands.spawn((
        DirectionalLight {
            shadows_enabled: true,
            ..default()
        },
        Transform::default(),
        SunLight,
    ));
    commands.spawn((
        DirectionalLight {
            shadows_enabled: profile.fill_shadows(),
            ..default()
        },
        Transform::default(),
        FillLight,
    ));

    let rim_visibility = if profile.rim_lights() {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    };
    for index in 0..2 {
        commands.spawn((
            DirectionalLight {
                shadows_enabled: false,
                ..default()
            },
            Transform::default(),
            rim_visibility,
            RimLight(index),
        ));
    }
}

fn apply_spec(light: &mut DirectionalLight, transform: &mut Transform, spec: &LightSpec) {
    light.color = spec.color;
    light.illuminance = spec.illuminance;
    *transform = aimed_at_origin(spec);
}

/// The ambient term plus every directional light the weather recipes drive.
#[derive(SystemParam)]
pub struct SceneLights<'w, 's> {
    ambient: ResMut<'w, AmbientLight>,
    sun: Query<'w, 's, (&'static mut DirectionalLight, &'static mut Transform), With<SunLight>>,
    fill: Query<
        'w,
        's,
        (&'static mut DirectionalLight, &'static mut Transform),
        (With<FillLight>, Without<SunLight>),
    >,
    rims: Query<
        'w,
        's,
        (
            &'static mut DirectionalLight,
            &'static mut Transform,
            &'static RimLight,
        ),
        (Without<SunLight>, Without<FillLight>),
    >,
}

impl SceneLights<'_, '_> {
    /// Push a recipe's ambient, sun, fill and rim values onto the spawned lights.
    pub fn apply(&mut self, recipe: &WeatherRecipe) {
        let (colour, brightness) = recipe.blended_ambient();
        self.ambient.color = colour;
        self.ambient.brightness = brightness;

        for (mut light, mut transform) in self.sun.iter_mut() {
            apply_spec(&mut light, &mut transform, &recipe.sun);
        }
        for (mut light, mut transform) in self.fill.iter_mut() {
            apply_spec(&mut light, &mut transform, &recipe.fill);
        }
        for (mut light, mut transform, rim) in self.rims.iter_mut() {
            if let Some(spec) = recipe.rim.get(rim.0) {
                apply_spec(&mut light, &mut transform, spec);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::core::performance_profile::DeviceCaps;
    use crate::engine::weather::state::WeatherState;

    fn profile(concurrency: u32) -> PerformanceProfile {
        PerformanceProfile::from_caps(DeviceCaps {
            hardware_concurrency: concurrency,
            device_pixel_ratio: 1.0,
        })
    }

    fn spawn_into(world: &mut World, profile: PerformanceProfile) {
        let mut queue = bevy::ecs::world::CommandQueue::default();
        let mut commands = Commands::new(&mut queue, world);
        spawn_lighting(&mut commands, &profile);
        queue.apply(world);
    }

    #[test]
    fn test_low_end_hides_rims_and_fill_shadows() {
        let mut world = World::new();
        spawn_into(&mut world, profile(2));

        let mut rims = world.query_filtered::<&Visibility, With<RimLight>>();
        assert!(rims.iter(&world).all(|v| *v == Visibility::Hidden));
        let mut fill = world.query_filtered::<&DirectionalLight, With<FillLight>>();
        assert!(fill.iter(&world).all(|l| !l.shadows_enabled));
        assert_eq!(world.resource::<DirectionalLightShadowMap>().size, 1024);
    }

    #[test]
    fn test_capable_device_keeps_rims() {
        let mut world = World::new();
        spawn_into(&mut world, profile(12));
        let mut rims = world.query_filtered::<&Visibility, With<RimLight>>();
        assert_eq!(rims.iter(&world).count(), 2);
        assert!(rims.iter(&world).all(|v| *v == Visibility::Inherited));
    }

    #[test]
    fn test_apply_sets_sun_from_recipe() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        app.init_resource::<AmbientLight>();
        spawn_into(app.world_mut(), profile(12));

        app.add_systems(Update, |mut lights: SceneLights| {
            lights.apply(&WeatherRecipe::for_state(WeatherState::Night));
        });
        app.update();

        let night = WeatherRecipe::for_state(WeatherState::Night);
        let mut sun = app
            .world_mut()
            .query_filtered::<&DirectionalLight, With<SunLight>>();
        let sun = sun.single(app.world()).unwrap();
        assert_eq!(sun.illuminance, night.sun.illuminance);
        assert_eq!(
            app.world().resource::<AmbientLight>().brightness,
            night.blended_ambient().1
        );
    }
}
