use crate::engine::core::performance_profile::PerformanceProfile;
use crate::engine::resources::scope::{DisposeSink, ResourceScope, SceneAssets, ScopeReport};
use crate::engine::weather::rain::{RainField, RainVolume};
use bevy::prelude::*;
use bevy::render::mesh::{PrimitiveTopology, VertexAttributeValues};
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::view::NoFrustumCulling;
use constants::rain::{LOW_END_RAIN_FRAME_INTERVAL, RAIN_SEED};

#[derive(Component)]
pub struct RainMesh;

struct ActiveRain {
    field: RainField,
    mesh: Handle<Mesh>,
    scope: ResourceScope,
}

/// Owns the single rain line mesh while rainy weather is active.
#[derive(Resource)]
pub struct RainSystem {
    active: Option<ActiveRain>,
    volume: RainVolume,
    frame_interval: u32,
    budget: usize,
}

impl Default for RainSystem {
    fn default() -> Self {
        Self {
            active: None,
            volume: RainVolume::default(),
            frame_interval: 1,
            budget: 0,
        }
    }
}

impl RainSystem {
    pub fn for_profile(profile: &PerformanceProfile) -> Self {
        Self {
            frame_interval: if profile.is_low_end {
                LOW_END_RAIN_FRAME_INTERVAL
            } else {
                1
            },
            budget: profile.particle_budget,
            ..default()
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn handle_count(&self) -> usize {
        self.active
            .as_ref()
            .map(|rain| rain.scope.handle_count())
            .unwrap_or(0)
    }

    pub fn particle_count(&self) -> usize {
        self.active.as_ref().map(|rain| rain.field.len()).unwrap_or(0)
    }

    pub fn volume(&self) -> RainVolume {
        self.volume
    }

    pub fn set_volume(&mut self, volume: RainVolume) {
        self.volume = volume;
        if let Some(rain) = self.active.as_mut() {
            rain.field.set_volume(volume);
        }
    }

    pub fn start(&mut self, scene: &mut SceneAssets) {
        if self.active.is_some() {
            return;
        }
        let field = RainField::new(self.budget, self.volume, RAIN_SEED);
        let mut positions = vec![[0.0f32; 3]; field.vertex_count()];
        if let Err(e) = field.write_segments(&mut positions) {
            warn!("Rain disabled: {}", e);
            return;
        }

        let mut mesh = Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::default());
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);

        let mut scope = ResourceScope::new("rain");
        let mesh = scope.track_mesh(scene.meshes.add(mesh));
        let material = scope.track_material(scene.materials.add(StandardMaterial {
            base_color: Color::srgba(0.75, 0.8, 0.9, 0.55),
            unlit: true,
            alpha_mode: AlphaMode::Blend,
            ..default()
        }));
        let entity = scene
            .commands
            .spawn((
                Mesh3d(mesh.clone()),
                MeshMaterial3d(material),
                Transform::default(),
                NoFrustumCulling,
                RainMesh,
            ))
            .id();
        scope.track_entity(entity);

        info!("Rain started with {} particles", field.len());
        self.active = Some(ActiveRain { field, mesh, scope });
    }

    pub fn stop(&mut self, sink: &mut impl DisposeSink) -> ScopeReport {
        match self.active.take() {
            Some(rain) => rain.scope.close(sink),
            None => ScopeReport::default(),
        }
    }
}

/// Step the field and rewrite the existing vertex buffer in place.
pub fn advance_rain(mut rain: ResMut<RainSystem>, time: Res<Time>, mut scene: SceneAssets) {
    let interval = rain.frame_interval;
    let Some(active) = rain.active.as_mut() else {
        return;
    };

    let result = active.field.advance(time.delta_secs(), interval).and_then(|stepped| {
        if !stepped {
            return Ok(());
        }
        match scene
            .meshes
            .get_mut(&active.mesh)
            .and_then(|mesh| mesh.attribute_mut(Mesh::ATTRIBUTE_POSITION))
        {
            Some(VertexAttributeValues::Float32x3(positions)) => {
                active.field.write_segments(positions)
            }
            _ => Ok(()),
        }
    });

    if let Err(e) = result {
        warn!("Rain simulation failed, shutting it down: {}", e);
        rain.stop(&mut scene);
    }
}
