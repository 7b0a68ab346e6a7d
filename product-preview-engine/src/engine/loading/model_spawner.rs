use crate::engine::assets::bounds::RawBounds;
use crate::engine::assets::loaded_model::{
    LoadedMaterial, LoadedMesh, LoadedModel, LoadedTexture, TextureColorSpace,
};
use crate::engine::assets::model_asset::ModelAsset;
use crate::engine::assets::viewer_manifest::ViewerSettings;
use crate::engine::camera::orbit_controls::OrbitControls;
use crate::engine::core::viewer_state::ViewerState;
use crate::engine::loading::error::LoadError;
use crate::engine::loading::model_loader::load_model;
use crate::engine::loading::progress::LoadingProgress;
use crate::engine::loading::tasks::{Inbox, spawn_task};
use crate::engine::resources::generation::{Generation, GenerationToken};
use crate::engine::resources::object_url::PendingObjectUrls;
use crate::engine::resources::scope::{
    DisposeSink, ResourceScope, SceneAssets, ScopeReport, close_scope,
};
use crate::engine::scene::normalize::ModelNormalization;
use crate::engine::weather::rain::RainVolume;
use crate::engine::weather::rain_system::RainSystem;
use crate::tools::unit_store::AssumedUnitStore;
use bevy::image::{ImageAddressMode, ImageSampler, ImageSamplerDescriptor};
use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::{Extent3d, Face, TextureDimension, TextureFormat};

#[derive(Component)]
pub struct ModelRoot;

pub struct ModelLoadResult {
    pub token: GenerationToken,
    pub url: String,
    pub outcome: Result<LoadedModel, LoadError>,
}

/// The model currently on screen and the scope owning its GPU resources.
#[derive(Resource, Default)]
pub struct ActiveModel {
    pub asset: Option<ModelAsset>,
    /// Bounds after normalization.
    pub world_bounds: Option<RawBounds>,
    scope: Option<ResourceScope>,
    generation: Generation,
}

impl ActiveModel {
    pub fn handle_count(&self) -> usize {
        self.scope
            .as_ref()
            .map(ResourceScope::handle_count)
            .unwrap_or(0)
    }

    pub fn entity_count(&self) -> usize {
        self.scope
            .as_ref()
            .map(ResourceScope::entity_count)
            .unwrap_or(0)
    }

    pub fn is_current(&self, token: GenerationToken) -> bool {
        self.generation.is_current(token)
    }

    /// Release the attached model and invalidate any load in flight.
    pub fn close(&mut self, sink: &mut impl DisposeSink) -> ScopeReport {
        self.generation.bump();
        self.asset = None;
        self.world_bounds = None;
        close_scope(&mut self.scope, sink)
    }

    /// Close the current model and hand out the token the next result must carry.
    pub fn begin_request(&mut self, sink: &mut impl DisposeSink) -> GenerationToken {
        self.close(sink);
        self.generation.current()
    }
}

/// Start loading the selected model once the selection changes.
pub fn request_model_load(
    mut state: ResMut<ViewerState>,
    mut active: ResMut<ActiveModel>,
    mut scene: SceneAssets,
    inbox: Res<Inbox<ModelLoadResult>>,
    pending: Res<PendingObjectUrls>,
    mut progress: ResMut<LoadingProgress>,
    mut rain: ResMut<RainSystem>,
) {
    if !state.dirty.model {
        return;
    }
    state.dirty.model = false;
    state.dirty.overlay = true;

    let report = active.close(&mut scene);
    if report.entities > 0 {
        debug!("Released previous model: {:?}", report);
    }
    rain.set_volume(RainVolume::default());

    let Some(url) = state.current_url().map(str::to_string) else {
        progress.model_in_flight = false;
        info!("No model selected");
        return;
    };

    let token = active.generation.current();
    let sender = inbox.clone();
    let pending = pending.clone();
    progress.model_in_flight = true;
    info!("Loading model {} ({})", state.model_index, url);

    spawn_task(move || async move {
        let outcome = load_model(&url, &pending).await;
        sender.push(ModelLoadResult {
            token,
            url,
            outcome,
        });
    });
}

fn texture_image(texture: LoadedTexture) -> Image {
    let format = match texture.color_space {
        TextureColorSpace::Srgb => TextureFormat::Rgba8UnormSrgb,
        TextureColorSpace::Linear => TextureFormat::Rgba8Unorm,
    };
    let mut image = Image::new(
        Extent3d {
            width: texture.width,
            height: texture.height,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        texture.rgba,
        format,
        RenderAssetUsages::default(),
    );
    image.sampler = ImageSampler::Descriptor(ImageSamplerDescriptor {
        address_mode_u: ImageAddressMode::Repeat,
        address_mode_v: ImageAddressMode::Repeat,
        ..ImageSamplerDescriptor::linear()
    });
    image
}

fn build_material(
    material: LoadedMaterial,
    scope: &mut ResourceScope,
    images: &mut Assets<Image>,
) -> StandardMaterial {
    let [r, g, b, a] = material.base_color;
    let [er, eg, eb] = material.emissive;
    let mut upload = |texture: Option<LoadedTexture>| {
        texture.map(|texture| scope.track_image(images.add(texture_image(texture))))
    };
    StandardMaterial {
        base_color: Color::linear_rgba(r, g, b, a),
        base_color_texture: upload(material.base_color_texture),
        emissive: LinearRgba::rgb(er, eg, eb),
        emissive_texture: upload(material.emissive_texture),
        metallic: material.metallic,
        perceptual_roughness: material.roughness,
        double_sided: material.double_sided,
        cull_mode: if material.double_sided {
            None
        } else {
            Some(Face::Back)
        },
        alpha_mode: if material.alpha_blend {
            AlphaMode::Blend
        } else {
            AlphaMode::Opaque
        },
        ..default()
    }
}

fn build_mesh(mesh: LoadedMesh) -> Mesh {
    let vertex_count = mesh.positions.len();
    let mut out = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());
    out.insert_attribute(Mesh::ATTRIBUTE_POSITION, mesh.positions);
    out.insert_attribute(Mesh::ATTRIBUTE_NORMAL, mesh.normals);
    if let Some(uvs) = mesh.uvs.filter(|uvs| uvs.len() == vertex_count) {
        out.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    }
    out.insert_indices(Indices::U32(mesh.indices));
    out
}

/// Spawn a parsed model under a normalized root. Every handle and the root go into one scope.
pub fn spawn_model(model: LoadedModel, scene: &mut SceneAssets) -> (ResourceScope, RawBounds) {
    let normalization = ModelNormalization::for_bounds(&model.raw_bounds);
    let world_bounds = normalization.apply(&model.raw_bounds);
    let mut scope = ResourceScope::new("model");

    let root = scene
        .commands
        .spawn((
            ModelRoot,
            normalization,
            normalization.transform(),
            Visibility::default(),
        ))
        .id();
    scope.track_entity(root);

    for mut mesh in model.meshes {
        let transform = Transform::from_matrix(mesh.transform);
        let material = std::mem::take(&mut mesh.material);
        let material = build_material(material, &mut scope, &mut scene.images);
        let material = scope.track_material(scene.materials.add(material));
        let mesh = scope.track_mesh(scene.meshes.add(build_mesh(mesh)));
        let child = scene
            .commands
            .spawn((Mesh3d(mesh), MeshMaterial3d(material), transform))
            .id();
        scene.commands.entity(root).add_child(child);
    }

    (scope, world_bounds)
}

/// Attach finished loads. Results whose token is no longer current are dropped untouched.
pub fn attach_loaded_models(
    inbox: Res<Inbox<ModelLoadResult>>,
    mut active: ResMut<ActiveModel>,
    mut scene: SceneAssets,
    mut state: ResMut<ViewerState>,
    mut controls: ResMut<OrbitControls>,
    mut rain: ResMut<RainSystem>,
    mut progress: ResMut<LoadingProgress>,
    store: Res<AssumedUnitStore>,
    settings: Res<ViewerSettings>,
) {
    for result in inbox.drain() {
        if !active.is_current(result.token) {
            debug!("Discarding stale model result for {}", result.url);
            continue;
        }
        progress.model_in_flight = false;

        let model = match result.outcome {
            Ok(model) => model,
            Err(e) => {
                error!("Model load failed: {}", e);
                continue;
            }
        };

        // Two results for one token cannot both stay on screen.
        close_scope(&mut active.scope, &mut scene);

        let format = model.format;
        let raw_bounds = model.raw_bounds;
        let mesh_count = model.meshes.len();
        let (scope, world_bounds) = spawn_model(model, &mut scene);

        controls.frame(&world_bounds);
        rain.set_volume(RainVolume::around(&world_bounds));

        let assumed_unit = store.resolve(&result.url, settings.default_assumed_unit);
        active.asset = Some(ModelAsset {
            url: result.url,
            format,
            raw_bounds,
            assumed_unit,
        });
        active.world_bounds = Some(world_bounds);
        active.scope = Some(scope);
        state.dirty.overlay = true;

        info!(
            "✓ Attached {} model with {} meshes, raw size {:?}",
            format,
            mesh_count,
            raw_bounds.size()
        );
    }
}

/// Persist a user override of the assumed authoring unit and rebuild the overlay.
pub fn apply_assumed_unit_override(
    mut state: ResMut<ViewerState>,
    mut active: ResMut<ActiveModel>,
    store: Res<AssumedUnitStore>,
) {
    let Some(unit) = state.assumed_unit_request.take() else {
        return;
    };
    let Some(url) = state.current_url().map(str::to_string) else {
        warn!("Assumed unit {} ignored: no model selected", unit);
        return;
    };

    store.remember(&url, unit);
    if let Some(asset) = active.asset.as_mut().filter(|asset| asset.url == url) {
        asset.assumed_unit = unit;
    }
    state.dirty.overlay = true;
    info!("Assumed unit for {} set to {}", url, unit);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::assets::model_asset::ModelFormat;
    use crate::engine::core::commands::ViewerCommand;
    use crate::tools::dimensions::LengthUnit;
    use constants::render_settings::CANONICAL_MODEL_SIZE;

    fn slab(name: &str, size: Vec3) -> LoadedModel {
        let corners = [
            [0.0, 0.0, 0.0],
            [size.x, 0.0, 0.0],
            [size.x, size.y, 0.0],
            [0.0, size.y, size.z],
        ];
        LoadedModel::new(
            ModelFormat::Glb,
            vec![LoadedMesh {
                name: name.into(),
                positions: corners.to_vec(),
                normals: Vec::new(),
                uvs: None,
                indices: vec![0, 1, 2, 0, 2, 3],
                transform: Mat4::IDENTITY,
                material: LoadedMaterial::default(),
            }],
        )
    }

    fn model_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .init_resource::<Assets<Mesh>>()
            .init_resource::<Assets<StandardMaterial>>()
            .init_resource::<Assets<Image>>()
            .init_resource::<ViewerState>()
            .init_resource::<ActiveModel>()
            .init_resource::<OrbitControls>()
            .init_resource::<RainSystem>()
            .init_resource::<LoadingProgress>()
            .init_resource::<ViewerSettings>()
            .init_resource::<PendingObjectUrls>()
            .init_resource::<Inbox<ModelLoadResult>>()
            .insert_resource(AssumedUnitStore::in_memory())
            .add_systems(
                Update,
                (
                    request_model_load,
                    attach_loaded_models,
                    apply_assumed_unit_override,
                )
                    .chain(),
            );
        app
    }

    fn begin(app: &mut App) -> GenerationToken {
        let id = app
            .world_mut()
            .register_system(|mut active: ResMut<ActiveModel>, mut scene: SceneAssets| {
                active.begin_request(&mut scene)
            });
        app.world_mut().run_system(id).unwrap()
    }

    fn deliver(app: &mut App, token: GenerationToken, url: &str, model: LoadedModel) {
        app.world()
            .resource::<Inbox<ModelLoadResult>>()
            .push(ModelLoadResult {
                token,
                url: url.into(),
                outcome: Ok(model),
            });
    }

    fn root_count(app: &mut App) -> usize {
        let mut roots = app.world_mut().query_filtered::<Entity, With<ModelRoot>>();
        roots.iter(app.world()).count()
    }

    #[test]
    fn test_out_of_order_results_leave_only_latest() {
        let mut app = model_app();
        let token_a = begin(&mut app);
        let token_b = begin(&mut app);

        deliver(&mut app, token_b, "b.glb", slab("b", Vec3::new(1.0, 2.0, 0.1)));
        deliver(&mut app, token_a, "a.glb", slab("a", Vec3::new(3.0, 1.0, 0.1)));
        app.update();

        let active = app.world().resource::<ActiveModel>();
        assert_eq!(active.asset.as_ref().map(|a| a.url.as_str()), Some("b.glb"));
        assert_eq!(root_count(&mut app), 1);
        assert_eq!(app.world().resource::<Assets<Mesh>>().len(), 1);
    }

    #[test]
    fn test_swaps_do_not_accumulate_resources() {
        let mut app = model_app();
        for i in 0..10 {
            let token = begin(&mut app);
            deliver(&mut app, token, &format!("m{i}.glb"), slab("m", Vec3::ONE));
            app.update();
            let active = app.world().resource::<ActiveModel>();
            assert_eq!(active.handle_count(), 2);
            assert_eq!(active.entity_count(), 1);
        }
        assert_eq!(app.world().resource::<Assets<Mesh>>().len(), 1);
        assert_eq!(app.world().resource::<Assets<StandardMaterial>>().len(), 1);
        assert_eq!(root_count(&mut app), 1);
    }

    #[test]
    fn test_attach_normalizes_and_frames() {
        let mut app = model_app();
        let token = begin(&mut app);
        deliver(&mut app, token, "door.glb", slab("door", Vec3::new(900.0, 2100.0, 40.0)));
        app.update();

        let active = app.world().resource::<ActiveModel>();
        let bounds = active.world_bounds.unwrap();
        assert!((bounds.max_dimension() - CANONICAL_MODEL_SIZE).abs() < 1e-4);
        assert!(bounds.min.y.abs() < 1e-5);
        let controls = app.world().resource::<OrbitControls>();
        assert!((controls.target - bounds.center()).length() < 1e-5);
        assert!(app.world().resource::<ViewerState>().dirty.overlay);
    }

    #[test]
    fn test_failed_load_leaves_slot_empty() {
        let mut app = model_app();
        let token = begin(&mut app);
        app.world()
            .resource::<Inbox<ModelLoadResult>>()
            .push(ModelLoadResult {
                token,
                url: "broken.fbx".into(),
                outcome: Err(LoadError::UnsupportedFormat {
                    url: "broken.fbx".into(),
                }),
            });
        app.world_mut().resource_mut::<LoadingProgress>().model_in_flight = true;
        app.update();
        assert!(app.world().resource::<ActiveModel>().asset.is_none());
        assert!(!app.world().resource::<LoadingProgress>().model_in_flight);
        assert_eq!(root_count(&mut app), 0);
    }

    #[test]
    fn test_assumed_unit_is_persisted_per_url() {
        let mut app = model_app();
        app.world_mut()
            .resource_mut::<ViewerState>()
            .model_urls = vec!["door.glb?sig=1".into()];
        let token = begin(&mut app);
        deliver(&mut app, token, "door.glb?sig=1", slab("door", Vec3::ONE));
        app.update();
        assert_eq!(
            app.world().resource::<ActiveModel>().asset.as_ref().unwrap().assumed_unit,
            LengthUnit::Mm
        );

        app.world_mut()
            .resource_mut::<ViewerState>()
            .apply(ViewerCommand::SetAssumedUnit(LengthUnit::Cm));
        app.update();
        assert_eq!(
            app.world().resource::<ActiveModel>().asset.as_ref().unwrap().assumed_unit,
            LengthUnit::Cm
        );
        let store = app.world().resource::<AssumedUnitStore>();
        assert_eq!(store.resolve("door.glb?sig=2", LengthUnit::M), LengthUnit::Cm);
    }

    #[test]
    fn test_closing_model_restores_default_rain_volume() {
        let mut app = model_app();
        let token = begin(&mut app);
        deliver(&mut app, token, "door.glb", slab("door", Vec3::new(900.0, 2100.0, 40.0)));
        app.update();
        assert_ne!(app.world().resource::<RainSystem>().volume(), RainVolume::default());

        app.world_mut()
            .resource_mut::<ViewerState>()
            .apply(ViewerCommand::SetModels {
                urls: Vec::new(),
                start_index: 0,
            });
        app.update();
        assert!(app.world().resource::<ActiveModel>().asset.is_none());
        assert_eq!(app.world().resource::<RainSystem>().volume(), RainVolume::default());
    }

    #[test]
    fn test_fbx_file_loads_through_systems() {
        use crate::engine::loading::fbx::test_support::door_slab;

        let dir = std::env::temp_dir().join("preview_model_spawner");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("door.fbx");
        std::fs::write(&path, door_slab(7500, true)).unwrap();

        let mut app = model_app();
        app.world_mut()
            .resource_mut::<ViewerState>()
            .apply(ViewerCommand::SetModels {
                urls: vec![path.display().to_string()],
                start_index: 0,
            });

        for _ in 0..500 {
            app.update();
            if app.world().resource::<ActiveModel>().asset.is_some() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }

        let active = app.world().resource::<ActiveModel>();
        let asset = active.asset.as_ref().expect("model never attached");
        assert_eq!(asset.format, ModelFormat::Fbx);
        let bounds = active.world_bounds.unwrap();
        assert!((bounds.max_dimension() - CANONICAL_MODEL_SIZE).abs() < 1e-4);
        assert!(!app.world().resource::<LoadingProgress>().model_in_flight);
    }
}
