use crate::engine::assets::viewer_manifest::ViewerManifest;
use crate::engine::core::commands::ViewerCommandQueue;
use crate::engine::loading::progress::LoadingProgress;
use bevy::asset::LoadState;
use bevy::prelude::*;
use constants::path::VIEWER_MANIFEST_PATH;

#[derive(Resource, Default)]
pub struct ManifestLoader {
    handle: Option<Handle<ViewerManifest>>,
}

pub fn start_loading(mut manifest_loader: ResMut<ManifestLoader>, asset_server: Res<AssetServer>) {
    info!("Loading mount manifest from {}", VIEWER_MANIFEST_PATH);
    manifest_loader.handle = Some(asset_server.load(VIEWER_MANIFEST_PATH));
}

/// Queue the manifest's commands once it resolves. A missing or broken
/// manifest leaves the viewer empty and driven by RPC alone.
pub fn load_manifest_system(
    mut progress: ResMut<LoadingProgress>,
    manifest_loader: Res<ManifestLoader>,
    manifests: Res<Assets<ViewerManifest>>,
    asset_server: Res<AssetServer>,
    mut queue: ResMut<ViewerCommandQueue>,
    mut commands: Commands,
) {
    if progress.manifest_resolved {
        return;
    }
    let Some(handle) = manifest_loader.handle.as_ref() else {
        return;
    };

    if let Some(manifest) = manifests.get(handle) {
        info!(
            "✓ Manifest loaded: {} models, weather {}",
            manifest.models.len(),
            manifest.weather
        );
        commands.insert_resource(manifest.settings());
        queue.extend(manifest.commands());
        progress.manifest_resolved = true;
        return;
    }

    if let Some(LoadState::Failed(error)) = asset_server.get_load_state(handle) {
        warn!("No usable mount manifest ({}); waiting for RPC", error);
        progress.manifest_resolved = true;
    }
}
