use crate::engine::camera::orbit_controls::{OrbitControls, ViewerCamera};
use crate::engine::core::app_state::ViewerPhase;
use crate::engine::core::viewer_state::ViewerState;
use crate::engine::loading::model_spawner::ActiveModel;
use crate::engine::loading::progress::LoadingIndicator;
use crate::engine::resources::object_url::PendingObjectUrls;
use crate::engine::weather::controller::WeatherController;
use crate::engine::weather::rain_system::RainSystem;
use crate::tools::labels::LabelLayer;
use crate::tools::measure::MeasurementOverlay;
use bevy::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownStep {
    StopFrameLoop,
    DisposeOverlay,
    RemoveControls,
    ReleaseRenderer,
    RevokeObjectUrls,
    DisposeEnvironment,
    RemoveUiNodes,
}

/// Steps taken by the last teardown, in the order they ran.
#[derive(Resource, Debug, Default, Clone, PartialEq)]
pub struct TeardownReport {
    pub steps: Vec<TeardownStep>,
}

fn with_resource<R: Resource>(world: &mut World, f: impl FnOnce(&mut World, Mut<R>)) {
    if world.contains_resource::<R>() {
        world.resource_scope(f);
    }
}

fn despawn_all<F: bevy::ecs::query::QueryFilter>(world: &mut World) -> usize {
    let entities: Vec<Entity> = world
        .query_filtered::<Entity, F>()
        .iter(world)
        .collect();
    for &entity in &entities {
        world.despawn(entity);
    }
    entities.len()
}

/// Release everything the viewer created. Runs once when the host asks for teardown.
pub fn teardown_viewer(world: &mut World) {
    let mut report = TeardownReport::default();

    if let Some(mut next) = world.get_resource_mut::<NextState<ViewerPhase>>() {
        next.set(ViewerPhase::TornDown);
    }
    if let Some(mut state) = world.get_resource_mut::<ViewerState>() {
        state.teardown_requested = false;
    }
    report.steps.push(TeardownStep::StopFrameLoop);

    with_resource::<MeasurementOverlay>(world, |world, mut overlay| overlay.clear(world));
    report.steps.push(TeardownStep::DisposeOverlay);

    world.remove_resource::<OrbitControls>();
    report.steps.push(TeardownStep::RemoveControls);

    let cameras = despawn_all::<With<ViewerCamera>>(world);
    world.send_event(AppExit::Success);
    debug!("Released {} viewer cameras", cameras);
    report.steps.push(TeardownStep::ReleaseRenderer);

    let revoked = world
        .get_resource::<PendingObjectUrls>()
        .map(PendingObjectUrls::revoke_all)
        .unwrap_or(0);
    debug!("Revoked {} object URLs", revoked);
    report.steps.push(TeardownStep::RevokeObjectUrls);

    with_resource::<WeatherController>(world, |world, mut weather| {
        weather.close_skybox(world);
    });
    with_resource::<RainSystem>(world, |world, mut rain| {
        rain.stop(world);
    });
    report.steps.push(TeardownStep::DisposeEnvironment);

    despawn_all::<Or<(With<LabelLayer>, With<LoadingIndicator>)>>(world);
    with_resource::<ActiveModel>(world, |world, mut active| {
        active.close(world);
    });
    report.steps.push(TeardownStep::RemoveUiNodes);

    info!("Viewer torn down: {:?}", report.steps);
    world.insert_resource(report);
}
