use crate::engine::core::viewer_state::ViewerState;
use crate::engine::weather::state::{SkyboxSet, WeatherState};
use crate::tools::dimensions::{LengthUnit, ProductDimensions};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use std::collections::VecDeque;

/// Everything the host can ask of the viewer. RPC, the mount manifest and
/// native shortcuts all funnel through this type.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerCommand {
    SetModels { urls: Vec<String>, start_index: usize },
    ShowModel(usize),
    SetWeather(WeatherState),
    SetSkyboxes(SkyboxSet),
    SetDimensions(Option<ProductDimensions>),
    SetDisplayUnit(LengthUnit),
    SetMeasurementsVisible(bool),
    SetAssumedUnit(LengthUnit),
    Resize { width: f32, height: f32 },
    Teardown,
}

#[derive(Resource, Default)]
pub struct ViewerCommandQueue {
    pending: VecDeque<ViewerCommand>,
}

impl ViewerCommandQueue {
    pub fn push(&mut self, command: ViewerCommand) {
        self.pending.push_back(command);
    }

    pub fn extend(&mut self, commands: impl IntoIterator<Item = ViewerCommand>) {
        self.pending.extend(commands);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = ViewerCommand> + '_ {
        self.pending.drain(..)
    }
}

/// Apply queued commands in arrival order, then act on window resizes.
pub fn drain_viewer_commands(
    mut queue: ResMut<ViewerCommandQueue>,
    mut state: ResMut<ViewerState>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
) {
    if queue.is_empty() {
        return;
    }
    for command in queue.drain() {
        debug!("Applying {:?}", command);
        state.apply(command);
    }

    if let Some(size) = state.resize_request.take() {
        if size.x > 0.0 && size.y > 0.0 {
            if let Ok(mut window) = windows.single_mut() {
                window.resolution.set(size.x, size.y);
                info!("Resized viewer to {}x{}", size.x, size.y);
            }
        } else {
            warn!("Ignoring resize to {}x{}", size.x, size.y);
        }
    }
}

/// Run condition for the exclusive teardown system.
pub fn teardown_requested(state: Res<ViewerState>) -> bool {
    state.teardown_requested
}
