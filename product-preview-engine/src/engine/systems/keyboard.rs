use crate::engine::core::commands::{ViewerCommand, ViewerCommandQueue};
use crate::engine::core::viewer_state::ViewerState;
use crate::engine::loading::model_spawner::ActiveModel;
use crate::engine::weather::state::WeatherState;
use crate::tools::dimensions::LengthUnit;
use bevy::prelude::*;

/// Map a shortcut key to the command the RPC surface would send for it.
pub fn shortcut_command(
    key: KeyCode,
    state: &ViewerState,
    assumed_unit: Option<LengthUnit>,
) -> Option<ViewerCommand> {
    match key {
        KeyCode::Digit1 => Some(ViewerCommand::SetWeather(WeatherState::Sunny)),
        KeyCode::Digit2 => Some(ViewerCommand::SetWeather(WeatherState::Rainy)),
        KeyCode::Digit3 => Some(ViewerCommand::SetWeather(WeatherState::Night)),
        KeyCode::Digit4 => Some(ViewerCommand::SetWeather(WeatherState::Foggy)),
        KeyCode::ArrowLeft => state.wrapped_index(-1).map(ViewerCommand::ShowModel),
        KeyCode::ArrowRight => state.wrapped_index(1).map(ViewerCommand::ShowModel),
        KeyCode::KeyU => Some(ViewerCommand::SetDisplayUnit(state.display_unit.next())),
        KeyCode::KeyM => Some(ViewerCommand::SetMeasurementsVisible(
            !state.measurements_visible,
        )),
        KeyCode::KeyA => assumed_unit.map(|unit| ViewerCommand::SetAssumedUnit(unit.next())),
        _ => None,
    }
}

/// Native shortcuts. In the browser the host drives the viewer over RPC instead.
pub fn keyboard_shortcuts(
    #[cfg(not(target_arch = "wasm32"))] keyboard: Res<ButtonInput<KeyCode>>,
    #[cfg(not(target_arch = "wasm32"))] state: Res<ViewerState>,
    #[cfg(not(target_arch = "wasm32"))] active: Res<ActiveModel>,
    #[cfg(not(target_arch = "wasm32"))] mut queue: ResMut<ViewerCommandQueue>,
) {
    #[cfg(not(target_arch = "wasm32"))]
    {
        let assumed_unit = active.asset.as_ref().map(|asset| asset.assumed_unit);
        for key in keyboard.get_just_pressed() {
            if let Some(command) = shortcut_command(*key, &state, assumed_unit) {
                info!("Shortcut {:?}: {:?}", key, command);
                queue.push(command);
            }
        }
    }
}
