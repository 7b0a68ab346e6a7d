use crate::engine::core::commands::ViewerCommand;
use crate::engine::weather::state::{SkyboxSet, WeatherState};
use crate::tools::dimensions::{LengthUnit, ProductDimensions};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MountSize {
    pub width: f32,
    pub height: f32,
}

/// Initial mount inputs, loaded from JSON. Mirrors the RPC surface.
#[derive(Asset, TypePath, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerManifest {
    pub models: Vec<String>,
    pub start_index: usize,
    pub weather: WeatherState,
    pub skyboxes: SkyboxSet,
    pub dimensions: Option<ProductDimensions>,
    pub default_assumed_unit: LengthUnit,
    pub display_unit: LengthUnit,
    pub measurements_visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mount_size: Option<MountSize>,
}

impl Default for ViewerManifest {
    fn default() -> Self {
        Self {
            models: Vec::new(),
            start_index: 0,
            weather: WeatherState::default(),
            skyboxes: SkyboxSet::default(),
            dimensions: None,
            default_assumed_unit: LengthUnit::default(),
            display_unit: LengthUnit::default(),
            measurements_visible: true,
            mount_size: None,
        }
    }
}

/// Runtime settings that are not commands.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct ViewerSettings {
    pub default_assumed_unit: LengthUnit,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            default_assumed_unit: LengthUnit::Mm,
        }
    }
}

impl ViewerManifest {
    pub fn settings(&self) -> ViewerSettings {
        ViewerSettings {
            default_assumed_unit: self.default_assumed_unit,
        }
    }

    /// The command sequence that brings a fresh viewer to this manifest's state.
    pub fn commands(&self) -> Vec<ViewerCommand> {
        let mut commands = vec![
            ViewerCommand::SetDisplayUnit(self.display_unit),
            ViewerCommand::SetMeasurementsVisible(self.measurements_visible),
            ViewerCommand::SetSkyboxes(self.skyboxes.clone()),
            ViewerCommand::SetWeather(self.weather),
            ViewerCommand::SetDimensions(self.dimensions),
        ];
        if let Some(size) = self.mount_size {
            commands.push(ViewerCommand::Resize {
                width: size.width,
                height: size.height,
            });
        }
        if !self.models.is_empty() {
            commands.push(ViewerCommand::SetModels {
                urls: self.models.clone(),
                start_index: self.start_index,
            });
        }
        commands
    }
}
