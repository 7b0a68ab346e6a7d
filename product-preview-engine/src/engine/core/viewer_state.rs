use crate::engine::core::commands::ViewerCommand;
use crate::engine::weather::state::{SkyboxSet, WeatherState};
use crate::tools::dimensions::{LengthUnit, ProductDimensions};
use bevy::prelude::*;

/// Which downstream systems have work pending after a batch of commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ViewerDirty {
    pub model: bool,
    pub weather: bool,
    pub overlay: bool,
    pub labels: bool,
    pub visibility: bool,
}

/// Host-facing inputs, mutated only by draining `ViewerCommandQueue`.
#[derive(Resource, Debug, Clone)]
pub struct ViewerState {
    pub model_urls: Vec<String>,
    pub model_index: usize,
    pub weather: WeatherState,
    pub skyboxes: SkyboxSet,
    pub dimensions: Option<ProductDimensions>,
    pub display_unit: LengthUnit,
    pub measurements_visible: bool,
    pub assumed_unit_request: Option<LengthUnit>,
    pub resize_request: Option<Vec2>,
    pub teardown_requested: bool,
    pub dirty: ViewerDirty,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self {
            model_urls: Vec::new(),
            model_index: 0,
            weather: WeatherState::default(),
            skyboxes: SkyboxSet::default(),
            dimensions: None,
            display_unit: LengthUnit::default(),
            measurements_visible: true,
            assumed_unit_request: None,
            resize_request: None,
            teardown_requested: false,
            // Weather is applied once on start even without a command.
            dirty: ViewerDirty {
                weather: true,
                ..default()
            },
        }
    }
}

impl ViewerState {
    pub fn current_url(&self) -> Option<&str> {
        self.model_urls.get(self.model_index).map(String::as_str)
    }

    /// Index `offset` steps away from the current one, wrapping in both directions.
    pub fn wrapped_index(&self, offset: i64) -> Option<usize> {
        let len = self.model_urls.len() as i64;
        (len > 0).then(|| (self.model_index as i64 + offset).rem_euclid(len) as usize)
    }

    pub fn apply(&mut self, command: ViewerCommand) {
        match command {
            ViewerCommand::SetModels { urls, start_index } => {
                self.model_index = if urls.is_empty() {
                    0
                } else {
                    start_index % urls.len()
                };
                self.model_urls = urls;
                self.dirty.model = true;
            }
            ViewerCommand::ShowModel(index) => {
                if self.model_urls.is_empty() {
                    warn!("show_model({}) ignored: no models set", index);
                    return;
                }
                let wrapped = index % self.model_urls.len();
                if wrapped != self.model_index {
                    self.model_index = wrapped;
                    self.dirty.model = true;
                }
            }
            ViewerCommand::SetWeather(weather) => {
                self.weather = weather;
                self.dirty.weather = true;
            }
            ViewerCommand::SetSkyboxes(skyboxes) => {
                self.skyboxes = skyboxes;
                self.dirty.weather = true;
            }
            ViewerCommand::SetDimensions(dimensions) => {
                self.dimensions = dimensions;
                self.dirty.overlay = true;
            }
            ViewerCommand::SetDisplayUnit(unit) => {
                if unit != self.display_unit {
                    self.display_unit = unit;
                    self.dirty.labels = true;
                }
            }
            ViewerCommand::SetMeasurementsVisible(visible) => {
                if visible != self.measurements_visible {
                    self.measurements_visible = visible;
                    self.dirty.visibility = true;
                }
            }
            ViewerCommand::SetAssumedUnit(unit) => {
                self.assumed_unit_request = Some(unit);
            }
            ViewerCommand::Resize { width, height } => {
                self.resize_request = Some(Vec2::new(width, height));
            }
            ViewerCommand::Teardown => {
                self.teardown_requested = true;
            }
        }
    }
}
