use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherState {
    #[default]
    Sunny,
    Rainy,
    Night,
    Foggy,
}

impl WeatherState {
    pub const ALL: [WeatherState; 4] = [
        WeatherState::Sunny,
        WeatherState::Rainy,
        WeatherState::Night,
        WeatherState::Foggy,
    ];

    pub fn from_string(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sunny" | "sun" | "clear" => Some(WeatherState::Sunny),
            "rainy" | "rain" => Some(WeatherState::Rainy),
            "night" => Some(WeatherState::Night),
            "foggy" | "fog" => Some(WeatherState::Foggy),
            _ => None,
        }
    }

    pub fn has_rain(self) -> bool {
        self == WeatherState::Rainy
    }
}

impl fmt::Display for WeatherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WeatherState::Sunny => "sunny",
            WeatherState::Rainy => "rainy",
            WeatherState::Night => "night",
            WeatherState::Foggy => "foggy",
        })
    }
}

/// Optional equirectangular sky image per weather state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkyboxSet(HashMap<WeatherState, String>);

impl SkyboxSet {
    pub fn url_for(&self, state: WeatherState) -> Option<&str> {
        self.0
            .get(&state)
            .map(String::as_str)
            .filter(|url| !url.trim().is_empty())
    }

    pub fn insert(&mut self, state: WeatherState, url: impl Into<String>) {
        self.0.insert(state, url.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skybox_set_deserialises_from_state_map() {
        let set: SkyboxSet =
            serde_json::from_str(r#"{"sunny": "sky/day.jpg", "night": ""}"#).unwrap();
        assert_eq!(set.url_for(WeatherState::Sunny), Some("sky/day.jpg"));
        assert_eq!(set.url_for(WeatherState::Night), None);
        assert_eq!(set.url_for(WeatherState::Rainy), None);
    }

    #[test]
    fn test_weather_names() {
        assert_eq!(WeatherState::from_string("Fog"), Some(WeatherState::Foggy));
        assert_eq!(WeatherState::from_string("snow"), None);
        assert_eq!(
            serde_json::to_string(&WeatherState::Night).unwrap(),
            "\"night\""
        );
    }
}
