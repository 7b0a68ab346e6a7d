use crate::engine::weather::state::WeatherState;
use bevy::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSpec {
    pub color: Color,
    pub illuminance: f32,
    /// Light placement relative to the scene origin; lights aim at the origin.
    pub position: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FogSpec {
    pub color: Color,
    pub density: f32,
}

/// Lighting, fog, background and rain for one weather state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherRecipe {
    pub background: Color,
    pub ambient_color: Color,
    pub ambient_brightness: f32,
    pub hemisphere_sky: Color,
    pub hemisphere_ground: Color,
    pub hemisphere_brightness: f32,
    pub sun: LightSpec,
    pub fill: LightSpec,
    pub rim: [LightSpec; 2],
    pub fog: Option<FogSpec>,
    pub rain: bool,
}

pub const SKY_BLUE: Color = Color::srgb(0.529, 0.808, 0.922);
pub const PALE_SLATE: Color = Color::srgb(0.58, 0.64, 0.70);
pub const NIGHT_NAVY: Color = Color::srgb(0.02, 0.03, 0.08);
pub const FOG_GREY: Color = Color::srgb(0.80, 0.82, 0.84);

impl WeatherRecipe {
    pub fn for_state(state: WeatherState) -> Self {
        match state {
            WeatherState::Sunny => Self {
                background: SKY_BLUE,
                ambient_color: Color::WHITE,
                ambient_brightness: 350.0,
                hemisphere_sky: Color::srgb(0.85, 0.93, 1.0),
                hemisphere_ground: Color::srgb(0.55, 0.50, 0.42),
                hemisphere_brightness: 250.0,
                sun: LightSpec {
                    color: Color::srgb(1.0, 0.96, 0.88),
                    illuminance: 12_000.0,
                    position: Vec3::new(6.0, 10.0, 8.0),
                },
                fill: LightSpec {
                    color: Color::srgb(0.85, 0.9, 1.0),
                    illuminance: 2_500.0,
                    position: Vec3::new(-8.0, 4.0, 4.0),
                },
                rim: rim_pair(Color::WHITE, 1_500.0),
                fog: None,
                rain: false,
            },
            WeatherState::Rainy => Self {
                background: PALE_SLATE,
                ambient_color: Color::srgb(0.78, 0.82, 0.88),
                ambient_brightness: 260.0,
                hemisphere_sky: Color::srgb(0.62, 0.68, 0.75),
                hemisphere_ground: Color::srgb(0.30, 0.32, 0.34),
                hemisphere_brightness: 180.0,
                sun: LightSpec {
                    color: Color::srgb(0.78, 0.82, 0.9),
                    illuminance: 3_500.0,
                    position: Vec3::new(4.0, 10.0, 6.0),
                },
                fill: LightSpec {
                    color: Color::srgb(0.7, 0.75, 0.85),
                    illuminance: 1_500.0,
                    position: Vec3::new(-8.0, 5.0, 4.0),
                },
                rim: rim_pair(Color::srgb(0.75, 0.8, 0.9), 900.0),
                fog: Some(FogSpec {
                    color: PALE_SLATE,
                    density: 0.035,
                }),
                rain: true,
            },
            WeatherState::Night => Self {
                background: NIGHT_NAVY,
                ambient_color: Color::srgb(0.45, 0.5, 0.75),
                ambient_brightness: 70.0,
                hemisphere_sky: Color::srgb(0.2, 0.25, 0.45),
                hemisphere_ground: Color::srgb(0.05, 0.05, 0.08),
                hemisphere_brightness: 50.0,
                sun: LightSpec {
                    color: Color::srgb(0.7, 0.78, 1.0),
                    illuminance: 900.0,
                    position: Vec3::new(-5.0, 9.0, 6.0),
                },
                fill: LightSpec {
                    color: Color::srgb(1.0, 0.78, 0.55),
                    illuminance: 400.0,
                    position: Vec3::new(7.0, 3.0, 5.0),
                },
                rim: rim_pair(Color::srgb(0.55, 0.65, 1.0), 500.0),
                fog: Some(FogSpec {
                    color: NIGHT_NAVY,
                    density: 0.02,
                }),
                rain: false,
            },
            WeatherState::Foggy => Self {
                background: FOG_GREY,
                ambient_color: Color::srgb(0.9, 0.9, 0.92),
                ambient_brightness: 320.0,
                hemisphere_sky: Color::srgb(0.88, 0.9, 0.92),
                hemisphere_ground: Color::srgb(0.5, 0.5, 0.5),
                hemisphere_brightness: 220.0,
                sun: LightSpec {
                    color: Color::srgb(0.95, 0.95, 0.93),
                    illuminance: 2_800.0,
                    position: Vec3::new(5.0, 10.0, 7.0),
                },
                fill: LightSpec {
                    color: Color::srgb(0.9, 0.92, 0.95),
                    illuminance: 1_200.0,
                    position: Vec3::new(-8.0, 4.0, 4.0),
                },
                rim: rim_pair(Color::srgb(0.9, 0.9, 0.92), 700.0),
                fog: Some(FogSpec {
                    color: FOG_GREY,
                    density: 0.1,
                }),
                rain: false,
            },
        }
    }

    /// Ambient and hemisphere contributions folded into one ambient term.
    pub fn blended_ambient(&self) -> (Color, f32) {
        let total = self.ambient_brightness + self.hemisphere_brightness;
        if total <= 0.0 {
            return (self.ambient_color, 0.0);
        }
        let ambient = self.ambient_color.to_linear();
        let sky = self.hemisphere_sky.to_linear();
        let ground = self.hemisphere_ground.to_linear();
        let a = self.ambient_brightness / total;
        let h = self.hemisphere_brightness / total * 0.5;
        let colour = LinearRgba::rgb(
            ambient.red * a + (sky.red + ground.red) * h,
            ambient.green * a + (sky.green + ground.green) * h,
            ambient.blue * a + (sky.blue + ground.blue) * h,
        );
        (Color::from(colour), total)
    }
}

fn rim_pair(color: Color, illuminance: f32) -> [LightSpec; 2] {
    [
        LightSpec {
            color,
            illuminance,
            position: Vec3::new(-6.0, 6.0, -8.0),
        },
        LightSpec {
            color,
            illuminance,
            position: Vec3::new(6.0, 5.0, -8.0),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_rainy_has_rain() {
        for state in WeatherState::ALL {
            assert_eq!(WeatherRecipe::for_state(state).rain, state == WeatherState::Rainy);
        }
    }

    #[test]
    fn test_fog_density_ordering() {
        let density = |s| WeatherRecipe::for_state(s).fog.map(|f| f.density).unwrap_or(0.0);
        assert_eq!(density(WeatherState::Sunny), 0.0);
        assert!(density(WeatherState::Foggy) > density(WeatherState::Rainy));
        assert!(density(WeatherState::Rainy) > density(WeatherState::Night));
    }

    #[test]
    fn test_blended_ambient_sums_brightness() {
        let recipe = WeatherRecipe::for_state(WeatherState::Sunny);
        let (_, brightness) = recipe.blended_ambient();
        assert_eq!(
            brightness,
            recipe.ambient_brightness + recipe.hemisphere_brightness
        );
        assert_eq!(recipe.background, SKY_BLUE);
    }
}
