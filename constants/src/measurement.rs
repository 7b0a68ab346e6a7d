use bevy::prelude::*;

/// Gap between the model edge and an indicator line, relative to the model's largest dimension.
pub const INDICATOR_OFFSET_FACTOR: f32 = 0.12;
/// Half length of the tick marks at each end of an indicator line.
pub const TICK_HALF_LENGTH_FACTOR: f32 = 0.025;
/// Extension lines run slightly past the indicator line.
pub const EXTENSION_OVERSHOOT_FACTOR: f32 = 0.02;

pub const MEASUREMENT_LINE_COLOUR: Color = Color::srgb(0.95, 0.35, 0.1);
pub const LABEL_TEXT_COLOUR: Color = Color::srgb(1.0, 1.0, 1.0);
pub const LABEL_BACKGROUND_COLOUR: Color = Color::srgba(0.08, 0.08, 0.1, 0.75);
pub const LABEL_FONT_SIZE: f32 = 14.0;

/// Approximate label box used to centre text on its anchor.
pub const LABEL_HALF_WIDTH_PX: f32 = 32.0;
pub const LABEL_HALF_HEIGHT_PX: f32 = 10.0;
