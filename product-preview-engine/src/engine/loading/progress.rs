use bevy::prelude::*;

#[derive(Resource, Default)]
pub struct LoadingProgress {
    pub manifest_resolved: bool,
    pub model_in_flight: bool,
    pub skybox_in_flight: bool,
}

#[derive(Component)]
pub struct LoadingIndicator;

pub fn spawn_loading_indicator(commands: &mut Commands) -> Entity {
    commands
        .spawn((
            Text::new("Loading model…"),
            TextFont {
                font_size: 16.0,
                ..default()
            },
            TextColor(Color::srgb(0.9, 0.9, 0.9)),
            Node {
                position_type: PositionType::Absolute,
                bottom: Val::Px(12.0),
                left: Val::Px(12.0),
                display: Display::None,
                ..default()
            },
            LoadingIndicator,
        ))
        .id()
}

/// Show the indicator only while a model request is outstanding.
pub fn update_loading_indicator(
    progress: Res<LoadingProgress>,
    mut indicators: Query<&mut Node, With<LoadingIndicator>>,
) {
    if !progress.is_changed() {
        return;
    }
    let display = if progress.model_in_flight {
        Display::Flex
    } else {
        Display::None
    };
    for mut node in &mut indicators {
        node.display = display;
    }
}
