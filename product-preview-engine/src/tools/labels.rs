use crate::engine::camera::orbit_controls::ViewerCamera;
use bevy::prelude::*;
use constants::measurement::{LABEL_HALF_HEIGHT_PX, LABEL_HALF_WIDTH_PX};

/// Full-window UI root that world-anchored labels are parented to.
#[derive(Component)]
pub struct LabelLayer;

/// A UI node that follows a world-space point.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct AnchoredLabel {
    pub world_anchor: Vec3,
    /// Disabled labels stay hidden wherever the anchor projects.
    pub enabled: bool,
}

impl AnchoredLabel {
    pub fn new(world_anchor: Vec3, enabled: bool) -> Self {
        Self {
            world_anchor,
            enabled,
        }
    }
}

pub fn spawn_label_layer(commands: &mut Commands) -> Entity {
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                ..default()
            },
            LabelLayer,
        ))
        .id()
}

/// Centre a label on its projected viewport position, or hide it.
fn place_label(node: &mut Node, viewport: Option<Vec2>) {
    match viewport {
        Some(position) => {
            node.display = Display::Flex;
            node.left = Val::Px(position.x - LABEL_HALF_WIDTH_PX);
            node.top = Val::Px(position.y - LABEL_HALF_HEIGHT_PX);
        }
        None => node.display = Display::None,
    }
}

/// Project every anchored label through the viewer camera. Anchors behind the camera are hidden.
pub fn project_anchored_labels(
    cameras: Query<(&Camera, &GlobalTransform), With<ViewerCamera>>,
    mut labels: Query<(&AnchoredLabel, &mut Node)>,
) {
    let Ok((camera, camera_transform)) = cameras.single() else {
        return;
    };
    for (label, mut node) in &mut labels {
        let viewport = label
            .enabled
            .then(|| camera.world_to_viewport(camera_transform, label.world_anchor).ok())
            .flatten();
        place_label(&mut node, viewport);
    }
}
