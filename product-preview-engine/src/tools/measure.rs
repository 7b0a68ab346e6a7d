use crate::engine::assets::bounds::RawBounds;
use crate::engine::core::viewer_state::ViewerState;
use crate::engine::loading::model_spawner::ActiveModel;
use crate::engine::resources::scope::{DisposeSink, ResourceScope, SceneAssets, close_scope};
use crate::tools::dimensions::{Dimensions, ResolvedDimensions, resolve_dimensions};
use crate::tools::labels::{AnchoredLabel, LabelLayer};
use bevy::prelude::*;
use bevy::render::mesh::PrimitiveTopology;
use bevy::render::render_asset::RenderAssetUsages;
use constants::measurement::{
    EXTENSION_OVERSHOOT_FACTOR, INDICATOR_OFFSET_FACTOR, LABEL_BACKGROUND_COLOUR,
    LABEL_FONT_SIZE, LABEL_TEXT_COLOUR, MEASUREMENT_LINE_COLOUR, TICK_HALF_LENGTH_FACTOR,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementAxis {
    Width,
    Height,
    Thickness,
}

/// Line work for one measured dimension: main line, two ticks, two extension lines.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionIndicator {
    pub axis: MeasurementAxis,
    pub segments: [[Vec3; 2]; 5],
    pub label_anchor: Vec3,
    pub length_mm: f64,
}

impl DimensionIndicator {
    fn new(
        axis: MeasurementAxis,
        edge: [Vec3; 2],
        offset: Vec3,
        length_mm: f64,
        tick: f32,
        overshoot: f32,
    ) -> Self {
        let normal = offset.normalize_or_zero();
        let start = edge[0] + offset;
        let end = edge[1] + offset;
        Self {
            axis,
            segments: [
                [start, end],
                [start - normal * tick, start + normal * tick],
                [end - normal * tick, end + normal * tick],
                [edge[0], start + normal * overshoot],
                [edge[1], end + normal * overshoot],
            ],
            label_anchor: (start + end) * 0.5,
            length_mm,
        }
    }

    pub fn main_line(&self) -> [Vec3; 2] {
        self.segments[0]
    }

    fn mesh(&self) -> Mesh {
        let positions: Vec<[f32; 3]> = self
            .segments
            .iter()
            .flat_map(|segment| segment.map(|p| p.to_array()))
            .collect();
        let mut mesh = Mesh::new(PrimitiveTopology::LineList, RenderAssetUsages::default());
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
        mesh
    }
}

/// Width along the top front edge, height up the right front edge, thickness
/// along the right floor edge.
pub fn build_indicators(bounds: &RawBounds, dims: &Dimensions) -> [DimensionIndicator; 3] {
    let scale = bounds.max_dimension();
    let offset = scale * INDICATOR_OFFSET_FACTOR;
    let tick = scale * TICK_HALF_LENGTH_FACTOR;
    let overshoot = scale * EXTENSION_OVERSHOOT_FACTOR;
    let (min, max) = (bounds.min, bounds.max);

    [
        DimensionIndicator::new(
            MeasurementAxis::Width,
            [Vec3::new(min.x, max.y, max.z), Vec3::new(max.x, max.y, max.z)],
            Vec3::Y * offset,
            dims.width_mm,
            tick,
            overshoot,
        ),
        DimensionIndicator::new(
            MeasurementAxis::Height,
            [Vec3::new(max.x, min.y, max.z), Vec3::new(max.x, max.y, max.z)],
            Vec3::X * offset,
            dims.height_mm,
            tick,
            overshoot,
        ),
        DimensionIndicator::new(
            MeasurementAxis::Thickness,
            [Vec3::new(max.x, min.y, min.z), Vec3::new(max.x, min.y, max.z)],
            Vec3::X * offset,
            dims.thickness_mm,
            tick,
            overshoot,
        ),
    ]
}

#[derive(Component)]
pub struct MeasurementLine;

#[derive(Component, Debug, Clone, Copy)]
pub struct MeasurementLabel {
    pub axis: MeasurementAxis,
    pub length_mm: f64,
}

/// Indicator meshes and labels for the current model, owned by one scope.
#[derive(Resource, Default)]
pub struct MeasurementOverlay {
    scope: Option<ResourceScope>,
    resolved: Option<ResolvedDimensions>,
}

impl MeasurementOverlay {
    pub fn resolved(&self) -> Option<&ResolvedDimensions> {
        self.resolved.as_ref()
    }

    pub fn handle_count(&self) -> usize {
        self.scope
            .as_ref()
            .map(ResourceScope::handle_count)
            .unwrap_or(0)
    }

    pub fn clear(&mut self, sink: &mut impl DisposeSink) {
        self.resolved = None;
        close_scope(&mut self.scope, sink);
    }
}

fn visibility_for(visible: bool) -> Visibility {
    if visible {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    }
}

/// Rebuild the indicators when the model, its assumed unit or the supplied dimensions change.
pub fn rebuild_overlay(
    mut state: ResMut<ViewerState>,
    mut overlay: ResMut<MeasurementOverlay>,
    active: Res<ActiveModel>,
    mut scene: SceneAssets,
    layers: Query<Entity, With<LabelLayer>>,
) {
    if !state.dirty.overlay {
        return;
    }
    state.dirty.overlay = false;
    state.dirty.labels = false;
    state.dirty.visibility = false;
    overlay.clear(&mut scene);

    let (Some(asset), Some(world_bounds)) = (active.asset.as_ref(), active.world_bounds) else {
        return;
    };

    let resolved = resolve_dimensions(
        state.dimensions.as_ref(),
        &asset.raw_bounds,
        asset.assumed_unit,
    );
    let visible = state.measurements_visible;
    let layer = layers.iter().next();
    let mut scope = ResourceScope::new("overlay");
    let material = scope.track_material(scene.materials.add(StandardMaterial {
        base_color: MEASUREMENT_LINE_COLOUR,
        unlit: true,
        ..default()
    }));

    for indicator in build_indicators(&world_bounds, &resolved.dimensions) {
        let mesh = scope.track_mesh(scene.meshes.add(indicator.mesh()));
        let line = scene
            .commands
            .spawn((
                Mesh3d(mesh),
                MeshMaterial3d(material.clone()),
                Transform::default(),
                visibility_for(visible),
                MeasurementLine,
            ))
            .id();
        scope.track_entity(line);

        let label = scene
            .commands
            .spawn((
                Text::new(state.display_unit.format_mm(indicator.length_mm)),
                TextFont {
                    font_size: LABEL_FONT_SIZE,
                    ..default()
                },
                TextColor(LABEL_TEXT_COLOUR),
                BackgroundColor(LABEL_BACKGROUND_COLOUR),
                Node {
                    position_type: PositionType::Absolute,
                    padding: UiRect::axes(Val::Px(6.0), Val::Px(2.0)),
                    display: Display::None,
                    ..default()
                },
                AnchoredLabel::new(indicator.label_anchor, visible),
                MeasurementLabel {
                    axis: indicator.axis,
                    length_mm: indicator.length_mm,
                },
            ))
            .id();
        if let Some(layer) = layer {
            scene.commands.entity(layer).add_child(label);
        }
        scope.track_entity(label);
    }

    debug!(
        "Measurement overlay rebuilt from {:?} dimensions",
        resolved.source
    );
    overlay.resolved = Some(resolved);
    overlay.scope = Some(scope);
}

/// Rewrite label text for a new display unit. Geometry is untouched.
pub fn refresh_label_text(
    mut state: ResMut<ViewerState>,
    mut labels: Query<(&MeasurementLabel, &mut Text)>,
) {
    if !state.dirty.labels {
        return;
    }
    state.dirty.labels = false;
    let unit = state.display_unit;
    for (label, mut text) in &mut labels {
        text.0 = unit.format_mm(label.length_mm);
    }
}

pub fn apply_measurement_visibility(
    mut state: ResMut<ViewerState>,
    mut lines: Query<&mut Visibility, With<MeasurementLine>>,
    mut labels: Query<&mut AnchoredLabel, With<MeasurementLabel>>,
) {
    if !state.dirty.visibility {
        return;
    }
    state.dirty.visibility = false;
    let visible = state.measurements_visible;
    for mut visibility in &mut lines {
        *visibility = visibility_for(visible);
    }
    for mut label in &mut labels {
        label.enabled = visible;
    }
}
