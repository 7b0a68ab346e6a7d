use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

/// Anything able to release GPU-backed assets and entities.
pub trait DisposeSink {
    fn despawn_entity(&mut self, entity: Entity);
    fn remove_mesh(&mut self, handle: &Handle<Mesh>);
    fn remove_material(&mut self, handle: &Handle<StandardMaterial>);
    fn remove_image(&mut self, handle: &Handle<Image>);
}

/// Asset stores plus commands, shared by systems that both create and release scene resources.
#[derive(SystemParam)]
pub struct SceneAssets<'w, 's> {
    pub commands: Commands<'w, 's>,
    pub meshes: ResMut<'w, Assets<Mesh>>,
    pub materials: ResMut<'w, Assets<StandardMaterial>>,
    pub images: ResMut<'w, Assets<Image>>,
}

impl DisposeSink for SceneAssets<'_, '_> {
    fn despawn_entity(&mut self, entity: Entity) {
        if let Ok(mut entity_commands) = self.commands.get_entity(entity) {
            entity_commands.despawn();
        }
    }

    fn remove_mesh(&mut self, handle: &Handle<Mesh>) {
        self.meshes.remove(handle);
    }

    fn remove_material(&mut self, handle: &Handle<StandardMaterial>) {
        self.materials.remove(handle);
    }

    fn remove_image(&mut self, handle: &Handle<Image>) {
        self.images.remove(handle);
    }
}

impl DisposeSink for World {
    fn despawn_entity(&mut self, entity: Entity) {
        self.despawn(entity);
    }

    fn remove_mesh(&mut self, handle: &Handle<Mesh>) {
        if let Some(mut meshes) = self.get_resource_mut::<Assets<Mesh>>() {
            meshes.remove(handle);
        }
    }

    fn remove_material(&mut self, handle: &Handle<StandardMaterial>) {
        if let Some(mut materials) = self.get_resource_mut::<Assets<StandardMaterial>>() {
            materials.remove(handle);
        }
    }

    fn remove_image(&mut self, handle: &Handle<Image>) {
        if let Some(mut images) = self.get_resource_mut::<Assets<Image>>() {
            images.remove(handle);
        }
    }
}

/// Counts of what a scope released when it was closed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScopeReport {
    pub meshes: usize,
    pub materials: usize,
    pub images: usize,
    pub entities: usize,
}

/// Owns every GPU resource and entity created for one subsystem instance.
///
/// A scope is closed exactly once. Closing consumes it, so a closed scope
/// cannot be used again; dropping an unclosed, non-empty scope logs a warning
/// because its assets would otherwise stay resident.
#[derive(Debug, Default)]
pub struct ResourceScope {
    label: &'static str,
    meshes: Vec<Handle<Mesh>>,
    materials: Vec<Handle<StandardMaterial>>,
    images: Vec<Handle<Image>>,
    entities: Vec<Entity>,
    closed: bool,
}

impl ResourceScope {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            meshes: Vec::new(),
            materials: Vec::new(),
            images: Vec::new(),
            entities: Vec::new(),
            closed: false,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn track_mesh(&mut self, handle: Handle<Mesh>) -> Handle<Mesh> {
        self.meshes.push(handle.clone());
        handle
    }

    pub fn track_material(
        &mut self,
        handle: Handle<StandardMaterial>,
    ) -> Handle<StandardMaterial> {
        self.materials.push(handle.clone());
        handle
    }

    pub fn track_image(&mut self, handle: Handle<Image>) -> Handle<Image> {
        self.images.push(handle.clone());
        handle
    }

    /// Track a root entity; its descendants are despawned with it.
    pub fn track_entity(&mut self, entity: Entity) -> Entity {
        self.entities.push(entity);
        entity
    }

    /// GPU asset handles held by this scope.
    pub fn handle_count(&self) -> usize {
        self.meshes.len() + self.materials.len() + self.images.len()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handle_count() == 0 && self.entities.is_empty()
    }

    pub fn close(mut self, sink: &mut impl DisposeSink) -> ScopeReport {
        let report = ScopeReport {
            meshes: self.meshes.len(),
            materials: self.materials.len(),
            images: self.images.len(),
            entities: self.entities.len(),
        };

        for entity in std::mem::take(&mut self.entities) {
            sink.despawn_entity(entity);
        }
        for handle in std::mem::take(&mut self.meshes) {
            sink.remove_mesh(&handle);
        }
        for handle in std::mem::take(&mut self.materials) {
            sink.remove_material(&handle);
        }
        for handle in std::mem::take(&mut self.images) {
            sink.remove_image(&handle);
        }
        self.closed = true;

        debug!("Closed {} scope: {:?}", self.label, report);
        report
    }
}

impl Drop for ResourceScope {
    fn drop(&mut self) {
        if !self.closed && !self.is_empty() {
            warn!(
                "{} scope dropped without close; {} handles and {} entities leaked",
                self.label,
                self.handle_count(),
                self.entities.len()
            );
        }
    }
}

/// Close an optional scope in place.
pub fn close_scope(slot: &mut Option<ResourceScope>, sink: &mut impl DisposeSink) -> ScopeReport {
    slot.take()
        .map(|scope| scope.close(sink))
        .unwrap_or_default()
}
