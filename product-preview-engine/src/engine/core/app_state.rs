use crate::engine::loading::progress::LoadingProgress;
use bevy::prelude::*;

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States)]
pub enum ViewerPhase {
    /// Waiting on the mount manifest.
    #[default]
    Booting,
    Running,
    /// Frame loop stopped; nothing scene-related runs again.
    TornDown,
}

pub fn transition_to_running(
    progress: Res<LoadingProgress>,
    mut next_phase: ResMut<NextState<ViewerPhase>>,
) {
    if progress.manifest_resolved {
        info!("→ Transitioning to Running");
        next_phase.set(ViewerPhase::Running);
    }
}
