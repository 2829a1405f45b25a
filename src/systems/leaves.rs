use bevy::prelude::*;

use crate::plugins::core::WaterPhase;
use crate::resources::leaf_layer::LeafLayer;
use crate::resources::SurfaceConfig;

/// Creates the leaf layer when the surface leaves `Off`.
pub fn setup_leaf_layer(mut commands: Commands, config: Res<SurfaceConfig>) {
    commands.insert_resource(LeafLayer::new(config.leaves.clone(), config.seed));
    info!("Leaf layer ready (cap {})", config.leaves.max_leaves);
}

/// Clears and drops the leaf layer on entering `Off`.
pub fn teardown_leaf_layer(mut commands: Commands, layer: Option<ResMut<LeafLayer>>) {
    let Some(mut layer) = layer else { return; };
    layer.update(false, 0.0);
    commands.remove_resource::<LeafLayer>();
    info!("Leaf layer removed");
}

/// Spawns, drifts and culls leaves on the logical frame clock.
pub fn update_leaves(
    time: Res<Time>,
    phase: Res<State<WaterPhase>>,
    layer: Option<ResMut<LeafLayer>>,
) {
    let Some(mut layer) = layer else { return; };
    layer.update(phase.is_active(), time.delta_secs());
}

/// Pushes edited leaf tuning into the live layer.
pub fn sync_leaf_config(config: Res<SurfaceConfig>, layer: Option<ResMut<LeafLayer>>) {
    if !config.is_changed() {
        return;
    }
    let Some(mut layer) = layer else { return; };
    layer.set_config(config.leaves.clone());
}
