//! Leaf plugin - owns the floating leaf population for the active surface.

use bevy::prelude::*;

use crate::plugins::core::{SurfaceSet, WaterPhase};
use crate::systems::leaves::{setup_leaf_layer, sync_leaf_config, teardown_leaf_layer, update_leaves};

pub struct LeafPlugin;

impl Plugin for LeafPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnExit(WaterPhase::Off), setup_leaf_layer)
            .add_systems(OnEnter(WaterPhase::Off), teardown_leaf_layer)
            .add_systems(
                Update,
                (sync_leaf_config, update_leaves)
                    .chain()
                    .in_set(SurfaceSet::Simulate),
            );
    }
}
