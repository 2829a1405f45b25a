use bevy::prelude::*;

use crate::components::presence::{PresenceAnimator, PresenceSignal};
use crate::events::{SurfaceDrained, SurfaceFilled};
use crate::plugins::core::WaterPhase;
use crate::resources::SurfaceConfig;

/// Starts the presence transition for the phase that was just entered.
/// Registered on `OnEnter` of every phase.
pub fn start_presence_transition(
    phase: Res<State<WaterPhase>>,
    config: Res<SurfaceConfig>,
    mut animator: ResMut<PresenceAnimator>,
) {
    animator.enter_phase(*phase.get(), &config.phase);
}

/// Eases the presence level and reports fill/drain completion.
pub fn animate_presence(
    time: Res<Time>,
    phase: Res<State<WaterPhase>>,
    mut animator: ResMut<PresenceAnimator>,
    mut drained: EventWriter<SurfaceDrained>,
    mut filled: EventWriter<SurfaceFilled>,
) {
    match animator.tick(time.delta_secs(), *phase.get()) {
        Some(PresenceSignal::Drained) => {
            info!("Surface drained");
            drained.send(SurfaceDrained);
        }
        Some(PresenceSignal::Filled) => {
            debug!("Surface filled");
            filled.send(SurfaceFilled);
        }
        None => {}
    }
}
