//! Presence plugin - eases the surface level in and out with the phase.

use bevy::prelude::*;

use crate::components::presence::PresenceAnimator;
use crate::plugins::core::{SurfaceSet, WaterPhase};
use crate::systems::presence::{animate_presence, start_presence_transition};

pub struct PresencePlugin;

impl Plugin for PresencePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PresenceAnimator>()
            .add_systems(OnEnter(WaterPhase::Off), start_presence_transition)
            .add_systems(OnEnter(WaterPhase::Filling), start_presence_transition)
            .add_systems(OnEnter(WaterPhase::On), start_presence_transition)
            .add_systems(OnEnter(WaterPhase::Draining), start_presence_transition)
            .add_systems(Update, animate_presence.in_set(SurfaceSet::Animate));
    }
}
