use bevy::prelude::*;

use crate::events::{SurfaceDrained, SurfaceFilled};
use crate::resources::SurfaceConfig;

/// Lifecycle of the water effect, driven by the host UI.
///
/// `Off` tears everything down; re-entering `Filling` from `Off` builds it
/// again from scratch.
#[derive(States, Default, Clone, Copy, Eq, PartialEq, Debug, Hash)]
pub enum WaterPhase {
    #[default]
    Off,
    Filling,
    On,
    Draining,
}

impl WaterPhase {
    /// Whether the simulator and leaf layer run in this phase.
    pub fn is_active(self) -> bool {
        !matches!(self, WaterPhase::Off)
    }

    /// Presence level this phase animates towards.
    pub fn target_level(self) -> f32 {
        match self {
            WaterPhase::Filling | WaterPhase::On => 1.0,
            WaterPhase::Off | WaterPhase::Draining => 0.0,
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "off" => Some(WaterPhase::Off),
            "filling" | "fill" => Some(WaterPhase::Filling),
            "on" => Some(WaterPhase::On),
            "draining" | "drain" => Some(WaterPhase::Draining),
            _ => None,
        }
    }
}

/// Per-frame ordering of the surface systems. Nothing in these sets runs
/// while the phase is `Off`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceSet {
    /// Pointer capture.
    Input,
    /// Presence level.
    Animate,
    /// Height field and leaves.
    Simulate,
    /// Texture uploads, materials, meshes.
    Render,
}

pub struct CorePlugin;

impl Plugin for CorePlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<SurfaceConfig>() {
            app.insert_resource(SurfaceConfig::default());
        }

        app.init_state::<WaterPhase>()
            .add_event::<SurfaceDrained>()
            .add_event::<SurfaceFilled>()
            .configure_sets(
                Update,
                (
                    SurfaceSet::Input,
                    SurfaceSet::Animate,
                    SurfaceSet::Simulate,
                    SurfaceSet::Render,
                )
                    .chain()
                    .run_if(not(in_state(WaterPhase::Off))),
            )
            .add_systems(Update, log_phase_transitions);
    }
}

fn log_phase_transitions(phase: Res<State<WaterPhase>>) {
    if phase.is_changed() {
        info!("Water phase: {:?}", phase.get());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_targets() {
        assert_eq!(WaterPhase::Filling.target_level(), 1.0);
        assert_eq!(WaterPhase::On.target_level(), 1.0);
        assert_eq!(WaterPhase::Draining.target_level(), 0.0);
        assert!(!WaterPhase::Off.is_active());
        assert!(WaterPhase::Draining.is_active());
    }

    #[test]
    fn test_parse_phase_names() {
        assert_eq!(WaterPhase::parse("Filling"), Some(WaterPhase::Filling));
        assert_eq!(WaterPhase::parse("drain"), Some(WaterPhase::Draining));
        assert_eq!(WaterPhase::parse("flood"), None);
    }
}
