//! Ripple simulation plugin.
//!
//! Allocates the height field when the surface leaves `Off`, steps it once
//! per frame from the pointer impulse and frees it again on `Off`. If the
//! buffers cannot be allocated the surface keeps running without ripples.

use bevy::prelude::*;

use crate::error::SurfaceError;
use crate::features::surface::height_field::{HeightFieldSimulator, HeightFieldView, WaveParams};
use crate::plugins::core::{SurfaceSet, WaterPhase};
use crate::resources::config::SimulationConfig;
use crate::resources::pointer::PointerInputAdapter;
use crate::resources::SurfaceConfig;

/// The live simulator, or the reason there is none.
#[derive(Resource, Debug)]
pub struct RippleSimulation {
    simulator: Option<HeightFieldSimulator>,
    failure: Option<SurfaceError>,
}

impl RippleSimulation {
    pub fn allocate(config: &SimulationConfig) -> Self {
        match HeightFieldSimulator::new(config.resolution, WaveParams::from(config)) {
            Ok(simulator) => Self {
                simulator: Some(simulator),
                failure: None,
            },
            Err(e) => Self {
                simulator: None,
                failure: Some(e),
            },
        }
    }

    pub fn simulator(&self) -> Option<&HeightFieldSimulator> {
        self.simulator.as_ref()
    }

    pub fn simulator_mut(&mut self) -> Option<&mut HeightFieldSimulator> {
        self.simulator.as_mut()
    }

    pub fn failure(&self) -> Option<&SurfaceError> {
        self.failure.as_ref()
    }

    /// Height texture for this frame. Absent when disabled or failed.
    pub fn texture(&self) -> Option<HeightFieldView<'_>> {
        self.simulator.as_ref().and_then(|sim| sim.texture())
    }
}

pub struct RippleSimulationPlugin;

impl Plugin for RippleSimulationPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnExit(WaterPhase::Off), setup_ripple_simulation)
            .add_systems(OnEnter(WaterPhase::Off), cleanup_ripple_simulation)
            .add_systems(Update, step_simulation.in_set(SurfaceSet::Simulate));
    }
}

fn setup_ripple_simulation(mut commands: Commands, config: Res<SurfaceConfig>) {
    let simulation = RippleSimulation::allocate(&config.simulation);
    match simulation.failure() {
        None => info!(
            "Ripple simulation ready ({0}x{0})",
            config.simulation.resolution
        ),
        Some(e) => error!("Ripple simulation disabled: {}", e),
    }

    commands.insert_resource(simulation);
    commands.insert_resource(PointerInputAdapter::new(config.pointer.clone()));
}

fn cleanup_ripple_simulation(mut commands: Commands) {
    commands.remove_resource::<RippleSimulation>();
    commands.remove_resource::<PointerInputAdapter>();
    info!("Ripple simulation cleaned up");
}

/// Pulls this frame's impulse and advances the field by one step.
pub fn step_simulation(
    time: Res<Time>,
    phase: Res<State<WaterPhase>>,
    config: Res<SurfaceConfig>,
    adapter: Option<ResMut<PointerInputAdapter>>,
    simulation: Option<ResMut<RippleSimulation>>,
) {
    let enabled = phase.is_active();
    let Some(mut adapter) = adapter else { return; };
    let impulse = adapter.frame(enabled);

    let Some(mut simulation) = simulation else { return; };
    let Some(simulator) = simulation.simulator_mut() else { return; };

    if config.is_changed() {
        simulator.set_params(WaveParams::from(&config.simulation));
    }
    simulator.tick(enabled, &impulse, time.delta_secs());
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bevy::state::app::StatesPlugin;
    use bevy::time::TimeUpdateStrategy;

    use super::*;
    use crate::plugins::core::CorePlugin;

    fn app(resolution: usize) -> App {
        let mut config = SurfaceConfig::default();
        config.simulation.resolution = resolution;

        let mut app = App::new();
        app.insert_resource(config)
            .add_plugins((MinimalPlugins, StatesPlugin, CorePlugin, RippleSimulationPlugin))
            .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(16)));
        app.update();
        app
    }

    fn set_phase(app: &mut App, phase: WaterPhase) {
        app.world_mut().resource_mut::<NextState<WaterPhase>>().set(phase);
        app.update();
    }

    #[test]
    fn test_simulation_lives_between_off_phases() {
        let mut app = app(32);
        assert!(app.world().get_resource::<RippleSimulation>().is_none());

        set_phase(&mut app, WaterPhase::Filling);
        let sim = app.world().resource::<RippleSimulation>();
        assert!(sim.texture().is_some());
        assert_eq!(sim.simulator().map(|s| s.ticks()), Some(1));

        set_phase(&mut app, WaterPhase::Off);
        assert!(app.world().get_resource::<RippleSimulation>().is_none());
        assert!(app.world().get_resource::<PointerInputAdapter>().is_none());
    }

    #[test]
    fn test_click_disturbs_field() {
        let mut app = app(32);
        set_phase(&mut app, WaterPhase::On);

        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        app.world_mut()
            .resource_mut::<PointerInputAdapter>()
            .pointer_down(Vec2::new(50.0, 50.0), bounds, 0.0);
        app.update();

        let sim = app.world().resource::<RippleSimulation>();
        let energy = sim.simulator().map(|s| s.height_energy()).unwrap_or(0.0);
        assert!(energy > 0.0);
    }

    #[test]
    fn test_allocation_failure_runs_without_ripples() {
        let mut app = app(0);
        set_phase(&mut app, WaterPhase::On);
        for _ in 0..5 {
            app.update();
        }

        let sim = app.world().resource::<RippleSimulation>();
        assert!(sim.simulator().is_none());
        assert!(sim.texture().is_none());
        assert_eq!(sim.failure(), Some(&SurfaceError::InvalidResolution(0)));
    }
}
