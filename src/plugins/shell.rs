//! Demo host for the overlay.
//!
//! Plays the part of the desktop shell: owns the camera, loads the config and
//! background named on the command line, drives the phase from the keyboard
//! and settles `Filling -> On` and `Draining -> Off` when the surface reports
//! it is done.

use bevy::prelude::*;
use leafwing_input_manager::prelude::*;

use crate::events::{SurfaceDrained, SurfaceFilled};
use crate::features::surface::background::{BackgroundImage, BackgroundSource};
use crate::plugins::core::WaterPhase;
use crate::plugins::input::{get_default_input_map, SurfaceAction};
use crate::resources::cli::CliArgs;
use crate::resources::SurfaceConfig;

/// Add before `SurfacePlugin` so the loaded config is the one it picks up.
pub struct ShellPlugin;

impl Plugin for ShellPlugin {
    fn build(&self, app: &mut App) {
        let cli = CliArgs::parse();
        app.insert_resource(load_config(&cli))
            .insert_resource(cli)
            .add_systems(Startup, (spawn_camera, load_background, apply_start_phase))
            .add_systems(Update, (phase_controls, settle_phase));
    }
}

fn load_config(cli: &CliArgs) -> SurfaceConfig {
    let mut config = match cli.config.as_deref() {
        Some(path) => SurfaceConfig::load_from_path(path).unwrap_or_else(|e| {
            error!("{}", e);
            SurfaceConfig::default()
        }),
        None => SurfaceConfig::load_from_file(),
    };
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    config
}

fn spawn_camera(mut commands: Commands) {
    commands.spawn((
        Camera2d,
        OrthographicProjection {
            near: -1000.0,
            far: 1000.0,
            ..OrthographicProjection::default_2d()
        },
        Transform::from_xyz(0.0, 0.0, 100.0),
        InputManagerBundle::with_map(get_default_input_map()),
    ));
}

fn load_background(cli: Res<CliArgs>, mut background: ResMut<BackgroundImage>) {
    let Some(path) = cli.background.as_ref() else { return; };
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png")
        .to_ascii_lowercase();

    match std::fs::read(path) {
        Ok(bytes) => {
            info!("Loaded background {:?} ({} bytes)", path, bytes.len());
            background.set(BackgroundSource::Encoded { bytes, extension });
        }
        Err(e) => warn!("Could not read background {:?}: {}", path, e),
    }
}

fn apply_start_phase(cli: Res<CliArgs>, mut next_phase: ResMut<NextState<WaterPhase>>) {
    if let Some(phase) = cli.phase {
        next_phase.set(phase);
    }
}

/// The phase a toggle request moves to.
pub fn toggled(phase: WaterPhase) -> WaterPhase {
    match phase {
        WaterPhase::Off | WaterPhase::Draining => WaterPhase::Filling,
        WaterPhase::Filling | WaterPhase::On => WaterPhase::Draining,
    }
}

fn phase_controls(
    actions: Query<&ActionState<SurfaceAction>>,
    phase: Res<State<WaterPhase>>,
    mut next_phase: ResMut<NextState<WaterPhase>>,
) {
    let Ok(action_state) = actions.get_single() else { return; };
    let current = *phase.get();

    if action_state.just_pressed(&SurfaceAction::Toggle) {
        next_phase.set(toggled(current));
    } else if action_state.just_pressed(&SurfaceAction::Fill) && current != WaterPhase::On {
        next_phase.set(WaterPhase::Filling);
    } else if action_state.just_pressed(&SurfaceAction::Drain) && current.is_active() {
        next_phase.set(WaterPhase::Draining);
    }
}

/// Moves to the resting phase once the surface reports a transition done.
pub fn settle_phase(
    mut filled: EventReader<SurfaceFilled>,
    mut drained: EventReader<SurfaceDrained>,
    phase: Res<State<WaterPhase>>,
    mut next_phase: ResMut<NextState<WaterPhase>>,
) {
    let filled = filled.read().count() > 0;
    let drained = drained.read().count() > 0;

    match phase.get() {
        WaterPhase::Filling if filled => next_phase.set(WaterPhase::On),
        WaterPhase::Draining if drained => next_phase.set(WaterPhase::Off),
        _ => {}
    }
}
