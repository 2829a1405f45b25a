use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::components::presence::PresenceAnimator;
use crate::features::surface::background::BackgroundTextureLoader;
use crate::features::surface::simulation::RippleSimulation;
use crate::plugins::core::WaterPhase;
use crate::resources::leaf_layer::LeafLayer;
use crate::resources::SurfaceConfig;

pub struct DebugUiPlugin;

impl Plugin for DebugUiPlugin {
    fn build(&self, app: &mut App) {
        if !app.is_plugin_added::<FrameTimeDiagnosticsPlugin>() {
            app.add_plugins(FrameTimeDiagnosticsPlugin::default());
        }

        app.init_resource::<SurfaceDebugConfig>()
            .add_systems(Update, (debug_panel, apply_debug_flags).chain());
    }
}

#[derive(Resource, Default, Debug)]
pub struct SurfaceDebugConfig {
    pub freeze_spawning: bool,
}

#[allow(clippy::too_many_arguments)]
fn debug_panel(
    mut contexts: EguiContexts,
    phase: Res<State<WaterPhase>>,
    mut next_phase: ResMut<NextState<WaterPhase>>,
    diagnostics: Res<DiagnosticsStore>,
    presence: Res<PresenceAnimator>,
    simulation: Option<Res<RippleSimulation>>,
    layer: Option<Res<LeafLayer>>,
    loader: Res<BackgroundTextureLoader>,
    mut config: ResMut<SurfaceConfig>,
    mut debug: ResMut<SurfaceDebugConfig>,
) {
    egui::Window::new("Water Surface").show(contexts.ctx_mut(), |ui| {
        ui.label(format!("Phase: {:?}", phase.get()));
        if let Some(fps) = diagnostics
            .get(&FrameTimeDiagnosticsPlugin::FPS)
            .and_then(|diag| diag.smoothed())
        {
            ui.label(format!("FPS: {:.1}", fps));
        }

        ui.horizontal(|ui| {
            for target in [WaterPhase::Off, WaterPhase::Filling, WaterPhase::On, WaterPhase::Draining] {
                if ui.button(format!("{:?}", target)).clicked() {
                    next_phase.set(target);
                }
            }
        });

        ui.separator();
        ui.label(format!("Presence: {:.3}", presence.level()));

        match simulation.as_ref() {
            Some(sim) => match (sim.simulator(), sim.failure()) {
                (Some(simulator), _) => {
                    ui.label(format!(
                        "Ripples: {0}x{0}, tick {1}",
                        simulator.resolution(),
                        simulator.ticks()
                    ));
                    ui.label(format!("Height energy: {:.4}", simulator.height_energy()));
                }
                (None, Some(e)) => {
                    ui.colored_label(egui::Color32::RED, format!("Ripples disabled: {}", e));
                }
                (None, None) => {
                    ui.label("Ripples: none");
                }
            },
            None => {
                ui.label("Ripples: off");
            }
        }

        let leaves = layer.as_ref().map_or(0, |l| l.len());
        ui.label(format!("Leaves: {} / {}", leaves, config.leaves.max_leaves));
        ui.checkbox(&mut debug.freeze_spawning, "Freeze leaf spawning");
        ui.label(format!("Background textures live: {}", loader.live()));

        ui.separator();
        ui.heading("Tuning");

        let mut damping = config.simulation.damping;
        let mut wave_speed_sq = config.simulation.wave_speed_sq;
        let mut strength = config.simulation.strength;
        let mut changed = false;
        changed |= ui
            .add(egui::Slider::new(&mut damping, 0.0..=0.2).text("damping"))
            .changed();
        changed |= ui
            .add(egui::Slider::new(&mut wave_speed_sq, 0.01..=0.5).text("wave speed²"))
            .changed();
        changed |= ui
            .add(egui::Slider::new(&mut strength, 0.0..=1.0).text("strength"))
            .changed();
        if changed {
            config.simulation.damping = damping;
            config.simulation.wave_speed_sq = wave_speed_sq;
            config.simulation.strength = strength;
        }

        if ui.button("Save config").clicked() {
            if let Err(e) = config.save_to_file() {
                error!("{}", e);
            }
        }
    });
}

fn apply_debug_flags(debug: Res<SurfaceDebugConfig>, layer: Option<ResMut<LeafLayer>>) {
    let Some(mut layer) = layer else { return; };
    if layer.spawning_paused() != debug.freeze_spawning {
        layer.set_spawning_paused(debug.freeze_spawning);
    }
}
