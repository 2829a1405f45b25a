use bevy::prelude::*;

use crate::features::surface::background::BackgroundPlugin;
use crate::features::surface::compositor::SurfaceCompositorPlugin;
use crate::features::surface::leaf_render::LeafRenderPlugin;
use crate::features::surface::simulation::RippleSimulationPlugin;
use crate::plugins::core::CorePlugin;
use crate::plugins::input::InputPlugin;
use crate::plugins::leaves::LeafPlugin;
use crate::plugins::presence::PresencePlugin;

/// Everything the water overlay needs. Insert a `SurfaceConfig` before
/// adding this to override the defaults.
pub struct SurfacePlugin;

impl Plugin for SurfacePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            CorePlugin,
            InputPlugin,
            PresencePlugin,
            RippleSimulationPlugin,
            LeafPlugin,
            BackgroundPlugin,
            SurfaceCompositorPlugin,
            LeafRenderPlugin,
        ));

        info!("Water surface systems initialized");
    }
}
