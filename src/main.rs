use bevy::prelude::*;
use bevy_egui::EguiPlugin;
use water_overlay::plugins::debug_ui::DebugUiPlugin;
use water_overlay::plugins::shell::ShellPlugin;
use water_overlay::plugins::surface::SurfacePlugin;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Water Overlay".to_string(),
                ..default()
            }),
            ..default()
        }))
        .insert_resource(ClearColor(Color::srgb(0.08, 0.09, 0.11)))
        .add_plugins(EguiPlugin)
        // Shell first: it inserts the config SurfacePlugin reads.
        .add_plugins(ShellPlugin)
        .add_plugins(SurfacePlugin)
        .add_plugins(DebugUiPlugin)
        .run();
}
