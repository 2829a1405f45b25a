use bevy::input::touch::{TouchInput, TouchPhase};
use bevy::prelude::*;
use bevy::window::{CursorMoved, PrimaryWindow};
use leafwing_input_manager::prelude::*;

use crate::plugins::core::SurfaceSet;
use crate::resources::pointer::{PointerInputAdapter, SurfaceBounds};

#[derive(Actionlike, PartialEq, Eq, Clone, Copy, Hash, Debug, Reflect)]
pub enum SurfaceAction {
    /// Press on the surface: a big splash at the cursor.
    Splash,
    Fill,
    Drain,
    Toggle,
}

pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(InputManagerPlugin::<SurfaceAction>::default())
            .init_resource::<SurfaceBounds>()
            .add_systems(PreUpdate, sync_surface_bounds)
            .add_systems(
                Update,
                (capture_cursor, capture_touch, splash_on_action).in_set(SurfaceSet::Input),
            );
    }
}

pub fn get_default_input_map() -> InputMap<SurfaceAction> {
    let mut input_map = InputMap::default();

    input_map.insert(SurfaceAction::Splash, MouseButton::Left);

    // Phase control for hosts without their own UI
    input_map.insert(SurfaceAction::Fill, KeyCode::KeyF);
    input_map.insert(SurfaceAction::Drain, KeyCode::KeyD);
    input_map.insert(SurfaceAction::Toggle, KeyCode::Space);

    input_map
}

/// Keeps the surface rectangle on the primary window unless the host pinned
/// it somewhere else.
fn sync_surface_bounds(
    windows: Query<&Window, With<PrimaryWindow>>,
    mut bounds: ResMut<SurfaceBounds>,
) {
    if !bounds.follow_window {
        return;
    }
    let Ok(window) = windows.get_single() else { return; };
    let rect = Rect::new(0.0, 0.0, window.width(), window.height());
    if bounds.rect != rect {
        bounds.rect = rect;
    }
}

pub fn capture_cursor(
    time: Res<Time>,
    bounds: Res<SurfaceBounds>,
    mut cursor: EventReader<CursorMoved>,
    adapter: Option<ResMut<PointerInputAdapter>>,
) {
    let Some(mut adapter) = adapter else {
        cursor.clear();
        return;
    };
    // Only the frame's final position is sampled, so speed is measured over
    // real frame time rather than the spacing of a burst of events.
    if let Some(event) = cursor.read().last() {
        adapter.pointer_moved(event.position, bounds.rect, time.elapsed_secs_f64());
    }
}

pub fn capture_touch(
    time: Res<Time>,
    bounds: Res<SurfaceBounds>,
    mut touches: EventReader<TouchInput>,
    adapter: Option<ResMut<PointerInputAdapter>>,
) {
    let Some(mut adapter) = adapter else {
        touches.clear();
        return;
    };
    let now = time.elapsed_secs_f64();
    let mut moved = None;
    for touch in touches.read() {
        match touch.phase {
            TouchPhase::Started => {
                adapter.pointer_down(touch.position, bounds.rect, now);
                moved = None;
            }
            TouchPhase::Moved => moved = Some(touch.position),
            TouchPhase::Ended | TouchPhase::Canceled => {}
        }
    }
    if let Some(position) = moved {
        adapter.pointer_moved(position, bounds.rect, now);
    }
}

fn splash_on_action(
    time: Res<Time>,
    bounds: Res<SurfaceBounds>,
    actions: Query<&ActionState<SurfaceAction>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    adapter: Option<ResMut<PointerInputAdapter>>,
) {
    let Some(mut adapter) = adapter else { return; };
    if !actions.iter().any(|state| state.just_pressed(&SurfaceAction::Splash)) {
        return;
    }
    let Some(position) = windows.get_single().ok().and_then(|w| w.cursor_position()) else {
        return;
    };
    adapter.pointer_down(position, bounds.rect, time.elapsed_secs_f64());
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bevy::time::TimeUpdateStrategy;

    use super::*;

    fn app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .add_event::<CursorMoved>()
            .add_event::<TouchInput>()
            .insert_resource(SurfaceBounds::fixed(Rect::new(0.0, 0.0, 200.0, 100.0)))
            .insert_resource(PointerInputAdapter::default())
            .add_systems(Update, (capture_cursor, capture_touch));
        app
    }

    #[test]
    fn test_cursor_moves_reach_adapter() {
        let mut app = app();
        app.world_mut().send_event(CursorMoved {
            window: Entity::PLACEHOLDER,
            position: Vec2::new(50.0, 25.0),
            delta: None,
        });
        app.update();

        let sample = app.world().resource::<PointerInputAdapter>().last_sample();
        assert_eq!(sample.map(|s| s.position), Some(Vec2::new(0.25, 0.75)));
    }

    #[test]
    fn test_touch_start_is_a_press() {
        let mut app = app();
        app.world_mut().send_event(TouchInput {
            phase: TouchPhase::Started,
            position: Vec2::new(100.0, 50.0),
            window: Entity::PLACEHOLDER,
            force: None,
            id: 0,
        });
        app.update();

        let adapter = app.world().resource::<PointerInputAdapter>();
        assert_eq!(adapter.magnitude(), 1.25);
        assert_eq!(adapter.last_sample().map(|s| s.position), Some(Vec2::splat(0.5)));
    }

    #[test]
    fn test_burst_of_moves_measures_frame_speed() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .add_event::<CursorMoved>()
            .insert_resource(SurfaceBounds::fixed(Rect::new(0.0, 0.0, 1280.0, 720.0)))
            .insert_resource(PointerInputAdapter::default())
            .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_millis(16)))
            .add_systems(Update, capture_cursor);

        // Two 2px moves per 16ms frame: 4px per frame.
        let mut x = 100.0;
        for _ in 0..5 {
            for _ in 0..2 {
                x += 2.0;
                app.world_mut().send_event(CursorMoved {
                    window: Entity::PLACEHOLDER,
                    position: Vec2::new(x, 360.0),
                    delta: None,
                });
            }
            app.update();
        }

        let true_speed = 4.0 / 1280.0 / 0.016;
        let adapter = app.world().resource::<PointerInputAdapter>();
        let sample = adapter.last_sample().unwrap();
        assert!((sample.speed - true_speed).abs() < 1e-3, "speed {}", sample.speed);
        assert!((adapter.magnitude() - true_speed * 0.9).abs() < 1e-3);
        assert!(adapter.magnitude() < 1.0);
    }

    #[test]
    fn test_default_map_binds_splash_to_left_click() {
        let map = get_default_input_map();
        assert!(map.get_buttonlike(&SurfaceAction::Splash).is_some());
        assert!(map.get_buttonlike(&SurfaceAction::Toggle).is_some());
    }
}
