//! Pointer state feeding the ripple solver.
//!
//! Input handlers write into the adapter whenever the host reports pointer
//! activity; the render loop calls `frame` once per tick to pull an impulse.

use bevy::prelude::*;

use crate::features::surface::height_field::Impulse;
use crate::resources::config::PointerConfig;

/// Last known pointer state together with the impulse it is driving.
/// Position, timestamp and magnitude are always replaced as one value, and
/// the per-frame decay writes a whole new sample back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerSample {
    /// Surface-normalised position, bottom-left origin.
    pub position: Vec2,
    /// Seconds on the host clock.
    pub time: f64,
    /// Surface widths per second.
    pub speed: f32,
    /// Driving magnitude, decayed once per frame.
    pub magnitude: f32,
    pub radius: f32,
}

/// Single-writer, single-reader value cell. Readers only ever see a complete
/// value; there is no way to update part of one.
#[derive(Debug, Clone, Copy)]
pub struct LatestCell<T: Copy> {
    value: Option<T>,
}

impl<T: Copy> Default for LatestCell<T> {
    fn default() -> Self {
        Self { value: None }
    }
}

impl<T: Copy> LatestCell<T> {
    pub fn store(&mut self, value: T) {
        self.value = Some(value);
    }

    pub fn load(&self) -> Option<T> {
        self.value
    }

    pub fn clear(&mut self) {
        self.value = None;
    }
}

/// Bounding rectangle of the surface in client space (top-left origin,
/// logical pixels).
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct SurfaceBounds {
    pub rect: Rect,
    /// Keep `rect` equal to the primary window.
    pub follow_window: bool,
}

impl SurfaceBounds {
    /// A fixed rectangle that does not track the window.
    pub fn fixed(rect: Rect) -> Self {
        Self { rect, follow_window: false }
    }
}

impl Default for SurfaceBounds {
    fn default() -> Self {
        Self {
            rect: Rect::new(0.0, 0.0, 1280.0, 720.0),
            follow_window: true,
        }
    }
}

/// Converts pointer activity into per-tick impulses.
#[derive(Resource, Debug, Clone)]
pub struct PointerInputAdapter {
    config: PointerConfig,
    last: LatestCell<PointerSample>,
}

impl Default for PointerInputAdapter {
    fn default() -> Self {
        Self::new(PointerConfig::default())
    }
}

impl PointerInputAdapter {
    pub fn new(config: PointerConfig) -> Self {
        Self {
            config,
            last: LatestCell::default(),
        }
    }

    /// Client coordinates to surface coordinates: bottom-left origin,
    /// clamped to [0, 1] on both axes.
    pub fn normalize(client: Vec2, bounds: Rect) -> Vec2 {
        let size = bounds.size();
        if size.x <= 0.0 || size.y <= 0.0 || !client.is_finite() {
            return Vec2::splat(0.5);
        }
        let local = (client - bounds.min) / size;
        Vec2::new(local.x, 1.0 - local.y).clamp(Vec2::ZERO, Vec2::ONE)
    }

    pub fn magnitude(&self) -> f32 {
        self.last.load().map_or(0.0, |s| s.magnitude)
    }

    pub fn radius(&self) -> f32 {
        self.last.load().map_or(self.config.baseline_radius, |s| s.radius)
    }

    pub fn last_sample(&self) -> Option<PointerSample> {
        self.last.load()
    }

    /// Records a move. Speed comes from the previous sample, with the elapsed
    /// time floored so bursts of events cannot blow it up.
    pub fn pointer_moved(&mut self, client: Vec2, bounds: Rect, now: f64) {
        let mut sample = self.sample_at(client, bounds, now);
        let stroke = (sample.speed * self.config.sensitivity).min(1.0);
        sample.magnitude = sample.magnitude.max(stroke);
        self.last.store(sample);
    }

    /// Records a press: a large fixed magnitude and a widened radius that
    /// eases back over the following frames.
    pub fn pointer_down(&mut self, client: Vec2, bounds: Rect, now: f64) {
        let mut sample = self.sample_at(client, bounds, now);
        sample.magnitude = sample.magnitude.max(self.config.click_magnitude);
        sample.radius = self.config.click_radius;
        self.last.store(sample);
    }

    /// Impulse for this tick, then per-frame decay of the driving magnitude
    /// and radius. At rest while disabled or before any pointer activity.
    pub fn frame(&mut self, enabled: bool) -> Impulse {
        let Some(mut sample) = self.last.load() else {
            return Impulse::REST;
        };

        if !enabled {
            sample.magnitude = 0.0;
            sample.radius = self.config.baseline_radius;
            self.last.store(sample);
            return Impulse::REST;
        }

        let impulse = if sample.magnitude > 0.0 {
            Impulse {
                position: sample.position,
                magnitude: sample.magnitude,
                radius: sample.radius,
            }
        } else {
            Impulse::REST
        };

        sample.magnitude *= self.config.magnitude_decay;
        if sample.magnitude < 1e-4 {
            sample.magnitude = 0.0;
        }
        sample.radius += (self.config.baseline_radius - sample.radius) * self.config.radius_ease;
        self.last.store(sample);

        impulse
    }

    /// Forgets all pointer history.
    pub fn reset(&mut self) {
        self.last.clear();
    }

    /// New sample at `client`, carrying the previous magnitude and radius.
    fn sample_at(&self, client: Vec2, bounds: Rect, now: f64) -> PointerSample {
        let position = Self::normalize(client, bounds);
        match self.last.load() {
            Some(prev) => {
                let elapsed = (now - prev.time).max(self.config.min_elapsed as f64) as f32;
                PointerSample {
                    position,
                    time: now,
                    speed: position.distance(prev.position) / elapsed,
                    ..prev
                }
            }
            None => PointerSample {
                position,
                time: now,
                speed: 0.0,
                magnitude: 0.0,
                radius: self.config.baseline_radius,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> Rect {
        Rect::new(100.0, 50.0, 500.0, 250.0)
    }

    #[test]
    fn test_normalize_uses_bottom_left_origin() {
        let b = bounds();
        assert_eq!(PointerInputAdapter::normalize(Vec2::new(100.0, 250.0), b), Vec2::new(0.0, 0.0));
        assert_eq!(PointerInputAdapter::normalize(Vec2::new(500.0, 50.0), b), Vec2::new(1.0, 1.0));
        assert_eq!(PointerInputAdapter::normalize(Vec2::new(300.0, 150.0), b), Vec2::new(0.5, 0.5));
    }

    #[test]
    fn test_normalize_clamps_outside_surface() {
        let p = PointerInputAdapter::normalize(Vec2::new(-40.0, 900.0), bounds());
        assert_eq!(p, Vec2::new(0.0, 0.0));
        let degenerate = Rect::new(10.0, 10.0, 10.0, 10.0);
        assert_eq!(PointerInputAdapter::normalize(Vec2::new(3.0, 3.0), degenerate), Vec2::splat(0.5));
    }

    #[test]
    fn test_at_rest_before_any_input() {
        let mut adapter = PointerInputAdapter::default();
        assert_eq!(adapter.frame(true), Impulse::REST);
    }

    #[test]
    fn test_move_speed_sets_bounded_magnitude() {
        let mut adapter = PointerInputAdapter::default();
        let b = bounds();
        adapter.pointer_moved(Vec2::new(100.0, 150.0), b, 1.0);
        // A tenth of the width over 0.5s: 0.2 widths/s.
        adapter.pointer_moved(Vec2::new(140.0, 150.0), b, 1.5);

        let impulse = adapter.frame(true);
        assert!((impulse.magnitude - 0.2 * 0.9).abs() < 1e-5);
        assert!((impulse.position - Vec2::new(0.1, 0.5)).length() < 1e-6);

        adapter.pointer_moved(Vec2::new(500.0, 150.0), b, 1.6);
        assert_eq!(adapter.magnitude(), 1.0);
    }

    #[test]
    fn test_elapsed_time_is_floored() {
        let mut adapter = PointerInputAdapter::default();
        let b = bounds();
        adapter.pointer_moved(Vec2::new(100.0, 150.0), b, 2.0);
        adapter.pointer_moved(Vec2::new(104.0, 150.0), b, 2.0);

        let sample = adapter.last_sample().unwrap();
        assert!(sample.speed.is_finite());
        assert!((sample.speed - 0.01 / 0.001).abs() < 1e-2);
    }

    #[test]
    fn test_click_overrides_with_large_magnitude_and_radius() {
        let mut adapter = PointerInputAdapter::default();
        adapter.pointer_down(Vec2::new(300.0, 150.0), bounds(), 0.0);

        let impulse = adapter.frame(true);
        assert_eq!(impulse.magnitude, 1.25);
        assert_eq!(impulse.radius, 0.09);

        // Radius eases back towards the baseline.
        let next = adapter.frame(true);
        let expected = 0.09 + (0.035 - 0.09) * 0.18;
        assert!((next.radius - expected).abs() < 1e-6);
        assert!(next.radius > 0.035);
    }

    #[test]
    fn test_magnitude_decays_into_strokes() {
        let mut adapter = PointerInputAdapter::default();
        adapter.pointer_down(Vec2::new(300.0, 150.0), bounds(), 0.0);

        let first = adapter.frame(true).magnitude;
        let second = adapter.frame(true).magnitude;
        assert!((second - first * 0.85).abs() < 1e-6);

        for _ in 0..200 {
            adapter.frame(true);
        }
        assert_eq!(adapter.frame(true), Impulse::REST);
    }

    #[test]
    fn test_disabled_is_at_rest() {
        let mut adapter = PointerInputAdapter::default();
        adapter.pointer_down(Vec2::new(300.0, 150.0), bounds(), 0.0);
        assert_eq!(adapter.frame(false), Impulse::REST);
        assert_eq!(adapter.magnitude(), 0.0);
    }

    #[test]
    fn test_latest_cell_replaces_whole_value() {
        let sample = |x: f32, time: f64| PointerSample {
            position: Vec2::splat(x),
            time,
            speed: 2.0,
            magnitude: 0.5,
            radius: 0.035,
        };
        let mut cell = LatestCell::default();
        assert!(cell.load().is_none());
        cell.store(sample(0.0, 1.0));
        cell.store(sample(1.0, 3.0));
        assert_eq!(cell.load(), Some(sample(1.0, 3.0)));
    }

    #[test]
    fn test_decay_is_written_back_with_the_sample() {
        let mut adapter = PointerInputAdapter::default();
        adapter.pointer_down(Vec2::new(300.0, 150.0), bounds(), 4.0);
        adapter.frame(true);

        let stored = adapter.last_sample().unwrap();
        assert_eq!(stored.time, 4.0);
        assert!((stored.magnitude - 1.25 * 0.85).abs() < 1e-6);
        assert_eq!(stored.magnitude, adapter.magnitude());
        assert_eq!(stored.radius, adapter.radius());

        adapter.reset();
        assert_eq!(adapter.last_sample(), None);
        assert_eq!(adapter.magnitude(), 0.0);
        assert_eq!(adapter.radius(), 0.035);
    }
}
