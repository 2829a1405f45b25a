//! Floating leaf population.
//!
//! Leaves spawn just outside the left edge on a randomised timer, drift right
//! at a constant per-leaf speed with a gentle wobble, and are culled once they
//! leave the visible area. Randomness and time are both injected: the RNG is
//! seedable and the clock only advances by the `dt` handed to `update`.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::components::leaf::{Leaf, LeafPose};
use crate::features::surface::height_field::HeightFieldView;
use crate::resources::config::LeafConfig;

/// Largest tilt the height field may add to a leaf, in radians.
const MAX_SLOPE_TILT: f32 = 0.5;

#[derive(Resource, Debug)]
pub struct LeafLayer {
    config: LeafConfig,
    rng: StdRng,
    leaves: Vec<Leaf>,
    /// Logical seconds since the layer was created.
    clock: f64,
    next_spawn_at: Option<f64>,
    active: bool,
    next_id: u64,
    spawning_paused: bool,
}

impl LeafLayer {
    pub fn new(config: LeafConfig, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            rng,
            leaves: Vec::new(),
            clock: 0.0,
            next_spawn_at: None,
            active: false,
            next_id: 0,
            spawning_paused: false,
        }
    }

    pub fn leaves(&self) -> &[Leaf] {
        &self.leaves
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn config(&self) -> &LeafConfig {
        &self.config
    }

    /// Replaces the tuning. Existing leaves keep their drawn attributes.
    /// Replaces the tuning. A lower cap only limits spawning; leaves already
    /// over it drift out on their own.
    pub fn set_config(&mut self, config: LeafConfig) {
        self.config = config;
    }

    pub fn spawning_paused(&self) -> bool {
        self.spawning_paused
    }

    /// Freezes the spawn timer. Existing leaves keep drifting.
    pub fn set_spawning_paused(&mut self, paused: bool) {
        self.spawning_paused = paused;
    }

    /// Seconds until the next spawn attempt, if one is scheduled.
    pub fn next_spawn_in(&self) -> Option<f32> {
        self.next_spawn_at.map(|at| (at - self.clock).max(0.0) as f32)
    }

    /// Per-frame update. Disabling clears every leaf immediately; the next
    /// enable counts as a first activation again.
    pub fn update(&mut self, enabled: bool, dt: f32) {
        if !enabled {
            if self.active || !self.leaves.is_empty() {
                self.leaves.clear();
                self.active = false;
                self.next_spawn_at = None;
            }
            return;
        }

        if !self.active {
            self.active = true;
            let delay = self.config.first_spawn_delay.sample(&mut self.rng) as f64;
            self.next_spawn_at = Some(self.clock + delay);
        }

        let dt = dt.max(0.0);
        self.clock += dt as f64;

        for leaf in &mut self.leaves {
            leaf.age += dt;
            leaf.anchor.x += leaf.velocity * dt;
        }

        let mut leaves = std::mem::take(&mut self.leaves);
        leaves.retain(|leaf| self.in_bounds(self.pose(leaf).position));
        self.leaves = leaves;

        if self.spawning_paused {
            if let Some(at) = self.next_spawn_at.as_mut() {
                *at += dt as f64;
            }
            return;
        }

        let Some(at) = self.next_spawn_at else { return; };
        if self.clock >= at {
            self.try_spawn();
            let interval = self.config.spawn_interval.sample(&mut self.rng) as f64;
            self.next_spawn_at = Some(self.clock + interval);
        }
    }

    /// One spawn attempt. Fails when the cap is reached, or when the layer is
    /// crowded and the last arrival has not yet cleared the spawn edge.
    pub fn try_spawn(&mut self) -> bool {
        let cap = self.config.max_leaves;
        if self.leaves.len() >= cap {
            return false;
        }

        let spawn_x = self.spawn_x();
        let crowded = self.leaves.len() as f32 >= self.config.crowding_fraction * cap as f32;
        let edge_busy = self
            .leaves
            .iter()
            .any(|leaf| leaf.anchor.x < spawn_x + self.config.spawn_edge_band);
        if crowded && edge_busy {
            return false;
        }

        let leaf = Leaf {
            id: self.next_id,
            anchor: Vec2::new(spawn_x, self.config.spawn_height.sample(&mut self.rng)),
            scale: self.config.scale.sample(&mut self.rng),
            base_rotation: self.rng.gen_range(-std::f32::consts::PI..std::f32::consts::PI),
            velocity: self.config.drift_speed.sample(&mut self.rng),
            phase: self.rng.gen_range(0.0..std::f32::consts::TAU),
            age: 0.0,
        };
        self.next_id += 1;
        self.leaves.push(leaf);
        true
    }

    /// Drawn pose without surface coupling: drift plus wobble.
    pub fn pose(&self, leaf: &Leaf) -> LeafPose {
        let t = leaf.age * self.config.wobble_frequency + leaf.phase;
        LeafPose {
            position: leaf.anchor + Vec2::new(0.0, self.config.wobble_amplitude * t.sin()),
            rotation: leaf.base_rotation + self.config.sway_amplitude * (t * 0.7 + leaf.phase).sin(),
            scale: leaf.scale,
        }
    }

    /// Drawn pose riding the height field: a small bob along the height and
    /// a tilt following the local slope.
    pub fn render_pose(&self, leaf: &Leaf, field: Option<&HeightFieldView>) -> LeafPose {
        let mut pose = self.pose(leaf);
        if let Some(field) = field {
            let uv = pose.position.clamp(Vec2::ZERO, Vec2::ONE);
            let height = field.sample(uv);
            let slope = field.gradient(uv);
            pose.position.y += self.config.bob_amplitude * height;
            pose.rotation += (slope.x * self.config.slope_tilt).clamp(-MAX_SLOPE_TILT, MAX_SLOPE_TILT);
        }
        pose
    }

    fn spawn_x(&self) -> f32 {
        -self.config.margin * 0.5
    }

    fn in_bounds(&self, position: Vec2) -> bool {
        let margin = self.config.margin;
        position.x <= 1.0 + margin && position.y >= -margin && position.y <= 1.0 + margin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::config::Span;

    const DT: f32 = 1.0 / 60.0;

    fn fast_config() -> LeafConfig {
        LeafConfig {
            spawn_interval: Span::new(0.05, 0.05),
            ..default()
        }
    }

    #[test]
    fn test_population_never_exceeds_cap() {
        let config = LeafConfig {
            crowding_fraction: 1.0,
            drift_speed: Span::new(0.0, 0.0),
            ..fast_config()
        };
        let mut layer = LeafLayer::new(config, Some(1));
        let mut peak = 0;
        for _ in 0..10_000 {
            layer.update(true, DT);
            assert!(layer.len() <= 9);
            peak = peak.max(layer.len());
        }
        assert_eq!(peak, 9);
    }

    #[test]
    fn test_cap_holds_with_drift() {
        let mut layer = LeafLayer::new(fast_config(), Some(2));
        for _ in 0..10_000 {
            layer.update(true, DT);
            assert!(layer.len() <= layer.config().max_leaves);
        }
    }

    #[test]
    fn test_crowding_suppresses_spawns_near_edge() {
        // Stationary leaves never clear the spawn edge, so spawning stops
        // once the population crosses 70% of the cap.
        let config = LeafConfig {
            drift_speed: Span::new(0.0, 0.0),
            ..fast_config()
        };
        let mut layer = LeafLayer::new(config, Some(3));
        for _ in 0..2_000 {
            layer.update(true, DT);
        }
        assert_eq!(layer.len(), 7);
    }

    #[test]
    fn test_first_spawn_after_short_delay() {
        for seed in 0..20 {
            let mut layer = LeafLayer::new(LeafConfig::default(), Some(seed));
            let mut elapsed = 0.0;
            while layer.is_empty() {
                layer.update(true, DT);
                elapsed += DT;
                assert!(elapsed < 1.0, "no spawn within 1s for seed {seed}");
            }
            assert!(elapsed >= 0.2 - DT && elapsed <= 0.8 + DT, "spawned after {elapsed}");
        }
    }

    #[test]
    fn test_disabling_clears_synchronously() {
        let mut layer = LeafLayer::new(fast_config(), Some(4));
        for _ in 0..120 {
            layer.update(true, DT);
        }
        assert!(!layer.is_empty());

        layer.update(false, DT);
        assert!(layer.is_empty());
        assert!(!layer.is_active());
        assert_eq!(layer.next_spawn_in(), None);
    }

    #[test]
    fn test_leaves_removed_past_far_edge() {
        let config = LeafConfig {
            drift_speed: Span::new(0.5, 0.5),
            ..LeafConfig::default()
        };
        let mut layer = LeafLayer::new(config, Some(5));
        assert!(layer.try_spawn());
        let id = layer.leaves()[0].id;

        layer.set_spawning_paused(true);
        layer.update(true, 1.0);
        assert!(layer.leaves().iter().any(|l| l.id == id));
        layer.update(true, 1.5);
        assert!(layer.leaves().iter().all(|l| l.id != id));
    }

    #[test]
    fn test_motion_is_horizontal_drift_plus_wobble() {
        let mut layer = LeafLayer::new(LeafConfig::default(), Some(6));
        layer.set_spawning_paused(true);
        assert!(layer.try_spawn());
        let before = layer.leaves()[0].clone();

        layer.update(true, 0.5);
        let after = &layer.leaves()[0];
        assert!((after.anchor.x - (before.anchor.x + before.velocity * 0.5)).abs() < 1e-6);
        assert_eq!(after.anchor.y, before.anchor.y);

        let pose = layer.pose(after);
        assert!((pose.position.y - after.anchor.y).abs() <= layer.config().wobble_amplitude + 1e-6);
    }

    #[test]
    fn test_lowering_cap_lets_extra_leaves_drift_out() {
        let config = LeafConfig {
            drift_speed: Span::new(0.5, 0.5),
            ..fast_config()
        };
        let mut layer = LeafLayer::new(config.clone(), Some(6));
        for _ in 0..5 {
            assert!(layer.try_spawn());
        }

        layer.set_config(LeafConfig { max_leaves: 2, ..config });
        assert_eq!(layer.len(), 5);
        assert!(!layer.try_spawn());
        layer.update(true, DT);
        assert_eq!(layer.len(), 5);

        layer.set_spawning_paused(true);
        layer.update(true, 3.0);
        assert!(layer.is_empty());

        layer.set_spawning_paused(false);
        for _ in 0..2_000 {
            layer.update(true, DT);
            assert!(layer.len() <= 2);
        }
    }

    #[test]
    fn test_same_seed_same_population() {
        let mut a = LeafLayer::new(fast_config(), Some(9));
        let mut b = LeafLayer::new(fast_config(), Some(9));
        for _ in 0..600 {
            a.update(true, DT);
            b.update(true, DT);
        }
        assert_eq!(a.leaves(), b.leaves());
    }

    #[test]
    fn test_render_pose_rides_height_field() {
        let mut layer = LeafLayer::new(LeafConfig::default(), Some(7));
        assert!(layer.try_spawn());
        let leaf = layer.leaves()[0].clone();

        let flat = layer.render_pose(&leaf, None);
        let heights = vec![1.0; 16];
        let raised = HeightFieldView { resolution: 4, heights: &heights };
        let pose = layer.render_pose(&leaf, Some(&raised));
        assert!((pose.position.y - flat.position.y - layer.config().bob_amplitude).abs() < 1e-6);
        assert!((pose.rotation - flat.rotation).abs() < 1e-6);
    }
}
