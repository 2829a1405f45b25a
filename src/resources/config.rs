//! Tuning values for the water surface.
//!
//! Everything the effect treats as a "magic number" lives here with its
//! default, so a host can override it from `surface.json` instead of
//! patching constants.

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::SurfaceError;

/// Closed range sampled uniformly (seconds, speeds, scales...).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub min: f32,
    pub max: f32,
}

impl Span {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Uniform sample; a degenerate span always yields `min`.
    pub fn sample(&self, rng: &mut impl Rng) -> f32 {
        if self.max <= self.min {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }

    fn ordered(self) -> Self {
        if self.max < self.min {
            Self { min: self.max, max: self.min }
        } else {
            self
        }
    }
}

/// Wave solver parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Grid resolution (N for an NxN field).
    pub resolution: usize,
    /// Wave speed squared (c^2) in cells per tick. Stable up to 0.5.
    pub wave_speed_sq: f32,
    /// Velocity damping per tick.
    pub damping: f32,
    /// Global multiplier on injected impulses.
    pub strength: f32,
    /// Fraction of the edge height seen by out-of-grid neighbours.
    /// 1.0 reflects everything, 0.0 pins the border to zero.
    pub edge_reflectance: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            resolution: 512,
            wave_speed_sq: 0.35 * 0.35,
            damping: 0.02,
            strength: 0.15,
            edge_reflectance: 0.9,
        }
    }
}

/// Compositor shading coefficients. Mirrored into the shader uniform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositorConfig {
    /// Linear RGB tint blended over the background.
    pub tint: [f32; 3],
    pub tint_base: f32,
    pub tint_gain: f32,
    pub alpha_base: f32,
    pub alpha_gain: f32,
    /// How much the height lookup zooms in at full presence.
    pub zoom: f32,
    /// Background UV offset per unit of height gradient.
    pub refraction: f32,
    pub highlight_low: f32,
    pub highlight_high: f32,
    pub highlight_strength: f32,
    /// Brightness added by raw height.
    pub height_shade: f32,
    pub edge_glow: f32,
    pub drift_amplitude: f32,
    /// Drift frequency in Hz.
    pub drift_frequency: f32,
    pub vignette_inner: f32,
    pub vignette_outer: f32,
    /// Surface plane depth at level 0 and level 1.
    pub plane_depth_empty: f32,
    pub plane_depth_full: f32,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            tint: [0.10, 0.38, 0.52],
            tint_base: 0.25,
            tint_gain: 0.35,
            alpha_base: 0.06,
            alpha_gain: 0.48,
            zoom: 0.04,
            refraction: 0.6,
            highlight_low: 0.004,
            highlight_high: 0.03,
            highlight_strength: 0.45,
            height_shade: 0.12,
            edge_glow: 0.18,
            drift_amplitude: 0.0025,
            drift_frequency: 0.08,
            vignette_inner: 0.3,
            vignette_outer: std::f32::consts::FRAC_1_SQRT_2,
            plane_depth_empty: 20.0,
            plane_depth_full: 30.0,
        }
    }
}

/// Floating leaf population.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LeafConfig {
    pub max_leaves: usize,
    /// Seconds between spawn attempts.
    pub spawn_interval: Span,
    /// Delay before the forced spawn on first activation.
    pub first_spawn_delay: Span,
    /// Population fraction above which the crowding rule applies.
    pub crowding_fraction: f32,
    /// Width of the band next to the spawn edge that counts as "crowded".
    pub spawn_edge_band: f32,
    /// How far outside [0,1] a leaf may go before it is culled.
    pub margin: f32,
    /// Horizontal drift in surface widths per second.
    pub drift_speed: Span,
    pub scale: Span,
    /// Vertical band leaves spawn in.
    pub spawn_height: Span,
    pub wobble_amplitude: f32,
    /// Wobble angular frequency (rad/s).
    pub wobble_frequency: f32,
    pub sway_amplitude: f32,
    /// Vertical offset per unit of height field.
    pub bob_amplitude: f32,
    /// Tilt (radians) per unit of slope.
    pub slope_tilt: f32,
    /// Leaf edge length in logical pixels at scale 1.
    pub size_px: f32,
    /// Depth offset above the surface plane.
    pub depth_epsilon: f32,
}

impl Default for LeafConfig {
    fn default() -> Self {
        Self {
            max_leaves: 9,
            spawn_interval: Span::new(2.5, 6.5),
            first_spawn_delay: Span::new(0.2, 0.8),
            crowding_fraction: 0.7,
            spawn_edge_band: 0.12,
            margin: 0.08,
            drift_speed: Span::new(0.012, 0.035),
            scale: Span::new(0.7, 1.15),
            spawn_height: Span::new(0.15, 0.85),
            wobble_amplitude: 0.006,
            wobble_frequency: 0.9,
            sway_amplitude: 0.12,
            bob_amplitude: 0.02,
            slope_tilt: 6.0,
            size_px: 42.0,
            depth_epsilon: 0.05,
        }
    }
}

/// Presence transition timings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseConfig {
    /// Seconds for level 0 -> 1.
    pub fill_duration: f32,
    /// Seconds for level 1 -> 0.
    pub drain_duration: f32,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            fill_duration: 0.65,
            drain_duration: 0.5,
        }
    }
}

/// Pointer to impulse conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerConfig {
    /// Magnitude per (surface width per second) of pointer speed.
    pub sensitivity: f32,
    pub click_magnitude: f32,
    pub baseline_radius: f32,
    pub click_radius: f32,
    /// Multiplicative magnitude decay per frame.
    pub magnitude_decay: f32,
    /// Fraction of the way back to the baseline radius per frame.
    pub radius_ease: f32,
    /// Floor on the elapsed time between samples (seconds).
    pub min_elapsed: f32,
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            sensitivity: 0.9,
            click_magnitude: 1.25,
            baseline_radius: 0.035,
            click_radius: 0.09,
            magnitude_decay: 0.85,
            radius_ease: 0.18,
            min_elapsed: 0.001,
        }
    }
}

/// All tuning for the effect. Inserted as a resource before `SurfacePlugin`
/// runs, or defaulted by it.
#[derive(Resource, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub simulation: SimulationConfig,
    pub compositor: CompositorConfig,
    pub leaves: LeafConfig,
    pub phase: PhaseConfig,
    pub pointer: PointerConfig,
    /// Seed for leaf randomness. `None` seeds from entropy.
    pub seed: Option<u64>,
}

/// Default file name for the config.
const CONFIG_FILE_NAME: &str = "surface.json";

/// Shortest spawn interval the leaf layer accepts.
pub const MIN_SPAWN_INTERVAL: f32 = 0.05;

impl SurfaceConfig {
    /// Clamps every value into the range the effect is stable in.
    pub fn validated(mut self) -> Self {
        let sim = &mut self.simulation;
        sim.resolution = sim.resolution.min(4096);
        sim.wave_speed_sq = sim.wave_speed_sq.clamp(0.0, 0.5);
        sim.damping = sim.damping.clamp(0.0, 0.99);
        sim.edge_reflectance = sim.edge_reflectance.clamp(0.0, 1.0);
        sim.strength = sim.strength.max(0.0);

        let leaves = &mut self.leaves;
        leaves.spawn_interval = leaves.spawn_interval.ordered();
        leaves.spawn_interval.min = leaves.spawn_interval.min.max(MIN_SPAWN_INTERVAL);
        leaves.spawn_interval.max = leaves.spawn_interval.max.max(leaves.spawn_interval.min);
        leaves.first_spawn_delay = leaves.first_spawn_delay.ordered();
        leaves.drift_speed = leaves.drift_speed.ordered();
        leaves.scale = leaves.scale.ordered();
        leaves.spawn_height = leaves.spawn_height.ordered();
        leaves.crowding_fraction = leaves.crowding_fraction.clamp(0.0, 1.0);
        leaves.margin = leaves.margin.max(0.0);

        self.phase.fill_duration = self.phase.fill_duration.max(0.0);
        self.phase.drain_duration = self.phase.drain_duration.max(0.0);

        let pointer = &mut self.pointer;
        pointer.magnitude_decay = pointer.magnitude_decay.clamp(0.0, 1.0);
        pointer.radius_ease = pointer.radius_ease.clamp(0.0, 1.0);
        pointer.min_elapsed = pointer.min_elapsed.max(0.001);
        pointer.baseline_radius = pointer.baseline_radius.max(1e-4);
        pointer.click_radius = pointer.click_radius.max(pointer.baseline_radius);
        self
    }

    /// Loads the config from the default location, or returns defaults.
    ///
    /// Location is platform-specific:
    /// - macOS: ~/Library/Application Support/water-overlay/
    /// - Linux: ~/.config/water-overlay/
    /// - Windows: %APPDATA%/water-overlay/
    pub fn load_from_file() -> Self {
        let Some(path) = Self::get_config_path() else {
            warn!("Could not determine config directory, using default surface config");
            return Self::default();
        };

        if !path.exists() {
            info!("No surface config at {:?}, using defaults", path);
            return Self::default();
        }

        match Self::load_from_path(&path) {
            Ok(config) => {
                info!("Loaded surface config from {:?}", path);
                config
            }
            Err(e) => {
                error!("{}", e);
                Self::default()
            }
        }
    }

    /// Reads and validates a config file.
    pub fn load_from_path(path: &std::path::Path) -> Result<Self, SurfaceError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SurfaceError::Config(format!("failed to read {:?}: {}", path, e)))?;
        Self::from_json(&contents)
    }

    /// Parses a (possibly partial) JSON config.
    pub fn from_json(contents: &str) -> Result<Self, SurfaceError> {
        let config: Self = serde_json::from_str(contents)
            .map_err(|e| SurfaceError::Config(format!("failed to parse config: {}", e)))?;
        Ok(config.validated())
    }

    /// Returns the platform-specific path for the config file.
    pub fn get_config_path() -> Option<std::path::PathBuf> {
        Self::get_config_dir().map(|mut path| {
            path.push(CONFIG_FILE_NAME);
            path
        })
    }

    /// Returns the platform-specific directory for config storage.
    pub fn get_config_dir() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|mut path| {
            path.push("water-overlay");
            path
        })
    }

    /// Writes the config to the default location, creating the directory.
    pub fn save_to_file(&self) -> Result<(), SurfaceError> {
        let Some(path) = Self::get_config_path() else {
            return Err(SurfaceError::Config("could not determine config directory".to_string()));
        };

        if let Some(dir) = Self::get_config_dir() {
            if !dir.exists() {
                std::fs::create_dir_all(&dir).map_err(|e| {
                    SurfaceError::Config(format!("failed to create config directory: {}", e))
                })?;
                info!("Created config directory: {:?}", dir);
            }
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| SurfaceError::Config(format!("failed to serialize config: {}", e)))?;
        std::fs::write(&path, json)
            .map_err(|e| SurfaceError::Config(format!("failed to write config: {}", e)))?;
        info!("Saved surface config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_defaults_match_tuning() {
        let config = SurfaceConfig::default();
        assert_eq!(config.simulation.resolution, 512);
        assert!((config.simulation.wave_speed_sq - 0.1225).abs() < 1e-6);
        assert_eq!(config.leaves.max_leaves, 9);
        assert_eq!(config.leaves.spawn_interval, Span::new(2.5, 6.5));
        assert_eq!(config.phase.fill_duration, 0.65);
        assert_eq!(config.phase.drain_duration, 0.5);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config = SurfaceConfig::from_json(r#"{ "leaves": { "max_leaves": 4 }, "seed": 7 }"#)
            .expect("partial config should parse");
        assert_eq!(config.leaves.max_leaves, 4);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.leaves.spawn_interval, Span::new(2.5, 6.5));
        assert_eq!(config.simulation.damping, 0.02);
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        let err = SurfaceConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, SurfaceError::Config(_)));
    }

    #[test]
    fn test_validated_clamps_unstable_values() {
        let mut config = SurfaceConfig::default();
        config.simulation.wave_speed_sq = 2.0;
        config.simulation.damping = -1.0;
        config.leaves.spawn_interval = Span::new(0.0, 0.0);
        config.leaves.drift_speed = Span::new(0.5, 0.1);

        let config = config.validated();
        assert_eq!(config.simulation.wave_speed_sq, 0.5);
        assert_eq!(config.simulation.damping, 0.0);
        assert_eq!(config.leaves.spawn_interval.min, MIN_SPAWN_INTERVAL);
        assert!(config.leaves.spawn_interval.max >= config.leaves.spawn_interval.min);
        assert_eq!(config.leaves.drift_speed, Span::new(0.1, 0.5));
    }

    #[test]
    fn test_span_sample_stays_in_range() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(3);
        let span = Span::new(2.5, 6.5);
        for _ in 0..1000 {
            let v = span.sample(&mut rng);
            assert!((2.5..=6.5).contains(&v));
        }
        assert_eq!(Span::new(1.0, 1.0).sample(&mut rng), 1.0);
    }
}
