//! Material for the full-window water surface.
//!
//! Composites the captured background, the tint, highlights from the ripple
//! height field and the edge glow. The shader is mirrored on the CPU by
//! `features::surface::compositor::shade`.

use bevy::prelude::*;
use bevy::render::render_resource::{AsBindGroup, ShaderRef, ShaderType};
use bevy::sprite::{AlphaMode2d, Material2d};

use crate::resources::config::CompositorConfig;

/// Uniform block for `surface.wgsl`.
#[derive(Clone, Copy, Debug, PartialEq, ShaderType)]
pub struct SurfaceSettings {
    /// RGB tint, alpha unused.
    pub tint: Vec4,
    /// Presence level in [0, 1].
    pub level: f32,
    /// Seconds, wrapped to keep precision.
    pub time: f32,
    /// 1 / N of the height texture.
    pub texel: f32,
    /// 1.0 when the height texture is bound, else 0.0.
    pub has_height: f32,
    /// 1.0 when the background texture is bound, else 0.0.
    pub has_background: f32,
    pub tint_base: f32,
    pub tint_gain: f32,
    pub alpha_base: f32,
    pub alpha_gain: f32,
    pub zoom: f32,
    pub refraction: f32,
    pub highlight_low: f32,
    pub highlight_high: f32,
    pub highlight_strength: f32,
    pub height_shade: f32,
    pub edge_glow: f32,
    pub drift_amplitude: f32,
    pub drift_frequency: f32,
    pub vignette_inner: f32,
    pub vignette_outer: f32,
}

impl SurfaceSettings {
    /// Static coefficients from config; per-frame fields start at zero.
    pub fn from_config(config: &CompositorConfig) -> Self {
        let [r, g, b] = config.tint;
        Self {
            tint: Vec4::new(r, g, b, 1.0),
            level: 0.0,
            time: 0.0,
            texel: 0.0,
            has_height: 0.0,
            has_background: 0.0,
            tint_base: config.tint_base,
            tint_gain: config.tint_gain,
            alpha_base: config.alpha_base,
            alpha_gain: config.alpha_gain,
            zoom: config.zoom,
            refraction: config.refraction,
            highlight_low: config.highlight_low,
            highlight_high: config.highlight_high,
            highlight_strength: config.highlight_strength,
            height_shade: config.height_shade,
            edge_glow: config.edge_glow,
            drift_amplitude: config.drift_amplitude,
            drift_frequency: config.drift_frequency,
            vignette_inner: config.vignette_inner,
            vignette_outer: config.vignette_outer,
        }
    }
}

impl Default for SurfaceSettings {
    fn default() -> Self {
        Self::from_config(&CompositorConfig::default())
    }
}

#[derive(Asset, TypePath, AsBindGroup, Debug, Clone, Default)]
pub struct SurfaceMaterial {
    #[uniform(0)]
    pub settings: SurfaceSettings,

    /// Heights re-mapped to [0, 1], `R32Float`, bottom row first.
    #[texture(1, sample_type = "float", filterable = false)]
    #[sampler(2, sampler_type = "non_filtering")]
    pub height_texture: Option<Handle<Image>>,

    #[texture(3)]
    #[sampler(4)]
    pub background_texture: Option<Handle<Image>>,
}

impl Material2d for SurfaceMaterial {
    fn fragment_shader() -> ShaderRef {
        "shaders/surface.wgsl".into()
    }

    fn alpha_mode(&self) -> AlphaMode2d {
        AlphaMode2d::Blend
    }
}
