//! Surface compositor.
//!
//! Draws the water as one full-window quad with `SurfaceMaterial`. Every
//! frame the current height field is uploaded as an `R32Float` texture and
//! the uniform is refreshed from the presence level and config. `shade` is a
//! CPU copy of the fragment shader used to check the shading contract.

use bevy::image::ImageSampler;
use bevy::prelude::*;
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use bevy::sprite::Material2dPlugin;
use bevy::window::PrimaryWindow;

use crate::components::presence::PresenceAnimator;
use crate::components::surface::{SurfaceEntity, SurfacePlane};
use crate::features::surface::background::{sync_background_texture, BackgroundTextureLoader};
use crate::features::surface::height_field::HeightFieldView;
use crate::features::surface::simulation::RippleSimulation;
use crate::plugins::core::{SurfaceSet, WaterPhase};
use crate::resources::config::CompositorConfig;
use crate::resources::pointer::SurfaceBounds;
use crate::resources::surface_material::{SurfaceMaterial, SurfaceSettings};
use crate::resources::SurfaceConfig;
use crate::utils::easing::{mix, smoothstep};

/// Depth of the surface plane for a presence level.
pub fn surface_depth(level: f32, config: &CompositorConfig) -> f32 {
    mix(config.plane_depth_empty, config.plane_depth_full, level.clamp(0.0, 1.0))
}

/// Surface UV (bottom-left origin) to world position, for a 2D camera
/// centred on the window.
pub fn surface_to_world(uv: Vec2, bounds: Rect, window: Vec2) -> Vec2 {
    let client = Vec2::new(
        bounds.min.x + uv.x * bounds.width(),
        bounds.max.y - uv.y * bounds.height(),
    );
    Vec2::new(client.x - window.x * 0.5, window.y * 0.5 - client.y)
}

/// CPU mirror of `surface.wgsl`. `uv` has a bottom-left origin; the result is
/// straight (non-premultiplied) RGBA.
pub fn shade(
    settings: &SurfaceSettings,
    uv: Vec2,
    field: Option<&HeightFieldView>,
    background: Option<&dyn Fn(Vec2) -> Vec3>,
) -> Vec4 {
    let level = settings.level.clamp(0.0, 1.0);
    let tint = settings.tint.truncate();
    let centered = uv - Vec2::splat(0.5);

    let height_uv = Vec2::splat(0.5) + centered * (1.0 - settings.zoom * level);
    let (height, gradient) = match field {
        Some(field) => (field.sample(height_uv), field.gradient(height_uv)),
        None => (0.0, Vec2::ZERO),
    };

    let phase = settings.time * std::f32::consts::TAU * settings.drift_frequency;
    let drift = Vec2::new(
        (phase + uv.y * 6.0).sin(),
        (phase * 0.7 + uv.x * 5.0).cos(),
    ) * settings.drift_amplitude;
    let refracted = uv + gradient * settings.refraction * level + drift;

    let base = match background {
        Some(sample) => sample(refracted.clamp(Vec2::ZERO, Vec2::ONE)),
        None => tint,
    };
    let mut color = base.lerp(tint, settings.tint_base + settings.tint_gain * level);

    let glint = smoothstep(settings.highlight_low, settings.highlight_high, gradient.length());
    color += Vec3::splat(glint * settings.highlight_strength * level);
    color += Vec3::splat(height * settings.height_shade * level);

    let distance = centered.length();
    let rim = smoothstep(settings.vignette_inner, settings.vignette_outer, distance);
    color += Vec3::splat(rim * settings.edge_glow * level);

    let alpha = (settings.alpha_base + settings.alpha_gain * level) * (1.0 - rim);
    color.clamp(Vec3::ZERO, Vec3::ONE).extend(alpha.clamp(0.0, 1.0))
}

/// GPU-side textures owned by the compositor for the current session.
#[derive(Resource, Debug, Default)]
pub struct SurfaceTextures {
    height: Option<Handle<Image>>,
    /// 1x1 zero-height stand-in, bound whenever there is no live field so the
    /// non-filtering slot never falls back to a filtering sampler.
    flat: Handle<Image>,
    resolution: usize,
    /// Whether the height texture holds this frame's field.
    height_live: bool,
}

impl SurfaceTextures {
    pub fn height(&self) -> Option<&Handle<Image>> {
        self.height_live.then_some(self.height.as_ref()).flatten()
    }
}

pub struct SurfaceCompositorPlugin;

impl Plugin for SurfaceCompositorPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(Material2dPlugin::<SurfaceMaterial>::default())
            .add_systems(OnExit(WaterPhase::Off), spawn_surface_plane)
            .add_systems(OnEnter(WaterPhase::Off), despawn_surface)
            .add_systems(
                Update,
                (upload_height_texture, update_surface_material, fit_surface_plane)
                    .chain()
                    .after(sync_background_texture)
                    .in_set(SurfaceSet::Render),
            );
    }
}

fn spawn_surface_plane(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<SurfaceMaterial>>,
    mut images: ResMut<Assets<Image>>,
    config: Res<SurfaceConfig>,
) {
    let flat = images.add(height_image(1));
    let material = materials.add(SurfaceMaterial {
        settings: SurfaceSettings::from_config(&config.compositor),
        height_texture: Some(flat.clone()),
        background_texture: None,
    });

    commands.spawn((
        Mesh2d(meshes.add(Rectangle::new(1.0, 1.0))),
        MeshMaterial2d(material),
        Transform::from_xyz(0.0, 0.0, surface_depth(0.0, &config.compositor)),
        Visibility::default(),
        SurfacePlane,
        SurfaceEntity,
    ));
    commands.insert_resource(SurfaceTextures {
        flat,
        ..default()
    });
    info!("Surface plane spawned");
}

fn despawn_surface(
    mut commands: Commands,
    entities: Query<Entity, With<SurfaceEntity>>,
    textures: Option<Res<SurfaceTextures>>,
    mut images: ResMut<Assets<Image>>,
) {
    for entity in &entities {
        commands.entity(entity).despawn_recursive();
    }
    if let Some(textures) = textures.as_ref() {
        if let Some(handle) = textures.height.as_ref() {
            images.remove(handle.id());
        }
        images.remove(textures.flat.id());
    }
    commands.remove_resource::<SurfaceTextures>();
    info!("Surface despawned");
}

fn height_image(resolution: usize) -> Image {
    let size = resolution as u32;
    let mut image = Image::new_fill(
        Extent3d {
            width: size,
            height: size,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        bytemuck::bytes_of(&0.5f32),
        TextureFormat::R32Float,
        RenderAssetUsages::default(),
    );
    image.sampler = ImageSampler::nearest();
    image
}

/// Copies the current height buffer into the height texture, creating the
/// texture the first time a field is available.
fn upload_height_texture(
    simulation: Option<Res<RippleSimulation>>,
    textures: Option<ResMut<SurfaceTextures>>,
    mut images: ResMut<Assets<Image>>,
) {
    let Some(mut textures) = textures else { return; };
    let Some(view) = simulation.as_ref().and_then(|s| s.texture()) else {
        textures.height_live = false;
        return;
    };

    if textures.height.is_none() || textures.resolution != view.resolution {
        if let Some(old) = textures.height.take() {
            images.remove(old.id());
        }
        textures.height = Some(images.add(height_image(view.resolution)));
        textures.resolution = view.resolution;
        debug!("Height texture created ({0}x{0})", view.resolution);
    }

    let Some(image) = textures.height.as_ref().and_then(|h| images.get_mut(h)) else {
        warn_once!("Height texture missing from assets");
        textures.height_live = false;
        return;
    };
    view.encode_unorm(&mut image.data);
    textures.height_live = true;
}

fn update_surface_material(
    time: Res<Time>,
    config: Res<SurfaceConfig>,
    presence: Res<PresenceAnimator>,
    loader: Res<BackgroundTextureLoader>,
    textures: Option<Res<SurfaceTextures>>,
    planes: Query<&MeshMaterial2d<SurfaceMaterial>, With<SurfacePlane>>,
    mut materials: ResMut<Assets<SurfaceMaterial>>,
) {
    let Ok(handle) = planes.get_single() else { return; };
    let Some(material) = materials.get_mut(&handle.0) else {
        warn_once!("Surface material missing");
        return;
    };

    let live_height = textures.as_ref().and_then(|t| t.height().cloned());
    let height = live_height
        .clone()
        .or_else(|| textures.as_ref().map(|t| t.flat.clone()));
    let background = loader.handle().cloned();

    let mut settings = SurfaceSettings::from_config(&config.compositor);
    settings.level = presence.level();
    settings.time = time.elapsed_secs_wrapped();
    settings.has_height = if live_height.is_some() { 1.0 } else { 0.0 };
    settings.has_background = if background.is_some() { 1.0 } else { 0.0 };
    settings.texel = textures
        .as_ref()
        .filter(|t| t.resolution > 0)
        .map_or(0.0, |t| 1.0 / t.resolution as f32);

    material.settings = settings;
    material.height_texture = height;
    material.background_texture = background;
}

/// Keeps the plane covering the surface rectangle at the depth for the
/// current level.
fn fit_surface_plane(
    config: Res<SurfaceConfig>,
    presence: Res<PresenceAnimator>,
    bounds: Res<SurfaceBounds>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut planes: Query<&mut Transform, With<SurfacePlane>>,
) {
    let window = windows
        .get_single()
        .map(|w| Vec2::new(w.width(), w.height()))
        .unwrap_or(bounds.rect.max);
    let centre = surface_to_world(Vec2::splat(0.5), bounds.rect, window);
    let depth = surface_depth(presence.level(), &config.compositor);

    for mut transform in &mut planes {
        transform.translation = centre.extend(depth);
        transform.scale = Vec3::new(bounds.rect.width(), bounds.rect.height(), 1.0);
    }
}
