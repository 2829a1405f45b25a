//! Leaf rendering: every leaf is a textured quad in one mesh, rebuilt each
//! frame and drawn just above the water plane.

use bevy::prelude::*;
use bevy::render::mesh::{Indices, PrimitiveTopology};
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat};
use bevy::window::PrimaryWindow;

use crate::components::leaf::{LeafMesh, LeafPose};
use crate::components::presence::PresenceAnimator;
use crate::components::surface::SurfaceEntity;
use crate::features::surface::compositor::{surface_depth, surface_to_world};
use crate::features::surface::simulation::RippleSimulation;
use crate::plugins::core::{SurfaceSet, WaterPhase};
use crate::resources::leaf_layer::LeafLayer;
use crate::resources::pointer::SurfaceBounds;
use crate::resources::SurfaceConfig;

const LEAF_TEXTURE_SIZE: u32 = 32;

/// Vertex data for a batch of leaf quads.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LeafQuads {
    pub positions: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub colors: Vec<[f32; 4]>,
    pub indices: Vec<u32>,
}

impl LeafQuads {
    /// One quad per pose, in world space. `alpha` is applied to every vertex.
    pub fn build(
        poses: impl IntoIterator<Item = (u64, LeafPose)>,
        bounds: Rect,
        window: Vec2,
        size_px: f32,
        alpha: f32,
    ) -> Self {
        let mut quads = Self::default();
        let corners = [
            (Vec2::new(-0.5, -0.5), [0.0, 1.0]),
            (Vec2::new(0.5, -0.5), [1.0, 1.0]),
            (Vec2::new(0.5, 0.5), [1.0, 0.0]),
            (Vec2::new(-0.5, 0.5), [0.0, 0.0]),
        ];

        for (id, pose) in poses {
            let centre = surface_to_world(pose.position, bounds, window);
            let extent = size_px * pose.scale;
            let rotation = Vec2::from_angle(pose.rotation);
            // Slight per-leaf warmth so the population is not uniform.
            let warm = (id % 3) as f32 * 0.08;
            let color = [1.0, 1.0 - warm, 1.0 - 2.0 * warm, alpha];

            let start = quads.positions.len() as u32;
            for (offset, uv) in corners {
                let p = centre + rotation.rotate(offset * extent);
                quads.positions.push([p.x, p.y, 0.0]);
                quads.uvs.push(uv);
                quads.colors.push(color);
            }
            quads
                .indices
                .extend_from_slice(&[start, start + 1, start + 2, start + 2, start + 3, start]);
        }
        quads
    }

    pub fn apply(self, mesh: &mut Mesh) {
        mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, self.positions);
        mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, self.uvs);
        mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, self.colors);
        mesh.insert_indices(Indices::U32(self.indices));
    }
}

/// Small procedural leaf: a pointed ellipse with a darker midrib.
pub fn leaf_image() -> Image {
    let n = LEAF_TEXTURE_SIZE;
    let mut pixels = Vec::with_capacity((n * n * 4) as usize);
    for y in 0..n {
        for x in 0..n {
            let u = (x as f32 + 0.5) / n as f32 * 2.0 - 1.0;
            let v = (y as f32 + 0.5) / n as f32 * 2.0 - 1.0;
            // Narrower towards the tips.
            let half_width = 0.55 * (1.0 - v * v).max(0.0).sqrt() * (1.0 - 0.35 * v.abs());
            let inside = half_width > 0.0 && u.abs() < half_width;
            let edge = if half_width > 0.0 { 1.0 - u.abs() / half_width } else { 0.0 };

            let (r, g, b) = if u.abs() < 0.04 {
                (0.42, 0.36, 0.16)
            } else {
                (0.56 + 0.1 * v, 0.47 - 0.05 * v, 0.18)
            };
            let alpha = if inside { (edge * 6.0).min(1.0) } else { 0.0 };
            pixels.extend([r, g, b, alpha].map(|c: f32| (c.clamp(0.0, 1.0) * 255.0) as u8));
        }
    }

    Image::new(
        Extent3d {
            width: n,
            height: n,
            depth_or_array_layers: 1,
        },
        TextureDimension::D2,
        pixels,
        TextureFormat::Rgba8UnormSrgb,
        RenderAssetUsages::RENDER_WORLD,
    )
}

pub struct LeafRenderPlugin;

impl Plugin for LeafRenderPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnExit(WaterPhase::Off), spawn_leaf_mesh)
            .add_systems(Update, rebuild_leaf_mesh.in_set(SurfaceSet::Render));
    }
}

fn spawn_leaf_mesh(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<ColorMaterial>>,
    mut images: ResMut<Assets<Image>>,
) {
    let mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());
    let material = materials.add(ColorMaterial {
        color: Color::WHITE,
        texture: Some(images.add(leaf_image())),
        ..default()
    });

    commands.spawn((
        Mesh2d(meshes.add(mesh)),
        MeshMaterial2d(material),
        Transform::default(),
        Visibility::default(),
        LeafMesh,
        SurfaceEntity,
    ));
}

/// Rebuilds the single leaf mesh from the layer, riding the height field.
fn rebuild_leaf_mesh(
    config: Res<SurfaceConfig>,
    presence: Res<PresenceAnimator>,
    bounds: Res<SurfaceBounds>,
    layer: Option<Res<LeafLayer>>,
    simulation: Option<Res<RippleSimulation>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut query: Query<(&Mesh2d, &mut Transform), With<LeafMesh>>,
    mut meshes: ResMut<Assets<Mesh>>,
) {
    let Ok((mesh_handle, mut transform)) = query.get_single_mut() else { return; };
    let Some(mesh) = meshes.get_mut(&mesh_handle.0) else {
        warn_once!("Leaf mesh asset not found");
        return;
    };

    let level = presence.level();
    transform.translation.z = surface_depth(level, &config.compositor) + config.leaves.depth_epsilon;

    let window = windows
        .get_single()
        .map(|w| Vec2::new(w.width(), w.height()))
        .unwrap_or(bounds.rect.max);
    let field = simulation.as_ref().and_then(|s| s.texture());

    let quads = match layer.as_ref() {
        Some(layer) => LeafQuads::build(
            layer
                .leaves()
                .iter()
                .map(|leaf| (leaf.id, layer.render_pose(leaf, field.as_ref()))),
            bounds.rect,
            window,
            config.leaves.size_px,
            level,
        ),
        None => LeafQuads::default(),
    };
    quads.apply(mesh);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pose(x: f32, y: f32) -> LeafPose {
        LeafPose {
            position: Vec2::new(x, y),
            rotation: 0.0,
            scale: 1.0,
        }
    }

    #[test]
    fn test_one_quad_per_leaf() {
        let window = Vec2::new(400.0, 300.0);
        let bounds = Rect::new(0.0, 0.0, 400.0, 300.0);
        let quads = LeafQuads::build(
            [(0, pose(0.5, 0.5)), (1, pose(0.1, 0.9)), (2, pose(0.8, 0.2))],
            bounds,
            window,
            40.0,
            0.6,
        );
        assert_eq!(quads.positions.len(), 12);
        assert_eq!(quads.indices.len(), 18);
        assert!(quads.colors.iter().all(|c| c[3] == 0.6));
    }

    #[test]
    fn test_quad_centred_on_leaf() {
        let window = Vec2::new(400.0, 300.0);
        let bounds = Rect::new(0.0, 0.0, 400.0, 300.0);
        let quads = LeafQuads::build([(0, pose(0.5, 0.5))], bounds, window, 40.0, 1.0);
        let centre = quads
            .positions
            .iter()
            .fold(Vec2::ZERO, |acc, p| acc + Vec2::new(p[0], p[1]))
            / 4.0;
        assert!(centre.length() < 1e-4);
        assert_eq!(quads.positions[2], [20.0, 20.0, 0.0]);
    }

    #[test]
    fn test_leaf_image_is_transparent_at_corners() {
        let image = leaf_image();
        assert_eq!(image.data.len(), (LEAF_TEXTURE_SIZE * LEAF_TEXTURE_SIZE * 4) as usize);
        assert_eq!(image.data[3], 0);
        let middle = ((LEAF_TEXTURE_SIZE / 2) * LEAF_TEXTURE_SIZE + LEAF_TEXTURE_SIZE / 2) as usize * 4;
        assert!(image.data[middle + 3] > 200);
    }
}
