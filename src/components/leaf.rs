use bevy::prelude::*;

/// A floating leaf. Owned by `LeafLayer`; leaves are plain data, not
/// entities, so the whole population renders as one mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    pub id: u64,
    /// Drifted position in surface space (bottom-left origin) before wobble.
    pub anchor: Vec2,
    pub scale: f32,
    pub base_rotation: f32,
    /// Surface widths per second, always along +x.
    pub velocity: f32,
    /// Wobble phase offset in radians.
    pub phase: f32,
    /// Seconds since spawn.
    pub age: f32,
}

/// Where a leaf is drawn this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeafPose {
    pub position: Vec2,
    pub rotation: f32,
    pub scale: f32,
}

/// Marker for the single mesh entity carrying every leaf quad.
#[derive(Component, Debug, Default)]
pub struct LeafMesh;
