use bevy::prelude::*;

/// Anything spawned for the water surface. Entering `Off` despawns every
/// entity carrying this.
#[derive(Component, Debug, Default)]
pub struct SurfaceEntity;

/// The full-window plane the compositor draws on.
#[derive(Component, Debug, Default)]
pub struct SurfacePlane;
