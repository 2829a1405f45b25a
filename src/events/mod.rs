use bevy::prelude::*;

/// Emitted once per draining cycle, the frame the presence level reaches 0.
/// The host is expected to move the phase to `Off` in response.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceDrained;

/// Emitted when a fill animation completes while still in `Filling`.
/// Hosts usually answer by settling into `On`.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceFilled;
