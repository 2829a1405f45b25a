//! Height field ripple solver.
//!
//! Second-order finite-difference wave equation on an NxN grid, stepped once
//! per rendered frame. Three buffers live in a fixed arena and swap roles by
//! index each tick:
//! - `current`: the most recent state (what the compositor samples)
//! - `previous`: the state before that
//! - `write`: scratch target for the next state (reuses the oldest buffer)
//!
//! Grid coordinates use a bottom-left origin: cell `(x, y)` sits at
//! `index = y * N + x` and its centre maps to UV `((x + 0.5) / N, (y + 0.5) / N)`.

use bevy::math::Vec2;

use crate::error::SurfaceError;
use crate::resources::config::SimulationConfig;

/// A one-tick injection of energy into the field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Impulse {
    /// Surface-normalised position (bottom-left origin).
    pub position: Vec2,
    pub magnitude: f32,
    /// Gaussian radius in UV units.
    pub radius: f32,
}

impl Impulse {
    /// No energy at all.
    pub const REST: Self = Self {
        position: Vec2::new(0.5, 0.5),
        magnitude: 0.0,
        radius: 0.0,
    };

    pub fn is_active(&self) -> bool {
        self.magnitude > 0.0
            && self.radius > 0.0
            && self.magnitude.is_finite()
            && self.radius.is_finite()
            && self.position.is_finite()
    }
}

impl Default for Impulse {
    fn default() -> Self {
        Self::REST
    }
}

/// Index of each role inside the three-buffer arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferRoles {
    pub current: usize,
    pub previous: usize,
    pub write: usize,
}

impl BufferRoles {
    pub const INITIAL: Self = Self {
        current: 0,
        previous: 1,
        write: 2,
    };

    /// Roles after a tick: the written buffer becomes current, current becomes
    /// previous and the old previous is recycled as the next write target.
    pub fn rotated(self) -> Self {
        Self {
            current: self.write,
            previous: self.current,
            write: self.previous,
        }
    }
}

/// Solver coefficients, copied out of `SimulationConfig`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveParams {
    pub wave_speed_sq: f32,
    pub damping: f32,
    pub strength: f32,
    pub edge_reflectance: f32,
}

impl From<&SimulationConfig> for WaveParams {
    fn from(config: &SimulationConfig) -> Self {
        Self {
            wave_speed_sq: config.wave_speed_sq,
            damping: config.damping,
            strength: config.strength,
            edge_reflectance: config.edge_reflectance,
        }
    }
}

impl Default for WaveParams {
    fn default() -> Self {
        Self::from(&SimulationConfig::default())
    }
}

/// Owns the three height buffers and advances them.
#[derive(Debug, Clone)]
pub struct HeightFieldSimulator {
    resolution: usize,
    buffers: [Vec<f32>; 3],
    roles: BufferRoles,
    params: WaveParams,
    enabled: bool,
    ticks: u64,
}

impl HeightFieldSimulator {
    /// Allocates three zeroed NxN buffers.
    ///
    /// Fails instead of aborting when the buffers cannot be allocated, so the
    /// caller can run without ripples.
    pub fn new(resolution: usize, params: WaveParams) -> Result<Self, SurfaceError> {
        if resolution == 0 {
            return Err(SurfaceError::InvalidResolution(resolution));
        }
        let cells = resolution
            .checked_mul(resolution)
            .ok_or(SurfaceError::InvalidResolution(resolution))?;

        Ok(Self {
            resolution,
            buffers: [
                alloc_buffer(cells, resolution)?,
                alloc_buffer(cells, resolution)?,
                alloc_buffer(cells, resolution)?,
            ],
            roles: BufferRoles::INITIAL,
            params,
            enabled: false,
            ticks: 0,
        })
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn params(&self) -> WaveParams {
        self.params
    }

    pub fn set_params(&mut self, params: WaveParams) {
        self.params = params;
    }

    pub fn roles(&self) -> BufferRoles {
        self.roles
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Raw buffer by arena index.
    pub fn buffer(&self, index: usize) -> &[f32] {
        &self.buffers[index]
    }

    pub fn current(&self) -> &[f32] {
        &self.buffers[self.roles.current]
    }

    pub fn previous(&self) -> &[f32] {
        &self.buffers[self.roles.previous]
    }

    /// Advances one fixed step. `dt` does not scale the step: the field moves
    /// the same amount per rendered frame at any frame rate.
    ///
    /// Returns the exposed texture, which is absent while disabled. Disabled
    /// ticks leave every buffer and role untouched.
    pub fn tick(&mut self, enabled: bool, impulse: &Impulse, _dt: f32) -> Option<HeightFieldView<'_>> {
        self.enabled = enabled;
        if !enabled {
            return None;
        }

        self.step(impulse);
        self.roles = self.roles.rotated();
        self.ticks += 1;
        self.texture()
    }

    /// The field as seen by the compositor: absent while disabled.
    pub fn texture(&self) -> Option<HeightFieldView<'_>> {
        self.enabled.then(|| self.view())
    }

    /// The current buffer regardless of enablement.
    pub fn view(&self) -> HeightFieldView<'_> {
        HeightFieldView {
            resolution: self.resolution,
            heights: self.current(),
        }
    }

    /// Zeroes all three buffers and resets the roles.
    pub fn clear(&mut self) {
        for buffer in &mut self.buffers {
            buffer.fill(0.0);
        }
        self.roles = BufferRoles::INITIAL;
        self.ticks = 0;
    }

    /// Sum of squared heights of the current buffer.
    pub fn height_energy(&self) -> f64 {
        self.current().iter().map(|&h| (h as f64) * (h as f64)).sum()
    }

    /// Discrete energy of the scheme:
    /// `|u - u_prev|^2 + s * c^2 * <-L u, u_prev>` with `s = 2 / (2 - damping)`.
    ///
    /// Constant without damping, non-increasing with damping, as long as no
    /// impulse is injected and the clamp does not engage.
    pub fn wave_energy(&self) -> f64 {
        let n = self.resolution;
        let edge = self.params.edge_reflectance;
        let current = self.current();
        let previous = self.previous();
        let sigma = 2.0 / (2.0 - self.params.damping as f64);

        let mut kinetic = 0.0f64;
        let mut potential = 0.0f64;
        for y in 0..n {
            for x in 0..n {
                let i = y * n + x;
                let v = (current[i] - previous[i]) as f64;
                kinetic += v * v;
                potential -= laplacian(current, n, edge, x, y) as f64 * previous[i] as f64;
            }
        }
        kinetic + sigma * self.params.wave_speed_sq as f64 * potential
    }

    fn step(&mut self, impulse: &Impulse) {
        let n = self.resolution;
        let BufferRoles { current, previous, write } = self.roles;
        let WaveParams {
            wave_speed_sq,
            damping,
            edge_reflectance,
            ..
        } = self.params;

        let mut next = std::mem::take(&mut self.buffers[write]);
        {
            let cur = &self.buffers[current];
            let prev = &self.buffers[previous];
            for y in 0..n {
                for x in 0..n {
                    let i = y * n + x;
                    let c = cur[i];
                    let mut h = 2.0 * c - prev[i] + wave_speed_sq * laplacian(cur, n, edge_reflectance, x, y);
                    h -= damping * (c - prev[i]);
                    next[i] = h;
                }
            }
        }

        self.splat(&mut next, impulse);

        for h in next.iter_mut() {
            *h = h.clamp(-1.0, 1.0);
        }
        self.buffers[write] = next;
    }

    /// Adds a gaussian bump, skipping cells beyond three radii.
    fn splat(&self, next: &mut [f32], impulse: &Impulse) {
        if !impulse.is_active() {
            return;
        }
        let n = self.resolution;
        let amount = impulse.magnitude * self.params.strength;
        let reach = impulse.radius * 3.0;
        let inv_radius_sq = 1.0 / (impulse.radius * impulse.radius);

        let Some(xs) = cell_span(impulse.position.x, reach, n) else { return };
        let Some(ys) = cell_span(impulse.position.y, reach, n) else { return };

        for y in ys {
            let v = (y as f32 + 0.5) / n as f32;
            for x in xs.clone() {
                let u = (x as f32 + 0.5) / n as f32;
                let dist_sq = Vec2::new(u, v).distance_squared(impulse.position);
                if dist_sq > reach * reach {
                    continue;
                }
                next[y * n + x] += (-dist_sq * inv_radius_sq).exp() * amount;
            }
        }
    }
}

fn alloc_buffer(cells: usize, resolution: usize) -> Result<Vec<f32>, SurfaceError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(cells)
        .map_err(|_| SurfaceError::BufferAllocation { resolution })?;
    buffer.resize(cells, 0.0);
    Ok(buffer)
}

/// 4-neighbour Laplacian. Neighbours outside the grid read the edge cell
/// scaled by `edge`, which makes the border a partial reflector.
#[inline]
fn laplacian(field: &[f32], n: usize, edge: f32, x: usize, y: usize) -> f32 {
    let i = y * n + x;
    let c = field[i];
    let west = if x > 0 { field[i - 1] } else { c * edge };
    let east = if x + 1 < n { field[i + 1] } else { c * edge };
    let south = if y > 0 { field[i - n] } else { c * edge };
    let north = if y + 1 < n { field[i + n] } else { c * edge };
    west + east + south + north - 4.0 * c
}

/// Cells whose centres may fall within `reach` of `center` along one axis.
fn cell_span(center: f32, reach: f32, resolution: usize) -> Option<std::ops::RangeInclusive<usize>> {
    let n = resolution as f32;
    let lo = ((center - reach) * n - 0.5).floor().max(0.0);
    let hi = ((center + reach) * n - 0.5).ceil().min(n - 1.0);
    (hi >= lo).then(|| lo as usize..=hi as usize)
}

/// Read-only view of one height buffer.
#[derive(Debug, Clone, Copy)]
pub struct HeightFieldView<'a> {
    pub resolution: usize,
    pub heights: &'a [f32],
}

impl<'a> HeightFieldView<'a> {
    /// Height at a cell, with coordinates clamped into the grid.
    pub fn cell(&self, x: isize, y: isize) -> f32 {
        let max = self.resolution as isize - 1;
        let x = x.clamp(0, max) as usize;
        let y = y.clamp(0, max) as usize;
        self.heights[y * self.resolution + x]
    }

    /// Bilinear sample at a bottom-left UV. Out-of-range UVs clamp to the edge.
    pub fn sample(&self, uv: Vec2) -> f32 {
        if !uv.is_finite() {
            return 0.0;
        }
        let n = self.resolution as f32;
        let p = uv.clamp(Vec2::ZERO, Vec2::ONE) * n - Vec2::splat(0.5);
        let base = p.floor();
        let f = p - base;
        let (x0, y0) = (base.x as isize, base.y as isize);

        let h00 = self.cell(x0, y0);
        let h10 = self.cell(x0 + 1, y0);
        let h01 = self.cell(x0, y0 + 1);
        let h11 = self.cell(x0 + 1, y0 + 1);

        let bottom = h00 + (h10 - h00) * f.x;
        let top = h01 + (h11 - h01) * f.x;
        bottom + (top - bottom) * f.y
    }

    /// 4-tap central difference, one texel apart, in height per texel.
    pub fn gradient(&self, uv: Vec2) -> Vec2 {
        let texel = 1.0 / self.resolution as f32;
        let dx = self.sample(uv + Vec2::new(texel, 0.0)) - self.sample(uv - Vec2::new(texel, 0.0));
        let dy = self.sample(uv + Vec2::new(0.0, texel)) - self.sample(uv - Vec2::new(0.0, texel));
        Vec2::new(dx, dy) * 0.5
    }

    /// Writes the field as `R32Float` texels re-mapped to [0, 1].
    pub fn encode_unorm(&self, out: &mut Vec<u8>) {
        out.clear();
        out.reserve(self.heights.len() * 4);
        for &h in self.heights {
            let texel = h * 0.5 + 0.5;
            out.extend_from_slice(bytemuck::bytes_of(&texel));
        }
    }
}
