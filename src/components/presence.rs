//! Presence level of the water surface.
//!
//! The level is the single scalar the compositor and leaf layer scale by. It
//! is eased between 0 and 1 whenever the phase changes and is mutated at most
//! once per frame, by `tick`.

use bevy::prelude::*;

use crate::plugins::core::WaterPhase;
use crate::resources::config::PhaseConfig;
use crate::utils::easing::{ease_in_out_cubic, mix};

/// One-shot notifications produced by `PresenceAnimator::tick`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceSignal {
    /// Fill finished while still `Filling`.
    Filled,
    /// Drain finished while still `Draining`. Once per draining cycle.
    Drained,
}

#[derive(Resource, Debug, Clone)]
pub struct PresenceAnimator {
    level: f32,
    from: f32,
    target: f32,
    elapsed: f32,
    duration: f32,
    animating: bool,
    fill_reported: bool,
    drain_reported: bool,
}

impl Default for PresenceAnimator {
    fn default() -> Self {
        Self::empty()
    }
}

impl PresenceAnimator {
    /// No water, nothing in flight.
    pub fn empty() -> Self {
        Self {
            level: 0.0,
            from: 0.0,
            target: 0.0,
            elapsed: 0.0,
            duration: 0.0,
            animating: false,
            fill_reported: false,
            drain_reported: false,
        }
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    /// Starts an eased transition from the current level, so retargeting in
    /// the middle of a transition never jumps.
    pub fn animate_to(&mut self, target: f32, duration: f32) {
        self.from = self.level;
        self.target = target.clamp(0.0, 1.0);
        self.elapsed = 0.0;
        self.duration = duration.max(0.0);
        self.animating = true;
    }

    /// Holds the level in place and cancels any transition.
    pub fn hold(&mut self, level: f32) {
        self.level = level.clamp(0.0, 1.0);
        self.from = self.level;
        self.target = self.level;
        self.animating = false;
    }

    /// Advances the running transition. Returns true on the call that
    /// completes it.
    pub fn advance(&mut self, dt: f32) -> bool {
        if !self.animating {
            return false;
        }

        self.elapsed += dt.max(0.0);
        let t = if self.duration <= 0.0 {
            1.0
        } else {
            self.elapsed / self.duration
        };

        if t >= 1.0 {
            self.level = self.target;
            self.animating = false;
            return true;
        }

        self.level = mix(self.from, self.target, ease_in_out_cubic(t)).clamp(0.0, 1.0);
        false
    }

    /// Reacts to a phase being entered.
    pub fn enter_phase(&mut self, phase: WaterPhase, config: &PhaseConfig) {
        match phase {
            WaterPhase::Off => *self = Self::empty(),
            WaterPhase::Filling => {
                self.fill_reported = false;
                self.drain_reported = false;
                self.animate_to(1.0, config.fill_duration);
            }
            WaterPhase::On => {
                self.drain_reported = false;
                if self.level < 1.0 {
                    if !(self.animating && self.target >= 1.0) {
                        self.animate_to(1.0, config.fill_duration);
                    }
                } else {
                    self.hold(1.0);
                }
            }
            WaterPhase::Draining => {
                self.drain_reported = false;
                self.animate_to(0.0, config.drain_duration);
            }
        }
    }

    /// Per-frame update. Completion signals are only reported for the phase
    /// that asked for them.
    pub fn tick(&mut self, dt: f32, phase: WaterPhase) -> Option<PresenceSignal> {
        self.advance(dt);

        if self.animating {
            return None;
        }

        match phase {
            WaterPhase::Draining if self.level <= 0.0 && !self.drain_reported => {
                self.drain_reported = true;
                Some(PresenceSignal::Drained)
            }
            WaterPhase::Filling if self.level >= 1.0 && !self.fill_reported => {
                self.fill_reported = true;
                Some(PresenceSignal::Filled)
            }
            _ => None,
        }
    }
}
