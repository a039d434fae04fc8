//! The two duelling bodies: state, per-step integration, vitality bookkeeping.

use crate::config::PhysicsConfig;
use crate::constants::{
    IMPACT_EFFECT_DAMAGE, IMPACT_EFFECT_DECAY, IMPACT_EFFECT_REWARD, MIN_MASS, TRAIL_LENGTH,
};
use bevy::prelude::*;
use rand::Rng;
use serde::Serialize;
use std::collections::VecDeque;

/// Which of the two arena slots a body occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BodyId {
    First,
    Second,
}

impl BodyId {
    pub const ALL: [BodyId; 2] = [BodyId::First, BodyId::Second];

    #[inline]
    pub fn index(self) -> usize {
        match self {
            BodyId::First => 0,
            BodyId::Second => 1,
        }
    }

    #[inline]
    pub fn other(self) -> BodyId {
        match self {
            BodyId::First => BodyId::Second,
            BodyId::Second => BodyId::First,
        }
    }
}

/// Caller-supplied description of a body at reset time.
#[derive(Debug, Clone, PartialEq)]
pub struct BodySpawn {
    pub name: String,
    pub position: Vec2,
    /// Linear RGB, passed through untouched for renderers.
    pub color: [f32; 3],
}

impl BodySpawn {
    pub fn new(name: impl Into<String>, position: Vec2, color: [f32; 3]) -> Self {
        Self {
            name: name.into(),
            position,
            color,
        }
    }
}

/// Read-only copy of a body's state after a step.
#[derive(Debug, Clone, PartialEq)]
pub struct BodySnapshot {
    pub id: BodyId,
    pub name: String,
    pub color: [f32; 3],
    pub position: Vec2,
    pub velocity: Vec2,
    pub angular_velocity: f32,
    pub rotation: f32,
    pub vitality: f32,
    pub current_size: f32,
    pub mass: f32,
    pub stuck_counter: u32,
    pub impact_effect: f32,
    pub trail: Vec<Vec2>,
}

/// Draw a spawn velocity: each axis uniform in `[-max, max]`, pushed out to
/// `±min` (keeping its sign) when it lands closer to zero than that.
pub fn random_spawn_velocity<R: Rng>(rng: &mut R, min: f32, max: f32) -> Vec2 {
    let (min, max) = sampling_bounds(min.abs(), max.abs());
    fn axis<R: Rng>(rng: &mut R, min: f32, max: f32) -> f32 {
        let v = rng.gen_range(-max..=max);
        if v.abs() < min {
            if v >= 0.0 {
                min
            } else {
                -min
            }
        } else {
            v
        }
    }
    Vec2::new(axis(rng, min, max), axis(rng, min, max))
}

/// Order a pair of config bounds for `gen_range`, mapping non-finite values
/// to 0.  Sliders may invert a range between steps; sampling must not panic.
pub(crate) fn sampling_bounds(a: f32, b: f32) -> (f32, f32) {
    let finite = |v: f32| if v.is_finite() { v } else { 0.0 };
    let (a, b) = (finite(a), finite(b));
    (a.min(b), a.max(b))
}

/// A circle-collider body with growth, spin and stall bookkeeping.
#[derive(Debug, Clone)]
pub struct DynamicBody {
    pub id: BodyId,
    pub name: String,
    pub color: [f32; 3],

    pub position: Vec2,
    /// Intrinsic velocity (u/step).  Speed multipliers scale displacement only
    /// and never write back here.
    pub velocity: Vec2,
    /// Degrees per step.
    pub angular_velocity: f32,
    /// Degrees, `[0, 360)`.
    pub rotation: f32,

    pub vitality: f32,
    pub current_size: f32,
    pub mass: f32,

    pub max_velocity: f32,
    pub max_angular_velocity: f32,
    pub max_vitality: f32,

    pub stuck_counter: u32,
    pub impact_effect: f32,

    history: VecDeque<Vec2>,
    trail: VecDeque<Vec2>,
}

impl DynamicBody {
    /// Build a body with an explicit starting velocity.
    pub fn new(id: BodyId, spawn: &BodySpawn, velocity: Vec2, config: &PhysicsConfig) -> Self {
        Self {
            id,
            name: spawn.name.clone(),
            color: spawn.color,
            position: spawn.position,
            velocity,
            angular_velocity: 0.0,
            rotation: 0.0,
            vitality: config.initial_vitality,
            current_size: config.base_size,
            mass: config.base_mass,
            max_velocity: config.max_velocity,
            max_angular_velocity: config.max_angular_velocity,
            max_vitality: config.max_vitality,
            stuck_counter: 0,
            impact_effect: 0.0,
            history: VecDeque::with_capacity(config.history_len),
            trail: VecDeque::with_capacity(TRAIL_LENGTH),
        }
    }

    /// Build a body with a random spawn velocity drawn from `rng`.
    pub fn spawn<R: Rng>(
        id: BodyId,
        spawn: &BodySpawn,
        config: &PhysicsConfig,
        rng: &mut R,
    ) -> Self {
        let velocity =
            random_spawn_velocity(rng, config.initial_speed_min, config.initial_speed_max);
        Self::new(id, spawn, velocity, config)
    }

    /// Advance one step: gravity, explicit Euler move, speed cap, size/mass
    /// coupling, spin, history.
    pub fn integrate(&mut self, config: &PhysicsConfig, speed_multiplier: f32) {
        let start = self.position;

        self.velocity.y += config.gravity;

        push_bounded(&mut self.trail, start, TRAIL_LENGTH);
        self.position += self.effective_velocity(speed_multiplier);

        self.velocity = self.velocity.clamp_length_max(self.max_velocity);

        let target_size = (config.base_size
            + (self.vitality - config.initial_vitality) * config.growth_factor)
            .max(config.min_size);
        self.current_size += (target_size - self.current_size) * config.size_smoothing;
        self.mass = mass_for_size(self.current_size, config);

        self.rotation = (self.rotation + self.angular_velocity).rem_euclid(360.0);
        self.angular_velocity = (self.angular_velocity * config.angular_damping)
            .clamp(-self.max_angular_velocity, self.max_angular_velocity);

        self.impact_effect = (self.impact_effect - IMPACT_EFFECT_DECAY).max(0.0);

        self.repair_non_finite(start, config);
        self.record_position(self.position, config.history_len);
    }

    /// Effective per-step displacement for a given multiplier.
    #[inline]
    pub fn effective_velocity(&self, speed_multiplier: f32) -> Vec2 {
        self.velocity * speed_multiplier
    }

    /// Add vitality, saturating at the body's ceiling.
    pub fn gain_vitality(&mut self, amount: f32) {
        self.vitality = (self.vitality + amount.max(0.0)).min(self.max_vitality);
        self.impact_effect = IMPACT_EFFECT_REWARD;
    }

    /// Remove vitality, never going below zero.
    pub fn lose_vitality(&mut self, amount: f32) {
        self.vitality = (self.vitality - amount.max(0.0)).max(0.0);
        self.impact_effect = IMPACT_EFFECT_DAMAGE;
    }

    #[inline]
    pub fn is_defeated(&self) -> bool {
        self.vitality <= 0.0
    }

    /// `true` once the stall counter has exceeded `step_threshold`.
    #[inline]
    pub fn is_stuck(&self, step_threshold: u32) -> bool {
        self.stuck_counter > step_threshold
    }

    #[inline]
    pub fn half_size(&self) -> f32 {
        self.current_size * 0.5
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Rotational inertia of a uniform disc of diameter `current_size`.
    #[inline]
    pub fn inertia(&self) -> f32 {
        let r = self.half_size();
        0.5 * self.mass * r * r
    }

    /// Append `position` to the displacement history, dropping the oldest
    /// entry beyond `capacity`.
    pub fn record_position(&mut self, position: Vec2, capacity: usize) {
        push_bounded(&mut self.history, position, capacity.max(1));
    }

    /// Distance moved between the two most recent history entries.
    pub fn last_displacement(&self) -> Option<f32> {
        let n = self.history.len();
        if n < 2 {
            return None;
        }
        Some(self.history[n - 1].distance(self.history[n - 2]))
    }

    pub fn history(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.history.iter().copied()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn snapshot(&self) -> BodySnapshot {
        BodySnapshot {
            id: self.id,
            name: self.name.clone(),
            color: self.color,
            position: self.position,
            velocity: self.velocity,
            angular_velocity: self.angular_velocity,
            rotation: self.rotation,
            vitality: self.vitality,
            current_size: self.current_size,
            mass: self.mass,
            stuck_counter: self.stuck_counter,
            impact_effect: self.impact_effect,
            trail: self.trail.iter().copied().collect(),
        }
    }

    /// Replace any non-finite state produced by a bad step with something sane.
    fn repair_non_finite(&mut self, last_position: Vec2, config: &PhysicsConfig) {
        if !self.velocity.is_finite() {
            warn!("{}: non-finite velocity {:?}; zeroing", self.name, self.velocity);
            self.velocity = Vec2::ZERO;
        }
        if !self.position.is_finite() {
            let fallback = self
                .history
                .back()
                .copied()
                .filter(|p| p.is_finite())
                .unwrap_or(last_position);
            warn!(
                "{}: non-finite position {:?}; restoring {:?}",
                self.name, self.position, fallback
            );
            self.position = fallback;
        }
        if !self.angular_velocity.is_finite() {
            self.angular_velocity = 0.0;
        }
        if !self.rotation.is_finite() {
            self.rotation = 0.0;
        }
        if !self.current_size.is_finite() {
            self.current_size = config.base_size;
            self.mass = mass_for_size(self.current_size, config);
        }
    }
}

/// Linear size-to-mass coupling, floored at [`MIN_MASS`].
#[inline]
pub fn mass_for_size(size: f32, config: &PhysicsConfig) -> f32 {
    (config.base_mass + (size - config.base_size) * config.size_to_mass_ratio).max(MIN_MASS)
}

fn push_bounded(buf: &mut VecDeque<Vec2>, value: Vec2, capacity: usize) {
    while buf.len() >= capacity {
        buf.pop_front();
    }
    buf.push_back(value);
}
