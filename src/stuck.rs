//! Stall detection and random rescue impulses.
//!
//! Per body the monitor is a three-state machine driven by the displacement
//! between the two newest history entries:
//!
//! - **Moving**: displacement at or above the threshold, the stall counter resets to 0.
//! - **Stalling**: displacement < threshold, the counter increments.
//! - **Rescue**: the counter exceeded `stuck_step_threshold`; a random
//!   bounded impulse is applied and the counter returns to 0.
//!
//! All randomness comes from the caller's RNG so runs are reproducible.

use crate::body::{sampling_bounds, DynamicBody};
use crate::config::PhysicsConfig;
use bevy::prelude::*;
use rand::Rng;
use std::f32::consts::TAU;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionState {
    Moving,
    Stalling,
}

/// The kick applied by a rescue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RescueImpulse {
    pub impulse: Vec2,
    pub spin: f32,
}

/// Update the stall counter from the body's latest displacement.
///
/// With fewer than two history entries there is nothing to measure and the
/// counter is left alone.
pub fn observe_motion(body: &mut DynamicBody, config: &PhysicsConfig) -> MotionState {
    match body.last_displacement() {
        Some(moved) if moved >= config.stuck_displacement_threshold => {
            body.stuck_counter = 0;
            MotionState::Moving
        }
        Some(_) => {
            body.stuck_counter = body.stuck_counter.saturating_add(1);
            MotionState::Stalling
        }
        None if body.stuck_counter == 0 => MotionState::Moving,
        None => MotionState::Stalling,
    }
}

/// Draw a rescue kick: uniform direction, magnitude uniform in
/// `[rescue_impulse_min, rescue_impulse_max]`, spin uniform in `±rescue_spin`.
///
/// The config may have been edited since it was validated, so an inverted
/// range is sampled in order and a non-finite bound counts as 0.
pub fn sample_rescue<R: Rng>(config: &PhysicsConfig, rng: &mut R) -> RescueImpulse {
    let (low, high) = sampling_bounds(config.rescue_impulse_min, config.rescue_impulse_max);
    let spin_limit = sampling_bounds(0.0, config.rescue_spin.abs()).1;

    let angle = rng.gen_range(0.0..TAU);
    let magnitude = rng.gen_range(low..=high);
    let spin = rng.gen_range(-spin_limit..=spin_limit);
    RescueImpulse {
        impulse: Vec2::from_angle(angle) * magnitude,
        spin,
    }
}

/// Apply a rescue if the body's counter is over the threshold.  Does not touch
/// the counter otherwise.
pub fn rescue_if_stuck<R: Rng>(
    body: &mut DynamicBody,
    config: &PhysicsConfig,
    rng: &mut R,
) -> Option<RescueImpulse> {
    if !body.is_stuck(config.stuck_step_threshold) {
        return None;
    }
    let rescue = sample_rescue(config, rng);
    body.velocity = (body.velocity + rescue.impulse).clamp_length_max(body.max_velocity);
    body.angular_velocity = (body.angular_velocity + rescue.spin)
        .clamp(-body.max_angular_velocity, body.max_angular_velocity);
    body.stuck_counter = 0;
    debug!(
        "{} rescued after stalling: impulse {:?}, spin {:.2}",
        body.name, rescue.impulse, rescue.spin
    );
    Some(rescue)
}
