use crate::body::{BodyId, DynamicBody};
use crate::boundary::RotatingBoundary;
use crate::config::PhysicsConfig;
use crate::constants::DISTANCE_EPSILON;
use crate::stuck::{self, RescueImpulse};
use bevy::prelude::*;
use rand::Rng;

/// What happened when a body was pushed back inside the boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryContact {
    pub body: BodyId,
    /// Inward unit normal of the edge that was hit.
    pub normal: Vec2,
    /// Where the body's centre was when the exit was detected.
    pub exit_point: Vec2,
    pub speed_before: f32,
    /// Speed after bounce, energy loss and spin coupling, before any rescue.
    pub speed_after: f32,
    pub repositioned: bool,
    pub rescue: Option<RescueImpulse>,
}

/// Resolve a boundary exit for `body`, or do nothing if it is still inside.
///
/// Order: reward, normal, reflection, energy loss, spin coupling,
/// repositioning, stall rescue.
pub fn resolve<R: Rng>(
    body: &mut DynamicBody,
    boundary: &RotatingBoundary,
    config: &PhysicsConfig,
    rng: &mut R,
) -> Option<BoundaryContact> {
    if boundary.contains(body.position) {
        return None;
    }

    let exit_point = body.position;
    let speed_before = body.speed();

    body.gain_vitality(config.contact_reward);

    let normal = boundary.collision_normal(body.position);

    // Restitution is folded into the reflection term.  Only bounce bodies
    // that are still heading out.
    let approach = body.velocity.dot(normal);
    if approach < 0.0 {
        body.velocity -= 2.0 * config.restitution * approach * normal;
    }

    body.velocity *= config.energy_loss_factor;

    // Spin rolls into linear motion along the edge, the wall eats some spin.
    let tangent = normal.perp();
    let surface_speed = body.angular_velocity.to_radians() * body.half_size();
    body.velocity += tangent * surface_speed * config.spin_coupling;
    body.angular_velocity *= config.boundary_spin_friction;

    let speed_after = body.speed();

    let repositioned = reposition(body, boundary, config);

    let rescue = stuck::rescue_if_stuck(body, config, rng);

    Some(BoundaryContact {
        body: body.id,
        normal,
        exit_point,
        speed_before,
        speed_after,
        repositioned,
        rescue,
    })
}

/// Distance from the boundary centre at which a body of `size` is clear of
/// the polygon by `safety_margin` along `dir`.
pub fn safe_distance(boundary: &RotatingBoundary, dir: Vec2, size: f32, safety_margin: f32) -> f32 {
    (boundary.extent_along(dir) - size * 0.5 - safety_margin).max(0.0)
}

/// Put the body back on its centre ray at the safe distance.  Skipped when
/// the body sits on the centre, where the ray is undefined.
fn reposition(body: &mut DynamicBody, boundary: &RotatingBoundary, config: &PhysicsConfig) -> bool {
    let offset = body.position - boundary.center();
    let distance = offset.length();
    if distance < DISTANCE_EPSILON {
        return false;
    }
    let dir = offset / distance;
    let target = safe_distance(boundary, dir, body.current_size, config.boundary_safety_margin);
    body.position = boundary.center() + dir * target;
    true
}
