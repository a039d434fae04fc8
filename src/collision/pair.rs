use crate::body::DynamicBody;
use crate::config::PhysicsConfig;
use crate::constants::{DISTANCE_EPSILON, ROTATION_KICK, SPIN_CONTACT_THRESHOLD, SPIN_DAMAGE_WEIGHT};
use bevy::prelude::*;

/// Result of a resolved body-body contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairCollision {
    /// Unit vector from the first body towards the second.
    pub normal: Vec2,
    /// Penetration depth before positional correction.
    pub overlap: f32,
    /// `|vn|` for approaching bodies, 0 when they were already separating.
    pub impact_speed: f32,
    /// Relative tangential surface speed at the contact point.
    pub slip: f32,
    /// Vitality removed from each body.
    pub damage: f32,
    pub separating: bool,
}

/// Resolve contact between `a` and `b`.
///
/// Returns `None` when they do not overlap, or when their centres coincide
/// and no normal can be defined.  Overlapping bodies are always pushed apart;
/// the impulse, spin transfer, damage and rotation kick only apply when they
/// are approaching.
pub fn resolve(a: &mut DynamicBody, b: &mut DynamicBody, config: &PhysicsConfig) -> Option<PairCollision> {
    let delta = b.position - a.position;
    let distance = delta.length();
    let contact_distance = a.half_size() + b.half_size();
    if distance >= contact_distance || distance < DISTANCE_EPSILON {
        return None;
    }

    let normal = delta / distance;
    let overlap = contact_distance - distance;

    // 50/50 split, plus a buffer so the pair is not re-detected next step.
    let push = normal * (overlap + config.separation_buffer) * 0.5;
    a.position -= push;
    b.position += push;

    let vn = (b.velocity - a.velocity).dot(normal);
    if vn > 0.0 {
        return Some(PairCollision {
            normal,
            overlap,
            impact_speed: 0.0,
            slip: 0.0,
            damage: 0.0,
            separating: true,
        });
    }

    let inv_a = 1.0 / a.mass;
    let inv_b = 1.0 / b.mass;

    let j = -(1.0 + config.restitution) * vn / (inv_a + inv_b);
    a.velocity -= normal * j * inv_a;
    b.velocity += normal * j * inv_b;

    let slip = transfer_spin(a, b, normal, config.spin_transfer);

    let impact_speed = vn.abs();
    let damage = (impact_speed + slip.abs() * SPIN_DAMAGE_WEIGHT)
        * config.damage_coefficient
        * config.damage_scale;
    a.lose_vitality(damage);
    b.lose_vitality(damage);

    let kick = impact_speed * ROTATION_KICK;
    a.rotation = (a.rotation + kick).rem_euclid(360.0);
    b.rotation = (b.rotation - kick).rem_euclid(360.0);

    Some(PairCollision {
        normal,
        overlap,
        impact_speed,
        slip,
        damage,
        separating: false,
    })
}

/// Tangential friction impulse at the contact point.
///
/// Removes `transfer` of the relative surface slip, split between linear and
/// angular motion according to mass and inertia.  Returns the slip measured
/// before the impulse.
fn transfer_spin(a: &mut DynamicBody, b: &mut DynamicBody, normal: Vec2, transfer: f32) -> f32 {
    let tangent = normal.perp();
    let ra = a.half_size();
    let rb = b.half_size();

    let slip = (b.velocity - a.velocity).dot(tangent)
        - b.angular_velocity.to_radians() * rb
        - a.angular_velocity.to_radians() * ra;
    if slip.abs() <= SPIN_CONTACT_THRESHOLD {
        return slip;
    }

    let inv_a = 1.0 / a.mass;
    let inv_b = 1.0 / b.mass;
    let (ia, ib) = (a.inertia(), b.inertia());
    if ia <= 0.0 || ib <= 0.0 {
        return slip;
    }
    let effective = inv_a + inv_b + ra * ra / ia + rb * rb / ib;
    let jt = -slip * transfer / effective;

    a.velocity -= tangent * jt * inv_a;
    b.velocity += tangent * jt * inv_b;

    a.angular_velocity = (a.angular_velocity - (jt * ra / ia).to_degrees())
        .clamp(-a.max_angular_velocity, a.max_angular_velocity);
    b.angular_velocity = (b.angular_velocity - (jt * rb / ib).to_degrees())
        .clamp(-b.max_angular_velocity, b.max_angular_velocity);

    slip
}
