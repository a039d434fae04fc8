//! 2D helpers shared by the boundary and the collision resolvers.
//!
//! Vector arithmetic itself comes from `bevy::math::Vec2`; this module only
//! adds the segment/ray queries and epsilon-guarded normalisation the arena
//! needs.

use crate::constants::{DISTANCE_EPSILON, EDGE_EPSILON};
use bevy::prelude::*;

/// Normalise `v`, or `None` when it is too short to define a direction.
#[inline]
pub fn safe_normalize(v: Vec2) -> Option<Vec2> {
    let len = v.length();
    if len.is_finite() && len > DISTANCE_EPSILON {
        Some(v / len)
    } else {
        None
    }
}

/// Closest point to `p` on the segment `a..b`, projection clamped to `[0, 1]`.
///
/// Returns `None` for segments shorter than [`EDGE_EPSILON`].
pub fn closest_point_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Option<Vec2> {
    let edge = b - a;
    let len_sq = edge.length_squared();
    if len_sq <= EDGE_EPSILON * EDGE_EPSILON {
        return None;
    }
    let t = ((p - a).dot(edge) / len_sq).clamp(0.0, 1.0);
    Some(a + edge * t)
}

/// Unit vector perpendicular to the edge `a..b` (rotated +90°), or `None` for
/// degenerate edges.
#[inline]
pub fn edge_normal(a: Vec2, b: Vec2) -> Option<Vec2> {
    let edge = b - a;
    if edge.length() <= EDGE_EPSILON {
        return None;
    }
    safe_normalize(edge.perp())
}

/// Distance from `origin` along unit `dir` to the first polygon edge ahead.
///
/// Intended for an `origin` inside a convex polygon, where exactly one edge is
/// hit.  Returns `None` if no edge lies ahead (origin outside, or `dir` zero).
pub fn ray_polygon_distance(origin: Vec2, dir: Vec2, vertices: &[Vec2]) -> Option<f32> {
    let n = vertices.len();
    let mut best: Option<f32> = None;
    for i in 0..n {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        let edge = b - a;
        let denom = dir.perp_dot(edge);
        if denom.abs() <= f32::EPSILON {
            continue;
        }
        let to_a = a - origin;
        let t = to_a.perp_dot(edge) / denom;
        let s = to_a.perp_dot(dir) / denom;
        if t >= 0.0 && (0.0..=1.0).contains(&s) {
            best = Some(best.map_or(t, |d| d.min(t)));
        }
    }
    best
}
