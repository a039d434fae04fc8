//! The rotating convex polygon that confines both bodies.

use crate::config::PhysicsConfig;
use crate::error::{validate_finite, validate_positive, validate_sides, SimResult};
use crate::geometry::{closest_point_on_segment, edge_normal, ray_polygon_distance, safe_normalize};
use bevy::prelude::*;
use std::f32::consts::PI;

/// Regular polygon inscribed in a circle, spinning a fixed number of degrees
/// per step.
///
/// All queries are computed from the current rotation, so they stay
/// deterministic for a given `(center, radius, sides, rotation)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RotatingBoundary {
    center: Vec2,
    radius: f32,
    sides: u32,
    /// Degrees, always in `[0, 360)`.
    rotation: f32,
    /// Degrees per step.
    rotation_speed: f32,
}

impl RotatingBoundary {
    pub fn new(center: Vec2, radius: f32, sides: u32, rotation_speed: f32) -> SimResult<Self> {
        validate_positive("boundary_radius", radius)?;
        validate_sides(sides)?;
        validate_finite("boundary_rotation_speed", rotation_speed)?;
        validate_finite("boundary_center.x", center.x)?;
        validate_finite("boundary_center.y", center.y)?;
        Ok(Self {
            center,
            radius,
            sides,
            rotation: 0.0,
            rotation_speed,
        })
    }

    /// Build from the arena geometry plus the polygon settings in `config`.
    pub fn from_config(center: Vec2, radius: f32, config: &PhysicsConfig) -> SimResult<Self> {
        Self::new(
            center,
            radius,
            config.boundary_sides,
            config.boundary_rotation_speed,
        )
    }

    /// Start from a given rotation (degrees).  Wrapped into `[0, 360)`.
    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = degrees.rem_euclid(360.0);
        self
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn sides(&self) -> u32 {
        self.sides
    }

    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn rotation_speed(&self) -> f32 {
        self.rotation_speed
    }

    /// Distance from the centre to the middle of each edge.
    pub fn apothem(&self) -> f32 {
        self.radius * (PI / self.sides as f32).cos()
    }

    /// Advance the rotation by one step.
    pub fn update(&mut self) {
        self.rotation = (self.rotation + self.rotation_speed).rem_euclid(360.0);
    }

    /// Polygon corners in order, spaced `360 / sides` degrees apart.
    pub fn vertices(&self) -> Vec<Vec2> {
        let step = 360.0 / self.sides as f32;
        (0..self.sides)
            .map(|i| {
                let angle = (step * i as f32 + self.rotation).to_radians();
                self.center + Vec2::new(angle.cos(), angle.sin()) * self.radius
            })
            .collect()
    }

    /// Even-odd ray-casting containment test.
    ///
    /// Horizontal edges are skipped outright: the crossing formula divides by
    /// the edge's `Δy`, and a horizontal edge can never satisfy the
    /// half-open y-span test anyway.
    pub fn contains(&self, point: Vec2) -> bool {
        let vertices = self.vertices();
        let n = vertices.len();
        let mut inside = false;

        for i in 0..n {
            let p1 = vertices[i];
            let p2 = vertices[(i + 1) % n];
            if p1.y == p2.y {
                continue;
            }
            if point.y > p1.y.min(p2.y) && point.y <= p1.y.max(p2.y) && point.x <= p1.x.max(p2.x)
            {
                let x_inters = (point.y - p1.y) * (p2.x - p1.x) / (p2.y - p1.y) + p1.x;
                if p1.x == p2.x || point.x <= x_inters {
                    inside = !inside;
                }
            }
        }

        inside
    }

    /// Unit normal of the edge closest to `point`, oriented toward the centre.
    ///
    /// Ties go to the first edge in vertex order.  Degenerate edges are
    /// ignored; if every edge is degenerate the direction to the centre is
    /// returned instead.
    pub fn collision_normal(&self, point: Vec2) -> Vec2 {
        let vertices = self.vertices();
        let n = vertices.len();
        let to_center = self.center - point;
        let mut best: Option<(f32, Vec2)> = None;

        for i in 0..n {
            let a = vertices[i];
            let b = vertices[(i + 1) % n];
            let (Some(closest), Some(normal)) =
                (closest_point_on_segment(point, a, b), edge_normal(a, b))
            else {
                continue;
            };
            let distance = point.distance(closest);
            if best.is_none_or(|(min, _)| distance < min) {
                let normal = if normal.dot(to_center) < 0.0 {
                    -normal
                } else {
                    normal
                };
                best = Some((distance, normal));
            }
        }

        match best {
            Some((_, normal)) => normal,
            None => safe_normalize(to_center).unwrap_or(Vec2::NEG_Y),
        }
    }

    /// Distance from the centre to the polygon edge along `dir`.
    ///
    /// Never more than the circumradius; falls back to the apothem when `dir`
    /// cannot be normalised.
    pub fn extent_along(&self, dir: Vec2) -> f32 {
        safe_normalize(dir)
            .and_then(|d| ray_polygon_distance(self.center, d, &self.vertices()))
            .map_or(self.apothem(), |d| d.min(self.radius))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;

    fn hexagon() -> RotatingBoundary {
        RotatingBoundary::new(Vec2::ZERO, 100.0, 6, 1.0).unwrap()
    }

    // ── construction ──────────────────────────────────────────────────────────

    #[test]
    fn non_positive_radius_is_rejected() {
        assert!(RotatingBoundary::new(Vec2::ZERO, 0.0, 6, 1.0).is_err());
        assert!(RotatingBoundary::new(Vec2::ZERO, -5.0, 6, 1.0).is_err());
    }

    #[test]
    fn fewer_than_three_sides_is_rejected() {
        assert!(matches!(
            RotatingBoundary::new(Vec2::ZERO, 100.0, 2, 1.0),
            Err(SimError::InsufficientVertices { got: 2, required: 3 })
        ));
    }

    #[test]
    fn from_config_takes_polygon_settings() {
        let config = PhysicsConfig {
            boundary_sides: 8,
            boundary_rotation_speed: -2.5,
            ..Default::default()
        };
        let b = RotatingBoundary::from_config(Vec2::new(3.0, 4.0), 50.0, &config).unwrap();
        assert_eq!(b.sides(), 8);
        assert_eq!(b.vertices().len(), 8);
        assert_eq!(b.rotation_speed(), -2.5);
        assert_eq!(b.center(), Vec2::new(3.0, 4.0));
    }

    // ── vertices & rotation ───────────────────────────────────────────────────

    #[test]
    fn vertices_lie_on_circle_starting_at_rotation() {
        let b = hexagon().with_rotation(30.0);
        let v = b.vertices();
        assert_eq!(v.len(), 6);
        for p in &v {
            assert!((p.length() - 100.0).abs() < 1e-3, "vertex {p:?} off circle");
        }
        let expected = Vec2::new(30f32.to_radians().cos(), 30f32.to_radians().sin()) * 100.0;
        assert!(v[0].distance(expected) < 1e-3);
    }

    #[test]
    fn update_wraps_at_360() {
        let mut b = RotatingBoundary::new(Vec2::ZERO, 100.0, 6, 100.0).unwrap();
        for _ in 0..4 {
            b.update();
        }
        assert!((b.rotation() - 40.0).abs() < 1e-3, "rotation {}", b.rotation());
    }

    #[test]
    fn update_touches_only_rotation() {
        let mut b = hexagon();
        b.update();
        assert_eq!(b.center(), Vec2::ZERO);
        assert_eq!(b.radius(), 100.0);
        assert_eq!(b.rotation(), 1.0);
    }

    // ── containment ───────────────────────────────────────────────────────────

    #[test]
    fn containment_along_vertex_axis() {
        let b = hexagon();
        assert!(b.contains(Vec2::ZERO));
        assert!(b.contains(Vec2::new(99.0, 0.0)));
        assert!(!b.contains(Vec2::new(101.0, 0.0)));
        assert!(!b.contains(Vec2::new(150.0, 0.0)));
        assert!(b.contains(Vec2::new(-99.0, 0.0)));
        assert!(!b.contains(Vec2::new(-101.0, 0.0)));
    }

    #[test]
    fn containment_across_horizontal_edges() {
        // At rotation 0 the top and bottom edges are horizontal at y = ±apothem.
        let b = hexagon();
        let apothem = b.apothem();
        assert!(b.contains(Vec2::new(0.0, apothem - 1.0)));
        assert!(!b.contains(Vec2::new(0.0, apothem + 1.0)));
        assert!(b.contains(Vec2::new(0.0, -apothem + 1.0)));
        assert!(!b.contains(Vec2::new(0.0, -apothem - 1.0)));
        // Exactly on the horizontal edge line must not blow up.
        let _ = b.contains(Vec2::new(0.0, apothem));
        let _ = b.contains(Vec2::new(200.0, apothem));
    }

    // ── normals ───────────────────────────────────────────────────────────────

    #[test]
    fn normal_points_back_toward_centre_for_outside_points() {
        for rotation in [0.0, 17.0, 45.0, 90.0, 333.0] {
            let b = hexagon().with_rotation(rotation);
            for k in 0..72 {
                let angle = (k as f32 * 5.0).to_radians();
                for dist in [101.0, 120.0, 300.0] {
                    let p = Vec2::new(angle.cos(), angle.sin()) * dist;
                    if b.contains(p) {
                        continue;
                    }
                    let n = b.collision_normal(p);
                    assert!((n.length() - 1.0).abs() < 1e-4);
                    assert!(
                        n.dot(b.center() - p) >= 0.0,
                        "normal {n:?} points outward at {p:?} (rotation {rotation})"
                    );
                }
            }
        }
    }

    #[test]
    fn normal_of_right_edge_points_left() {
        // Rotation 30 puts a vertical edge at x = apothem.
        let b = hexagon().with_rotation(30.0);
        let n = b.collision_normal(Vec2::new(120.0, 0.0));
        assert!(n.distance(Vec2::NEG_X) < 1e-4, "got {n:?}");
    }

    // ── extent ────────────────────────────────────────────────────────────────

    #[test]
    fn extent_is_radius_at_vertex_and_apothem_at_edge_midpoint() {
        let b = hexagon();
        assert!((b.extent_along(Vec2::X) - 100.0).abs() < 1e-3);
        assert!((b.extent_along(Vec2::Y) - b.apothem()).abs() < 1e-3);
        assert!((b.extent_along(Vec2::ZERO) - b.apothem()).abs() < 1e-6);
    }
}
