//! Centralised physics and gameplay constants.
//!
//! All tuneable values live here so they can be found, reasoned-about, and
//! modified in one place without source-diving across multiple modules.
//! Every value that a driver may want to change at runtime is mirrored by a
//! field on [`crate::config::PhysicsConfig`]; the remaining constants are
//! fixed model parameters.
//!
//! ## Tuning guidance
//!
//! Each constant includes the tested range and the observable consequence of
//! changing it.  After editing, run `ARENA_TEST=baseline cargo run` to confirm
//! the duel still behaves.

// ── Arena Layout ──────────────────────────────────────────────────────────────

/// Default centre of the hexagon (world units, y grows downward like screen space).
pub const ARENA_CENTER_X: f32 = 400.0;
pub const ARENA_CENTER_Y: f32 = 300.0;

/// Circumradius of the boundary polygon (centre to vertex).
pub const BOUNDARY_RADIUS: f32 = 220.0;

/// Offsets of the two spawn points from the arena centre.
///
/// Kept well inside the apothem (≈190 u for the default radius) so neither body
/// starts outside the polygon at any rotation.
pub const SPAWN_OFFSET_X: f32 = 70.0;
pub const SPAWN_OFFSET_Y: f32 = 40.0;

// ── Boundary ──────────────────────────────────────────────────────────────────

/// Number of polygon sides.  The duel is designed around a hexagon.
pub const BOUNDARY_SIDES: u32 = 6;

/// Boundary rotation per step, in degrees.
///
/// Tested range: 0.5–2.0.  Faster rotation sweeps bodies along the walls and
/// raises the boundary hit rate.
pub const BOUNDARY_ROTATION_SPEED: f32 = 1.2;

/// Minimum clearance kept between a body's edge and the wall after a bounce.
///
/// Below ~3.0 bodies re-trigger exit detection on the next step and farm
/// vitality while pinned to the wall.
pub const BOUNDARY_SAFETY_MARGIN: f32 = 6.0;

// ── Physics: Integration ──────────────────────────────────────────────────────

/// Downward acceleration added to the vertical velocity every step.
///
/// Tested range: 0.01–0.2.  Above ~0.2 bodies pool at the bottom wall.
pub const GRAVITY: f32 = 0.06;

/// Hard cap on linear speed (u/step), enforced after every integration.
pub const MAX_VELOCITY: f32 = 12.0;

/// Hard cap on angular speed (degrees/step).
pub const MAX_ANGULAR_VELOCITY: f32 = 20.0;

/// Per-step multiplier applied to angular velocity (0 < d < 1).
pub const ANGULAR_DAMPING: f32 = 0.98;

/// Number of past positions kept for stall detection.
pub const HISTORY_LEN: usize = 30;

/// Number of past positions kept for the render trail.
pub const TRAIL_LENGTH: usize = 8;

// ── Physics: Size & Mass ──────────────────────────────────────────────────────

/// Diameter of a body at its initial vitality.
pub const BASE_SIZE: f32 = 20.0;

/// Smallest target diameter a body may shrink toward as vitality drains.
pub const MIN_SIZE: f32 = 6.0;

/// Fraction of the remaining size gap closed per step.
///
/// Tested range: 0.1–0.3.  Higher values make growth visibly snap.
pub const SIZE_SMOOTHING: f32 = 0.18;

/// Extra diameter per point of vitality above the initial value.
pub const GROWTH_FACTOR: f32 = 1.7;

/// Mass of a body at `BASE_SIZE`.
pub const BASE_MASS: f32 = 1.0;

/// Mass gained per unit of diameter above `BASE_SIZE`.
pub const SIZE_TO_MASS_RATIO: f32 = 0.012;

/// Floor applied to derived mass so impulse maths never divides by ~0.
pub const MIN_MASS: f32 = 0.1;

// ── Vitality ──────────────────────────────────────────────────────────────────

/// Vitality every body spawns with.
pub const INITIAL_VITALITY: f32 = 10.0;

/// Vitality ceiling.  Without it wall-farming grows bodies without bound.
pub const MAX_VITALITY: f32 = 50.0;

/// Vitality granted per boundary contact.
pub const CONTACT_REWARD: f32 = 1.0;

// ── Physics: Collision ────────────────────────────────────────────────────────

/// Bounce elasticity for wall and body contacts.
/// 0.0 = perfectly inelastic; 1.0 = perfectly elastic.
pub const RESTITUTION: f32 = 0.72;

/// Uniform velocity multiplier applied after every wall bounce.
pub const ENERGY_LOSS_FACTOR: f32 = 0.86;

/// Fraction of wall-contact surface speed converted into linear velocity.
pub const SPIN_COUPLING: f32 = 0.1;

/// Multiplier applied to angular velocity on every wall contact.
pub const BOUNDARY_SPIN_FRICTION: f32 = 0.8;

/// Friction factor of the tangential impulse between two bodies.
pub const SPIN_TRANSFER: f32 = 0.3;

/// Relative tangential speed below which no spin is exchanged.
pub const SPIN_CONTACT_THRESHOLD: f32 = 0.01;

/// Extra clearance added when separating overlapping bodies.
pub const SEPARATION_BUFFER: f32 = 2.0;

/// Visual rotation kick (degrees) per unit of impact speed.
pub const ROTATION_KICK: f32 = 1.5;

// ── Damage ────────────────────────────────────────────────────────────────────

/// User-facing damage multiplier.  Tested range: 0.5–1.5.
pub const DAMAGE_COEFFICIENT: f32 = 0.85;

/// Fixed scale on top of the coefficient.
pub const DAMAGE_SCALE: f32 = 0.8;

/// Weight of the tangential slip speed in the damage formula.
pub const SPIN_DAMAGE_WEIGHT: f32 = 0.25;

// ── Stall Recovery ────────────────────────────────────────────────────────────

/// Per-step displacement under which a body counts as stalling.
pub const STUCK_DISPLACEMENT_THRESHOLD: f32 = 0.3;

/// Stalled steps tolerated before a rescue impulse fires.
pub const STUCK_STEP_THRESHOLD: u32 = 20;

/// Magnitude range of the random rescue impulse (u/step).
pub const RESCUE_IMPULSE_MIN: f32 = 1.0;
pub const RESCUE_IMPULSE_MAX: f32 = 2.5;

/// Bound on the random angular kick added by a rescue (degrees/step).
pub const RESCUE_SPIN: f32 = 4.0;

// ── Spawning ──────────────────────────────────────────────────────────────────

/// Per-axis spawn speed range.  Axes slower than the minimum are pushed to it.
pub const INITIAL_SPEED_MIN: f32 = 1.2;
pub const INITIAL_SPEED_MAX: f32 = 3.5;

// ── Visual Feedback ───────────────────────────────────────────────────────────

/// Impact-effect intensity set on a wall reward.
pub const IMPACT_EFFECT_REWARD: f32 = 15.0;

/// Impact-effect intensity set when damage is taken.
pub const IMPACT_EFFECT_DAMAGE: f32 = 20.0;

/// Impact-effect decay per step.
pub const IMPACT_EFFECT_DECAY: f32 = 2.0;

// ── Geometry Guards ───────────────────────────────────────────────────────────

/// Edges shorter than this are ignored by normal computation.
pub const EDGE_EPSILON: f32 = 1e-3;

/// Distances shorter than this cannot define a direction.
pub const DISTANCE_EPSILON: f32 = 1e-3;

// ── Telemetry ─────────────────────────────────────────────────────────────────

/// Per-step samples kept by the telemetry monitor.
pub const TELEMETRY_WINDOW: usize = 1000;

/// Collision and boundary-hit events kept by the telemetry monitor.
pub const TELEMETRY_EVENT_WINDOW: usize = 100;

/// Samples required before velocity stability is reported.
pub const STABILITY_MIN_SAMPLES: usize = 10;

/// Speed above which a body is reported as running away.
pub const ANOMALY_HIGH_VELOCITY: f32 = 20.0;

/// Speed below which a sample counts towards a stall.
pub const ANOMALY_STALL_SPEED: f32 = 0.1;

/// Consecutive slow samples that make a stall.
pub const ANOMALY_STALL_SAMPLES: usize = 10;

/// Single-hit damage above which a collision is reported.
pub const ANOMALY_EXCESSIVE_DAMAGE: f32 = 20.0;

/// Recent collisions inspected for excessive damage.
pub const ANOMALY_RECENT_COLLISIONS: usize = 5;

/// Steps between telemetry log lines from the headless driver.
pub const TELEMETRY_REPORT_INTERVAL: u64 = 300;

/// Driver ticks the binary runs when `ARENA_STEPS` is unset.
pub const DEFAULT_RUN_TICKS: u32 = 600;

// ── Driver ────────────────────────────────────────────────────────────────────

/// Default RNG seed.
pub const SEED: u64 = 42;

/// Simulation steps per driver tick.
pub const TIME_MULTIPLIER: u32 = 1;

/// Default config override file.
pub const CONFIG_PATH: &str = "assets/arena.toml";
