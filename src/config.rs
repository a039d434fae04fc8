//! Runtime physics configuration loaded from `assets/arena.toml`.
//!
//! [`PhysicsConfig`] is a Bevy [`Resource`] that mirrors every tunable in
//! [`crate::constants`].  At startup the binary calls
//! [`PhysicsConfig::load_or_default`], which reads `assets/arena.toml` and
//! overwrites the defaults with any values present in the file.  Missing keys
//! fall back to the compile-time defaults, so a minimal TOML can override just
//! the constants you care about.
//!
//! The record is passed explicitly to every physics operation; nothing in the
//! core reads global state.  A driver may mutate it between steps (that is how
//! a slider UI would edit parameters).
//!
//! ## Tuning workflow
//!
//! 1. Edit `assets/arena.toml`.
//! 2. Restart the simulation; no recompilation required.
//! 3. Run `ARENA_TEST=baseline cargo run` to validate the new values.
//!
//! Keep `src/constants.rs` in sync: it remains the **authoritative default**
//! source used by `PhysicsConfig::default()`.

use crate::constants::*;
use crate::error::{
    validate_finite, validate_non_negative, validate_positive, validate_range, validate_sides,
    validate_unit_closed, validate_unit_open, validate_unit_open_low, SimError, SimResult,
};
use bevy::prelude::*;
use serde::Deserialize;
use std::path::Path;

/// Runtime-tunable physics and gameplay configuration.
///
/// All fields default to the corresponding compile-time constant from
/// `src/constants.rs`.  Override any subset by setting the value in
/// `assets/arena.toml`.
#[derive(Resource, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    // ── Driver ────────────────────────────────────────────────────────────────
    pub seed: u64,
    pub time_multiplier: u32,

    // ── Boundary ──────────────────────────────────────────────────────────────
    pub boundary_sides: u32,
    pub boundary_rotation_speed: f32,
    pub boundary_safety_margin: f32,

    // ── Physics: Integration ──────────────────────────────────────────────────
    pub gravity: f32,
    pub max_velocity: f32,
    pub max_angular_velocity: f32,
    pub angular_damping: f32,
    pub history_len: usize,
    /// Per-body displacement multipliers, indexed by [`crate::body::BodyId`].
    pub speed_multipliers: [f32; 2],

    // ── Physics: Size & Mass ──────────────────────────────────────────────────
    pub base_size: f32,
    pub min_size: f32,
    pub size_smoothing: f32,
    pub growth_factor: f32,
    pub base_mass: f32,
    pub size_to_mass_ratio: f32,

    // ── Vitality ──────────────────────────────────────────────────────────────
    pub initial_vitality: f32,
    pub max_vitality: f32,
    pub contact_reward: f32,

    // ── Physics: Collision ────────────────────────────────────────────────────
    pub restitution: f32,
    pub energy_loss_factor: f32,
    pub spin_coupling: f32,
    pub boundary_spin_friction: f32,
    pub spin_transfer: f32,
    pub separation_buffer: f32,

    // ── Damage ────────────────────────────────────────────────────────────────
    pub damage_coefficient: f32,
    pub damage_scale: f32,

    // ── Stall Recovery ────────────────────────────────────────────────────────
    pub stuck_displacement_threshold: f32,
    pub stuck_step_threshold: u32,
    pub rescue_impulse_min: f32,
    pub rescue_impulse_max: f32,
    pub rescue_spin: f32,

    // ── Spawning ──────────────────────────────────────────────────────────────
    pub initial_speed_min: f32,
    pub initial_speed_max: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            // Driver
            seed: SEED,
            time_multiplier: TIME_MULTIPLIER,
            // Boundary
            boundary_sides: BOUNDARY_SIDES,
            boundary_rotation_speed: BOUNDARY_ROTATION_SPEED,
            boundary_safety_margin: BOUNDARY_SAFETY_MARGIN,
            // Integration
            gravity: GRAVITY,
            max_velocity: MAX_VELOCITY,
            max_angular_velocity: MAX_ANGULAR_VELOCITY,
            angular_damping: ANGULAR_DAMPING,
            history_len: HISTORY_LEN,
            speed_multipliers: [1.0, 1.0],
            // Size & Mass
            base_size: BASE_SIZE,
            min_size: MIN_SIZE,
            size_smoothing: SIZE_SMOOTHING,
            growth_factor: GROWTH_FACTOR,
            base_mass: BASE_MASS,
            size_to_mass_ratio: SIZE_TO_MASS_RATIO,
            // Vitality
            initial_vitality: INITIAL_VITALITY,
            max_vitality: MAX_VITALITY,
            contact_reward: CONTACT_REWARD,
            // Collision
            restitution: RESTITUTION,
            energy_loss_factor: ENERGY_LOSS_FACTOR,
            spin_coupling: SPIN_COUPLING,
            boundary_spin_friction: BOUNDARY_SPIN_FRICTION,
            spin_transfer: SPIN_TRANSFER,
            separation_buffer: SEPARATION_BUFFER,
            // Damage
            damage_coefficient: DAMAGE_COEFFICIENT,
            damage_scale: DAMAGE_SCALE,
            // Stall Recovery
            stuck_displacement_threshold: STUCK_DISPLACEMENT_THRESHOLD,
            stuck_step_threshold: STUCK_STEP_THRESHOLD,
            rescue_impulse_min: RESCUE_IMPULSE_MIN,
            rescue_impulse_max: RESCUE_IMPULSE_MAX,
            rescue_spin: RESCUE_SPIN,
            // Spawning
            initial_speed_min: INITIAL_SPEED_MIN,
            initial_speed_max: INITIAL_SPEED_MAX,
        }
    }
}

impl PhysicsConfig {
    /// Parse a TOML override.  Keys absent from `contents` keep their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<PhysicsConfig>(contents)
    }

    /// Read `path` and parse it, distinguishing "missing" (`Ok(None)`) from
    /// "present but broken" (`Err`).
    pub fn read(path: impl AsRef<Path>) -> SimResult<Option<Self>> {
        let path = path.as_ref();
        let Ok(contents) = std::fs::read_to_string(path) else {
            return Ok(None);
        };
        Self::from_toml_str(&contents)
            .map(Some)
            .map_err(|e| SimError::ConfigParse {
                path: path.display().to_string(),
                message: e.to_string(),
            })
    }

    /// Attempt to load `path`, falling back to compiled defaults.
    ///
    /// TOML parse errors are logged but do not abort the simulation.  A
    /// missing file is not an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::read(path) {
            Ok(Some(loaded)) => {
                info!("Loaded physics config from {}", path.display());
                loaded
            }
            Ok(None) => {
                info!("No {} found; using compiled defaults", path.display());
                Self::default()
            }
            Err(e) => {
                warn!("{e}; using defaults");
                Self::default()
            }
        }
    }

    /// Reject values that would make the simulation misbehave.
    ///
    /// Called once before an arena is built; an invalid record means the
    /// simulation refuses to start.
    pub fn validate(&self) -> SimResult<()> {
        validate_sides(self.boundary_sides)?;
        validate_finite("boundary_rotation_speed", self.boundary_rotation_speed)?;
        validate_non_negative("boundary_safety_margin", self.boundary_safety_margin)?;

        validate_finite("gravity", self.gravity)?;
        validate_positive("max_velocity", self.max_velocity)?;
        validate_positive("max_angular_velocity", self.max_angular_velocity)?;
        validate_unit_open("angular_damping", self.angular_damping)?;
        if self.history_len < 2 {
            return Err(SimError::UnsafeConstant {
                name: "history_len",
                value: self.history_len as f32,
                safe_range: "[2, ∞)",
            });
        }
        for multiplier in self.speed_multipliers {
            validate_non_negative("speed_multipliers", multiplier)?;
        }

        validate_positive("base_size", self.base_size)?;
        validate_positive("min_size", self.min_size)?;
        validate_range("min_size..base_size", self.min_size, self.base_size)?;
        validate_unit_open_low("size_smoothing", self.size_smoothing)?;
        validate_non_negative("growth_factor", self.growth_factor)?;
        validate_positive("base_mass", self.base_mass)?;
        validate_positive("size_to_mass_ratio", self.size_to_mass_ratio)?;

        validate_positive("initial_vitality", self.initial_vitality)?;
        validate_range(
            "initial_vitality..max_vitality",
            self.initial_vitality,
            self.max_vitality,
        )?;
        validate_non_negative("contact_reward", self.contact_reward)?;

        validate_unit_closed("restitution", self.restitution)?;
        validate_unit_closed("energy_loss_factor", self.energy_loss_factor)?;
        validate_unit_closed("spin_coupling", self.spin_coupling)?;
        validate_unit_closed("boundary_spin_friction", self.boundary_spin_friction)?;
        validate_unit_closed("spin_transfer", self.spin_transfer)?;
        validate_non_negative("separation_buffer", self.separation_buffer)?;

        validate_non_negative("damage_coefficient", self.damage_coefficient)?;
        validate_non_negative("damage_scale", self.damage_scale)?;

        validate_non_negative(
            "stuck_displacement_threshold",
            self.stuck_displacement_threshold,
        )?;
        validate_non_negative("rescue_impulse_min", self.rescue_impulse_min)?;
        validate_range(
            "rescue_impulse",
            self.rescue_impulse_min,
            self.rescue_impulse_max,
        )?;
        validate_non_negative("rescue_spin", self.rescue_spin)?;

        validate_non_negative("initial_speed_min", self.initial_speed_min)?;
        validate_range(
            "initial_speed",
            self.initial_speed_min,
            self.initial_speed_max,
        )?;
        Ok(())
    }

    /// Displacement multiplier for body `index`, or 1.0 when out of range.
    pub fn speed_multiplier(&self, index: usize) -> f32 {
        self.speed_multipliers.get(index).copied().unwrap_or(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        assert!(PhysicsConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_remaining_defaults() {
        let config = PhysicsConfig::from_toml_str("gravity = 0.0\nrestitution = 1.0\n")
            .expect("valid toml");
        assert_eq!(config.gravity, 0.0);
        assert_eq!(config.restitution, 1.0);
        assert_eq!(config.boundary_sides, BOUNDARY_SIDES);
        assert_eq!(config.max_velocity, MAX_VELOCITY);
    }

    #[test]
    fn speed_multipliers_parse_as_array() {
        let config = PhysicsConfig::from_toml_str("speed_multipliers = [0.5, 2.0]\n").unwrap();
        assert_eq!(config.speed_multiplier(0), 0.5);
        assert_eq!(config.speed_multiplier(1), 2.0);
        assert_eq!(config.speed_multiplier(7), 1.0);
    }

    #[test]
    fn energy_gaining_restitution_is_rejected() {
        let config = PhysicsConfig {
            restitution: 1.2,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SimError::UnsafeConstant {
                name: "restitution",
                ..
            })
        ));
    }

    #[test]
    fn degenerate_polygon_is_rejected() {
        let config = PhysicsConfig {
            boundary_sides: 2,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SimError::InsufficientVertices { got: 2, .. })
        ));
    }

    #[test]
    fn vitality_ceiling_below_initial_is_rejected() {
        let config = PhysicsConfig {
            max_vitality: 5.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SimError::InvertedRange { .. })
        ));
    }

    #[test]
    fn non_positive_mass_constants_are_rejected() {
        let config = PhysicsConfig {
            base_mass: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_file_reads_as_none() {
        let result = PhysicsConfig::read("does/not/exist/arena.toml");
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn shipped_override_file_is_valid() {
        let config = PhysicsConfig::from_toml_str(include_str!("../assets/arena.toml"))
            .expect("assets/arena.toml parses");
        assert!(config.validate().is_ok());
        assert_eq!(config.boundary_sides, 6);
    }
}
