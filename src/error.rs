//! Simulation-specific error types.
//!
//! Only construction-time problems surface as errors: a misconfigured arena
//! refuses to start.  Numeric degeneracies inside a step are recovered where
//! they occur and never propagate.
//!
//! ## Usage
//!
//! ```rust
//! use hex_arena::error::{validate_positive, SimResult};
//!
//! fn check_radius(radius: f32) -> SimResult<()> {
//!     validate_positive("boundary_radius", radius)?;
//!     Ok(())
//! }
//! assert!(check_radius(0.0).is_err());
//! ```

use std::fmt;

/// Top-level error enum for the arena simulation.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    /// A polygon was requested with too few sides to enclose an area.
    InsufficientVertices {
        /// Actual side count requested.
        got: u32,
        /// Minimum required.
        required: u32,
    },

    /// Physics constant is outside its safe operating range.
    UnsafeConstant {
        /// Name of the constant (for logging).
        name: &'static str,
        /// The value that was rejected.
        value: f32,
        /// Human-readable description of the safe range.
        safe_range: &'static str,
    },

    /// A `(min, max)` pair with `min > max`.
    InvertedRange {
        name: &'static str,
        min: f32,
        max: f32,
    },

    /// A config file was found but could not be parsed.
    ConfigParse {
        path: String,
        message: String,
    },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::InsufficientVertices { got, required } => write!(
                f,
                "boundary side count too low: got {}, need at least {}",
                got, required
            ),
            SimError::UnsafeConstant {
                name,
                value,
                safe_range,
            } => write!(
                f,
                "constant '{}' = {} is outside safe range {}",
                name, value, safe_range
            ),
            SimError::InvertedRange { name, min, max } => write!(
                f,
                "range '{}' is inverted: min {} > max {}",
                name, min, max
            ),
            SimError::ConfigParse { path, message } => {
                write!(f, "failed to parse {}: {}", path, message)
            }
        }
    }
}

impl std::error::Error for SimError {}

/// Convenience alias: a `Result` using `SimError` as the error type.
pub type SimResult<T> = Result<T, SimError>;

// ── Validation helpers ────────────────────────────────────────────────────────

/// Returns an error unless `value` is finite.
pub fn validate_finite(name: &'static str, value: f32) -> SimResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SimError::UnsafeConstant {
            name,
            value,
            safe_range: "(-∞, ∞)",
        })
    }
}

/// Returns an error unless `value` is finite and strictly positive.
pub fn validate_positive(name: &'static str, value: f32) -> SimResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SimError::UnsafeConstant {
            name,
            value,
            safe_range: "(0.0, ∞)",
        })
    }
}

/// Returns an error unless `value` is finite and not negative.
pub fn validate_non_negative(name: &'static str, value: f32) -> SimResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SimError::UnsafeConstant {
            name,
            value,
            safe_range: "[0.0, ∞)",
        })
    }
}

/// Returns an error unless `value` lies in `[0, 1]`.
///
/// Restitution or energy-loss factors above 1.0 make every bounce add energy.
pub fn validate_unit_closed(name: &'static str, value: f32) -> SimResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SimError::UnsafeConstant {
            name,
            value,
            safe_range: "[0.0, 1.0]",
        })
    }
}

/// Returns an error unless `value` lies in `(0, 1]`.
pub fn validate_unit_open_low(name: &'static str, value: f32) -> SimResult<()> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(SimError::UnsafeConstant {
            name,
            value,
            safe_range: "(0.0, 1.0]",
        })
    }
}

/// Returns an error unless `value` lies strictly inside `(0, 1)`.
pub fn validate_unit_open(name: &'static str, value: f32) -> SimResult<()> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(SimError::UnsafeConstant {
            name,
            value,
            safe_range: "(0.0, 1.0)",
        })
    }
}

/// Returns an error if `min > max` or either end is not finite.
pub fn validate_range(name: &'static str, min: f32, max: f32) -> SimResult<()> {
    if !min.is_finite() || !max.is_finite() || min > max {
        Err(SimError::InvertedRange { name, min, max })
    } else {
        Ok(())
    }
}

/// Returns an error if a polygon would have fewer than three sides.
pub fn validate_sides(sides: u32) -> SimResult<()> {
    if sides < 3 {
        Err(SimError::InsufficientVertices {
            got: sides,
            required: 3,
        })
    } else {
        Ok(())
    }
}
