//! Contact resolution.
//!
//! - [`boundary`]: a body that left the rotating polygon is rewarded, bounced
//!   back along the nearest edge normal and repositioned inside.
//! - [`pair`]: circle-circle overlap between the two bodies, resolved with a
//!   normal impulse, a spin friction impulse and symmetric damage.

pub mod boundary;
pub mod pair;

pub use boundary::BoundaryContact;
pub use pair::PairCollision;
