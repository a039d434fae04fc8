//! Two-body duel inside a rotating hexagon.
//!
//! A fixed-step physics core (boundary geometry, integration, impulse
//! collisions, stall recovery) with a telemetry monitor and a headless Bevy
//! driver on top.

pub mod arena;
pub mod body;
pub mod boundary;
pub mod collision;
pub mod config;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod simulation;
pub mod stuck;
pub mod telemetry;
pub mod testing;
