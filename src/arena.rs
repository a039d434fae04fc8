//! One simulation instance: the boundary, both bodies and their random source.
//!
//! A step always runs in the same order:
//!
//! 1. boundary rotation
//! 2. integration of each body (first, then second), each followed by its
//!    stall counter update
//! 3. boundary collisions (first, then second), which rescue stalled bodies
//!    on contact
//! 4. body-body collision
//! 5. rescue of any body still stalled (first, then second)
//!
//! Changing this order changes trajectories.

use crate::body::{BodyId, BodySnapshot, BodySpawn, DynamicBody};
use crate::boundary::RotatingBoundary;
use crate::collision::{self, BoundaryContact, PairCollision};
use crate::config::PhysicsConfig;
use crate::constants::{
    ARENA_CENTER_X, ARENA_CENTER_Y, BOUNDARY_RADIUS, SPAWN_OFFSET_X, SPAWN_OFFSET_Y,
};
use crate::error::SimResult;
use crate::stuck::{self, RescueImpulse};
use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

/// Where things start on every reset.
#[derive(Debug, Clone, PartialEq)]
pub struct ArenaLayout {
    pub center: Vec2,
    pub radius: f32,
    pub spawns: [BodySpawn; 2],
}

impl Default for ArenaLayout {
    fn default() -> Self {
        let center = Vec2::new(ARENA_CENTER_X, ARENA_CENTER_Y);
        let offset = Vec2::new(SPAWN_OFFSET_X, SPAWN_OFFSET_Y);
        Self {
            center,
            radius: BOUNDARY_RADIUS,
            spawns: [
                BodySpawn::new("Red", center - offset, [0.9, 0.2, 0.2]),
                BodySpawn::new("Blue", center + offset, [0.2, 0.4, 0.9]),
            ],
        }
    }
}

/// Termination signal for the driver.  The arena never resets itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Ongoing,
    Defeated(BodyId),
    BothDefeated,
}

impl Outcome {
    pub fn is_over(self) -> bool {
        self != Outcome::Ongoing
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArenaEvent {
    BoundaryHit(BoundaryContact),
    BodyCollision(PairCollision),
    /// A rescue fired at the end of the step, away from any wall contact.
    /// Rescues fired during a boundary contact ride on the contact itself.
    Rescue { body: BodyId, impulse: RescueImpulse },
}

/// Everything an observer needs about one step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub step: u64,
    pub boundary_rotation: f32,
    pub events: Vec<ArenaEvent>,
    pub bodies: [BodySnapshot; 2],
    pub outcome: Outcome,
}

impl StepReport {
    pub fn boundary_hits(&self) -> impl Iterator<Item = &BoundaryContact> {
        self.events.iter().filter_map(|event| match event {
            ArenaEvent::BoundaryHit(contact) => Some(contact),
            _ => None,
        })
    }

    pub fn body_collision(&self) -> Option<&PairCollision> {
        self.events.iter().find_map(|event| match event {
            ArenaEvent::BodyCollision(hit) => Some(hit),
            _ => None,
        })
    }

    /// Rescues from both boundary contacts and the stall check.
    pub fn rescue_count(&self) -> usize {
        self.events
            .iter()
            .filter(|event| match event {
                ArenaEvent::BoundaryHit(contact) => contact.rescue.is_some(),
                ArenaEvent::Rescue { .. } => true,
                ArenaEvent::BodyCollision(_) => false,
            })
            .count()
    }
}

#[derive(Resource, Debug, Clone)]
pub struct Arena {
    layout: ArenaLayout,
    boundary: RotatingBoundary,
    bodies: [DynamicBody; 2],
    rng: StdRng,
    step: u64,
}

impl Arena {
    /// Validate `config` and build an arena seeded from `config.seed`.
    pub fn new(layout: ArenaLayout, config: &PhysicsConfig) -> SimResult<Self> {
        Self::with_rng(layout, config, StdRng::seed_from_u64(config.seed))
    }

    /// Like [`Arena::new`] with a caller-supplied random source.
    pub fn with_rng(layout: ArenaLayout, config: &PhysicsConfig, mut rng: StdRng) -> SimResult<Self> {
        config.validate()?;
        let boundary = RotatingBoundary::from_config(layout.center, layout.radius, config)?;
        let bodies = spawn_bodies(&layout, config, &mut rng);
        Ok(Self {
            layout,
            boundary,
            bodies,
            rng,
            step: 0,
        })
    }

    /// Rebuild the boundary and both bodies from the stored layout.  The
    /// random stream continues, so successive rounds differ.
    pub fn reset(&mut self, config: &PhysicsConfig) -> SimResult<()> {
        config.validate()?;
        self.boundary = RotatingBoundary::from_config(self.layout.center, self.layout.radius, config)?;
        self.bodies = spawn_bodies(&self.layout, config, &mut self.rng);
        self.step = 0;
        Ok(())
    }

    /// Run one fixed-order step and report what happened.
    pub fn step(&mut self, config: &PhysicsConfig) -> StepReport {
        self.step += 1;
        let mut events = Vec::new();

        self.boundary.update();

        for (i, body) in self.bodies.iter_mut().enumerate() {
            body.integrate(config, config.speed_multiplier(i));
            stuck::observe_motion(body, config);
        }

        for body in self.bodies.iter_mut() {
            if let Some(contact) =
                collision::boundary::resolve(body, &self.boundary, config, &mut self.rng)
            {
                events.push(ArenaEvent::BoundaryHit(contact));
            }
        }

        let [first, second] = &mut self.bodies;
        if let Some(hit) = collision::pair::resolve(first, second, config) {
            events.push(ArenaEvent::BodyCollision(hit));
        }

        for body in self.bodies.iter_mut() {
            if let Some(impulse) = stuck::rescue_if_stuck(body, config, &mut self.rng) {
                events.push(ArenaEvent::Rescue {
                    body: body.id,
                    impulse,
                });
            }
        }

        StepReport {
            step: self.step,
            boundary_rotation: self.boundary.rotation(),
            events,
            bodies: self.snapshot(),
            outcome: self.outcome(),
        }
    }

    /// Run `steps` steps back to back (the time multiplier path).
    pub fn advance(&mut self, config: &PhysicsConfig, steps: u32) -> Vec<StepReport> {
        (0..steps).map(|_| self.step(config)).collect()
    }

    pub fn outcome(&self) -> Outcome {
        match (self.bodies[0].is_defeated(), self.bodies[1].is_defeated()) {
            (true, true) => Outcome::BothDefeated,
            (true, false) => Outcome::Defeated(BodyId::First),
            (false, true) => Outcome::Defeated(BodyId::Second),
            (false, false) => Outcome::Ongoing,
        }
    }

    pub fn snapshot(&self) -> [BodySnapshot; 2] {
        [self.bodies[0].snapshot(), self.bodies[1].snapshot()]
    }

    pub fn step_count(&self) -> u64 {
        self.step
    }

    pub fn layout(&self) -> &ArenaLayout {
        &self.layout
    }

    pub fn boundary(&self) -> &RotatingBoundary {
        &self.boundary
    }

    pub fn body(&self, id: BodyId) -> &DynamicBody {
        &self.bodies[id.index()]
    }

    pub fn body_mut(&mut self, id: BodyId) -> &mut DynamicBody {
        &mut self.bodies[id.index()]
    }
}

fn spawn_bodies(layout: &ArenaLayout, config: &PhysicsConfig, rng: &mut StdRng) -> [DynamicBody; 2] {
    BodyId::ALL.map(|id| DynamicBody::spawn(id, &layout.spawns[id.index()], config, rng))
}
