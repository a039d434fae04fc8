//! Scripted scenarios for the binary's test mode (`ARENA_TEST=<name>`).
//!
//! Each scenario tweaks the config, places the bodies by hand, runs for a
//! fixed number of steps while [`ScenarioLog`] watches the step reports, and
//! is then judged by [`verify`].

use crate::arena::{Arena, ArenaLayout, StepReport};
use crate::body::{BodyId, BodySnapshot};
use crate::collision::PairCollision;
use crate::config::PhysicsConfig;
use crate::error::SimResult;
use crate::simulation::{self, LastStep};
use bevy::prelude::*;

/// Every scenario name accepted by [`Scenario::named`].
pub const SCENARIOS: [&str; 6] = [
    "head_on",
    "wall_pin",
    "stall_rescue",
    "spin_exchange",
    "lossless_bounce",
    "baseline",
];

/// Test configuration
#[derive(Resource, Debug, Clone)]
pub struct TestConfig {
    pub enabled: bool,
    pub test_name: String,
    pub frame_limit: u32,
    pub frame_count: u32,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            test_name: String::new(),
            frame_limit: 100,
            frame_count: 0,
        }
    }
}

/// A named setup: config overrides plus hand-placed bodies.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: &'static str,
    pub frame_limit: u32,
    pub config: PhysicsConfig,
    pub layout: ArenaLayout,
    place: fn(&mut Arena),
}

impl Scenario {
    /// Look up `name`, starting from `base` (usually the loaded config).
    pub fn named(name: &str, base: &PhysicsConfig) -> Option<Self> {
        let layout = ArenaLayout::default();
        let mut config = PhysicsConfig {
            time_multiplier: 1,
            ..base.clone()
        };
        let (name, frame_limit, place): (&'static str, u32, fn(&mut Arena)) = match name {
            "head_on" => {
                config.restitution = 1.0;
                config.gravity = 0.0;
                config.damage_coefficient = 0.0;
                config.boundary_rotation_speed = 0.0;
                ("head_on", 30, place_head_on)
            }
            "wall_pin" => {
                config.gravity = 1.0;
                config.restitution = 0.0;
                config.energy_loss_factor = 0.0;
                config.boundary_rotation_speed = 0.0;
                config.speed_multipliers = [1.0, 0.0];
                ("wall_pin", 300, place_wall_pin)
            }
            "stall_rescue" => {
                config.gravity = 0.0;
                config.speed_multipliers = [0.0, 0.0];
                ("stall_rescue", 100, place_at_spawn_resting)
            }
            "spin_exchange" => {
                config.gravity = 0.0;
                config.restitution = 1.0;
                config.spin_transfer = 0.5;
                config.boundary_rotation_speed = 0.0;
                ("spin_exchange", 40, place_spin_exchange)
            }
            "lossless_bounce" => {
                config.gravity = 0.0;
                config.restitution = 1.0;
                config.energy_loss_factor = 1.0;
                config.spin_coupling = 0.0;
                config.damage_coefficient = 0.0;
                config.growth_factor = 0.0;
                ("lossless_bounce", 600, place_unchanged)
            }
            "baseline" => return Some(Self::baseline(base)),
            _ => return None,
        };
        Some(Self {
            name,
            frame_limit,
            config,
            layout,
            place,
        })
    }

    /// Untouched config and random spawns.
    pub fn baseline(base: &PhysicsConfig) -> Self {
        Self {
            name: "baseline",
            frame_limit: 600,
            config: PhysicsConfig {
                time_multiplier: 1,
                ..base.clone()
            },
            layout: ArenaLayout::default(),
            place: place_unchanged,
        }
    }

    pub fn build_arena(&self) -> SimResult<Arena> {
        let mut arena = Arena::new(self.layout.clone(), &self.config)?;
        (self.place)(&mut arena);
        Ok(arena)
    }

    pub fn new_log(&self) -> ScenarioLog {
        ScenarioLog::new(self.layout.center, self.layout.radius)
    }

    /// Run the whole scenario without Bevy and return what was observed.
    pub fn run_headless(&self) -> SimResult<ScenarioLog> {
        let mut arena = self.build_arena()?;
        let mut log = self.new_log();
        for _ in 0..self.frame_limit {
            let report = arena.step(&self.config);
            log.observe(&report);
            if report.outcome.is_over() {
                arena.reset(&self.config)?;
            }
        }
        Ok(log)
    }
}

fn place_unchanged(_arena: &mut Arena) {}

fn place_head_on(arena: &mut Arena) {
    let center = arena.layout().center;
    place(arena, BodyId::First, center - Vec2::new(40.0, 0.0), Vec2::new(5.0, 0.0), 0.0);
    place(arena, BodyId::Second, center + Vec2::new(40.0, 0.0), Vec2::new(-5.0, 0.0), 0.0);
}

fn place_wall_pin(arena: &mut Arena) {
    let center = arena.layout().center;
    place(arena, BodyId::First, center + Vec2::new(0.0, 150.0), Vec2::ZERO, 0.0);
    place(arena, BodyId::Second, center - Vec2::new(0.0, 150.0), Vec2::ZERO, 0.0);
}

fn place_at_spawn_resting(arena: &mut Arena) {
    for id in BodyId::ALL {
        let position = arena.layout().spawns[id.index()].position;
        place(arena, id, position, Vec2::ZERO, 0.0);
    }
}

fn place_spin_exchange(arena: &mut Arena) {
    let center = arena.layout().center;
    place(arena, BodyId::First, center - Vec2::new(40.0, 0.0), Vec2::new(3.0, 0.0), 15.0);
    place(arena, BodyId::Second, center + Vec2::new(40.0, 0.0), Vec2::new(-3.0, 0.0), 0.0);
}

fn place(arena: &mut Arena, id: BodyId, position: Vec2, velocity: Vec2, spin: f32) {
    let body = arena.body_mut(id);
    body.position = position;
    body.velocity = velocity;
    body.angular_velocity = spin;
}

/// The first approaching body-body contact of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpactObservation {
    pub step: u64,
    pub before: [BodySnapshot; 2],
    pub after: [BodySnapshot; 2],
    pub collision: PairCollision,
}

/// Everything the verifier needs, accumulated one step report at a time.
#[derive(Resource, Debug, Clone)]
pub struct ScenarioLog {
    pub steps: u64,
    pub first_impact: Option<ImpactObservation>,
    pub boundary_hits: u64,
    /// Largest `|speed_after - speed_before|` over all boundary hits.
    pub worst_bounce_speed_change: f32,
    pub rescues: u64,
    pub min_vitality: f32,
    pub max_vitality: f32,
    /// Body-steps that ended with the body wholly outside the circumscribed
    /// circle.  Pair correction may nudge a body past the wall for one step;
    /// it is pulled back on the next.
    pub escapes: u64,
    pub non_finite: bool,
    center: Vec2,
    radius: f32,
    previous: Option<[BodySnapshot; 2]>,
}

impl ScenarioLog {
    pub fn new(center: Vec2, radius: f32) -> Self {
        Self {
            steps: 0,
            first_impact: None,
            boundary_hits: 0,
            worst_bounce_speed_change: 0.0,
            rescues: 0,
            min_vitality: f32::INFINITY,
            max_vitality: f32::NEG_INFINITY,
            escapes: 0,
            non_finite: false,
            center,
            radius,
            previous: None,
        }
    }

    pub fn observe(&mut self, report: &StepReport) {
        self.steps += 1;

        for body in &report.bodies {
            if !body.position.is_finite() || !body.velocity.is_finite() {
                self.non_finite = true;
            }
            self.min_vitality = self.min_vitality.min(body.vitality);
            self.max_vitality = self.max_vitality.max(body.vitality);
            if body.position.distance(self.center) > self.radius + body.current_size {
                self.escapes += 1;
            }
        }

        for contact in report.boundary_hits() {
            self.boundary_hits += 1;
            let change = (contact.speed_after - contact.speed_before).abs();
            self.worst_bounce_speed_change = self.worst_bounce_speed_change.max(change);
        }

        self.rescues += report.rescue_count() as u64;

        if self.first_impact.is_none() {
            let impact = report.body_collision().filter(|hit| !hit.separating);
            if let (Some(hit), Some(before)) = (impact, self.previous.as_ref()) {
                self.first_impact = Some(ImpactObservation {
                    step: report.step,
                    before: before.clone(),
                    after: report.bodies.clone(),
                    collision: *hit,
                });
            }
        }

        self.previous = Some(report.bodies.clone());
    }
}

/// Judge a finished scenario.  `Ok` carries a one-line summary, `Err` the
/// reason it failed.
pub fn verify(scenario: &Scenario, log: &ScenarioLog) -> Result<String, String> {
    if log.non_finite {
        return Err("non-finite body state observed".into());
    }
    if log.min_vitality < 0.0 || log.max_vitality > scenario.config.max_vitality {
        return Err(format!(
            "vitality left [0, {}]: min {:.2}, max {:.2}",
            scenario.config.max_vitality, log.min_vitality, log.max_vitality
        ));
    }

    match scenario.name {
        "head_on" => {
            let impact = log.first_impact.as_ref().ok_or("bodies never collided")?;
            let (a, b) = (impact.after[0].velocity, impact.after[1].velocity);
            if a.distance(Vec2::new(-5.0, 0.0)) < 1e-3 && b.distance(Vec2::new(5.0, 0.0)) < 1e-3 {
                Ok(format!("velocities exchanged at step {}", impact.step))
            } else {
                Err(format!("expected (-5, 0) / (5, 0), got {:?} / {:?}", a, b))
            }
        }
        "wall_pin" => {
            if log.escapes > 0 {
                Err(format!("body left the boundary on {} steps", log.escapes))
            } else if log.boundary_hits < 5 {
                Err(format!("only {} wall contacts", log.boundary_hits))
            } else {
                Ok(format!("{} wall contacts, never escaped", log.boundary_hits))
            }
        }
        "stall_rescue" => {
            let period = u64::from(scenario.config.stuck_step_threshold) + 1;
            // The first step has no displacement to measure.
            let expected = 2 * ((u64::from(scenario.frame_limit) - 1) / period);
            if log.rescues == expected {
                Ok(format!("{} rescues", log.rescues))
            } else {
                Err(format!("expected {} rescues, got {}", expected, log.rescues))
            }
        }
        "spin_exchange" => {
            let impact = log.first_impact.as_ref().ok_or("bodies never collided")?;
            let spinner_slowed =
                impact.after[0].angular_velocity < impact.before[0].angular_velocity;
            let partner_spun = impact.after[1].angular_velocity.abs() > 0.0;
            let partner_deflected = impact.after[1].velocity.y.abs() > 0.0;
            if spinner_slowed && partner_spun && partner_deflected {
                Ok(format!(
                    "spin {:.2} -> {:.2}, partner spin {:.2}",
                    impact.before[0].angular_velocity,
                    impact.after[0].angular_velocity,
                    impact.after[1].angular_velocity
                ))
            } else {
                Err(format!(
                    "no spin transfer: slowed={} spun={} deflected={}",
                    spinner_slowed, partner_spun, partner_deflected
                ))
            }
        }
        "lossless_bounce" => {
            if log.boundary_hits == 0 {
                Err("no boundary hits".into())
            } else if log.worst_bounce_speed_change > 1e-3 {
                Err(format!(
                    "bounce changed speed by {:.5}",
                    log.worst_bounce_speed_change
                ))
            } else if log.min_vitality <= 0.0 {
                Err("a body was defeated".into())
            } else if log.escapes > 0 {
                Err(format!("body left the boundary on {} steps", log.escapes))
            } else {
                Ok(format!("{} speed-preserving bounces", log.boundary_hits))
            }
        }
        "baseline" => {
            if log.steps == u64::from(scenario.frame_limit) {
                Ok(format!(
                    "{} steps, {} wall hits, {} rescues",
                    log.steps, log.boundary_hits, log.rescues
                ))
            } else {
                Err(format!("ran {} of {} steps", log.steps, scenario.frame_limit))
            }
        }
        other => Err(format!("unknown scenario {other}")),
    }
}

/// Install `scenario` into `app`: its config, arena, log and the
/// logging/verification systems.  Falls back to `baseline` for unknown names.
pub fn configure_test_mode(app: &mut App, test_name: &str, base: &PhysicsConfig) -> SimResult<()> {
    let scenario = Scenario::named(test_name, base).unwrap_or_else(|| {
        warn!("Unknown test {test_name:?}; running baseline");
        Scenario::baseline(base)
    });

    let arena = scenario.build_arena()?;
    app.insert_resource(scenario.config.clone())
        .insert_resource(arena)
        .insert_resource(scenario.new_log())
        .insert_resource(TestConfig {
            enabled: true,
            test_name: scenario.name.to_string(),
            frame_limit: scenario.frame_limit,
            frame_count: 0,
        })
        .insert_resource(ActiveScenario(scenario))
        .add_systems(
            Update,
            (test_logging_system, test_verification_system)
                .chain()
                .after(simulation::round_end_system),
        );

    println!("Running test: {}", test_name);
    Ok(())
}

#[derive(Resource, Debug, Clone)]
pub struct ActiveScenario(pub Scenario);

pub fn test_logging_system(
    mut test_config: ResMut<TestConfig>,
    last: Res<LastStep>,
    mut log: ResMut<ScenarioLog>,
) {
    if !test_config.enabled {
        return;
    }

    test_config.frame_count += 1;
    if let Some(report) = &last.0 {
        log.observe(report);
    }

    if test_config.frame_count.is_multiple_of(100) {
        println!(
            "[Frame {}] {} | wall hits: {} | rescues: {} | vitality {:.1}..{:.1}",
            test_config.frame_count,
            test_config.test_name,
            log.boundary_hits,
            log.rescues,
            log.min_vitality,
            log.max_vitality
        );
    }
}

pub fn test_verification_system(
    test_config: Res<TestConfig>,
    scenario: Res<ActiveScenario>,
    log: Res<ScenarioLog>,
    mut exit: MessageWriter<bevy::app::AppExit>,
) {
    if !test_config.enabled || test_config.frame_count != test_config.frame_limit {
        return;
    }

    println!("\n╔════════════════════════════════════════════╗");
    println!("║           TEST COMPLETE                    ║");
    println!("╚════════════════════════════════════════════╝");
    println!("Test: {}", test_config.test_name);
    println!("Frames: {}", test_config.frame_count);

    match verify(&scenario.0, &log) {
        Ok(summary) => {
            println!("Result: ✓ PASS ({summary})");
            exit.write(bevy::app::AppExit::Success);
        }
        Err(reason) => {
            println!("Result: ✗ FAIL ({reason})");
            exit.write(bevy::app::AppExit::error());
        }
    }
}
