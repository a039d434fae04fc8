//! Simulation plugin and systems for Bevy ECS

use crate::arena::{Arena, Outcome, StepReport};
use crate::body::BodyId;
use crate::config::PhysicsConfig;
use crate::constants::TELEMETRY_REPORT_INTERVAL;
use crate::telemetry::TelemetryMonitor;
use bevy::prelude::*;

/// Drives an [`Arena`] resource headlessly.
///
/// Expects [`PhysicsConfig`] and [`Arena`] to be inserted by the caller; the
/// arena has to be built (and the config validated) before the app starts.
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TelemetryMonitor>()
            .init_resource::<RoundStats>()
            .init_resource::<LastStep>()
            .add_systems(
                Update,
                (arena_step_system, round_end_system, telemetry_report_system).chain(),
            );
    }
}

/// Round bookkeeping across resets.
#[derive(Resource, Debug, Default, Clone, PartialEq)]
pub struct RoundStats {
    pub ticks: u64,
    pub total_steps: u64,
    pub rounds_finished: u32,
    pub wins: [u32; 2],
    pub draws: u32,
}

impl RoundStats {
    pub fn wins_for(&self, id: BodyId) -> u32 {
        self.wins[id.index()]
    }
}

/// The most recent step report, for systems that run after stepping.
#[derive(Resource, Debug, Default, Clone)]
pub struct LastStep(pub Option<StepReport>);

/// Run `time_multiplier` arena steps and feed every report to telemetry.
///
/// Stops early within a tick once a body is defeated so the round end is seen
/// by [`round_end_system`] before anything else happens.
pub fn arena_step_system(
    config: Res<PhysicsConfig>,
    mut arena: ResMut<Arena>,
    mut telemetry: ResMut<TelemetryMonitor>,
    mut stats: ResMut<RoundStats>,
    mut last: ResMut<LastStep>,
) {
    stats.ticks += 1;
    for _ in 0..config.time_multiplier.max(1) {
        let report = arena.step(&config);
        telemetry.record(&report);
        stats.total_steps += 1;
        let over = report.outcome.is_over();
        last.0 = Some(report);
        if over {
            break;
        }
    }
}

/// Log a finished round and start the next one.
pub fn round_end_system(
    config: Res<PhysicsConfig>,
    mut arena: ResMut<Arena>,
    mut stats: ResMut<RoundStats>,
) {
    let outcome = arena.outcome();
    match outcome {
        Outcome::Ongoing => return,
        Outcome::Defeated(loser) => {
            let winner = loser.other();
            stats.wins[winner.index()] += 1;
            info!(
                "Round {} over after {} steps: {} defeated {}",
                stats.rounds_finished + 1,
                arena.step_count(),
                arena.body(winner).name,
                arena.body(loser).name
            );
        }
        Outcome::BothDefeated => {
            stats.draws += 1;
            info!(
                "Round {} over after {} steps: both bodies defeated",
                stats.rounds_finished + 1,
                arena.step_count()
            );
        }
    }
    stats.rounds_finished += 1;

    if let Err(err) = arena.reset(&config) {
        error!("Failed to reset arena: {}", err);
    }
}

/// Periodically log the stability analysis and any anomalies.
pub fn telemetry_report_system(telemetry: Res<TelemetryMonitor>, mut reported: Local<u64>) {
    let interval = telemetry.steps() / TELEMETRY_REPORT_INTERVAL;
    if interval == 0 || interval == *reported {
        return;
    }
    *reported = interval;
    let analysis = telemetry.analyze();
    let low = telemetry.min_vitality();
    info!(
        "Telemetry @ {} steps: collisions/step {:.3}, wall hits/step {:.3}, avg speed {:.2}/{:.2}, stability {:.3}, low vitality {:.1}/{:.1}",
        analysis.steps,
        analysis.collision_rate,
        analysis.boundary_hit_rate,
        analysis.average_speed[0],
        analysis.average_speed[1],
        analysis.velocity_stability,
        low[0],
        low[1]
    );
    for anomaly in telemetry.detect_anomalies() {
        warn!("{}", anomaly);
    }
}
