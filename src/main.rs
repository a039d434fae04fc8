use bevy::log::LogPlugin;
use bevy::prelude::*;
use hex_arena::arena::{Arena, ArenaLayout};
use hex_arena::config::PhysicsConfig;
use hex_arena::constants::{CONFIG_PATH, DEFAULT_RUN_TICKS};
use hex_arena::simulation::{self, RoundStats, SimulationPlugin};
use hex_arena::telemetry::TelemetryMonitor;
use hex_arena::testing;
use std::env;

/// Ticks left before a normal (non-test) run exits.
#[derive(Resource)]
struct RunLimit {
    ticks: u32,
}

fn run_limit_system(
    limit: Res<RunLimit>,
    stats: Res<RoundStats>,
    telemetry: Res<TelemetryMonitor>,
    mut exit: MessageWriter<AppExit>,
) {
    if stats.ticks < u64::from(limit.ticks) {
        return;
    }

    let analysis = telemetry.analyze();
    println!("\n── Run complete ──────────────────────────────");
    println!("Ticks: {}  Steps: {}", stats.ticks, stats.total_steps);
    println!(
        "Rounds: {}  Wins: {} / {}  Draws: {}",
        stats.rounds_finished, stats.wins[0], stats.wins[1], stats.draws
    );
    println!(
        "Collisions/step: {:.3}  Wall hits/step: {:.3}  Rescues: {}",
        analysis.collision_rate, analysis.boundary_hit_rate, analysis.total_rescues
    );
    println!(
        "Avg speed: {:.2} / {:.2}  Stability: {:.3}",
        analysis.average_speed[0], analysis.average_speed[1], analysis.velocity_stability
    );
    for anomaly in telemetry.detect_anomalies() {
        println!("Anomaly: {anomaly}");
    }
    exit.write(AppExit::Success);
}

fn main() -> AppExit {
    // Check for test mode
    let test_mode = env::var("ARENA_TEST").ok();

    let mut app = App::new();
    app.add_plugins((MinimalPlugins, LogPlugin::default()));

    let config = PhysicsConfig::load_or_default(CONFIG_PATH);
    if let Err(err) = config.validate() {
        error!("Refusing to start: {err}");
        return AppExit::error();
    }

    app.add_plugins(SimulationPlugin);

    if let Some(test_name) = test_mode {
        if let Err(err) = testing::configure_test_mode(&mut app, &test_name, &config) {
            error!("Cannot set up test {test_name:?}: {err}");
            return AppExit::error();
        }
    } else {
        let arena = match Arena::new(ArenaLayout::default(), &config) {
            Ok(arena) => arena,
            Err(err) => {
                error!("Refusing to start: {err}");
                return AppExit::error();
            }
        };
        let ticks = env::var("ARENA_STEPS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_RUN_TICKS);
        let boundary = arena.boundary();
        info!(
            "Running {ticks} ticks (seed {}): {}-sided boundary, radius {:.0}, {:.2} deg/step",
            config.seed,
            boundary.sides(),
            boundary.radius(),
            boundary.rotation_speed()
        );

        app.insert_resource(config)
            .insert_resource(arena)
            .insert_resource(RunLimit { ticks })
            .add_systems(
                Update,
                run_limit_system.after(simulation::telemetry_report_system),
            );
    }

    app.run()
}
