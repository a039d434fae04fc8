//! Step-report telemetry: bounded sample windows, stability analysis and
//! anomaly detection.
//!
//! The monitor only consumes [`StepReport`]s handed to it by the driver; it
//! holds no reference to the arena and never mutates it.

use crate::arena::StepReport;
use crate::body::BodyId;
use crate::constants::{
    ANOMALY_EXCESSIVE_DAMAGE, ANOMALY_HIGH_VELOCITY, ANOMALY_RECENT_COLLISIONS,
    ANOMALY_STALL_SAMPLES, ANOMALY_STALL_SPEED, STABILITY_MIN_SAMPLES, TELEMETRY_EVENT_WINDOW,
    TELEMETRY_WINDOW,
};
use bevy::prelude::*;
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;

/// One resolved body-body impact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CollisionSample {
    pub step: u64,
    pub impact_speed: f32,
    pub damage: f32,
}

/// One boundary contact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundaryHitSample {
    pub step: u64,
    pub body: BodyId,
    pub speed_before: f32,
    pub speed_after: f32,
}

/// Rates are per simulated step, not per second.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StabilityAnalysis {
    pub steps: u64,
    pub collision_rate: f32,
    pub boundary_hit_rate: f32,
    pub average_speed: [f32; 2],
    /// `1 / (1 + var_first + var_second)`; 0 until enough samples exist.
    pub velocity_stability: f32,
    pub total_collisions: u64,
    pub total_boundary_hits: u64,
    pub total_rescues: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Anomaly {
    HighVelocity { body: BodyId, speed: f32 },
    Stalled { body: BodyId },
    ExcessiveDamage { step: u64, damage: f32 },
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anomaly::HighVelocity { body, speed } => {
                write!(f, "High velocity on {:?}: {:.2}", body, speed)
            }
            Anomaly::Stalled { body } => {
                write!(f, "{:?} appears to be stuck (very low velocity)", body)
            }
            Anomaly::ExcessiveDamage { step, damage } => {
                write!(f, "Excessive damage at step {}: {:.2}", step, damage)
            }
        }
    }
}

#[derive(Resource, Debug, Clone)]
pub struct TelemetryMonitor {
    speeds: [VecDeque<f32>; 2],
    vitality: [VecDeque<f32>; 2],
    positions: [VecDeque<Vec2>; 2],
    collisions: VecDeque<CollisionSample>,
    boundary_hits: VecDeque<BoundaryHitSample>,
    steps: u64,
    total_collisions: u64,
    total_boundary_hits: u64,
    total_rescues: u64,
}

impl Default for TelemetryMonitor {
    fn default() -> Self {
        Self {
            speeds: Default::default(),
            vitality: Default::default(),
            positions: Default::default(),
            collisions: VecDeque::with_capacity(TELEMETRY_EVENT_WINDOW),
            boundary_hits: VecDeque::with_capacity(TELEMETRY_EVENT_WINDOW),
            steps: 0,
            total_collisions: 0,
            total_boundary_hits: 0,
            total_rescues: 0,
        }
    }
}

impl TelemetryMonitor {
    pub fn record(&mut self, report: &StepReport) {
        self.steps += 1;

        for (i, body) in report.bodies.iter().enumerate() {
            push_bounded(&mut self.speeds[i], body.velocity.length(), TELEMETRY_WINDOW);
            push_bounded(&mut self.vitality[i], body.vitality, TELEMETRY_WINDOW);
            push_bounded(&mut self.positions[i], body.position, TELEMETRY_WINDOW);
        }

        for contact in report.boundary_hits() {
            self.total_boundary_hits += 1;
            push_bounded(
                &mut self.boundary_hits,
                BoundaryHitSample {
                    step: report.step,
                    body: contact.body,
                    speed_before: contact.speed_before,
                    speed_after: contact.speed_after,
                },
                TELEMETRY_EVENT_WINDOW,
            );
        }

        // Separating contacts are only positional corrections, not impacts.
        if let Some(hit) = report.body_collision().filter(|hit| !hit.separating) {
            self.total_collisions += 1;
            push_bounded(
                &mut self.collisions,
                CollisionSample {
                    step: report.step,
                    impact_speed: hit.impact_speed,
                    damage: hit.damage,
                },
                TELEMETRY_EVENT_WINDOW,
            );
        }

        self.total_rescues += report.rescue_count() as u64;
    }

    /// Forget everything, e.g. when the driver starts a new round.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn collisions(&self) -> impl Iterator<Item = &CollisionSample> {
        self.collisions.iter()
    }

    pub fn boundary_hits(&self) -> impl Iterator<Item = &BoundaryHitSample> {
        self.boundary_hits.iter()
    }

    pub fn positions(&self, body: BodyId) -> impl Iterator<Item = Vec2> + '_ {
        self.positions[body.index()].iter().copied()
    }

    /// Lowest vitality each body reached inside the window.
    pub fn min_vitality(&self) -> [f32; 2] {
        [0, 1].map(|i| self.vitality[i].iter().copied().fold(f32::INFINITY, f32::min))
    }

    pub fn analyze(&self) -> StabilityAnalysis {
        let per_step = |count: u64| {
            if self.steps == 0 {
                0.0
            } else {
                count as f32 / self.steps as f32
            }
        };

        let enough = self.speeds.iter().all(|s| s.len() >= STABILITY_MIN_SAMPLES);
        let velocity_stability = if enough {
            1.0 / (1.0 + variance(&self.speeds[0]) + variance(&self.speeds[1]))
        } else {
            0.0
        };

        StabilityAnalysis {
            steps: self.steps,
            collision_rate: per_step(self.total_collisions),
            boundary_hit_rate: per_step(self.total_boundary_hits),
            average_speed: [mean(&self.speeds[0]), mean(&self.speeds[1])],
            velocity_stability,
            total_collisions: self.total_collisions,
            total_boundary_hits: self.total_boundary_hits,
            total_rescues: self.total_rescues,
        }
    }

    pub fn detect_anomalies(&self) -> Vec<Anomaly> {
        let mut anomalies = Vec::new();

        for id in BodyId::ALL {
            let speeds = &self.speeds[id.index()];

            let peak = speeds.iter().copied().fold(0.0_f32, f32::max);
            if peak > ANOMALY_HIGH_VELOCITY {
                anomalies.push(Anomaly::HighVelocity { body: id, speed: peak });
            }

            if speeds.len() >= ANOMALY_STALL_SAMPLES
                && speeds
                    .iter()
                    .rev()
                    .take(ANOMALY_STALL_SAMPLES)
                    .all(|&s| s < ANOMALY_STALL_SPEED)
            {
                anomalies.push(Anomaly::Stalled { body: id });
            }
        }

        anomalies.extend(
            self.collisions
                .iter()
                .rev()
                .take(ANOMALY_RECENT_COLLISIONS)
                .filter(|c| c.damage > ANOMALY_EXCESSIVE_DAMAGE)
                .map(|c| Anomaly::ExcessiveDamage {
                    step: c.step,
                    damage: c.damage,
                }),
        );

        anomalies
    }
}

fn push_bounded<T>(buf: &mut VecDeque<T>, value: T, capacity: usize) {
    while buf.len() >= capacity {
        buf.pop_front();
    }
    buf.push_back(value);
}

fn mean(values: &VecDeque<f32>) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}

fn variance(values: &VecDeque<f32>) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f32>() / values.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::{ArenaEvent, Outcome};
    use crate::body::{BodySnapshot, BodySpawn, DynamicBody};
    use crate::collision::{BoundaryContact, PairCollision};
    use crate::config::PhysicsConfig;

    fn snapshots(speed_a: f32, speed_b: f32) -> [BodySnapshot; 2] {
        let config = PhysicsConfig::default();
        BodyId::ALL.map(|id| {
            let speed = if id == BodyId::First { speed_a } else { speed_b };
            let spawn = BodySpawn::new("s", Vec2::ZERO, [1.0, 1.0, 1.0]);
            DynamicBody::new(id, &spawn, Vec2::new(speed, 0.0), &config).snapshot()
        })
    }

    fn report(step: u64, speed_a: f32, speed_b: f32, events: Vec<ArenaEvent>) -> StepReport {
        StepReport {
            step,
            boundary_rotation: 0.0,
            events,
            bodies: snapshots(speed_a, speed_b),
            outcome: Outcome::Ongoing,
        }
    }

    fn impact(damage: f32, separating: bool) -> ArenaEvent {
        ArenaEvent::BodyCollision(PairCollision {
            normal: Vec2::X,
            overlap: 1.0,
            impact_speed: 3.0,
            slip: 0.0,
            damage,
            separating,
        })
    }

    fn wall(body: BodyId) -> ArenaEvent {
        ArenaEvent::BoundaryHit(BoundaryContact {
            body,
            normal: Vec2::NEG_Y,
            exit_point: Vec2::ZERO,
            speed_before: 2.0,
            speed_after: 1.5,
            repositioned: true,
            rescue: None,
        })
    }

    // ── analysis ──────────────────────────────────────────────────────────────

    #[test]
    fn empty_monitor_reports_zeroes() {
        let analysis = TelemetryMonitor::default().analyze();
        assert_eq!(analysis.steps, 0);
        assert_eq!(analysis.collision_rate, 0.0);
        assert_eq!(analysis.velocity_stability, 0.0);
    }

    #[test]
    fn rates_are_per_step() {
        let mut monitor = TelemetryMonitor::default();
        monitor.record(&report(1, 1.0, 1.0, vec![impact(1.0, false), wall(BodyId::First)]));
        monitor.record(&report(2, 1.0, 1.0, vec![wall(BodyId::Second)]));
        monitor.record(&report(3, 1.0, 1.0, vec![impact(0.0, true)]));
        monitor.record(&report(4, 1.0, 1.0, vec![]));
        let analysis = monitor.analyze();
        assert_eq!(analysis.total_collisions, 1, "separating contacts are not impacts");
        assert_eq!(analysis.total_boundary_hits, 2);
        assert!((analysis.collision_rate - 0.25).abs() < 1e-6);
        assert!((analysis.boundary_hit_rate - 0.5).abs() < 1e-6);
    }

    #[test]
    fn constant_speeds_are_perfectly_stable() {
        let mut monitor = TelemetryMonitor::default();
        for step in 0..20 {
            monitor.record(&report(step, 2.0, 3.0, vec![]));
        }
        let analysis = monitor.analyze();
        assert!((analysis.velocity_stability - 1.0).abs() < 1e-6);
        assert!((analysis.average_speed[0] - 2.0).abs() < 1e-6);
        assert!((analysis.average_speed[1] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn windows_are_bounded() {
        let mut monitor = TelemetryMonitor::default();
        for step in 0..(TELEMETRY_WINDOW as u64 + 50) {
            monitor.record(&report(step, 1.0, 1.0, vec![impact(0.5, false)]));
        }
        assert_eq!(monitor.positions(BodyId::First).count(), TELEMETRY_WINDOW);
        assert_eq!(monitor.collisions().count(), TELEMETRY_EVENT_WINDOW);
        assert_eq!(monitor.analyze().total_collisions, TELEMETRY_WINDOW as u64 + 50);
        let initial = PhysicsConfig::default().initial_vitality;
        assert_eq!(monitor.min_vitality(), [initial, initial]);
    }

    #[test]
    fn analysis_and_samples_serialize() {
        let mut monitor = TelemetryMonitor::default();
        monitor.record(&report(1, 1.0, 2.0, vec![impact(1.0, false), wall(BodyId::Second)]));

        let analysis = toml::to_string(&monitor.analyze()).unwrap();
        assert!(analysis.contains("collision_rate = 1"), "{analysis}");
        assert!(analysis.contains("total_rescues = 0"), "{analysis}");

        let hit = monitor.boundary_hits().next().copied().unwrap();
        let hit = toml::to_string(&hit).unwrap();
        assert!(hit.contains("body = \"Second\""), "{hit}");
    }

    // ── anomalies ─────────────────────────────────────────────────────────────

    #[test]
    fn stall_needs_ten_slow_samples() {
        let mut monitor = TelemetryMonitor::default();
        for step in 0..(ANOMALY_STALL_SAMPLES as u64 - 1) {
            monitor.record(&report(step, 0.0, 2.0, vec![]));
        }
        assert!(monitor.detect_anomalies().is_empty());
        monitor.record(&report(99, 0.0, 2.0, vec![]));
        assert_eq!(
            monitor.detect_anomalies(),
            vec![Anomaly::Stalled { body: BodyId::First }]
        );
    }

    #[test]
    fn high_velocity_and_excessive_damage_are_flagged() {
        let mut monitor = TelemetryMonitor::default();
        monitor.record(&report(1, 25.0, 1.0, vec![impact(30.0, false)]));
        let anomalies = monitor.detect_anomalies();
        assert!(anomalies.contains(&Anomaly::HighVelocity {
            body: BodyId::First,
            speed: 25.0
        }));
        assert!(anomalies.contains(&Anomaly::ExcessiveDamage { step: 1, damage: 30.0 }));
        assert!(anomalies.iter().all(|a| !a.to_string().is_empty()));
    }

    #[test]
    fn clear_resets_everything() {
        let mut monitor = TelemetryMonitor::default();
        monitor.record(&report(1, 1.0, 1.0, vec![impact(1.0, false)]));
        monitor.clear();
        assert_eq!(monitor.steps(), 0);
        assert_eq!(monitor.collisions().count(), 0);
    }
}
