//! End-to-end runs of the arena core, without Bevy scheduling.
//!
//! Covered scenarios:
//! 1. A lossless, damage-free run never defeats anyone and never changes a
//!    body's speed at a wall bounce.
//! 2. Two arenas from the same seed replay identically.
//! 3. Running N steps per tick matches running N single steps.
//! 4. Editing the config between steps keeps the state finite and bounded.
//! 5. Wall contacts always put the body back inside the polygon.
//! 6. A body pinned against a wall is rescued at the contact itself.
//! 7. Inverting the rescue range between steps never brings the core down.

use hex_arena::arena::{Arena, ArenaEvent, ArenaLayout, Outcome};
use hex_arena::body::BodyId;
use bevy::prelude::Vec2;
use hex_arena::config::PhysicsConfig;

// ── Helpers ───────────────────────────────────────────────────────────────────

fn arena(config: &PhysicsConfig) -> Arena {
    Arena::new(ArenaLayout::default(), config).expect("valid config")
}

fn lossless() -> PhysicsConfig {
    PhysicsConfig {
        restitution: 1.0,
        energy_loss_factor: 1.0,
        damage_coefficient: 0.0,
        spin_coupling: 0.0,
        ..Default::default()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn lossless_run_keeps_everyone_alive_and_bounces_preserve_speed() {
    let config = lossless();
    let mut arena = arena(&config);
    let mut bounces = 0;

    for report in arena.advance(&config, 3_000) {
        assert_eq!(report.outcome, Outcome::Ongoing, "step {}", report.step);
        for body in &report.bodies {
            assert!(body.vitality > 0.0, "{} defeated at step {}", body.name, report.step);
        }
        for hit in report.boundary_hits() {
            bounces += 1;
            assert!(
                (hit.speed_after - hit.speed_before).abs() < 1e-3,
                "step {}: bounce changed speed {} -> {}",
                report.step,
                hit.speed_before,
                hit.speed_after
            );
        }
    }

    assert!(bounces > 0, "bodies never reached the wall");
}

#[test]
fn same_seed_replays_identically() {
    let config = PhysicsConfig::default();
    let mut a = arena(&config);
    let mut b = arena(&config);
    for _ in 0..1_000 {
        let (ra, rb) = (a.step(&config), b.step(&config));
        assert_eq!(ra, rb, "diverged at step {}", ra.step);
        if ra.outcome.is_over() {
            a.reset(&config).unwrap();
            b.reset(&config).unwrap();
        }
    }
}

#[test]
fn multi_step_ticks_match_single_steps() {
    let config = PhysicsConfig::default();
    let mut batched = arena(&config);
    let mut single = arena(&config);

    for _ in 0..100 {
        let reports = batched.advance(&config, 3);
        let mut last = None;
        for _ in 0..3 {
            last = Some(single.step(&config));
        }
        assert_eq!(reports.last(), last.as_ref());
        if batched.outcome().is_over() {
            break;
        }
    }
    assert_eq!(batched.snapshot(), single.snapshot());
}

#[test]
fn config_edits_between_steps_stay_sane() {
    let mut config = PhysicsConfig::default();
    let mut arena = arena(&config);

    for step in 0..1_500u32 {
        // Slider-style edits while the simulation runs.
        config.speed_multipliers = [1.0 + (step % 7) as f32 * 0.25, 1.0];
        config.gravity = if step % 200 < 100 { 0.06 } else { 0.3 };

        let report = arena.step(&config);
        for body in &report.bodies {
            assert!(body.position.is_finite() && body.velocity.is_finite());
            assert!(body.angular_velocity.abs() <= config.max_angular_velocity + 1e-3);
            assert!(body.vitality >= 0.0 && body.vitality <= config.max_vitality);
        }
        if report.outcome.is_over() {
            arena.reset(&config).unwrap();
        }
    }
}

#[test]
fn wall_contacts_end_inside_the_polygon() {
    let config = PhysicsConfig {
        // Keep the pair apart so only wall contacts move them.
        speed_multipliers: [1.0, 0.0],
        gravity: 0.4,
        ..Default::default()
    };
    let mut arena = arena(&config);
    let mut contacts = 0;

    for _ in 0..1_000 {
        let report = arena.step(&config);
        let first_hit = report
            .events
            .iter()
            .any(|e| matches!(e, ArenaEvent::BoundaryHit(c) if c.body == BodyId::First));
        if first_hit && report.body_collision().is_none() {
            contacts += 1;
            let body = arena.body(BodyId::First);
            assert!(
                arena.boundary().contains(body.position),
                "step {}: {:?} left outside",
                report.step,
                body.position
            );
            let reach = body.position.distance(arena.layout().center) + body.half_size();
            assert!(reach <= arena.layout().radius - config.boundary_safety_margin + 1e-3);
        }
    }
    assert!(contacts > 0);
}

#[test]
fn defeat_is_reported_but_not_acted_on() {
    let config = PhysicsConfig::default();
    let mut arena = arena(&config);
    arena.body_mut(BodyId::First).lose_vitality(1_000.0);

    let report = arena.step(&config);
    assert_eq!(report.outcome, Outcome::Defeated(BodyId::First));
    // Still the same round until the driver resets it.
    assert_eq!(arena.step_count(), 1);
    assert_eq!(arena.body(BodyId::First).vitality, 0.0);
}

#[test]
fn body_pinned_to_the_floor_is_rescued_on_contact() {
    // A still floor and a restitution-free, fully damped bounce: every step
    // the body falls through the bottom edge and is put back on the same spot.
    let config = PhysicsConfig {
        boundary_rotation_speed: 0.0,
        gravity: 6.0,
        base_size: 8.0,
        min_size: 6.0,
        growth_factor: 0.0,
        restitution: 0.0,
        energy_loss_factor: 0.0,
        spin_coupling: 0.0,
        boundary_safety_margin: 0.5,
        speed_multipliers: [1.0, 0.0],
        ..Default::default()
    };
    let mut arena = arena(&config);
    let center = arena.layout().center;
    {
        let body = arena.body_mut(BodyId::First);
        body.position = center + Vec2::new(0.0, 100.0);
        body.velocity = Vec2::ZERO;
        body.angular_velocity = 0.0;
    }

    let mut contact_rescues = 0;
    for report in arena.advance(&config, 200) {
        for event in &report.events {
            match event {
                ArenaEvent::BoundaryHit(contact) if contact.body == BodyId::First => {
                    if contact.rescue.is_some() {
                        contact_rescues += 1;
                    }
                }
                ArenaEvent::Rescue { body, .. } => {
                    assert_ne!(
                        *body,
                        BodyId::First,
                        "step {}: pinned body rescued away from the wall",
                        report.step
                    );
                }
                _ => {}
            }
        }
    }
    assert!(contact_rescues > 0, "pinned body was never rescued on contact");
}

#[test]
fn inverted_rescue_range_mid_run_keeps_stepping() {
    let mut config = PhysicsConfig {
        gravity: 0.0,
        speed_multipliers: [0.0, 0.0],
        ..Default::default()
    };
    let mut arena = arena(&config);
    arena.advance(&config, 10);

    // Slider edits that no longer pass validation.
    config.rescue_impulse_min = 3.0;
    config.rescue_impulse_max = 1.0;
    config.rescue_spin = -2.0;

    let mut rescues = 0;
    for report in arena.advance(&config, 100) {
        rescues += report.rescue_count();
        for body in &report.bodies {
            assert!(body.velocity.is_finite() && body.angular_velocity.is_finite());
        }
    }
    assert!(rescues > 0, "stalled bodies were never rescued");

    // Starting a new round with the broken config is refused, not panicked on.
    assert!(arena.reset(&config).is_err());
}
