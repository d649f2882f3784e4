//! Per-frame simulation tick
//!
//! Order within a frame: hazards and platforms advance, the player integrates,
//! collisions resolve, then win/lose conditions are evaluated.

use super::collision::{self, CollisionEvent};
use super::state::{GameOverReason, GamePhase, Session, World};
use crate::tuning::Tuning;

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Tap: jump if standing on something
    pub jump: bool,
    /// Pause toggle
    pub pause: bool,
}

/// How a level ended on this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelOutcome {
    Complete,
    Failed(GameOverReason),
}

/// What happened during one tick
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub events: Vec<CollisionEvent>,
    pub outcome: Option<LevelOutcome>,
    /// Seconds actually simulated (0 when nothing ran)
    pub simulated_dt: f32,
}

/// Start a jump if the player is grounded. Returns whether it took effect.
pub fn request_jump(world: &mut World, tuning: &Tuning) -> bool {
    let player = &mut world.player;
    if !player.on_ground {
        return false;
    }
    player.vel.y = tuning.jump_impulse;
    player.on_ground = false;
    true
}

/// Advance platforms, traps and the player by `dt` without resolving collisions
///
/// Returns the player's feet y before integration (used for one-way landing).
pub fn integrate(world: &mut World, tuning: &Tuning, dt: f32) -> f32 {
    for platform in &mut world.platforms {
        platform.advance(dt);
    }
    for trap in &mut world.traps {
        trap.advance(dt);
    }

    let width = world.width;
    let height = world.height;
    let player = &mut world.player;

    player.invulnerable_timer = (player.invulnerable_timer - dt).max(0.0);

    // Ground contact must be re-established by a landing every step
    let was_grounded = player.on_ground;
    player.on_ground = false;
    if !was_grounded {
        player.vel.y = (player.vel.y + tuning.gravity * dt).min(tuning.max_fall_speed);
    }

    let prev_bottom = player.bottom();
    player.pos += player.vel * dt;

    // Walls: clamp and turn around
    let max_x = (width - player.size.x).max(0.0);
    if player.pos.x < 0.0 {
        player.pos.x = 0.0;
        player.vel.x = player.vel.x.abs();
    } else if player.pos.x > max_x {
        player.pos.x = max_x;
        player.vel.x = -player.vel.x.abs();
    }

    if player.pos.y > height {
        player.fell_off = true;
    }

    prev_bottom
}

/// Advance the world by one physics step and resolve collisions
pub fn step(world: &mut World, tuning: &Tuning, dt: f32) -> Vec<CollisionEvent> {
    let dt = dt.min(tuning.max_frame_dt);
    if dt <= 0.0 {
        return Vec::new();
    }
    let prev_bottom = integrate(world, tuning, dt);
    collision::resolve(world, prev_bottom, tuning, dt)
}

/// Advance one frame: pause handling, physics, collisions, then rule checks
pub fn tick(
    session: &mut Session,
    world: &mut World,
    input: &TickInput,
    tuning: &Tuning,
    dt: f32,
) -> TickReport {
    // Handle pause toggle
    if input.pause {
        match session.phase {
            GamePhase::Playing => {
                session.phase = GamePhase::Paused;
                return TickReport::default();
            }
            GamePhase::Paused => session.phase = GamePhase::Playing,
            _ => {}
        }
    }

    // Only Playing advances the simulation (timer frozen otherwise)
    if session.phase != GamePhase::Playing {
        return TickReport::default();
    }

    let dt = dt.min(tuning.max_frame_dt);
    if dt <= 0.0 {
        return TickReport::default();
    }

    if input.jump {
        request_jump(world, tuning);
    }

    let events = step(world, tuning, dt);
    session.elapsed += dt as f64;

    let player = &world.player;
    let portal_entered = events.contains(&CollisionEvent::PortalEntered);

    let outcome = if session
        .time_limit
        .is_some_and(|limit| session.elapsed >= limit as f64)
    {
        Some(LevelOutcome::Failed(GameOverReason::TimeLimit))
    } else if player.fell_off {
        Some(LevelOutcome::Failed(GameOverReason::FellOff))
    } else if player.is_dead() {
        Some(LevelOutcome::Failed(GameOverReason::LaserTrap))
    } else if player.orbs_collected >= session.required_orbs && portal_entered {
        Some(LevelOutcome::Complete)
    } else {
        None
    };

    // HUD-facing fields
    session.orbs_collected_this_level = player.orbs_collected;
    session.score = session.level_start_score + player.score;

    match outcome {
        Some(LevelOutcome::Complete) => session.phase = GamePhase::LevelComplete,
        Some(LevelOutcome::Failed(reason)) => session.phase = GamePhase::GameOver(reason),
        None => {}
    }

    TickReport {
        events,
        outcome,
        simulated_dt: dt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level::generate;
    use glam::Vec2;

    const DT: f32 = 1.0 / 60.0;

    fn playing(level: u32) -> (Session, World, Tuning) {
        let tuning = Tuning::default();
        let config = generate(level, 12345).unwrap();
        let world = World::from_config(&config, &tuning);
        let mut session = Session::default();
        session.begin_level(level);
        session.required_orbs = config.required_orb_count;
        session.time_limit = config.time_limit;
        session.phase = GamePhase::Playing;
        (session, world, tuning)
    }

    #[test]
    fn test_landing_is_idempotent() {
        let (_, mut world, tuning) = playing(1);
        world.player.vel = Vec2::ZERO;
        let start = world.player.pos;
        for _ in 0..120 {
            step(&mut world, &tuning, DT);
            assert!(world.player.on_ground);
        }
        assert_eq!(world.player.pos, start);
    }

    #[test]
    fn test_jump_requires_ground() {
        let (_, mut world, tuning) = playing(1);
        world.player.vel.x = 0.0;
        assert!(request_jump(&mut world, &tuning));
        assert_eq!(world.player.vel.y, tuning.jump_impulse);
        assert!(!world.player.on_ground);
        // Mid-air tap is ignored
        assert!(!request_jump(&mut world, &tuning));

        let start_y = world.player.pos.y;
        step(&mut world, &tuning, DT);
        assert!(world.player.pos.y < start_y);
    }

    #[test]
    fn test_fall_speed_clamped() {
        let (_, mut world, tuning) = playing(1);
        world.player.on_ground = false;
        world.player.pos = Vec2::new(0.0, 0.0);
        world.player.vel = Vec2::new(0.0, tuning.max_fall_speed - 1.0);
        integrate(&mut world, &tuning, DT);
        assert_eq!(world.player.vel.y, tuning.max_fall_speed);
    }

    #[test]
    fn test_large_dt_is_capped() {
        let (mut session, mut world, tuning) = playing(2);
        let report = tick(&mut session, &mut world, &TickInput::default(), &tuning, 5.0);
        assert_eq!(report.simulated_dt, tuning.max_frame_dt);
        assert!((session.elapsed - tuning.max_frame_dt as f64).abs() < 1e-9);
    }

    #[test]
    fn test_walls_turn_player_around() {
        let (_, mut world, tuning) = playing(1);
        world.player.on_ground = false;
        world.player.pos.x = world.width - world.player.size.x - 1.0;
        world.player.vel = Vec2::new(tuning.run_speed, 0.0);
        integrate(&mut world, &tuning, DT);
        assert_eq!(world.player.pos.x, world.width - world.player.size.x);
        assert!(world.player.vel.x < 0.0);
    }

    #[test]
    fn test_idle_runner_stays_on_floor() {
        let (mut session, mut world, tuning) = playing(1);
        let floor_top = world.platforms[0].rect.top();
        let start_x = world.player.pos.x;
        let mut turned = false;
        for _ in 0..1200 {
            tick(&mut session, &mut world, &TickInput::default(), &tuning, DT);
            assert_eq!(session.phase, GamePhase::Playing);
            assert_eq!(world.player.bottom(), floor_top);
            turned |= world.player.vel.x < 0.0;
        }
        // Ran into a wall and came back
        assert!(turned);
        assert_ne!(world.player.pos.x, start_x);
    }

    #[test]
    fn test_falling_below_world_is_fatal() {
        let (mut session, mut world, tuning) = playing(2);
        world.player.on_ground = false;
        world.player.pos = Vec2::new(5.0, world.height - 1.0);
        world.player.vel = Vec2::new(0.0, tuning.max_fall_speed);
        let report = tick(&mut session, &mut world, &TickInput::default(), &tuning, DT);
        assert_eq!(report.outcome, Some(LevelOutcome::Failed(GameOverReason::FellOff)));
        assert_eq!(session.phase, GamePhase::GameOver(GameOverReason::FellOff));
    }

    #[test]
    fn test_pause_freezes_timer() {
        let (mut session, mut world, tuning) = playing(2);
        world.player.vel = Vec2::ZERO;
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut session, &mut world, &pause, &tuning, DT);
        assert_eq!(session.phase, GamePhase::Paused);
        for _ in 0..30 {
            tick(&mut session, &mut world, &TickInput::default(), &tuning, DT);
        }
        assert_eq!(session.elapsed, 0.0);

        tick(&mut session, &mut world, &pause, &tuning, DT);
        assert_eq!(session.phase, GamePhase::Playing);
        assert!(session.elapsed > 0.0);
    }

    #[test]
    fn test_time_limit_checked_before_completion() {
        let (mut session, mut world, tuning) = playing(2);
        // Enough orbs and standing in the portal, but the clock runs out this frame
        world.player.orbs_collected = session.required_orbs;
        world.player.vel = Vec2::ZERO;
        world.player.pos = world.portal.rect.center() - world.player.size / 2.0;
        session.elapsed = 89.99;
        let report = tick(&mut session, &mut world, &TickInput::default(), &tuning, DT);
        assert_eq!(report.outcome, Some(LevelOutcome::Failed(GameOverReason::TimeLimit)));
    }
}
