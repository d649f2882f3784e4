//! Entity model and session state
//!
//! `World` is rebuilt wholesale from a `LevelConfig` on every level load.
//! `Session` survives level loads and is the record persisted between runs.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::{Circle, Rect};
use super::laser::LaserTrap;
use super::level::{LevelConfig, PlatformSpec};
use crate::tuning::Tuning;

/// Closed set of things the player can touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Platform,
    MovingPlatform,
    EnergyOrb,
    LaserTrap,
    ExitPortal,
}

/// Why a level ended in failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverReason {
    TimeLimit,
    LaserTrap,
    FellOff,
    LoadFailure,
    /// Player left a running level for another one
    Abandoned,
}

impl GameOverReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameOverReason::TimeLimit => "time_limit",
            GameOverReason::LaserTrap => "laser_trap",
            GameOverReason::FellOff => "fell_off",
            GameOverReason::LoadFailure => "load_failure",
            GameOverReason::Abandoned => "abandoned",
        }
    }
}

/// Current phase of the level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Level being generated / assets being prepared
    Loading,
    /// Active gameplay
    Playing,
    /// Simulation frozen by the player
    Paused,
    /// Exit reached with enough orbs
    LevelComplete,
    /// Level failed
    GameOver(GameOverReason),
}

impl GamePhase {
    /// LevelComplete and GameOver need an explicit restart/next/goto
    pub fn is_terminal(&self) -> bool {
        matches!(self, GamePhase::LevelComplete | GamePhase::GameOver(_))
    }
}

/// The player avatar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Top-left corner of the bounding box
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
    pub health: u8,
    pub max_health: u8,
    /// Seconds of invulnerability left (0 = vulnerable)
    pub invulnerable_timer: f32,
    pub on_ground: bool,
    /// Points earned in the current level
    pub score: u64,
    pub orbs_collected: u32,
    /// Dropped below the world's lower bound this step
    pub fell_off: bool,
}

impl Player {
    /// Spawn standing on `spawn` (feet center), running right
    pub fn spawn(spawn: Vec2, tuning: &Tuning) -> Self {
        let size = Vec2::new(tuning.player_width, tuning.player_height);
        Self {
            pos: Vec2::new(spawn.x - size.x / 2.0, spawn.y - size.y),
            vel: Vec2::new(tuning.run_speed, 0.0),
            size,
            health: tuning.max_health,
            max_health: tuning.max_health,
            invulnerable_timer: 0.0,
            on_ground: true,
            score: 0,
            orbs_collected: 0,
            fell_off: false,
        }
    }

    #[inline]
    pub fn rect(&self) -> Rect {
        Rect {
            pos: self.pos,
            size: self.size,
        }
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    #[inline]
    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_timer > 0.0
    }

    pub fn is_dead(&self) -> bool {
        self.health == 0
    }

    /// Apply damage and start invulnerability; health never goes below zero
    pub fn take_damage(&mut self, amount: u8, invulnerability: f32) {
        self.health = self.health.saturating_sub(amount);
        self.invulnerable_timer = invulnerability;
    }
}

/// How a platform moves
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PlatformMotion {
    Static,
    /// Horizontal back-and-forth between `start_x` and `end_x` (left edge)
    Moving {
        start_x: f32,
        end_x: f32,
        speed: f32,
        /// +1.0 moving right, -1.0 moving left
        direction: f32,
    },
}

/// A one-way platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Platform {
    pub id: u32,
    pub rect: Rect,
    pub motion: PlatformMotion,
    /// Horizontal velocity over the last step (carried onto a landing player)
    #[serde(default)]
    pub velocity_x: f32,
}

impl Platform {
    pub fn from_spec(id: u32, spec: &PlatformSpec) -> Self {
        Self {
            id,
            rect: spec.rect,
            motion: spec.motion,
            velocity_x: 0.0,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self.motion {
            PlatformMotion::Static => EntityKind::Platform,
            PlatformMotion::Moving { .. } => EntityKind::MovingPlatform,
        }
    }

    /// Move between bounds, flipping direction at each end
    pub fn advance(&mut self, dt: f32) {
        if let PlatformMotion::Moving {
            start_x,
            end_x,
            speed,
            ref mut direction,
        } = self.motion
        {
            let old_x = self.rect.pos.x;
            let mut x = old_x + *direction * speed * dt;
            if x >= end_x {
                x = end_x;
                *direction = -1.0;
            } else if x <= start_x {
                x = start_x;
                *direction = 1.0;
            }
            self.rect.pos.x = x;
            self.velocity_x = if dt > 0.0 { (x - old_x) / dt } else { 0.0 };
        }
    }
}

/// A collectible orb
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergyOrb {
    pub id: u32,
    pub shape: Circle,
    pub collected: bool,
}

/// The level goal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitPortal {
    pub rect: Rect,
}

/// Live entities of the current level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    pub level: u32,
    pub width: f32,
    pub height: f32,
    pub spawn: Vec2,
    pub player: Player,
    /// Sorted by id for deterministic iteration
    pub platforms: Vec<Platform>,
    /// Uncollected orbs only; collected orbs are removed
    pub orbs: Vec<EnergyOrb>,
    pub traps: Vec<LaserTrap>,
    pub portal: ExitPortal,
    pub required_orbs: u32,
    pub time_limit: Option<f32>,
    next_id: u32,
}

impl World {
    /// Instantiate every entity described by `config`
    pub fn from_config(config: &LevelConfig, tuning: &Tuning) -> Self {
        let mut world = Self {
            level: config.level_number,
            width: config.width,
            height: config.height,
            spawn: config.spawn_point,
            player: Player::spawn(config.spawn_point, tuning),
            platforms: Vec::with_capacity(config.platforms.len()),
            orbs: Vec::with_capacity(config.orbs.len()),
            traps: Vec::with_capacity(config.traps.len()),
            portal: ExitPortal {
                rect: config.exit_rect(),
            },
            required_orbs: config.required_orb_count,
            time_limit: config.time_limit,
            next_id: 1,
        };

        for spec in &config.platforms {
            let id = world.next_entity_id();
            world.platforms.push(Platform::from_spec(id, spec));
        }
        for orb in &config.orbs {
            let id = world.next_entity_id();
            world.orbs.push(EnergyOrb {
                id,
                shape: *orb,
                collected: false,
            });
        }
        for spec in &config.traps {
            let id = world.next_entity_id();
            world.traps.push(LaserTrap::from_spec(id, spec));
        }

        world
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// Session record owned by the game state machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Current level (1-based)
    pub current_level: u32,
    pub phase: GamePhase,
    /// Seconds spent playing the current level (paused time excluded)
    pub elapsed: f64,
    /// Run score including progress in the current level
    pub score: u64,
    /// Score banked before the current level started
    pub level_start_score: u64,
    pub orbs_collected_this_level: u32,
    pub required_orbs: u32,
    pub time_limit: Option<f32>,
    pub total_currency: u64,
    pub highest_unlocked_level: u32,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            current_level: 1,
            phase: GamePhase::Loading,
            elapsed: 0.0,
            score: 0,
            level_start_score: 0,
            orbs_collected_this_level: 0,
            required_orbs: 0,
            time_limit: None,
            total_currency: 0,
            highest_unlocked_level: 1,
        }
    }
}

impl Session {
    /// Seconds left on the clock, `None` when the level is unbounded
    pub fn time_remaining(&self) -> Option<f64> {
        self.time_limit
            .map(|limit| (limit as f64 - self.elapsed).max(0.0))
    }

    /// Reset per-level fields for a fresh attempt at `level`
    pub fn begin_level(&mut self, level: u32) {
        self.current_level = level;
        self.phase = GamePhase::Loading;
        self.elapsed = 0.0;
        self.score = self.level_start_score;
        self.orbs_collected_this_level = 0;
        self.required_orbs = 0;
        self.time_limit = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::level::generate;

    #[test]
    fn test_player_damage_saturates() {
        let tuning = Tuning::default();
        let mut player = Player::spawn(Vec2::new(100.0, 100.0), &tuning);
        player.take_damage(10, 1.0);
        assert_eq!(player.health, 0);
        assert!(player.is_dead());
        assert!(player.is_invulnerable());
    }

    #[test]
    fn test_player_spawns_on_feet() {
        let tuning = Tuning::default();
        let player = Player::spawn(Vec2::new(240.0, 500.0), &tuning);
        assert_eq!(player.bottom(), 500.0);
        assert_eq!(player.rect().center().x, 240.0);
    }

    #[test]
    fn test_moving_platform_flips_at_bounds() {
        let mut platform = Platform {
            id: 1,
            rect: Rect::new(95.0, 0.0, 50.0, 10.0),
            motion: PlatformMotion::Moving {
                start_x: 0.0,
                end_x: 100.0,
                speed: 10.0,
                direction: 1.0,
            },
            velocity_x: 0.0,
        };
        platform.advance(1.0);
        assert_eq!(platform.rect.pos.x, 100.0);
        assert!(matches!(platform.motion, PlatformMotion::Moving { direction, .. } if direction < 0.0));
        platform.advance(1.0);
        assert_eq!(platform.rect.pos.x, 90.0);
        assert_eq!(platform.velocity_x, -10.0);
    }

    #[test]
    fn test_world_from_config_assigns_unique_ids() {
        let config = generate(4, 7).unwrap();
        let world = World::from_config(&config, &Tuning::default());
        let mut ids: Vec<u32> = world
            .platforms
            .iter()
            .map(|p| p.id)
            .chain(world.orbs.iter().map(|o| o.id))
            .chain(world.traps.iter().map(|t| t.id))
            .collect();
        let count = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), count);
        assert_eq!(world.orbs.len() as u32, world.required_orbs);
    }
}
