//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only (level generation)
//! - Stable iteration order (by entity ID)
//! - No rendering, audio or platform dependencies

pub mod collision;
pub mod geometry;
pub mod laser;
pub mod level;
pub mod state;
pub mod tick;

pub use collision::{CollisionEvent, Interaction, interaction, resolve};
pub use geometry::{Circle, Rect, rect_circle_overlap};
pub use laser::{LaserTrap, LaserTrapSpec};
pub use level::{LevelConfig, PlatformSpec, fallback_layout, generate, generate_with};
pub use state::{
    EnergyOrb, EntityKind, ExitPortal, GameOverReason, GamePhase, Platform, PlatformMotion, Player,
    Session, World,
};
pub use tick::{LevelOutcome, TickInput, TickReport, request_jump, step, tick};
