//! Orb Climber - gameplay core for a tap-to-jump vertical platformer
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, collisions, level generation)
//! - `game`: Level/session state machine driving the simulation
//! - `progression`: Level unlock policy
//! - `persistence`: Progress snapshot save/load
//! - `services`: Analytics, rewarded-ad and asset collaborators
//! - `tuning`: Data-driven game balance
//! - `view`: Read-only snapshot for renderers

pub mod error;
pub mod game;
pub mod persistence;
pub mod progression;
pub mod services;
pub mod sim;
pub mod tuning;
pub mod view;

pub use error::{AdError, AnalyticsError, AssetError, GenerationError, StoreError, TuningError};
pub use game::{Game, LoadOutcome, LoadTicket, UnlockOutcome};
pub use persistence::{JsonFileStore, MemoryStore, ProgressSnapshot, ProgressStore};
pub use progression::Progression;
pub use services::{AdProvider, Analytics, AnalyticsEvent, LevelAssets, Services};
pub use tuning::Tuning;
pub use view::{FrameView, Hud};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep used by hosts that run a fixed-rate loop
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// World dimensions (y grows downward, 0 is the top of the level)
    pub const WORLD_WIDTH: f32 = 480.0;
    /// Vertical distance between static platform rows
    pub const ROW_SPACING: f32 = 100.0;
    /// Extra height above the top row and below the floor
    pub const LEVEL_VERTICAL_PADDING: f32 = 220.0;
    /// Height of the band at the bottom of the level kept free of traps
    pub const FLOOR_SAFE_BAND: f32 = 160.0;
    /// Distance from the portal kept free of traps
    pub const PORTAL_SAFE_RADIUS: f32 = 80.0;

    /// Platform defaults
    pub const PLATFORM_HEIGHT: f32 = 14.0;
    pub const PLATFORM_MIN_WIDTH: f32 = 80.0;
    pub const PLATFORM_MAX_WIDTH: f32 = 150.0;
    pub const PLATFORM_JITTER: f32 = 150.0;
    pub const MOVING_PLATFORM_WIDTH: f32 = 90.0;
    pub const MOVING_PLATFORM_TRAVEL: f32 = 140.0;

    /// Orb defaults
    pub const ORB_RADIUS: f32 = 10.0;

    /// Laser trap beam defaults
    pub const TRAP_HEIGHT: f32 = 8.0;
    pub const TRAP_MIN_WIDTH: f32 = 70.0;
    pub const TRAP_MAX_WIDTH: f32 = 130.0;

    /// Exit portal size
    pub const PORTAL_WIDTH: f32 = 48.0;
    pub const PORTAL_HEIGHT: f32 = 64.0;

    /// Minimum gap between any placed orb/trap and platforms/traps
    pub const MIN_CLEARANCE: f32 = 24.0;

    /// Levels 1..=3 never need unlocking
    pub const ALWAYS_UNLOCKED_LEVELS: u32 = 3;
    /// Highest level the generator will build
    pub const MAX_LEVEL: u32 = 100;
}
