//! Level unlock policy
//!
//! The first few levels are always open. Beyond that a level opens when the
//! previous one is completed, or when a rewarded ad is granted for it. The
//! unlock high-water mark lives in the session so it persists with progress.

use crate::consts::{ALWAYS_UNLOCKED_LEVELS, MAX_LEVEL};
use crate::sim::Session;

/// Unlock rules applied to a session's high-water mark
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progression {
    /// Levels 1..=always_unlocked never need unlocking
    pub always_unlocked: u32,
}

impl Default for Progression {
    fn default() -> Self {
        Self {
            always_unlocked: ALWAYS_UNLOCKED_LEVELS,
        }
    }
}

impl Progression {
    /// Level numbers the game can build at all
    pub fn exists(&self, level: u32) -> bool {
        (1..=MAX_LEVEL).contains(&level)
    }

    pub fn is_unlocked(&self, session: &Session, level: u32) -> bool {
        self.exists(level)
            && (level <= self.always_unlocked || level <= session.highest_unlocked_level)
    }

    /// The first level that is not yet open
    pub fn next_locked(&self, session: &Session) -> u32 {
        (session.highest_unlocked_level + 1).max(self.always_unlocked + 1)
    }

    /// A rewarded ad may only open the next locked level
    pub fn can_unlock_via_ad(&self, session: &Session, level: u32) -> bool {
        self.exists(level) && level == self.next_locked(session)
    }

    /// Completing `level` opens `level + 1`. Returns true if the mark advanced.
    pub fn record_completion(&self, session: &mut Session, level: u32) -> bool {
        let next = level.saturating_add(1).min(MAX_LEVEL);
        if next > session.highest_unlocked_level {
            session.highest_unlocked_level = next;
            log::info!("Unlocked level {}", next);
            true
        } else {
            false
        }
    }

    /// Open `level` after a successful ad grant. Returns false if not eligible.
    pub fn grant_unlock(&self, session: &mut Session, level: u32) -> bool {
        if !self.can_unlock_via_ad(session, level) {
            return false;
        }
        session.highest_unlocked_level = level;
        log::info!("Unlocked level {} via rewarded ad", level);
        true
    }

    /// Clamp a requested start level to something the player may enter
    pub fn playable_level(&self, session: &Session, level: u32) -> u32 {
        if self.is_unlocked(session, level) {
            level
        } else {
            session.highest_unlocked_level.max(1)
        }
    }
}
