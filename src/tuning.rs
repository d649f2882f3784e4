//! Game balance and physics parameters
//!
//! Loaded from JSON when present, otherwise compiled-in defaults are used.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::TuningError;

/// Data-driven balance values shared by the simulation and the state machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Physics ===
    /// Downward acceleration (px/s²)
    pub gravity: f32,
    /// Terminal fall speed (px/s)
    pub max_fall_speed: f32,
    /// Vertical velocity applied on jump (negative = up)
    pub jump_impulse: f32,
    /// Horizontal auto-run speed (px/s)
    pub run_speed: f32,
    /// Player bounding box
    pub player_width: f32,
    pub player_height: f32,
    /// Largest frame delta the simulation will integrate
    pub max_frame_dt: f32,

    // === Damage ===
    pub max_health: u8,
    /// Health removed per laser hit (max_health = one-hit kill)
    pub hazard_damage: u8,
    /// Player invulnerability after a hit (seconds)
    pub invulnerability_secs: f32,
    /// Per-trap suppression after it lands a hit (seconds)
    pub trap_hit_cooldown_secs: f32,

    // === Scoring ===
    pub orb_score: u64,
    /// Time bonus points per second remaining
    pub time_bonus_rate: f32,
    pub time_bonus_cap: u64,
    /// Currency granted for each completed level
    pub level_currency_reward: u64,

    // === Generation ===
    /// Samples per clearance tier before relaxing
    pub placement_attempts: u32,

    // === Collaborators ===
    /// Ad, asset and store calls that take longer than this count as failed
    pub collaborator_timeout_secs: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            gravity: 1500.0,
            max_fall_speed: 900.0,
            jump_impulse: -640.0,
            run_speed: 150.0,
            player_width: 28.0,
            player_height: 36.0,
            max_frame_dt: 0.1,

            max_health: 3,
            hazard_damage: 1,
            invulnerability_secs: 1.0,
            trap_hit_cooldown_secs: 0.5,

            orb_score: 100,
            time_bonus_rate: 10.0,
            time_bonus_cap: 1000,
            level_currency_reward: 50,

            placement_attempts: 64,

            collaborator_timeout_secs: 10.0,
        }
    }
}

impl Tuning {
    /// Parse and validate tuning from a JSON document
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load tuning from a file, falling back to defaults on any failure
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(tuning) => {
                log::info!("Loaded tuning from {}", path.display());
                tuning
            }
            Err(e) => {
                log::warn!("Using default tuning ({}): {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        if self.gravity <= 0.0 {
            return Err(TuningError::Invalid("gravity must be positive".into()));
        }
        if self.jump_impulse >= 0.0 {
            return Err(TuningError::Invalid("jump_impulse must point up (negative)".into()));
        }
        if self.player_width <= 0.0 || self.player_height <= 0.0 {
            return Err(TuningError::Invalid("player size must be positive".into()));
        }
        if self.max_health == 0 {
            return Err(TuningError::Invalid("max_health must be at least 1".into()));
        }
        if self.max_frame_dt <= 0.0 || self.max_fall_speed <= 0.0 {
            return Err(TuningError::Invalid("max_frame_dt and max_fall_speed must be positive".into()));
        }
        if self.placement_attempts == 0 {
            return Err(TuningError::Invalid("placement_attempts must be at least 1".into()));
        }
        if self.invulnerability_secs < 0.0 || self.trap_hit_cooldown_secs < 0.0 {
            return Err(TuningError::Invalid("damage cooldowns must not be negative".into()));
        }
        if self.time_bonus_rate < 0.0 {
            return Err(TuningError::Invalid("time_bonus_rate must not be negative".into()));
        }
        if self.collaborator_timeout_secs <= 0.0 {
            return Err(TuningError::Invalid("collaborator_timeout_secs must be positive".into()));
        }
        Ok(())
    }

    /// Deadline for one ad, asset or store call
    pub fn collaborator_timeout(&self) -> Duration {
        Duration::try_from_secs_f32(self.collaborator_timeout_secs)
            .unwrap_or(Duration::from_secs(10))
    }

    /// Time bonus for finishing with `remaining` seconds left
    pub fn time_bonus(&self, remaining: f64) -> u64 {
        let raw = (remaining.max(0.0) * self.time_bonus_rate as f64).floor() as u64;
        raw.min(self.time_bonus_cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let tuning = Tuning::from_json(r#"{ "hazard_damage": 3 }"#).unwrap();
        assert_eq!(tuning.hazard_damage, 3);
        assert_eq!(tuning.max_health, Tuning::default().max_health);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(Tuning::from_json(r#"{ "gravity": -1.0 }"#).is_err());
        assert!(Tuning::from_json(r#"{ "jump_impulse": 400.0 }"#).is_err());
        assert!(Tuning::from_json("not json").is_err());
    }

    #[test]
    fn test_negative_timers_rejected() {
        assert!(Tuning::from_json(r#"{ "invulnerability_secs": -1.0 }"#).is_err());
        assert!(Tuning::from_json(r#"{ "trap_hit_cooldown_secs": -0.5 }"#).is_err());
        assert!(Tuning::from_json(r#"{ "time_bonus_rate": -10.0 }"#).is_err());
        assert!(Tuning::from_json(r#"{ "collaborator_timeout_secs": 0.0 }"#).is_err());
        // Zero cooldowns are allowed
        assert!(Tuning::from_json(r#"{ "invulnerability_secs": 0.0, "time_bonus_rate": 0.0 }"#).is_ok());
    }

    #[test]
    fn test_collaborator_timeout() {
        let tuning = Tuning {
            collaborator_timeout_secs: 0.25,
            ..Tuning::default()
        };
        assert_eq!(tuning.collaborator_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_missing_file_falls_back() {
        let tuning = Tuning::load_or_default("/definitely/not/here/tuning.json");
        assert_eq!(tuning, Tuning::default());
    }

    #[test]
    fn test_time_bonus_clamped() {
        let tuning = Tuning::default();
        assert_eq!(tuning.time_bonus(12.5), 125);
        assert_eq!(tuning.time_bonus(-4.0), 0);
        assert_eq!(tuning.time_bonus(10_000.0), tuning.time_bonus_cap);
    }
}
