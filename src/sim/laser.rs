//! Laser trap hazard: a beam that cycles between active and inactive
//!
//! The active/inactive cycle has no memory of collisions. A separate
//! one-shot hit cooldown suppresses repeat hits right after the trap lands one.

use serde::{Deserialize, Serialize};

use super::geometry::Rect;

/// Shortest phase the cycle accepts, keeps `advance` finite
const MIN_PHASE_SECS: f32 = 0.01;

/// Generation-time description of a trap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaserTrapSpec {
    pub rect: Rect,
    pub active_duration: f32,
    pub inactive_duration: f32,
    /// Starting point within the cycle, in [0, period)
    pub phase_offset: f32,
}

impl LaserTrapSpec {
    pub fn period(&self) -> f32 {
        self.active_duration + self.inactive_duration
    }
}

/// Live trap instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaserTrap {
    pub id: u32,
    pub rect: Rect,
    pub active_duration: f32,
    pub inactive_duration: f32,
    /// Seconds spent in the current phase
    pub phase_timer: f32,
    pub is_active: bool,
    /// Seconds until this trap may land another hit
    pub hit_cooldown: f32,
}

impl LaserTrap {
    pub fn from_spec(id: u32, spec: &LaserTrapSpec) -> Self {
        let active_duration = spec.active_duration.max(MIN_PHASE_SECS);
        let inactive_duration = spec.inactive_duration.max(MIN_PHASE_SECS);
        let offset = spec.phase_offset.rem_euclid(active_duration + inactive_duration);
        let (is_active, phase_timer) = if offset < active_duration {
            (true, offset)
        } else {
            (false, offset - active_duration)
        };
        Self {
            id,
            rect: spec.rect,
            active_duration,
            inactive_duration,
            phase_timer,
            is_active,
            hit_cooldown: 0.0,
        }
    }

    /// Length of the phase the trap is currently in
    #[inline]
    pub fn current_phase_duration(&self) -> f32 {
        if self.is_active {
            self.active_duration
        } else {
            self.inactive_duration
        }
    }

    /// Advance the cycle and the hit cooldown by `dt`
    pub fn advance(&mut self, dt: f32) {
        self.hit_cooldown = (self.hit_cooldown - dt).max(0.0);
        self.phase_timer += dt;
        while self.phase_timer >= self.current_phase_duration() {
            self.phase_timer -= self.current_phase_duration();
            self.is_active = !self.is_active;
        }
    }

    /// Only an active beam hurts
    #[inline]
    pub fn is_dangerous(&self) -> bool {
        self.is_active
    }

    /// Dangerous and not inside its own post-hit cooldown
    pub fn can_hit(&self) -> bool {
        self.is_active && self.hit_cooldown <= 0.0
    }

    pub fn register_hit(&mut self, cooldown: f32) {
        self.hit_cooldown = cooldown;
    }

    /// Progress through the current phase in [0, 1), for presentation
    pub fn phase_fraction(&self) -> f32 {
        (self.phase_timer / self.current_phase_duration()).clamp(0.0, 1.0)
    }

    pub fn time_until_toggle(&self) -> f32 {
        (self.current_phase_duration() - self.phase_timer).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trap(active: f32, inactive: f32, offset: f32) -> LaserTrap {
        LaserTrap::from_spec(
            1,
            &LaserTrapSpec {
                rect: Rect::new(0.0, 0.0, 100.0, 8.0),
                active_duration: active,
                inactive_duration: inactive,
                phase_offset: offset,
            },
        )
    }

    #[test]
    fn test_cycle_toggles() {
        let mut t = trap(2.0, 1.0, 0.0);
        assert!(t.is_active);
        t.advance(1.5);
        assert!(t.is_active);
        t.advance(0.5);
        assert!(!t.is_active);
        t.advance(1.0);
        assert!(t.is_active);
    }

    #[test]
    fn test_phase_offset_starts_inactive() {
        let t = trap(2.0, 1.0, 2.5);
        assert!(!t.is_active);
        assert!((t.phase_timer - 0.5).abs() < 1e-5);
        assert!((t.phase_fraction() - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_large_step_wraps_multiple_periods() {
        let mut t = trap(1.0, 0.5, 0.0);
        // 3.25s = two full periods (3.0) + 0.25 into active
        t.advance(3.25);
        assert!(t.is_active);
        assert!((t.phase_timer - 0.25).abs() < 1e-4);
    }

    #[test]
    fn test_hit_cooldown_independent_of_cycle() {
        let mut t = trap(3.0, 1.0, 0.0);
        assert!(t.can_hit());
        t.register_hit(0.5);
        assert!(t.is_dangerous());
        assert!(!t.can_hit());
        t.advance(0.5);
        assert!(t.can_hit());
    }
}
