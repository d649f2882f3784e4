//! Read-only frame snapshot for renderers and HUDs
//!
//! Built from the session and world after each update. Holds plain values so
//! a presentation layer can keep it across frames without borrowing the game.

use glam::Vec2;
use serde::Serialize;

use crate::sim::{GamePhase, PlatformMotion, Rect, Session, World};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlayerView {
    pub rect: Rect,
    pub vel: Vec2,
    pub on_ground: bool,
    /// Renderer blinks the sprite while set
    pub invulnerable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PlatformView {
    pub id: u32,
    pub rect: Rect,
    pub moving: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrbView {
    pub id: u32,
    pub center: Vec2,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrapView {
    pub id: u32,
    pub rect: Rect,
    pub active: bool,
    /// Progress through the current phase in [0, 1]
    pub phase_fraction: f32,
}

/// HUD values
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Hud {
    pub level: u32,
    pub orbs_collected: u32,
    pub required_orbs: u32,
    /// `None` on unbounded levels
    pub time_remaining: Option<f64>,
    pub score: u64,
    pub health: u8,
    pub max_health: u8,
    pub currency: u64,
    pub phase: GamePhase,
}

impl Hud {
    /// Enough orbs collected for the portal to accept the player
    pub fn portal_open(&self) -> bool {
        self.orbs_collected >= self.required_orbs
    }
}

/// Everything needed to draw one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameView {
    pub world_size: Vec2,
    pub player: PlayerView,
    pub platforms: Vec<PlatformView>,
    pub orbs: Vec<OrbView>,
    pub traps: Vec<TrapView>,
    pub portal: Rect,
    pub hud: Hud,
}

impl FrameView {
    pub fn capture(session: &Session, world: &World) -> Self {
        let player = &world.player;
        Self {
            world_size: Vec2::new(world.width, world.height),
            player: PlayerView {
                rect: player.rect(),
                vel: player.vel,
                on_ground: player.on_ground,
                invulnerable: player.is_invulnerable(),
            },
            platforms: world
                .platforms
                .iter()
                .map(|p| PlatformView {
                    id: p.id,
                    rect: p.rect,
                    moving: matches!(p.motion, PlatformMotion::Moving { .. }),
                })
                .collect(),
            orbs: world
                .orbs
                .iter()
                .filter(|o| !o.collected)
                .map(|o| OrbView {
                    id: o.id,
                    center: o.shape.center,
                    radius: o.shape.radius,
                })
                .collect(),
            traps: world
                .traps
                .iter()
                .map(|t| TrapView {
                    id: t.id,
                    rect: t.rect,
                    active: t.is_active,
                    phase_fraction: t.phase_fraction(),
                })
                .collect(),
            portal: world.portal.rect,
            hud: Hud {
                level: session.current_level,
                orbs_collected: session.orbs_collected_this_level,
                required_orbs: session.required_orbs,
                time_remaining: session.time_remaining(),
                score: session.score,
                health: player.health,
                max_health: player.max_health,
                currency: session.total_currency,
                phase: session.phase,
            },
        }
    }

    /// Vertical camera offset that keeps the player in view, clamped to the level
    pub fn camera_y(&self, viewport_height: f32) -> f32 {
        let target = self.player.rect.center().y - viewport_height * 0.6;
        target.clamp(0.0, (self.world_size.y - viewport_height).max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::generate;
    use crate::tuning::Tuning;

    fn capture(level: u32) -> FrameView {
        let tuning = Tuning::default();
        let config = generate(level, 99).unwrap();
        let world = World::from_config(&config, &tuning);
        let mut session = Session::default();
        session.begin_level(level);
        session.required_orbs = config.required_orb_count;
        session.time_limit = config.time_limit;
        session.phase = GamePhase::Playing;
        FrameView::capture(&session, &world)
    }

    #[test]
    fn test_hud_reflects_session() {
        let view = capture(2);
        assert_eq!(view.hud.level, 2);
        assert_eq!(view.hud.required_orbs, 5);
        assert_eq!(view.hud.time_remaining, Some(90.0));
        assert_eq!(view.hud.health, 3);
        assert!(!view.hud.portal_open());
        assert_eq!(view.orbs.len(), 5);
        assert_eq!(view.traps.len(), 2);
    }

    #[test]
    fn test_unbounded_level_has_no_clock() {
        assert_eq!(capture(1).hud.time_remaining, None);
    }

    #[test]
    fn test_camera_stays_in_level() {
        let view = capture(3);
        let camera = view.camera_y(640.0);
        assert!(camera >= 0.0);
        assert!(camera <= view.world_size.y - 640.0);
    }
}
