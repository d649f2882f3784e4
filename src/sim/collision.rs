//! Player-vs-world collision detection and response
//!
//! Detection gathers every contact for the step; response looks up each
//! contact's kind in the interaction table and applies that effect. Platforms
//! are one-way: only a falling player whose feet started above the top edge lands.

use serde::{Deserialize, Serialize};

use super::geometry::rect_circle_overlap;
use super::state::{EntityKind, World};
use crate::tuning::Tuning;

/// Feet may start this far below a platform top and still land (float slack)
const LANDING_EPSILON: f32 = 0.01;

/// Effect of the player touching an entity kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    Land,
    Collect,
    Damage,
    Enter,
}

/// Player x entity-kind resolution table
pub const fn interaction(kind: EntityKind) -> Interaction {
    match kind {
        EntityKind::Platform | EntityKind::MovingPlatform => Interaction::Land,
        EntityKind::EnergyOrb => Interaction::Collect,
        EntityKind::LaserTrap => Interaction::Damage,
        EntityKind::ExitPortal => Interaction::Enter,
    }
}

/// Something that happened to the player this step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CollisionEvent {
    Landed { platform_id: u32 },
    OrbCollected { orb_id: u32 },
    HazardHit { trap_id: u32, damage: u8 },
    PortalEntered,
}

/// A detected overlap, indexing into the world's entity list for `kind`
#[derive(Debug, Clone, Copy)]
struct Contact {
    kind: EntityKind,
    index: usize,
}

/// Gather contacts in resolution order: platforms (highest top first), orbs, traps, portal
fn detect(world: &World, prev_bottom: f32) -> Vec<Contact> {
    let player = &world.player;
    let rect = player.rect();
    let mut contacts = Vec::new();

    if player.vel.y >= 0.0 {
        let mut landings: Vec<(usize, f32)> = world
            .platforms
            .iter()
            .enumerate()
            .filter(|(_, p)| {
                rect.overlaps_x(&p.rect)
                    && player.bottom() >= p.rect.top()
                    && prev_bottom <= p.rect.top() + LANDING_EPSILON
            })
            .map(|(i, p)| (i, p.rect.top()))
            .collect();
        landings.sort_by(|a, b| a.1.total_cmp(&b.1));
        contacts.extend(landings.into_iter().map(|(index, _)| Contact {
            kind: world.platforms[index].kind(),
            index,
        }));
    }

    for (index, orb) in world.orbs.iter().enumerate() {
        if !orb.collected && rect_circle_overlap(&rect, &orb.shape) {
            contacts.push(Contact {
                kind: EntityKind::EnergyOrb,
                index,
            });
        }
    }

    for (index, trap) in world.traps.iter().enumerate() {
        if trap.is_dangerous() && rect.overlaps(&trap.rect) {
            contacts.push(Contact {
                kind: EntityKind::LaserTrap,
                index,
            });
        }
    }

    if rect.overlaps(&world.portal.rect) {
        contacts.push(Contact {
            kind: EntityKind::ExitPortal,
            index: 0,
        });
    }

    contacts
}

/// Resolve the player against every world entity for one step
///
/// `prev_bottom` is the player's feet y before this step's integration.
pub fn resolve(world: &mut World, prev_bottom: f32, tuning: &Tuning, dt: f32) -> Vec<CollisionEvent> {
    let contacts = detect(world, prev_bottom);
    let mut events = Vec::with_capacity(contacts.len());
    let mut landed = false;

    for contact in contacts {
        match interaction(contact.kind) {
            Interaction::Land => {
                // Only the highest crossed surface counts
                if landed {
                    continue;
                }
                landed = true;
                let platform = &world.platforms[contact.index];
                let player = &mut world.player;
                player.vel.y = 0.0;
                player.pos.y = platform.rect.top() - player.size.y;
                player.on_ground = true;
                if contact.kind == EntityKind::MovingPlatform {
                    // Ride along for this step only
                    player.pos.x = (player.pos.x + platform.velocity_x * dt)
                        .clamp(0.0, (world.width - player.size.x).max(0.0));
                }
                events.push(CollisionEvent::Landed {
                    platform_id: platform.id,
                });
            }
            Interaction::Collect => {
                let orb = &mut world.orbs[contact.index];
                if orb.collected {
                    continue;
                }
                orb.collected = true;
                world.player.orbs_collected += 1;
                world.player.score += tuning.orb_score;
                events.push(CollisionEvent::OrbCollected { orb_id: orb.id });
            }
            Interaction::Damage => {
                let trap = &mut world.traps[contact.index];
                let player = &mut world.player;
                if !trap.can_hit() || player.is_invulnerable() || player.is_dead() {
                    continue;
                }
                player.take_damage(tuning.hazard_damage, tuning.invulnerability_secs);
                trap.register_hit(tuning.trap_hit_cooldown_secs);
                events.push(CollisionEvent::HazardHit {
                    trap_id: trap.id,
                    damage: tuning.hazard_damage,
                });
            }
            Interaction::Enter => events.push(CollisionEvent::PortalEntered),
        }
    }

    // Collected orbs leave the live set
    world.orbs.retain(|orb| !orb.collected);

    events
}
