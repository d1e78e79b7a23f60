//! Contact damage, invulnerability windows and deaths.

use crate::ai::normalize_angle;
use crate::config::PlayerConfig;
use crate::entity::Entity;
use crate::events::EventQueue;
use crate::leaderboard::Leaderboard;
use crate::world::World;
use protocol::packets::ServerPacket;
use std::f32::consts::PI;
use tracing::{debug, info};

/// What a contact did to its victim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactOutcome {
    /// Unknown victim, already dead, not a player, or still invulnerable.
    Ignored,
    /// Lost a hit point and survived.
    Hit { hp: u8 },
    /// Lost the last hit point.
    Killed { survival_ms: u64 },
}

/// Applies contact damage to players.
#[derive(Debug, Clone)]
pub struct DamageSystem {
    invulnerability_ms: u64,
    knockback_force: f32,
}

impl DamageSystem {
    pub fn new(config: &PlayerConfig) -> Self {
        Self {
            invulnerability_ms: config.invulnerability_ms,
            knockback_force: config.knockback_force,
        }
    }

    /// Damage `victim_id` by one hit point unless it is inside its grace
    /// period. The knockback is pushed opposite to `attacker_heading`, or
    /// opposite to the victim's own heading when no attacker is known.
    pub fn apply_contact(
        &self,
        world: &mut World,
        leaderboard: &mut Leaderboard,
        events: &mut EventQueue,
        victim_id: u32,
        attacker_heading: Option<f32>,
        now: u64,
    ) -> ContactOutcome {
        let Some(Entity::Player(victim)) = world.get_mut(victim_id) else {
            return ContactOutcome::Ignored;
        };
        let vehicle = &mut victim.vehicle;
        if vehicle.is_dead() || now <= vehicle.invulnerable_until {
            return ContactOutcome::Ignored;
        }

        let hp = vehicle.lose_hp();
        vehicle.invulnerable_until = now + self.invulnerability_ms;
        events.broadcast(ServerPacket::HealthChanged { id: victim_id, hp });

        if vehicle.is_dead() {
            let survival_ms = victim.survival_ms(now);
            let name = victim.vehicle.name.clone();
            info!("Player {} ({}) died after {} ms", victim_id, name, survival_ms);
            events.broadcast(ServerPacket::EntityDied { id: victim_id });
            leaderboard.submit(name, survival_ms);
            events.broadcast(ServerPacket::LeaderboardSnapshot {
                entries: leaderboard.records(),
            });
            return ContactOutcome::Killed { survival_ms };
        }

        let angle = normalize_angle(attacker_heading.unwrap_or(vehicle.heading) + PI);
        debug!("Player {} hit, {} hp left", victim_id, hp);
        events.send_to(
            victim_id,
            ServerPacket::Knockback {
                target_id: victim_id,
                angle,
                force: self.knockback_force,
            },
        );
        ContactOutcome::Hit { hp }
    }
}
