//! Bot population control.
//!
//! Keeps the number of bots tracking the number of connected players and
//! culls bots that drifted away from every player.

use crate::config::BotConfig;
use crate::entity::Bot;
use crate::events::EventQueue;
use crate::world::World;
use glam::Vec2;
use protocol::packets::ServerPacket;
use rand::Rng;
use rand::seq::IndexedRandom;
use std::f32::consts::TAU;
use tracing::debug;

/// Bots added and removed by one [`PopulationManager::adjust`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Adjustment {
    pub spawned: Option<u32>,
    pub removed: Vec<u32>,
}

/// Spawns and removes bots.
#[derive(Debug, Clone)]
pub struct PopulationManager {
    max_bots: usize,
    bonus: usize,
    despawn_distance_sq: f32,
    spawn_attempts: u32,
    spawn_min_distance: f32,
    spawn_max_distance: f32,
    spawn_clearance_sq: f32,
    fallback_spawn: Vec2,
    max_hp: u8,
}

impl PopulationManager {
    pub fn new(config: &BotConfig, max_hp: u8) -> Self {
        Self {
            max_bots: config.max_bots,
            bonus: config.bots_per_player_bonus,
            despawn_distance_sq: config.despawn_distance * config.despawn_distance,
            spawn_attempts: config.spawn_attempts,
            spawn_min_distance: config.spawn_min_distance.min(config.spawn_max_distance),
            spawn_max_distance: config.spawn_min_distance.max(config.spawn_max_distance),
            spawn_clearance_sq: config.spawn_clearance * config.spawn_clearance,
            fallback_spawn: Vec2::from(config.fallback_spawn),
            max_hp,
        }
    }

    /// Bots wanted for `player_count` connected players.
    #[inline]
    pub fn target_count(&self, player_count: usize) -> usize {
        if player_count == 0 {
            0
        } else {
            (player_count + self.bonus).min(self.max_bots)
        }
    }

    /// Remove every bot farther than the despawn distance from the nearest
    /// live player. Does nothing while no player is connected.
    pub fn despawn_strays(&self, world: &mut World, events: &mut EventQueue) -> Vec<u32> {
        if world.player_count() == 0 {
            return Vec::new();
        }

        let players = world.live_player_positions();
        let border = world.border;
        let strays: Vec<u32> = world
            .bot_ids()
            .iter()
            .copied()
            .filter(|&id| {
                let Some(bot) = world.bot(id) else {
                    return false;
                };
                let nearest = players
                    .iter()
                    .map(|&p| border.distance_sq(bot.vehicle.position, p))
                    .fold(f32::INFINITY, f32::min);
                nearest > self.despawn_distance_sq
            })
            .collect();

        for &id in &strays {
            world.remove(id);
            events.broadcast(ServerPacket::EntityRemoved { id });
            debug!("Despawned stray bot {}", id);
        }
        strays
    }

    /// Move the live bot count one step toward the target: spawn at most one
    /// bot, or remove the oldest bots above the target.
    pub fn adjust<R: Rng>(&self, world: &mut World, events: &mut EventQueue, rng: &mut R) -> Adjustment {
        let target = self.target_count(world.player_count());
        let live = world.live_bot_count();
        let mut adjustment = Adjustment::default();

        if live < target {
            let Some(position) = self.find_spawn_point(world, rng) else {
                debug!("No live player to spawn a bot near");
                return adjustment;
            };
            let id = world.next_id();
            let bot = Bot::spawn(id, position, self.max_hp, rng);
            events.broadcast(ServerPacket::EntityCreated {
                id,
                entity: bot.vehicle.record(true),
            });
            debug!("Spawned bot {} ({}) at {:?}", id, bot.vehicle.name, position);
            world.add_bot(bot);
            adjustment.spawned = Some(id);
        } else if live > target {
            let excess: Vec<u32> = world.bot_ids().iter().take(live - target).copied().collect();
            for id in excess {
                world.remove(id);
                events.broadcast(ServerPacket::EntityRemoved { id });
                debug!("Removed surplus bot {}", id);
                adjustment.removed.push(id);
            }
        }

        adjustment
    }

    /// Pick a clear point near a random live player. Returns `None` when no
    /// player is alive, and the fallback position when every draw is blocked.
    pub fn find_spawn_point<R: Rng>(&self, world: &World, rng: &mut R) -> Option<Vec2> {
        let players = world.live_player_positions();
        let anchor = *players.choose(rng)?;

        for _ in 0..self.spawn_attempts {
            let angle = rng.random_range(0.0..TAU);
            let distance = rng.random_range(self.spawn_min_distance..=self.spawn_max_distance);
            let candidate = world
                .border
                .wrap_point(anchor + Vec2::new(angle.sin(), angle.cos()) * distance);
            if self.is_clear(world, candidate) {
                return Some(candidate);
            }
        }

        debug!("Spawn search exhausted, using fallback position");
        Some(self.fallback_spawn)
    }

    fn is_clear(&self, world: &World, at: Vec2) -> bool {
        !world.blocked_by_building(at.x, at.y)
            && world
                .list_live()
                .iter()
                .all(|e| world.border.distance_sq(at, e.data().position) >= self.spawn_clearance_sq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PlayerConfig, WorldConfig};
    use crate::entity::Player;
    use crate::map::Building;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn manager() -> PopulationManager {
        PopulationManager::new(&BotConfig::default(), 5)
    }

    fn add_player(world: &mut World, id: u32, at: Vec2) {
        let mut rng = StdRng::seed_from_u64(id as u64);
        world.add_player(Player::spawn(id, format!("P{id}"), &PlayerConfig::default(), 0, &mut rng));
        world.upsert_player_position(id, at.x, at.y, 0.0);
    }

    fn add_bot_at(world: &mut World, at: Vec2) -> u32 {
        let mut rng = StdRng::seed_from_u64(99);
        let id = world.next_id();
        world.add_bot(Bot::spawn(id, at, 5, &mut rng))
    }

    #[test]
    fn test_target_count() {
        let m = manager();
        assert_eq!(m.target_count(0), 0);
        assert_eq!(m.target_count(1), 4);
        assert_eq!(m.target_count(47), 50);
        assert_eq!(m.target_count(200), 50);
    }

    #[test]
    fn test_no_players_no_bots() {
        let mut world = World::new(&WorldConfig::default(), Vec::new());
        let mut events = EventQueue::new();
        let mut rng = StdRng::seed_from_u64(1);
        let adjustment = manager().adjust(&mut world, &mut events, &mut rng);
        assert_eq!(adjustment, Adjustment::default());
        assert!(events.is_empty());
    }

    #[test]
    fn test_spawns_one_per_call_up_to_target() {
        let mut world = World::new(&WorldConfig::default(), Vec::new());
        let mut events = EventQueue::new();
        let mut rng = StdRng::seed_from_u64(1);
        add_player(&mut world, 1, Vec2::ZERO);

        for expected in 1..=4 {
            let adjustment = manager().adjust(&mut world, &mut events, &mut rng);
            assert!(adjustment.spawned.is_some());
            assert_eq!(world.live_bot_count(), expected);
        }
        let adjustment = manager().adjust(&mut world, &mut events, &mut rng);
        assert_eq!(adjustment, Adjustment::default());
        assert_eq!(world.live_bot_count(), 4);

        let created = events
            .drain()
            .into_iter()
            .filter(|e| matches!(e.packet, ServerPacket::EntityCreated { .. }))
            .count();
        assert_eq!(created, 4);
    }

    #[test]
    fn test_surplus_removes_oldest_first() {
        let mut world = World::new(&WorldConfig::default(), Vec::new());
        let mut events = EventQueue::new();
        let mut rng = StdRng::seed_from_u64(1);
        add_player(&mut world, 1, Vec2::ZERO);
        let ids: Vec<u32> = (0..6).map(|i| add_bot_at(&mut world, Vec2::new(i as f32 * 20.0, 30.0))).collect();

        let adjustment = manager().adjust(&mut world, &mut events, &mut rng);
        assert_eq!(adjustment.removed, vec![ids[0], ids[1]]);
        assert_eq!(world.bot_ids(), &ids[2..]);
    }

    #[test]
    fn test_last_player_leaving_clears_bots() {
        let mut world = World::new(&WorldConfig::default(), Vec::new());
        let mut events = EventQueue::new();
        let mut rng = StdRng::seed_from_u64(1);
        add_player(&mut world, 1, Vec2::ZERO);
        add_bot_at(&mut world, Vec2::new(30.0, 0.0));
        add_bot_at(&mut world, Vec2::new(-30.0, 0.0));
        world.remove_player(1);

        manager().adjust(&mut world, &mut events, &mut rng);
        assert_eq!(world.live_bot_count(), 0);
    }

    #[test]
    fn test_despawns_bot_far_from_players() {
        let mut world = World::new(&WorldConfig::default(), Vec::new());
        let mut events = EventQueue::new();
        add_player(&mut world, 1, Vec2::ZERO);
        let near = add_bot_at(&mut world, Vec2::new(200.0, 0.0));
        let far = add_bot_at(&mut world, Vec2::new(0.0, 301.0));
        // Across the wrap this bot is 20 units away.
        let wrapped = add_bot_at(&mut world, Vec2::new(0.0, 0.0));
        world.upsert_player_position(1, 990.0, 0.0, 0.0);
        if let Some(bot) = world.bot_mut(wrapped) {
            bot.vehicle.position = Vec2::new(-990.0, 0.0);
        }

        let removed = manager().despawn_strays(&mut world, &mut events);
        assert!(removed.contains(&far));
        assert!(removed.contains(&near));
        assert!(!removed.contains(&wrapped));
        assert_eq!(world.bot_ids(), &[wrapped]);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_despawn_waits_for_players() {
        let mut world = World::new(&WorldConfig::default(), Vec::new());
        let mut events = EventQueue::new();
        add_bot_at(&mut world, Vec2::new(900.0, 900.0));
        assert!(manager().despawn_strays(&mut world, &mut events).is_empty());
        assert_eq!(world.live_bot_count(), 1);
    }

    #[test]
    fn test_spawn_point_in_annulus_and_clear() {
        let mut world = World::new(&WorldConfig::default(), Vec::new());
        add_player(&mut world, 1, Vec2::new(500.0, -200.0));
        let mut rng = StdRng::seed_from_u64(8);

        for _ in 0..50 {
            let point = manager().find_spawn_point(&world, &mut rng).unwrap();
            let d = world.border.distance_sq(point, Vec2::new(500.0, -200.0)).sqrt();
            assert!((80.0 - 1e-3..=120.0 + 1e-3).contains(&d), "{d}");
        }
    }

    #[test]
    fn test_spawn_falls_back_when_blocked() {
        // One building covering the whole world.
        let wall = Building::new(Vec2::ZERO, 4000.0, 10.0, 4000.0, 0.5);
        let mut world = World::new(&WorldConfig::default(), vec![wall]);
        add_player(&mut world, 1, Vec2::ZERO);
        let mut rng = StdRng::seed_from_u64(8);
        assert_eq!(manager().find_spawn_point(&world, &mut rng), Some(Vec2::ZERO));
    }

    #[test]
    fn test_spawn_needs_live_player() {
        let world = World::new(&WorldConfig::default(), Vec::new());
        let mut rng = StdRng::seed_from_u64(8);
        assert_eq!(manager().find_spawn_point(&world, &mut rng), None);
    }
}
