//! World state management.
//!
//! Owns every player and bot, the static buildings and the spatial grid.
//! Only the game state touches it, one mutation at a time.

use crate::config::WorldConfig;
use crate::entity::{Bot, Entity, Player};
use crate::map::Building;
use crate::spatial::SpatialGrid;
use glam::Vec2;
use protocol::packets::EntityRecord;
use std::collections::{HashMap, HashSet};

/// The game world containing all vehicles.
#[derive(Debug)]
pub struct World {
    /// Next id to try. Clients and bots share one id space.
    next_id: u32,
    /// Ids held by connected clients, joined or not.
    reserved: HashSet<u32>,

    /// All entities by id.
    entities: HashMap<u32, Entity>,

    /// Player ids in join order.
    player_ids: Vec<u32>,
    /// Bot ids in spawn order (oldest first).
    bot_ids: Vec<u32>,

    buildings: Vec<Building>,
    building_margin: f32,

    /// Wrapping world border.
    pub border: WorldBorder,

    /// Grid over live entities, rebuilt every tick.
    pub grid: SpatialGrid,
}

/// Toroidal world bounds: `-half_size..=half_size` on both axes.
#[derive(Debug, Clone, Copy)]
pub struct WorldBorder {
    pub half_size: f32,
    pub size: f32,
}

impl WorldBorder {
    pub fn new(half_size: f32) -> Self {
        Self {
            half_size,
            size: half_size * 2.0,
        }
    }

    /// Move a coordinate past one bound onto the opposite bound.
    #[inline]
    pub fn wrap(&self, v: f32) -> f32 {
        if v > self.half_size {
            -self.half_size
        } else if v < -self.half_size {
            self.half_size
        } else {
            v
        }
    }

    #[inline]
    pub fn wrap_point(&self, p: Vec2) -> Vec2 {
        Vec2::new(self.wrap(p.x), self.wrap(p.y))
    }

    /// Shortest signed per-axis offset from `a` to `b` across the wrap.
    #[inline]
    pub fn delta(&self, a: Vec2, b: Vec2) -> Vec2 {
        Vec2::new(self.fold(b.x - a.x), self.fold(b.y - a.y))
    }

    #[inline]
    fn fold(&self, d: f32) -> f32 {
        if d > self.half_size {
            d - self.size
        } else if d < -self.half_size {
            d + self.size
        } else {
            d
        }
    }

    /// Squared toroidal distance.
    #[inline]
    pub fn distance_sq(&self, a: Vec2, b: Vec2) -> f32 {
        self.delta(a, b).length_squared()
    }
}

impl World {
    /// Create a new world around a fixed building list.
    pub fn new(config: &WorldConfig, buildings: Vec<Building>) -> Self {
        Self {
            next_id: 1,
            reserved: HashSet::new(),
            entities: HashMap::with_capacity(128),
            player_ids: Vec::with_capacity(64),
            bot_ids: Vec::with_capacity(64),
            buildings,
            building_margin: config.building_margin,
            border: WorldBorder::new(config.half_size),
            grid: SpatialGrid::wrapping(config.cell_size, config.half_size),
        }
    }

    /// Get an id that no entity or connected client holds.
    pub fn next_id(&mut self) -> u32 {
        loop {
            let id = self.next_id;
            self.next_id = self.next_id.wrapping_add(1).max(1);
            if !self.entities.contains_key(&id) && !self.reserved.contains(&id) {
                return id;
            }
        }
    }

    /// Allocate an id for a new client. It stays reserved until released, so
    /// bots never take it while the client has no vehicle.
    pub fn reserve_id(&mut self) -> u32 {
        let id = self.next_id();
        self.reserved.insert(id);
        id
    }

    pub fn release_id(&mut self, id: u32) {
        self.reserved.remove(&id);
    }

    #[inline]
    pub fn get(&self, id: u32) -> Option<&Entity> {
        self.entities.get(&id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: u32) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn player(&self, id: u32) -> Option<&Player> {
        self.entities.get(&id).and_then(Entity::as_player)
    }

    pub fn bot(&self, id: u32) -> Option<&Bot> {
        self.entities.get(&id).and_then(Entity::as_bot)
    }

    pub fn bot_mut(&mut self, id: u32) -> Option<&mut Bot> {
        self.entities.get_mut(&id).and_then(Entity::as_bot_mut)
    }

    /// Add a player to the world.
    pub fn add_player(&mut self, player: Player) -> u32 {
        let id = player.vehicle.id;
        if self.entities.insert(id, Entity::Player(player)).is_none() {
            self.player_ids.push(id);
        }
        id
    }

    /// Add a bot to the world. It is indexed immediately so later movers in
    /// the same tick can see it.
    pub fn add_bot(&mut self, bot: Bot) -> u32 {
        let id = bot.vehicle.id;
        let pos = bot.vehicle.position;
        if self.entities.insert(id, Entity::Bot(bot)).is_none() {
            self.bot_ids.push(id);
        }
        self.grid.insert(id, pos.x, pos.y);
        id
    }

    /// Remove an entity from the world.
    pub fn remove(&mut self, id: u32) -> Option<Entity> {
        let entry = self.entities.remove(&id)?;
        match entry {
            Entity::Player(_) => self.player_ids.retain(|&p| p != id),
            Entity::Bot(_) => self.bot_ids.retain(|&b| b != id),
        }
        Some(entry)
    }

    pub fn remove_player(&mut self, id: u32) -> Option<Player> {
        match self.entities.get(&id) {
            Some(Entity::Player(_)) => match self.remove(id) {
                Some(Entity::Player(p)) => Some(p),
                _ => None,
            },
            _ => None,
        }
    }

    /// Apply a client-reported pose. Dropped unless every value is finite
    /// and the player is alive. Returns whether the pose was applied.
    pub fn upsert_player_position(&mut self, id: u32, x: f32, z: f32, heading: f32) -> bool {
        if !(x.is_finite() && z.is_finite() && heading.is_finite()) {
            return false;
        }
        let border = self.border;
        match self.entities.get_mut(&id) {
            Some(Entity::Player(player)) if player.vehicle.is_alive() => {
                player.vehicle.position = border.wrap_point(Vec2::new(x, z));
                player.vehicle.heading = heading;
                true
            }
            _ => false,
        }
    }

    /// Player ids in join order, dead or alive.
    #[inline]
    pub fn player_ids(&self) -> &[u32] {
        &self.player_ids
    }

    /// Bot ids, oldest first.
    #[inline]
    pub fn bot_ids(&self) -> &[u32] {
        &self.bot_ids
    }

    #[inline]
    pub fn player_count(&self) -> usize {
        self.player_ids.len()
    }

    pub fn live_bot_count(&self) -> usize {
        self.bot_ids
            .iter()
            .filter(|id| self.entities.get(id).is_some_and(|e| e.data().is_alive()))
            .count()
    }

    /// Positions of live players.
    pub fn live_player_positions(&self) -> Vec<Vec2> {
        self.player_ids
            .iter()
            .filter_map(|id| self.entities.get(id))
            .filter(|e| e.data().is_alive())
            .map(|e| e.data().position)
            .collect()
    }

    /// Live players and bots, players first, each in insertion order.
    pub fn list_live(&self) -> Vec<&Entity> {
        self.player_ids
            .iter()
            .chain(self.bot_ids.iter())
            .filter_map(|id| self.entities.get(id))
            .filter(|e| e.data().is_alive())
            .collect()
    }

    /// Wire records of every live entity.
    pub fn all_for_broadcast_snapshot(&self) -> Vec<EntityRecord> {
        self.list_live().into_iter().map(Entity::record).collect()
    }

    /// Rebuild the spatial grid from live entities.
    pub fn rebuild_grid(&mut self) {
        let items: Vec<(u32, f32, f32)> = self
            .list_live()
            .into_iter()
            .map(|e| {
                let d = e.data();
                (d.id, d.position.x, d.position.y)
            })
            .collect();
        self.grid.rebuild(items);
    }

    #[inline]
    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    /// Whether a point lies inside any padded building rectangle.
    pub fn blocked_by_building(&self, x: f32, z: f32) -> bool {
        let margin = self.building_margin;
        self.buildings
            .iter()
            .any(|b| b.collision_bounds(margin).contains(x, z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayerConfig;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn world_with_player() -> World {
        let mut world = World::new(&WorldConfig::default(), Vec::new());
        let mut rng = StdRng::seed_from_u64(1);
        world.add_player(Player::spawn(1, "Ace".into(), &PlayerConfig::default(), 0, &mut rng));
        world
    }

    #[test]
    fn test_wrap() {
        let border = WorldBorder::new(1000.0);
        assert_eq!(border.wrap(1001.0), -1000.0);
        assert_eq!(border.wrap(-1000.5), 1000.0);
        assert_eq!(border.wrap(1000.0), 1000.0);
        assert_eq!(border.wrap(12.0), 12.0);
    }

    #[test]
    fn test_toroidal_distance() {
        let border = WorldBorder::new(1000.0);
        let a = Vec2::new(990.0, 0.0);
        let b = Vec2::new(-990.0, 0.0);
        assert_eq!(border.delta(a, b), Vec2::new(20.0, 0.0));
        assert_eq!(border.distance_sq(a, b), 400.0);
        assert_eq!(border.distance_sq(Vec2::ZERO, Vec2::new(3.0, 4.0)), 25.0);
    }

    #[test]
    fn test_upsert_player_position() {
        let mut world = world_with_player();
        assert!(world.upsert_player_position(1, 10.0, 20.0, 0.5));
        let p = world.player(1).unwrap();
        assert_eq!(p.vehicle.position, Vec2::new(10.0, 20.0));
        assert_eq!(p.vehicle.heading, 0.5);

        assert!(!world.upsert_player_position(1, f32::NAN, 0.0, 0.0));
        assert!(!world.upsert_player_position(1, 0.0, f32::INFINITY, 0.0));
        assert!(!world.upsert_player_position(2, 0.0, 0.0, 0.0));
        assert_eq!(world.player(1).unwrap().vehicle.position, Vec2::new(10.0, 20.0));
    }

    #[test]
    fn test_upsert_wraps_position() {
        let mut world = world_with_player();
        assert!(world.upsert_player_position(1, 1001.0, -1001.0, 0.0));
        assert_eq!(world.player(1).unwrap().vehicle.position, Vec2::new(-1000.0, 1000.0));
    }

    #[test]
    fn test_dead_player_position_ignored() {
        let mut world = world_with_player();
        if let Some(entity) = world.get_mut(1) {
            while entity.data_mut().lose_hp() > 0 {}
        }
        assert!(!world.upsert_player_position(1, 5.0, 5.0, 0.0));
        assert!(world.list_live().is_empty());
        assert_eq!(world.player_count(), 1);
    }

    #[test]
    fn test_bot_ids_keep_spawn_order() {
        let mut world = world_with_player();
        let mut rng = StdRng::seed_from_u64(2);
        let ids: Vec<u32> = (0..3)
            .map(|_| {
                let id = world.next_id();
                world.add_bot(Bot::spawn(id, Vec2::ZERO, 5, &mut rng))
            })
            .collect();
        assert_eq!(world.bot_ids(), ids.as_slice());
        assert_eq!(ids, vec![2, 3, 4]);
        world.remove(ids[1]);
        assert_eq!(world.bot_ids(), &[ids[0], ids[2]]);
        assert_eq!(world.live_bot_count(), 2);
        assert!(world.remove_player(ids[0]).is_none());
        assert!(world.remove_player(1).is_some());
        assert_eq!(world.player_count(), 0);
    }

    #[test]
    fn test_ids_skip_taken_and_reserved() {
        let mut world = world_with_player();
        let mut rng = StdRng::seed_from_u64(3);
        let client = world.reserve_id();
        assert_eq!(client, 2);
        let bot = world.next_id();
        world.add_bot(Bot::spawn(bot, Vec2::ZERO, 5, &mut rng));
        assert_eq!(bot, 3);

        // Counter wrapped around onto ids that are still in use.
        world.next_id = 1;
        assert_eq!(world.reserve_id(), 4);
        world.release_id(client);
        world.next_id = 1;
        assert_eq!(world.next_id(), 2);
    }

    #[test]
    fn test_blocked_by_building() {
        let building = Building::new(Vec2::new(100.0, 100.0), 20.0, 30.0, 20.0, 0.5);
        let world = World::new(&WorldConfig::default(), vec![building]);
        // Rectangle is 90.5..109.5, padded by 1.0.
        assert!(world.blocked_by_building(89.6, 100.0));
        assert!(!world.blocked_by_building(89.4, 100.0));
        assert!(world.blocked_by_building(100.0, 110.4));
    }
}
