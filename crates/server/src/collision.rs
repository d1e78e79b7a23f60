//! Collision detection and resolution for bot movement.
//!
//! Movement is resolved one axis at a time so a vehicle pressed against a
//! wall keeps sliding along it instead of sticking.

use crate::ai::normalize_angle;
use crate::config::BotConfig;
use crate::world::World;
use glam::Vec2;
use rand::Rng;
use std::f32::consts::PI;

/// What blocked an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Obstacle {
    Building,
    Vehicle { id: u32, is_player: bool },
}

/// Result of resolving one bot step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveOutcome {
    pub moved_x: bool,
    pub moved_z: bool,
    /// First obstacle hit on any axis.
    pub obstacle: Option<Obstacle>,
    /// Live player touched on a rejected axis.
    pub hit_player: Option<u32>,
    pub stunned: bool,
    /// Heading the bot was driving with before a stun turned it around.
    pub heading: f32,
}

impl MoveOutcome {
    #[inline]
    pub fn blocked(&self) -> bool {
        self.obstacle.is_some()
    }

    fn record(&mut self, obstacle: Obstacle) {
        if let Obstacle::Vehicle { id, is_player: true } = obstacle {
            self.hit_player.get_or_insert(id);
        }
        self.obstacle.get_or_insert(obstacle);
    }

    /// Vehicle to back away from, preferring a player.
    fn repel_from(&self) -> Option<u32> {
        match (self.hit_player, self.obstacle) {
            (Some(id), _) => Some(id),
            (None, Some(Obstacle::Vehicle { id, .. })) => Some(id),
            _ => None,
        }
    }
}

/// Validates bot steps against buildings and nearby vehicles.
#[derive(Debug, Clone)]
pub struct CollisionResolver {
    radius_sq: f32,
    stun_ticks: u32,
    recoil_speed: f32,
    repulse_distance: f32,
}

impl CollisionResolver {
    pub fn new(config: &BotConfig) -> Self {
        Self {
            radius_sq: config.collision_radius * config.collision_radius,
            stun_ticks: config.stun_ticks,
            recoil_speed: config.recoil_speed,
            repulse_distance: config.repulse_distance,
        }
    }

    /// First obstacle occupying `at`, ignoring `mover` and dead vehicles.
    pub fn obstacle_at(&self, world: &World, mover: u32, at: Vec2) -> Option<Obstacle> {
        let at = world.border.wrap_point(at);
        if world.blocked_by_building(at.x, at.y) {
            return Some(Obstacle::Building);
        }

        world
            .grid
            .query_neighborhood(at.x, at.y)
            .into_iter()
            .filter(|&id| id != mover)
            .filter_map(|id| world.get(id))
            .filter(|e| e.data().is_alive())
            .find(|e| world.border.distance_sq(at, e.data().position) < self.radius_sq)
            .map(|e| Obstacle::Vehicle {
                id: e.data().id,
                is_player: e.is_player(),
            })
    }

    /// Advance a bot by its heading and speed. Returns `None` when the bot is
    /// gone or dead.
    ///
    /// A bot that could not move on any axis, or that touched a live player,
    /// is stunned: it turns roughly around, recoils, and is pushed a fixed
    /// distance away from what it hit.
    pub fn resolve_move<R: Rng>(&self, world: &mut World, bot_id: u32, rng: &mut R) -> Option<MoveOutcome> {
        let (origin, heading, velocity) = {
            let vehicle = &world.bot(bot_id)?.vehicle;
            if vehicle.is_dead() {
                return None;
            }
            (vehicle.position, vehicle.heading, vehicle.forward() * vehicle.speed)
        };

        let mut outcome = MoveOutcome {
            heading,
            ..Default::default()
        };
        let mut pos = origin;

        if velocity.x != 0.0 {
            let candidate = Vec2::new(pos.x + velocity.x, pos.y);
            match self.obstacle_at(world, bot_id, candidate) {
                None => {
                    pos = candidate;
                    outcome.moved_x = true;
                }
                Some(obstacle) => outcome.record(obstacle),
            }
        }
        if velocity.y != 0.0 {
            let candidate = Vec2::new(pos.x, pos.y + velocity.y);
            match self.obstacle_at(world, bot_id, candidate) {
                None => {
                    pos = candidate;
                    outcome.moved_z = true;
                }
                Some(obstacle) => outcome.record(obstacle),
            }
        }
        pos = world.border.wrap_point(pos);

        let stuck = !outcome.moved_x && !outcome.moved_z && outcome.blocked();
        if stuck || outcome.hit_player.is_some() {
            outcome.stunned = true;
            pos = self.repulse(world, &outcome, pos);

            let twist: f32 = rng.random_range(-0.5..0.5);
            let bot = world.bot_mut(bot_id)?;
            bot.stun_ticks = self.stun_ticks;
            bot.vehicle.heading = normalize_angle(heading + PI + twist);
            bot.vehicle.speed = self.recoil_speed;
        }

        world.bot_mut(bot_id)?.vehicle.position = pos;
        Some(outcome)
    }

    /// Push `pos` away from the vehicle that was hit, or backwards along the
    /// heading for buildings. The push is dropped if it would land inside a
    /// building.
    fn repulse(&self, world: &World, outcome: &MoveOutcome, pos: Vec2) -> Vec2 {
        let backwards = -Vec2::new(outcome.heading.sin(), outcome.heading.cos());
        let away = outcome
            .repel_from()
            .and_then(|id| world.get(id))
            .map(|e| -world.border.delta(pos, e.data().position).normalize_or_zero())
            .filter(|dir| *dir != Vec2::ZERO)
            .unwrap_or(backwards);

        let pushed = world.border.wrap_point(pos + away * self.repulse_distance);
        if world.blocked_by_building(pushed.x, pushed.y) {
            pos
        } else {
            pushed
        }
    }
}
