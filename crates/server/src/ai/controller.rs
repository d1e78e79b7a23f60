//! Per-bot steering state machine.

use crate::config::BotConfig;
use crate::world::World;
use glam::Vec2;
use rand::Rng;
use std::f32::consts::{PI, TAU};

/// Wrap an angle into `(-PI, PI]`.
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    let a = angle % TAU;
    if a > PI {
        a - TAU
    } else if a <= -PI {
        a + TAU
    } else {
        a
    }
}

/// What a bot decided this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotState {
    /// Recovering from an impact; speed decays and heading is frozen.
    Stunned,
    /// Steering toward a live player.
    Pursuing { target: u32 },
    /// Cruising with occasional random turns.
    Wandering,
}

/// Sets each bot's heading and speed before movement is resolved.
#[derive(Debug, Clone)]
pub struct BotController {
    pursuit_radius_sq: f32,
    pursuit_speed: f32,
    cruise_speed: f32,
    turn_damping: f32,
    wander_jitter: f32,
    wander_ticks_min: u32,
    wander_ticks_max: u32,
    stun_decay: f32,
}

impl BotController {
    pub fn new(config: &BotConfig) -> Self {
        Self {
            pursuit_radius_sq: config.pursuit_radius * config.pursuit_radius,
            pursuit_speed: config.pursuit_speed,
            cruise_speed: config.cruise_speed,
            turn_damping: config.turn_damping,
            wander_jitter: config.wander_jitter,
            wander_ticks_min: config.wander_ticks_min.min(config.wander_ticks_max),
            wander_ticks_max: config.wander_ticks_min.max(config.wander_ticks_max),
            stun_decay: config.stun_decay,
        }
    }

    /// Nearest live player in the bot's grid neighborhood within pursuit
    /// range, with the toroidal offset toward it.
    pub fn nearest_player(&self, world: &World, from: Vec2) -> Option<(u32, Vec2)> {
        world
            .grid
            .query_neighborhood(from.x, from.y)
            .into_iter()
            .filter_map(|id| world.player(id))
            .filter(|p| p.vehicle.is_alive())
            .map(|p| (p.vehicle.id, world.border.delta(from, p.vehicle.position)))
            .filter(|(_, delta)| delta.length_squared() < self.pursuit_radius_sq)
            .min_by(|a, b| a.1.length_squared().total_cmp(&b.1.length_squared()))
    }

    /// Run one decision for `bot_id`. Returns `None` for missing or dead bots.
    pub fn think<R: Rng>(&self, world: &mut World, bot_id: u32, rng: &mut R) -> Option<BotState> {
        let (position, stunned) = {
            let bot = world.bot(bot_id)?;
            if bot.vehicle.is_dead() {
                return None;
            }
            (bot.vehicle.position, bot.is_stunned())
        };

        if stunned {
            let bot = world.bot_mut(bot_id)?;
            bot.stun_ticks -= 1;
            bot.vehicle.speed *= self.stun_decay;
            return Some(BotState::Stunned);
        }

        let target = self.nearest_player(world, position);
        let bot = world.bot_mut(bot_id)?;

        if let Some((target, delta)) = target {
            let desired = delta.x.atan2(delta.y);
            let error = normalize_angle(desired - bot.vehicle.heading);
            bot.vehicle.heading = normalize_angle(bot.vehicle.heading + error * self.turn_damping);
            bot.vehicle.speed = self.pursuit_speed;
            return Some(BotState::Pursuing { target });
        }

        bot.vehicle.speed = self.cruise_speed;
        bot.wander_ticks = bot.wander_ticks.saturating_sub(1);
        if bot.wander_ticks == 0 {
            let jitter = rng.random_range(-0.5f32..0.5) * self.wander_jitter;
            bot.vehicle.heading = normalize_angle(bot.vehicle.heading + jitter);
            bot.wander_ticks = rng.random_range(self.wander_ticks_min..=self.wander_ticks_max);
        }
        Some(BotState::Wandering)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PlayerConfig, WorldConfig};
    use crate::entity::{Bot, Player};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::f32::consts::FRAC_PI_2;

    fn controller() -> BotController {
        BotController::new(&BotConfig::default())
    }

    fn world_with_bot(heading: f32) -> (World, u32) {
        let mut world = World::new(&WorldConfig::default(), Vec::new());
        let mut rng = StdRng::seed_from_u64(3);
        let id = world.next_id();
        let mut bot = Bot::spawn(id, Vec2::ZERO, 5, &mut rng);
        bot.vehicle.heading = heading;
        world.add_bot(bot);
        (world, id)
    }

    fn add_player(world: &mut World, id: u32, x: f32, z: f32) {
        let mut rng = StdRng::seed_from_u64(id as u64);
        world.add_player(Player::spawn(id, "Ace".into(), &PlayerConfig::default(), 0, &mut rng));
        world.upsert_player_position(id, x, z, 0.0);
        world.rebuild_grid();
    }

    #[test]
    fn test_normalize_angle() {
        assert!((normalize_angle(3.0 * FRAC_PI_2) + FRAC_PI_2).abs() < 1e-5);
        assert!((normalize_angle(-3.0 * FRAC_PI_2) - FRAC_PI_2).abs() < 1e-5);
        assert_eq!(normalize_angle(PI), PI);
        assert_eq!(normalize_angle(-PI), PI);
        assert_eq!(normalize_angle(0.25), 0.25);
        let wide = normalize_angle(5.0 * TAU + 0.5);
        assert!((wide - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_stunned_bot_decays_and_keeps_heading() {
        let (mut world, id) = world_with_bot(0.3);
        add_player(&mut world, 101, 0.0, 50.0);
        {
            let bot = world.bot_mut(id).unwrap();
            bot.stun_ticks = 2;
            bot.vehicle.speed = 1.5;
        }
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(controller().think(&mut world, id, &mut rng), Some(BotState::Stunned));
        let bot = world.bot(id).unwrap();
        assert_eq!(bot.stun_ticks, 1);
        assert!((bot.vehicle.speed - 1.2).abs() < 1e-6);
        assert_eq!(bot.vehicle.heading, 0.3);

        controller().think(&mut world, id, &mut rng);
        assert!(!world.bot(id).unwrap().is_stunned());
        let state = controller().think(&mut world, id, &mut rng);
        assert_eq!(state, Some(BotState::Pursuing { target: 101 }));
    }

    #[test]
    fn test_pursuit_turns_partially_toward_target() {
        let (mut world, id) = world_with_bot(0.0);
        add_player(&mut world, 101, 100.0, 0.0);
        let mut rng = StdRng::seed_from_u64(1);

        let state = controller().think(&mut world, id, &mut rng);
        assert_eq!(state, Some(BotState::Pursuing { target: 101 }));
        let bot = world.bot(id).unwrap();
        assert!((bot.vehicle.heading - 0.3 * FRAC_PI_2).abs() < 1e-5);
        assert_eq!(bot.vehicle.speed, 1.7);
    }

    #[test]
    fn test_pursuit_takes_shortest_turn() {
        // Target is behind and slightly left; turning right would be longer.
        let (mut world, id) = world_with_bot(PI - 0.1);
        add_player(&mut world, 101, -1.0, -100.0);
        let mut rng = StdRng::seed_from_u64(1);

        controller().think(&mut world, id, &mut rng);
        let heading = world.bot(id).unwrap().vehicle.heading;
        // Desired heading is just past -PI; the error is small.
        assert!(heading.abs() > PI - 0.1);
    }

    #[test]
    fn test_nearest_player_wins() {
        let (mut world, id) = world_with_bot(0.0);
        add_player(&mut world, 101, 0.0, 200.0);
        add_player(&mut world, 102, 0.0, -60.0);
        let target = controller().nearest_player(&world, Vec2::ZERO);
        assert_eq!(target.map(|t| t.0), Some(102));
        assert!(world.bot(id).is_some());
    }

    #[test]
    fn test_pursuit_sees_across_the_edge() {
        let (mut world, id) = world_with_bot(FRAC_PI_2);
        if let Some(bot) = world.bot_mut(id) {
            bot.vehicle.position = Vec2::new(995.0, 0.0);
        }
        add_player(&mut world, 101, -995.0, 0.0);
        let mut rng = StdRng::seed_from_u64(1);

        let state = controller().think(&mut world, id, &mut rng);
        assert_eq!(state, Some(BotState::Pursuing { target: 101 }));
        // Already facing +x, the short way round.
        assert!((world.bot(id).unwrap().vehicle.heading - FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn test_out_of_range_player_is_ignored() {
        let (mut world, id) = world_with_bot(0.0);
        add_player(&mut world, 101, 0.0, 260.0);
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(controller().think(&mut world, id, &mut rng), Some(BotState::Wandering));
        assert_eq!(world.bot(id).unwrap().vehicle.speed, 0.5);
    }

    #[test]
    fn test_dead_player_is_ignored() {
        let (mut world, id) = world_with_bot(0.0);
        add_player(&mut world, 101, 0.0, 20.0);
        if let Some(entity) = world.get_mut(101) {
            while entity.data_mut().lose_hp() > 0 {}
        }
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(controller().think(&mut world, id, &mut rng), Some(BotState::Wandering));
    }

    #[test]
    fn test_wander_timer_resets_in_range() {
        let (mut world, id) = world_with_bot(0.0);
        let mut rng = StdRng::seed_from_u64(5);

        controller().think(&mut world, id, &mut rng);
        let bot = world.bot(id).unwrap();
        assert!((50..=100).contains(&bot.wander_ticks));
        assert!(bot.vehicle.heading.abs() <= 0.5);

        let ticks = bot.wander_ticks;
        let heading = bot.vehicle.heading;
        controller().think(&mut world, id, &mut rng);
        let bot = world.bot(id).unwrap();
        assert_eq!(bot.wander_ticks, ticks - 1);
        assert_eq!(bot.vehicle.heading, heading);
    }

    #[test]
    fn test_seeded_wander_is_reproducible() {
        let run = || {
            let (mut world, id) = world_with_bot(0.0);
            let mut rng = StdRng::seed_from_u64(42);
            for _ in 0..300 {
                controller().think(&mut world, id, &mut rng);
            }
            world.bot(id).unwrap().vehicle.heading
        };
        assert_eq!(run(), run());
    }
}
