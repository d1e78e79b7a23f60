//! AI-controlled vehicle.

use super::vehicle::{Vehicle, VehicleData, VehicleSpec};
use glam::Vec2;
use protocol::Color;
use rand::Rng;
use std::f32::consts::TAU;

const ADJECTIVES: &[&str] = &[
    "Angry", "Mad", "Crazy", "Wild", "Killer", "Dark", "Iron", "Brutal", "Fast", "Hyper",
];
const NOUNS: &[&str] = &[
    "Racer", "Truck", "Tank", "Beast", "Shark", "Bull", "Demon", "Hunter", "Viper", "Hammer",
];

/// Every bot is painted the same red.
pub const BOT_COLOR: Color = Color::new(0xff, 0x33, 0x33);

/// A vehicle driven by the server.
#[derive(Debug, Clone)]
pub struct Bot {
    /// Vehicle data (public for direct access).
    pub vehicle: VehicleData,
    /// Ticks until the wander heading is perturbed again.
    pub wander_ticks: u32,
    /// Remaining stunned ticks; 0 means the bot is free to think.
    pub stun_ticks: u32,
}

impl Bot {
    pub fn new(vehicle: VehicleData) -> Self {
        Self {
            vehicle,
            wander_ticks: 0,
            stun_ticks: 0,
        }
    }

    /// Create a bot at `position` with a random name, heading and chassis.
    pub fn spawn<R: Rng>(id: u32, position: Vec2, max_hp: u8, rng: &mut R) -> Self {
        let spec = VehicleSpec::new(
            4.0 + rng.random::<f32>(),
            2.0 + rng.random::<f32>(),
            9.0 + rng.random::<f32>(),
        );
        let heading = rng.random_range(0.0..TAU);
        let vehicle = VehicleData::new(id, random_name(rng), position, heading, max_hp, BOT_COLOR, spec);
        Self::new(vehicle)
    }

    #[inline]
    pub fn is_stunned(&self) -> bool {
        self.stun_ticks > 0
    }
}

impl Vehicle for Bot {
    fn data(&self) -> &VehicleData {
        &self.vehicle
    }

    fn data_mut(&mut self) -> &mut VehicleData {
        &mut self.vehicle
    }
}

/// Adjective + noun + number, e.g. `IronViper42`.
fn random_name<R: Rng>(rng: &mut R) -> String {
    let adjective = ADJECTIVES[rng.random_range(0..ADJECTIVES.len())];
    let noun = NOUNS[rng.random_range(0..NOUNS.len())];
    let number = rng.random_range(0..99);
    format!("{adjective}{noun}{number}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_spawn_bot() {
        let mut rng = StdRng::seed_from_u64(3);
        let bot = Bot::spawn(1_000_000, Vec2::new(10.0, -5.0), 5, &mut rng);
        assert_eq!(bot.vehicle.position, Vec2::new(10.0, -5.0));
        assert_eq!(bot.vehicle.color, BOT_COLOR);
        assert!(!bot.is_stunned());
        assert!((4.0..5.0).contains(&bot.vehicle.spec.chassis_width));
        assert!((0.0..TAU).contains(&bot.vehicle.heading));
    }

    #[test]
    fn test_names_are_composed() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..20 {
            let name = random_name(&mut rng);
            assert!(ADJECTIVES.iter().any(|a| name.starts_with(a)));
            assert!(name.chars().last().is_some_and(|c| c.is_ascii_digit()));
        }
    }
}
