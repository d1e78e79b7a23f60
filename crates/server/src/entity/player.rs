//! Human-controlled vehicle.

use super::vehicle::{Vehicle, VehicleData, VehicleSpec};
use crate::config::PlayerConfig;
use glam::Vec2;
use protocol::Color;
use rand::Rng;

/// A vehicle driven by a connected client.
#[derive(Debug, Clone)]
pub struct Player {
    /// Vehicle data (public for direct access).
    pub vehicle: VehicleData,
    /// Join time in ms since epoch; survival time is measured from here.
    pub joined_at: u64,
}

impl Player {
    pub fn new(vehicle: VehicleData, joined_at: u64) -> Self {
        Self { vehicle, joined_at }
    }

    /// Create a player with a random spawn point, color and chassis.
    pub fn spawn<R: Rng>(id: u32, name: String, config: &PlayerConfig, now: u64, rng: &mut R) -> Self {
        let half = config.spawn_half_extent;
        let position = if half > 0.0 {
            Vec2::new(rng.random_range(-half..half), rng.random_range(-half..half))
        } else {
            Vec2::ZERO
        };
        let color = Color::from_rgb24(rng.random_range(0..=0xFF_FFFF));
        let spec = VehicleSpec::new(
            rng.random_range(3.5..5.5),
            rng.random_range(1.5..3.0),
            rng.random_range(8.0..12.0),
        );
        let vehicle = VehicleData::new(id, name, position, 0.0, config.max_hp, color, spec);
        Self::new(vehicle, now)
    }

    /// Survival time in ms at `now`.
    #[inline]
    pub fn survival_ms(&self, now: u64) -> u64 {
        now.saturating_sub(self.joined_at)
    }
}

impl Vehicle for Player {
    fn data(&self) -> &VehicleData {
        &self.vehicle
    }

    fn data_mut(&mut self) -> &mut VehicleData {
        &mut self.vehicle
    }
}
