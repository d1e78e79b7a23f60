//! Game entities (vehicles).
//!
//! Players and bots share [`VehicleData`]; the [`Entity`] variant carries the
//! per-kind state.

mod bot;
mod player;
mod vehicle;

pub use bot::Bot;
pub use player::Player;
pub use vehicle::{Vehicle, VehicleData, VehicleSpec};

use protocol::packets::EntityRecord;

/// A live or dead vehicle in the world.
#[derive(Debug, Clone)]
pub enum Entity {
    Player(Player),
    Bot(Bot),
}

impl Entity {
    /// Get the common vehicle data.
    #[inline]
    pub fn data(&self) -> &VehicleData {
        match self {
            Entity::Player(p) => p.data(),
            Entity::Bot(b) => b.data(),
        }
    }

    /// Get mutable vehicle data.
    #[inline]
    pub fn data_mut(&mut self) -> &mut VehicleData {
        match self {
            Entity::Player(p) => p.data_mut(),
            Entity::Bot(b) => b.data_mut(),
        }
    }

    #[inline]
    pub fn is_bot(&self) -> bool {
        matches!(self, Entity::Bot(_))
    }

    #[inline]
    pub fn is_player(&self) -> bool {
        matches!(self, Entity::Player(_))
    }

    pub fn as_player(&self) -> Option<&Player> {
        match self {
            Entity::Player(p) => Some(p),
            Entity::Bot(_) => None,
        }
    }

    pub fn as_bot(&self) -> Option<&Bot> {
        match self {
            Entity::Bot(b) => Some(b),
            Entity::Player(_) => None,
        }
    }

    pub fn as_bot_mut(&mut self) -> Option<&mut Bot> {
        match self {
            Entity::Bot(b) => Some(b),
            Entity::Player(_) => None,
        }
    }

    /// Wire representation.
    pub fn record(&self) -> EntityRecord {
        self.data().record(self.is_bot())
    }
}
