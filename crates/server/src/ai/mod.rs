//! Server-driven vehicles: per-bot steering and population control.

mod controller;
mod population;

pub use controller::{BotController, BotState, normalize_angle};
pub use population::{Adjustment, PopulationManager};
