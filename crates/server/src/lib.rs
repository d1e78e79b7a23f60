//! Authoritative vehicular combat arena server library.

pub mod ai;
pub mod clock;
pub mod collision;
pub mod config;
pub mod damage;
pub mod entity;
pub mod events;
pub mod filter;
pub mod leaderboard;
pub mod map;
pub mod server;
pub mod spatial;
pub mod world;

// Re-export commonly used types
pub use config::Config;
pub use events::{Audience, EventQueue, Outbound};
pub use server::{Frame, GameState, run, run_game_loop};
