//! Packet definitions for the arena protocol.
//!
//! Every frame is a JSON text message shaped as
//! `{"type": "<name>", "data": {...}}`. Names are camelCase.

mod client;
mod server;

pub use client::*;
pub use server::*;
