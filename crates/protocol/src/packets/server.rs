//! Server -> Client packet building.

use crate::ProtocolError;
use serde::{Deserialize, Serialize};

/// Packet sent from the server to one or more clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerPacket {
    /// Identity assigned to the connection.
    Welcome { id: u32 },
    /// Static city layout, sent once per connection.
    MapSnapshot { buildings: Vec<BuildingRecord> },
    /// Top survival times, highest first.
    LeaderboardSnapshot { entries: Vec<LeaderboardRecord> },
    /// Every live entity, sent to a client when it joins.
    EntitySnapshot { entities: Vec<EntityRecord> },
    EntityCreated { id: u32, entity: EntityRecord },
    EntityMoved { id: u32, entity: EntityRecord },
    EntityRemoved { id: u32 },
    HealthChanged { id: u32, hp: u8 },
    EntityDied { id: u32 },
    /// Advisory push for the client's local physics.
    Knockback { target_id: u32, angle: f32, force: f32 },
}

impl ServerPacket {
    /// Encode the packet as a JSON text frame.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }
}

/// Static building as rendered by clients. `y` is the vertical center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuildingRecord {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
    pub h: f32,
    pub d: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardRecord {
    pub name: String,
    pub time_ms: u64,
}

/// Chassis and turret dimensions of a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleSpecRecord {
    pub chassis_width: f32,
    pub chassis_height: f32,
    pub chassis_depth: f32,
    pub turret_width: f32,
    pub turret_height: f32,
    pub turret_depth: f32,
}

/// Flattened entity state for wire transmission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord {
    pub id: u32,
    pub name: String,
    pub x: f32,
    pub z: f32,
    pub heading: f32,
    pub speed: f32,
    pub hp: u8,
    pub dead: bool,
    pub is_bot: bool,
    pub color: String,
    pub spec: VehicleSpecRecord,
}
