//! Client -> Server packet parsing.

use crate::ProtocolError;
use serde::{Deserialize, Serialize};

/// Parsed client packet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ClientPacket {
    /// Join the arena with a requested display name.
    Join {
        #[serde(default)]
        name: String,
    },
    /// Client-authoritative movement of the sender's own vehicle.
    ReportMovement { x: f32, z: f32, heading: f32 },
    /// The client's local physics detected a hit against its vehicle.
    ReportContact,
}

impl ClientPacket {
    /// Parse a client packet from a text frame.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        if text.trim().is_empty() {
            return Err(ProtocolError::Empty);
        }
        serde_json::from_str(text).map_err(ProtocolError::Malformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_join() {
        let packet = ClientPacket::parse(r#"{"type":"join","data":{"name":"Ace"}}"#).unwrap();
        assert_eq!(packet, ClientPacket::Join { name: "Ace".into() });
    }

    #[test]
    fn test_parse_join_without_name() {
        let packet = ClientPacket::parse(r#"{"type":"join","data":{}}"#).unwrap();
        assert_eq!(packet, ClientPacket::Join { name: String::new() });
    }

    #[test]
    fn test_parse_movement() {
        let packet =
            ClientPacket::parse(r#"{"type":"reportMovement","data":{"x":1.5,"z":-2,"heading":0.25}}"#)
                .unwrap();
        assert_eq!(packet, ClientPacket::ReportMovement { x: 1.5, z: -2.0, heading: 0.25 });
    }

    #[test]
    fn test_parse_contact() {
        let packet = ClientPacket::parse(r#"{"type":"reportContact"}"#).unwrap();
        assert_eq!(packet, ClientPacket::ReportContact);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(ClientPacket::parse(""), Err(ProtocolError::Empty)));
        assert!(matches!(
            ClientPacket::parse(r#"{"type":"reportMovement","data":{"x":"left"}}"#),
            Err(ProtocolError::Malformed(_))
        ));
        assert!(matches!(
            ClientPacket::parse(r#"{"type":"teleport"}"#),
            Err(ProtocolError::Malformed(_))
        ));
    }
}
