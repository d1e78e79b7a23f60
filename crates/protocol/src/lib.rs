//! Shared protocol crate for the arena server.
//!
//! This crate contains:
//! - Packet definitions for both directions (the event catalog)
//! - JSON text encoding of those packets
//! - Shared types (Color)

mod error;
pub mod packets;

pub use error::ProtocolError;

/// RGB color used for vehicles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a color from the low 24 bits of `rgb` (0xRRGGBB).
    pub const fn from_rgb24(rgb: u32) -> Self {
        Self {
            r: ((rgb >> 16) & 0xFF) as u8,
            g: ((rgb >> 8) & 0xFF) as u8,
            b: (rgb & 0xFF) as u8,
        }
    }

    /// CSS style hex string, e.g. `#ff3333`.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_hex() {
        assert_eq!(Color::new(0xff, 0x33, 0x33).to_hex(), "#ff3333");
        assert_eq!(Color::from_rgb24(0x0a0b0c).to_hex(), "#0a0b0c");
    }
}
