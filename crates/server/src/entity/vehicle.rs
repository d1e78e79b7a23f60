//! Common vehicle state shared by players and bots.

use glam::Vec2;
use protocol::Color;
use protocol::packets::{EntityRecord, VehicleSpecRecord};

/// Turret height is the same for every vehicle.
const TURRET_HEIGHT: f32 = 1.5;
const TURRET_WIDTH_RATIO: f32 = 0.8;
const TURRET_DEPTH_RATIO: f32 = 0.6;

/// Chassis dimensions; the turret is derived from them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleSpec {
    pub chassis_width: f32,
    pub chassis_height: f32,
    pub chassis_depth: f32,
}

impl VehicleSpec {
    pub fn new(chassis_width: f32, chassis_height: f32, chassis_depth: f32) -> Self {
        Self {
            chassis_width,
            chassis_height,
            chassis_depth,
        }
    }

    #[inline]
    pub fn turret_width(&self) -> f32 {
        self.chassis_width * TURRET_WIDTH_RATIO
    }

    #[inline]
    pub fn turret_height(&self) -> f32 {
        TURRET_HEIGHT
    }

    #[inline]
    pub fn turret_depth(&self) -> f32 {
        self.chassis_depth * TURRET_DEPTH_RATIO
    }

    pub fn record(&self) -> VehicleSpecRecord {
        VehicleSpecRecord {
            chassis_width: self.chassis_width,
            chassis_height: self.chassis_height,
            chassis_depth: self.chassis_depth,
            turret_width: self.turret_width(),
            turret_height: self.turret_height(),
            turret_depth: self.turret_depth(),
        }
    }
}

/// Common vehicle data shared by all entity kinds.
///
/// `position.x` is world x and `position.y` is world z. Heading 0 faces +z;
/// forward motion is `(sin(heading), cos(heading)) * speed`.
#[derive(Debug, Clone)]
pub struct VehicleData {
    /// Unique entity id.
    pub id: u32,
    pub name: String,
    pub position: Vec2,
    /// Radians.
    pub heading: f32,
    /// Signed forward speed in world units per tick.
    pub speed: f32,
    pub color: Color,
    pub spec: VehicleSpec,
    /// Damage is ignored while `now <= invulnerable_until` (ms since epoch).
    pub invulnerable_until: u64,
    hp: u8,
    dead: bool,
}

impl VehicleData {
    /// Create new vehicle data with full health.
    pub fn new(id: u32, name: String, position: Vec2, heading: f32, hp: u8, color: Color, spec: VehicleSpec) -> Self {
        Self {
            id,
            name,
            position,
            heading,
            speed: 0.0,
            color,
            spec,
            invulnerable_until: 0,
            hp,
            dead: hp == 0,
        }
    }

    #[inline]
    pub fn hp(&self) -> u8 {
        self.hp
    }

    #[inline]
    pub fn is_dead(&self) -> bool {
        self.dead
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        !self.dead
    }

    /// Remove one hit point. Returns the remaining hp; reaching 0 marks the
    /// vehicle dead.
    pub(crate) fn lose_hp(&mut self) -> u8 {
        self.hp = self.hp.saturating_sub(1);
        self.dead = self.hp == 0;
        self.hp
    }

    /// Unit vector of the current heading.
    #[inline]
    pub fn forward(&self) -> Vec2 {
        Vec2::new(self.heading.sin(), self.heading.cos())
    }

    /// Wire representation.
    pub fn record(&self, is_bot: bool) -> EntityRecord {
        EntityRecord {
            id: self.id,
            name: self.name.clone(),
            x: self.position.x,
            z: self.position.y,
            heading: self.heading,
            speed: self.speed,
            hp: self.hp,
            dead: self.dead,
            is_bot,
            color: self.color.to_hex(),
            spec: self.spec.record(),
        }
    }
}

/// Trait for all vehicle kinds.
pub trait Vehicle: Send + Sync {
    /// Get the common vehicle data.
    fn data(&self) -> &VehicleData;

    /// Get mutable vehicle data.
    fn data_mut(&mut self) -> &mut VehicleData;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> VehicleData {
        VehicleData::new(
            1,
            "Ace".into(),
            Vec2::new(3.0, 4.0),
            0.0,
            2,
            Color::new(1, 2, 3),
            VehicleSpec::new(5.0, 2.0, 10.0),
        )
    }

    #[test]
    fn test_lose_hp_clamps_and_marks_dead() {
        let mut data = sample();
        assert_eq!(data.lose_hp(), 1);
        assert!(data.is_alive());
        assert_eq!(data.lose_hp(), 0);
        assert!(data.is_dead());
        assert_eq!(data.lose_hp(), 0);
        assert!(data.is_dead());
    }

    #[test]
    fn test_derived_turret() {
        let spec = VehicleSpec::new(5.0, 2.0, 10.0);
        assert_eq!(spec.turret_width(), 4.0);
        assert_eq!(spec.turret_depth(), 6.0);
        assert_eq!(spec.record().turret_height, 1.5);
    }

    #[test]
    fn test_record_maps_plane_to_xz() {
        let record = sample().record(false);
        assert_eq!(record.x, 3.0);
        assert_eq!(record.z, 4.0);
        assert_eq!(record.color, "#010203");
        assert!(!record.is_bot);
    }
}
