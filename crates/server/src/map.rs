//! Static city geometry.
//!
//! Buildings are produced once before the simulation starts and never change.

use crate::config::{MapConfig, WorldConfig};
use crate::spatial::Bounds;
use glam::Vec2;
use protocol::packets::BuildingRecord;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// A static obstacle with a rectangular footprint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Building {
    pub center: Vec2,
    pub width: f32,
    pub height: f32,
    pub depth: f32,
    /// Footprint inset by the configured building inset.
    pub bounds: Bounds,
}

impl Building {
    pub fn new(center: Vec2, width: f32, height: f32, depth: f32, inset: f32) -> Self {
        let bounds = Bounds::from_center(center.x, center.y, width, depth).expand(-inset);
        Self {
            center,
            width,
            height,
            depth,
            bounds,
        }
    }

    /// Rectangle used by the collision resolver and spawn search.
    #[inline]
    pub fn collision_bounds(&self, margin: f32) -> Bounds {
        self.bounds.expand(margin)
    }

    pub fn record(&self) -> BuildingRecord {
        BuildingRecord {
            x: self.center.x,
            y: self.height / 2.0,
            z: self.center.y,
            w: self.width,
            h: self.height,
            d: self.depth,
        }
    }
}

/// Produces the building list for a new world.
pub trait BuildingLayout {
    fn generate(&mut self) -> Vec<Building>;
}

/// A fixed list of buildings.
impl BuildingLayout for Vec<Building> {
    fn generate(&mut self) -> Vec<Building> {
        self.clone()
    }
}

/// Block-grid city with roads and a central plaza.
#[derive(Debug)]
pub struct CityLayout {
    map: MapConfig,
    inset: f32,
    rng: StdRng,
}

impl CityLayout {
    pub fn new(map: &MapConfig, world: &WorldConfig) -> Self {
        let rng = match map.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::seed_from_u64(rand::random()),
        };
        Self {
            map: map.sanitized(),
            inset: world.building_inset,
            rng,
        }
    }

    fn is_road(&self, bx: i32, bz: i32) -> bool {
        let every = self.map.road_every;
        every > 0 && (bx % every == 0 || bz % every == 0)
    }
}

impl BuildingLayout for CityLayout {
    fn generate(&mut self) -> Vec<Building> {
        let radius = self.map.city_radius;
        let block = self.map.block_size;
        let mut buildings = Vec::new();

        for bx in -radius..=radius {
            for bz in -radius..=radius {
                if bx.abs() < self.map.clear_radius && bz.abs() < self.map.clear_radius {
                    continue;
                }
                if self.is_road(bx, bz) && !self.rng.random_bool(self.map.road_building_chance) {
                    continue;
                }
                if self.rng.random_bool(self.map.skip_chance) {
                    continue;
                }

                let width = self.rng.random_range(10.0f32..30.0);
                let height = self.rng.random_range(20.0f32..80.0);
                let depth = self.rng.random_range(10.0f32..30.0);
                let center = Vec2::new(
                    bx as f32 * block + self.rng.random_range(-5.0f32..5.0),
                    bz as f32 * block + self.rng.random_range(-5.0f32..5.0),
                );
                buildings.push(Building::new(center, width, height, depth, self.inset));
            }
        }

        buildings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(seed: u64) -> CityLayout {
        let map = MapConfig {
            seed: Some(seed),
            ..MapConfig::default()
        };
        CityLayout::new(&map, &WorldConfig::default())
    }

    #[test]
    fn test_building_bounds_inset() {
        let b = Building::new(Vec2::new(100.0, 50.0), 20.0, 40.0, 10.0, 0.5);
        assert_eq!(b.bounds, Bounds::new(90.5, 45.5, 109.5, 54.5));
        assert_eq!(b.collision_bounds(1.0), Bounds::new(89.5, 44.5, 110.5, 55.5));
        assert_eq!(b.record().y, 20.0);
        assert_eq!(b.record().z, 50.0);
    }

    #[test]
    fn test_seeded_layout_is_reproducible() {
        let a = seeded(11).generate();
        let b = seeded(11).generate();
        assert!(!a.is_empty());
        assert_eq!(a, b);
    }

    #[test]
    fn test_out_of_range_chances_do_not_panic() {
        let map = MapConfig {
            seed: Some(1),
            skip_chance: 1.5,
            road_building_chance: -1.0,
            ..MapConfig::default()
        };
        assert!(CityLayout::new(&map, &WorldConfig::default()).generate().is_empty());
    }

    #[test]
    fn test_plaza_stays_clear() {
        let buildings = seeded(5).generate();
        for b in &buildings {
            // Plaza blocks are |block| < 3, i.e. centers within 2 * 40 + 5.
            assert!(b.center.x.abs() > 85.0 || b.center.y.abs() > 85.0, "{:?}", b.center);
            assert!(b.width >= 10.0 && b.width < 30.0);
        }
    }
}
