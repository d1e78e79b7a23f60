//! Uniform grid for neighborhood queries.
//!
//! Entities are bucketed by the cell containing their center. A query returns
//! the 3x3 block of cells around the query point, so anything within one
//! cell width on each axis is always included. A grid built with
//! [`SpatialGrid::wrapping`] folds cell coordinates so the block continues
//! across the world edge.

use std::collections::HashMap;

/// Axis-aligned rectangle on the ground plane.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    pub min_x: f32,
    pub min_z: f32,
    pub max_x: f32,
    pub max_z: f32,
}

impl Bounds {
    pub fn new(min_x: f32, min_z: f32, max_x: f32, max_z: f32) -> Self {
        Self { min_x, min_z, max_x, max_z }
    }

    /// Create bounds from a center and full width/depth.
    #[inline]
    pub fn from_center(cx: f32, cz: f32, width: f32, depth: f32) -> Self {
        Self {
            min_x: cx - width / 2.0,
            min_z: cz - depth / 2.0,
            max_x: cx + width / 2.0,
            max_z: cz + depth / 2.0,
        }
    }

    /// Grow (or shrink, for negative `margin`) on every side.
    #[inline]
    pub fn expand(&self, margin: f32) -> Self {
        Self {
            min_x: self.min_x - margin,
            min_z: self.min_z - margin,
            max_x: self.max_x + margin,
            max_z: self.max_z + margin,
        }
    }

    /// Strict containment: points on the edge are outside.
    #[inline]
    pub fn contains(&self, x: f32, z: f32) -> bool {
        x > self.min_x && x < self.max_x && z > self.min_z && z < self.max_z
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }
}

/// Discretized cell coordinate.
pub type CellKey = (i32, i32);

/// Spatial hash grid over entity ids.
pub struct SpatialGrid {
    cell_size: f32,
    /// Half the world size and the number of cells across it, when keys wrap.
    wrap: Option<(f32, i32)>,
    /// Cells keep their allocation across rebuilds.
    cells: HashMap<CellKey, Vec<u32>>,
    len: usize,
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            wrap: None,
            cells: HashMap::with_capacity(128),
            len: 0,
        }
    }

    /// Grid over a toroidal world spanning `-half_size..=half_size`. Falls
    /// back to plain keys unless the world is a whole number of at least three
    /// cells across.
    pub fn wrapping(cell_size: f32, half_size: f32) -> Self {
        let across = half_size * 2.0 / cell_size;
        let mut grid = Self::new(cell_size);
        if across.is_finite() && across >= 3.0 && (across - across.round()).abs() < 1e-4 {
            grid.wrap = Some((half_size, across.round() as i32));
        }
        grid
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Cell containing a world position.
    #[inline]
    pub fn key(&self, x: f32, z: f32) -> CellKey {
        match self.wrap {
            Some((half, across)) => (
                (((x + half) / self.cell_size).floor() as i32).rem_euclid(across),
                (((z + half) / self.cell_size).floor() as i32).rem_euclid(across),
            ),
            None => (
                (x / self.cell_size).floor() as i32,
                (z / self.cell_size).floor() as i32,
            ),
        }
    }

    #[inline]
    fn neighbor(&self, (cx, cz): CellKey, dx: i32, dz: i32) -> CellKey {
        match self.wrap {
            Some((_, across)) => ((cx + dx).rem_euclid(across), (cz + dz).rem_euclid(across)),
            None => (cx + dx, cz + dz),
        }
    }

    pub fn clear(&mut self) {
        for cell in self.cells.values_mut() {
            cell.clear();
        }
        self.len = 0;
    }

    #[inline]
    pub fn insert(&mut self, id: u32, x: f32, z: f32) {
        let key = self.key(x, z);
        self.cells.entry(key).or_default().push(id);
        self.len += 1;
    }

    /// Clear and repopulate from `(id, x, z)` triples.
    pub fn rebuild<I>(&mut self, items: I)
    where
        I: IntoIterator<Item = (u32, f32, f32)>,
    {
        self.clear();
        for (id, x, z) in items {
            self.insert(id, x, z);
        }
    }

    /// Ids in the 3x3 block of cells around `(x, z)`.
    pub fn query_neighborhood(&self, x: f32, z: f32) -> Vec<u32> {
        let center = self.key(x, z);
        let mut result = Vec::with_capacity(16);
        for dx in -1..=1 {
            for dz in -1..=1 {
                if let Some(cell) = self.cells.get(&self.neighbor(center, dx, dz)) {
                    result.extend_from_slice(cell);
                }
            }
        }
        result
    }

    /// Number of indexed entities.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl std::fmt::Debug for SpatialGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpatialGrid")
            .field("cell_size", &self.cell_size)
            .field("wrap", &self.wrap)
            .field("items", &self.len)
            .finish()
    }
}
