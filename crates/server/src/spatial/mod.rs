//! Spatial indexing utilities.
//!
//! A uniform grid keyed by `floor(x / cell_size), floor(z / cell_size)`,
//! rebuilt from scratch every tick.

mod grid;

pub use grid::{Bounds, CellKey, SpatialGrid};
