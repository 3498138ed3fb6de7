//! Spatial indexing.

mod grid;

pub use grid::SpatialGrid;
