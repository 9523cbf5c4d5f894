//! # Spatial Indexing
//!
//! Uniform-grid partitioning of the horizontal plane.
//!
//! The grid answers "what is near this point" in time proportional to the
//! number of cells touched and their occupancy, never to the total number of
//! indexed items. Items are plain copyable keys (usually pool handles); the
//! grid never stores positions, the caller supplies them at query time.

mod grid;

pub use grid::{cell_hash, CellCoord, SpatialIndex2D, MIN_CELL_SIZE};
