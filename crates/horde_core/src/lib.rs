//! # HORDE Core
//!
//! Allocation-free building blocks for simulating large, churning populations
//! of short-lived game entities:
//! - [`ReusePool`]: LIFO object reuse, instances are built once and recycled
//! - [`SpatialIndex2D`]: uniform grid over the horizontal plane with
//!   bounded-radius queries into caller-owned buffers
//! - [`Vec2`] / [`Vec3`]: the math types the simulation speaks
//!
//! ## Architecture Rules
//!
//! 1. **No heap allocations in hot path** - pools are prewarmed, query
//!    buffers are fixed-size and owned by the caller
//! 2. **Per-frame cost independent of population** - queries touch cells,
//!    not entities
//! 3. **Never fail in the step** - capacity is enforced above this crate
//!
//! ## Example
//!
//! ```rust
//! use horde_core::{ReusePool, SpatialIndex2D, Vec2};
//!
//! let mut pool = ReusePool::new(16, || Vec2::ZERO);
//! pool.prewarm(16);
//! let handle = pool.acquire();
//! pool[handle] = Vec2::new(3.0, 4.0);
//!
//! let mut grid = SpatialIndex2D::new(2.0);
//! let (x, y) = grid.cell_of(pool[handle]);
//! grid.add(handle, x, y);
//!
//! let mut out = [handle; 8];
//! let found = grid.query(Vec2::new(3.0, 4.0), 1.0, &mut out, |h| pool[*h]);
//! assert_eq!(found, 1);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod math;
pub mod memory;
pub mod spatial;

pub use math::{Vec2, Vec3};
pub use memory::{PoolHandle, ReusePool};
pub use spatial::{cell_hash, CellCoord, SpatialIndex2D, MIN_CELL_SIZE};
