//! # Memory Management
//!
//! Object-reuse pools for zero-allocation gameplay.
//!
//! ## Design Philosophy
//!
//! Instances are constructed once, at prewarm or on a pool miss. During
//! gameplay:
//! - No construction or destruction of entities
//! - Counts only grow when demand exceeds everything seen before
//! - Predictable, flat latency

mod pool;

pub use pool::{PoolHandle, ReusePool};
