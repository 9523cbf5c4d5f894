//! # Uniform Grid
//!
//! Hash-bucketed 2D grid with O(1) insert/remove/move and bounded-radius
//! range queries.

use std::collections::HashMap;
use std::hash::{BuildHasherDefault, Hash, Hasher};

use crate::math::Vec2;

/// Smallest accepted cell edge length (world units).
pub const MIN_CELL_SIZE: f32 = 0.1;

/// Initial item capacity of a freshly created bucket.
const BUCKET_CAPACITY: usize = 16;

/// Large odd multipliers for the cell mix.
const HASH_X: i32 = 73_856_093;
const HASH_Y: i32 = 19_349_663;

/// Spreads the 32-bit mix over the full hash width (golden-ratio multiply).
const HASH_SPREAD: u64 = 0x9E37_79B9_7F4A_7C15;

/// Integer cell coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellCoord {
    /// Cell column (world X).
    pub x: i32,
    /// Cell row (world Z).
    pub y: i32,
}

impl CellCoord {
    /// Creates a cell coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Hash for CellCoord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(cell_hash(self.x, self.y));
    }
}

/// Deterministic cell mix: `(x * 73856093) ^ (y * 19349663)` with wrapping
/// arithmetic. Well-defined for negative coordinates.
#[inline]
#[must_use]
pub const fn cell_hash(x: i32, y: i32) -> u32 {
    (x.wrapping_mul(HASH_X) ^ y.wrapping_mul(HASH_Y)) as u32
}

/// Hasher that trusts [`CellCoord`]'s own mix instead of running SipHash.
#[derive(Default)]
struct CellHasher(u64);

impl Hasher for CellHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }

    #[inline]
    fn write_u32(&mut self, n: u32) {
        self.0 = u64::from(n).wrapping_mul(HASH_SPREAD);
    }

    fn write(&mut self, bytes: &[u8]) {
        // Only reached if something other than CellCoord is hashed.
        for &b in bytes {
            self.0 = (self.0 ^ u64::from(b)).wrapping_mul(0x0100_0000_01B3);
        }
    }
}

type CellMap<T> = HashMap<CellCoord, Vec<T>, BuildHasherDefault<CellHasher>>;

/// Uniform grid over the horizontal plane.
///
/// Each occupied cell owns an unordered bucket of items. Empty buckets are
/// removed from the map; their storage is kept aside and reused for the next
/// cell that becomes occupied, so steady-state churn does not allocate.
///
/// # Example
///
/// ```rust
/// use horde_core::{SpatialIndex2D, Vec2};
///
/// let positions = [Vec2::new(10.0, 0.0), Vec2::new(40.0, 0.0)];
/// let mut grid = SpatialIndex2D::new(2.0);
/// for (i, p) in positions.iter().enumerate() {
///     let (x, y) = grid.cell_of(*p);
///     grid.add(i, x, y);
/// }
///
/// let mut out = [0usize; 4];
/// let n = grid.query(Vec2::new(10.0, 0.0), 1.0, &mut out, |i| positions[*i]);
/// assert_eq!(&out[..n], &[0]);
/// ```
pub struct SpatialIndex2D<T> {
    /// Occupied cells.
    cells: CellMap<T>,
    /// Storage of buckets that emptied, ready for reuse.
    spare: Vec<Vec<T>>,
    /// Cell edge length.
    cell_size: f32,
    /// `1 / cell_size`, cached for `to_cell`.
    inverse_cell_size: f32,
    /// Total items across all buckets.
    len: usize,
}

impl<T: Copy + PartialEq> SpatialIndex2D<T> {
    /// Creates an empty grid.
    ///
    /// `cell_size` is clamped to at least [`MIN_CELL_SIZE`].
    #[must_use]
    pub fn new(cell_size: f32) -> Self {
        Self::with_capacity(cell_size, 256)
    }

    /// Creates an empty grid with room for `cells` occupied cells.
    #[must_use]
    pub fn with_capacity(cell_size: f32, cells: usize) -> Self {
        let cell_size = cell_size.max(MIN_CELL_SIZE);
        Self {
            cells: CellMap::with_capacity_and_hasher(cells, BuildHasherDefault::default()),
            spare: Vec::new(),
            cell_size,
            inverse_cell_size: 1.0 / cell_size,
            len: 0,
        }
    }

    /// Cell edge length actually in use.
    #[inline]
    #[must_use]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Converts one world coordinate to a cell coordinate (`floor(w / size)`).
    #[inline]
    #[must_use]
    pub fn to_cell(&self, world: f32) -> i32 {
        (world * self.inverse_cell_size).floor() as i32
    }

    /// Cell containing a planar position.
    #[inline]
    #[must_use]
    pub fn cell_of(&self, position: Vec2) -> (i32, i32) {
        (self.to_cell(position.x), self.to_cell(position.y))
    }

    /// Appends `item` to the bucket of cell `(x, y)`.
    pub fn add(&mut self, item: T, x: i32, y: i32) {
        let spare = &mut self.spare;
        self.cells
            .entry(CellCoord::new(x, y))
            .or_insert_with(|| spare.pop().unwrap_or_else(|| Vec::with_capacity(BUCKET_CAPACITY)))
            .push(item);
        self.len += 1;
    }

    /// Removes `item` from the bucket of cell `(x, y)`.
    ///
    /// Swap-removes inside the bucket, so bucket order is not preserved.
    /// Returns `false` when the item was not registered in that cell.
    pub fn remove(&mut self, item: T, x: i32, y: i32) -> bool {
        let key = CellCoord::new(x, y);
        let Some(bucket) = self.cells.get_mut(&key) else {
            return false;
        };

        let found = match bucket.iter().position(|candidate| *candidate == item) {
            Some(index) => {
                bucket.swap_remove(index);
                self.len -= 1;
                true
            }
            None => false,
        };

        if bucket.is_empty() {
            if let Some(bucket) = self.cells.remove(&key) {
                self.spare.push(bucket);
            }
        }

        found
    }

    /// Moves `item` between cells. No-op when the cell did not change.
    pub fn move_item(&mut self, item: T, old_x: i32, old_y: i32, new_x: i32, new_y: i32) {
        if old_x == new_x && old_y == new_y {
            return;
        }
        self.remove(item, old_x, old_y);
        self.add(item, new_x, new_y);
    }

    /// Collects items within `radius` of `center` into `out`.
    ///
    /// Scans every cell of the rectangle covering the bounding square of the
    /// circle and keeps items whose position satisfies
    /// `|pos - center|^2 <= radius^2` (boundary inclusive). Items are written
    /// in scan order, not by distance.
    ///
    /// When the rectangle spans more cells than are occupied, the occupied
    /// buckets are walked instead, so a huge radius costs no more than a
    /// full scan.
    ///
    /// **Truncation:** as soon as `out` is full the scan stops and the count
    /// is returned; further matches are silently omitted. Size `out` for the
    /// densest neighbourhood you care about.
    ///
    /// A non-finite `center` or `radius` matches nothing.
    ///
    /// # Returns
    ///
    /// Number of items written to the front of `out`.
    pub fn query<F>(&self, center: Vec2, radius: f32, out: &mut [T], position_of: F) -> usize
    where
        F: Fn(&T) -> Vec2,
    {
        if out.is_empty() || self.len == 0 {
            return 0;
        }
        if !(radius.is_finite() && center.x.is_finite() && center.y.is_finite()) {
            return 0;
        }

        let radius_sq = radius * radius;
        let min_x = self.to_cell(center.x - radius);
        let max_x = self.to_cell(center.x + radius);
        let min_y = self.to_cell(center.y - radius);
        let max_y = self.to_cell(center.y + radius);

        let mut count = 0;
        let mut scan = |bucket: &Vec<T>| {
            for item in bucket {
                if position_of(item).distance_squared(center) > radius_sq {
                    continue;
                }

                out[count] = *item;
                count += 1;
                if count == out.len() {
                    return true;
                }
            }
            false
        };

        let width = i64::from(max_x) - i64::from(min_x) + 1;
        let height = i64::from(max_y) - i64::from(min_y) + 1;
        if width.saturating_mul(height) > self.cells.len() as i64 {
            for (coord, bucket) in &self.cells {
                let inside =
                    (min_x..=max_x).contains(&coord.x) && (min_y..=max_y).contains(&coord.y);
                if inside && scan(bucket) {
                    break;
                }
            }
            return count;
        }

        'rows: for y in min_y..=max_y {
            for x in min_x..=max_x {
                if let Some(bucket) = self.cells.get(&CellCoord::new(x, y)) {
                    if scan(bucket) {
                        break 'rows;
                    }
                }
            }
        }

        count
    }

    /// Number of items in cell `(x, y)`.
    #[must_use]
    pub fn bucket_len(&self, x: i32, y: i32) -> usize {
        self.cells.get(&CellCoord::new(x, y)).map_or(0, Vec::len)
    }

    /// Total number of indexed items.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when nothing is indexed.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of occupied cells.
    #[inline]
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Removes every item, keeping bucket storage for reuse.
    pub fn clear(&mut self) {
        for (_, mut bucket) in self.cells.drain() {
            bucket.clear();
            self.spare.push(bucket);
        }
        self.len = 0;
    }
}
