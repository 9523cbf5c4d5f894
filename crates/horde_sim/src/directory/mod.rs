//! # Entity Directories
//!
//! A directory owns every instance of one entity kind: a [`ReusePool`] that
//! is the source of truth for total/parked counts and a dense array of the
//! handles currently simulated.
//!
//! ## Dense Array Rules
//!
//! ```text
//! active: [ h3 | h0 | h7 | h5 ]        remove h0 (index 1)
//!                 ▲           │
//!                 └───────────┘  last moves into the gap
//! active: [ h3 | h5 | h7 ]            h5.active_index = 1
//! ```
//!
//! - `active[e.active_index] == e` for every active entity
//! - `pool.total == pool.inactive + active.len()`
//!
//! [`ActiveSet`] owns both rules so the directories never touch the array
//! directly.

use std::ops::{Index, IndexMut};

use horde_core::{PoolHandle, ReusePool};

use crate::entity::Pooled;

mod enemy;
mod orb;
mod projectile;

pub use enemy::{DamageOutcome, EnemyDirectory, EnemyDirectoryConfig, EnemyTickStats};
pub use orb::{OrbDirectory, OrbDirectoryConfig, OrbTickStats};
pub use projectile::{ProjectileDirectory, ProjectileDirectoryConfig, ProjectileTickStats};

/// Population counters polled by debug overlays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DirectoryCounters {
    /// Entities currently simulated.
    pub active: usize,
    /// Instances ever constructed.
    pub pool_total: usize,
    /// Instances parked for reuse.
    pub pool_inactive: usize,
}

impl DirectoryCounters {
    /// Checks `pool_total == pool_inactive + active`.
    #[inline]
    #[must_use]
    pub fn is_conserved(&self) -> bool {
        self.pool_total == self.pool_inactive + self.active
    }
}

/// Pool plus dense active array for one entity kind.
pub struct ActiveSet<T> {
    pool: ReusePool<T>,
    active: Vec<PoolHandle>,
}

impl<T: Pooled + 'static> ActiveSet<T> {
    /// Builds the pool, installs the visibility hooks and prewarms.
    pub(crate) fn new<F>(prewarm: usize, factory: F) -> Self
    where
        F: FnMut() -> T + 'static,
    {
        let mut pool = ReusePool::new(prewarm, factory)
            .with_on_acquire(|entity: &mut T| entity.set_visible(true))
            .with_on_release(|entity: &mut T| entity.set_visible(false));
        pool.prewarm(prewarm);

        Self {
            pool,
            active: Vec::with_capacity(prewarm),
        }
    }

    /// Acquires an instance and appends it to the dense array.
    pub(crate) fn activate(&mut self) -> PoolHandle {
        let handle = self.pool.acquire();
        self.pool[handle].slot_mut().activate(self.active.len());
        self.active.push(handle);
        handle
    }

    /// Swap-removes the entry at `index`, deactivates it and parks it.
    ///
    /// Returns the removed handle, or `None` when `index` is out of range.
    pub(crate) fn remove_at(&mut self, index: usize) -> Option<PoolHandle> {
        if index >= self.active.len() {
            return None;
        }

        let handle = self.active.swap_remove(index);
        if let Some(&moved) = self.active.get(index) {
            self.pool[moved].slot_mut().relocate(index);
        }

        self.pool[handle].slot_mut().deactivate();
        self.pool.release(handle);
        Some(handle)
    }

    /// Exchanges two dense entries, keeping both `active_index` values right.
    pub(crate) fn swap(&mut self, a: usize, b: usize) {
        if a == b || a >= self.active.len() || b >= self.active.len() {
            return;
        }
        self.active.swap(a, b);
        let (ha, hb) = (self.active[a], self.active[b]);
        self.pool[ha].slot_mut().relocate(a);
        self.pool[hb].slot_mut().relocate(b);
    }

    /// Dense index of an active entity, checked against the array.
    #[must_use]
    pub fn index_of(&self, handle: PoolHandle) -> Option<usize> {
        let index = self.pool.get(handle)?.active_index()?;
        (self.active.get(index) == Some(&handle)).then_some(index)
    }

    /// Number of entities currently simulated.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// True when nothing is simulated.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Handle at dense position `index`.
    #[inline]
    #[must_use]
    pub fn handle_at(&self, index: usize) -> Option<PoolHandle> {
        self.active.get(index).copied()
    }

    /// The dense array.
    #[inline]
    #[must_use]
    pub fn handles(&self) -> &[PoolHandle] {
        &self.active
    }

    /// Active entity behind `handle`.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        self.pool.get(handle).filter(|entity| entity.is_active())
    }

    /// Mutable active entity behind `handle`.
    #[inline]
    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        self.pool.get_mut(handle).filter(|entity| entity.is_active())
    }

    /// Iterates active entities in dense order.
    pub fn iter_active(&self) -> impl Iterator<Item = (PoolHandle, &T)> + '_ {
        self.active.iter().map(move |&handle| (handle, &self.pool[handle]))
    }

    /// Snapshot of the population counters.
    #[must_use]
    pub fn counters(&self) -> DirectoryCounters {
        DirectoryCounters {
            active: self.active.len(),
            pool_total: self.pool.total_count(),
            pool_inactive: self.pool.inactive_count(),
        }
    }

    /// Every instance ever constructed, parked or not.
    pub fn iter_all(&self) -> impl Iterator<Item = (PoolHandle, &T)> {
        self.pool.iter()
    }
}

impl<T> Index<PoolHandle> for ActiveSet<T> {
    type Output = T;

    #[inline]
    fn index(&self, handle: PoolHandle) -> &T {
        &self.pool[handle]
    }
}

impl<T> IndexMut<PoolHandle> for ActiveSet<T> {
    #[inline]
    fn index_mut(&mut self, handle: PoolHandle) -> &mut T {
        &mut self.pool[handle]
    }
}

/// Asserts the dense-array rules. Test helper shared by the directories.
#[cfg(test)]
pub(crate) fn assert_dense_invariants<T: Pooled + 'static>(set: &ActiveSet<T>) {
    for (index, &handle) in set.handles().iter().enumerate() {
        let entity = &set[handle];
        assert!(entity.is_active(), "{handle:?} in active array but inactive");
        assert_eq!(entity.active_index(), Some(index));
    }
    for (handle, entity) in set.iter_all() {
        if !entity.is_active() {
            assert_eq!(entity.active_index(), None, "{handle:?} pooled with an index");
        }
    }
    assert!(set.counters().is_conserved());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Orb, OrbTemplate};
    use horde_core::Vec3;

    fn orb_set(prewarm: usize) -> ActiveSet<Orb> {
        ActiveSet::new(prewarm, || Orb::from_template(OrbTemplate::default()))
    }

    #[test]
    fn test_activate_sets_index_and_visibility() {
        let mut set = orb_set(4);
        let a = set.activate();
        let b = set.activate();

        assert_eq!(set.index_of(a), Some(0));
        assert_eq!(set.index_of(b), Some(1));
        assert!(set[a].is_visible());
        assert_dense_invariants(&set);
    }

    #[test]
    fn test_remove_at_relocates_last() {
        let mut set = orb_set(4);
        let handles: Vec<_> = (0..4).map(|_| set.activate()).collect();

        assert_eq!(set.remove_at(1), Some(handles[1]));
        assert_eq!(set.index_of(handles[3]), Some(1));
        assert_eq!(set.index_of(handles[1]), None);
        assert!(!set[handles[1]].is_visible());
        assert!(set.get(handles[1]).is_none());
        assert_dense_invariants(&set);

        assert_eq!(set.remove_at(10), None);
    }

    #[test]
    fn test_swap_keeps_indices() {
        let mut set = orb_set(3);
        let handles: Vec<_> = (0..3).map(|_| set.activate()).collect();

        set.swap(0, 2);
        assert_eq!(set.handle_at(0), Some(handles[2]));
        assert_eq!(set.index_of(handles[0]), Some(2));
        assert_dense_invariants(&set);
    }

    #[test]
    fn test_conservation_under_churn() {
        let mut set = orb_set(2);
        for round in 0..50 {
            let h = set.activate();
            set[h].reset(Vec3::ZERO, 1.0);
            if round % 3 == 0 {
                set.remove_at(0);
            }
            assert_dense_invariants(&set);
        }
        assert!(set.counters().pool_total >= set.len());
    }
}
