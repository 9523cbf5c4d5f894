//! # Reuse Pool
//!
//! LIFO object-reuse allocator for entities that are spawned and despawned
//! many times per second.

use std::fmt;
use std::ops::{Index, IndexMut};

/// Hook invoked on an instance as it leaves or re-enters the pool.
type Hook<T> = Box<dyn FnMut(&mut T)>;

/// Handle to an instance owned by a [`ReusePool`].
///
/// Handles index the pool's all-time instance list, so they stay valid for
/// the pool's whole lifetime. A handle says nothing about whether the
/// instance is currently checked out; the owner tracks that.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PoolHandle {
    /// Index into the instance list.
    index: u32,
}

impl PoolHandle {
    /// Null handle. Never minted by a pool; used to fill scratch buffers.
    pub const NULL: Self = Self { index: u32::MAX };

    /// Returns the slot index of this handle.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.index as usize
    }

    /// Checks if this is the null handle.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.index == u32::MAX
    }
}

impl Default for PoolHandle {
    fn default() -> Self {
        Self::NULL
    }
}

/// A growable pool of reusable instances.
///
/// Every instance ever constructed is kept in an all-time list; released
/// instances are parked on a stack and handed out again most-recent-first,
/// which favors cache-warm reuse.
///
/// The pool never fails and never shrinks. Capacity limits are the caller's
/// business.
///
/// # Thread Safety
///
/// This pool is NOT thread-safe (hooks are `FnMut` and not `Send`). Keep it
/// on the simulation thread.
///
/// # Example
///
/// ```rust
/// use horde_core::ReusePool;
///
/// #[derive(Default)]
/// struct Particle { life: f32, visible: bool }
///
/// let mut pool = ReusePool::new(1024, Particle::default)
///     .with_on_acquire(|p| p.visible = true)
///     .with_on_release(|p| p.visible = false);
/// pool.prewarm(1024);
///
/// // Acquire - O(1), no construction
/// let handle = pool.acquire();
/// pool[handle].life = 1.0;
///
/// // Release - O(1), no destruction
/// pool.release(handle);
/// assert_eq!(pool.total_count(), 1024);
/// ```
pub struct ReusePool<T> {
    /// Every instance ever constructed, in construction order.
    instances: Vec<T>,
    /// Reuse stack of parked instances (LIFO).
    inactive: Vec<PoolHandle>,
    /// Builds a fresh instance on a pool miss.
    factory: Box<dyn FnMut() -> T>,
    /// Invoked after an instance is handed out.
    on_acquire: Option<Hook<T>>,
    /// Invoked before an instance is parked.
    on_release: Option<Hook<T>>,
}

impl<T> ReusePool<T> {
    /// Creates an empty pool.
    ///
    /// # Arguments
    ///
    /// * `initial_capacity` - Storage reserved up front for instances and the
    ///   reuse stack; does not construct anything
    /// * `factory` - Builds a new instance whenever the reuse stack is empty
    #[must_use]
    pub fn new<F>(initial_capacity: usize, factory: F) -> Self
    where
        F: FnMut() -> T + 'static,
    {
        Self {
            instances: Vec::with_capacity(initial_capacity),
            inactive: Vec::with_capacity(initial_capacity),
            factory: Box::new(factory),
            on_acquire: None,
            on_release: None,
        }
    }

    /// Installs the hook run on every instance handed out by [`Self::acquire`].
    #[must_use]
    pub fn with_on_acquire<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&mut T) + 'static,
    {
        self.on_acquire = Some(Box::new(hook));
        self
    }

    /// Installs the hook run on every instance parked by [`Self::release`]
    /// or [`Self::prewarm`].
    #[must_use]
    pub fn with_on_release<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&mut T) + 'static,
    {
        self.on_release = Some(Box::new(hook));
        self
    }

    /// Constructs and parks `count` instances.
    pub fn prewarm(&mut self, count: usize) {
        self.instances.reserve(count);
        self.inactive.reserve(count);

        for _ in 0..count {
            let handle = self.construct();
            if let Some(hook) = self.on_release.as_mut() {
                hook(&mut self.instances[handle.index()]);
            }
            self.inactive.push(handle);
        }

        tracing::debug!(count, total = self.instances.len(), "pool prewarmed");
    }

    /// Hands out an instance.
    ///
    /// Pops the most recently released instance, or constructs a new one
    /// when none is parked. O(1), no allocation unless the pool grows.
    pub fn acquire(&mut self) -> PoolHandle {
        let handle = match self.inactive.pop() {
            Some(handle) => handle,
            None => {
                let handle = self.construct();
                tracing::trace!(total = self.instances.len(), "pool miss, constructed instance");
                handle
            }
        };

        if let Some(hook) = self.on_acquire.as_mut() {
            hook(&mut self.instances[handle.index()]);
        }

        handle
    }

    /// Parks an instance for reuse.
    ///
    /// Handles that this pool did not mint are ignored. Releasing the same
    /// handle twice without an acquire in between is a caller bug.
    pub fn release(&mut self, handle: PoolHandle) {
        let Some(instance) = self.instances.get_mut(handle.index()) else {
            return;
        };
        debug_assert!(
            !self.inactive.contains(&handle),
            "handle {handle:?} released twice"
        );

        if let Some(hook) = self.on_release.as_mut() {
            hook(instance);
        }
        self.inactive.push(handle);
    }

    /// Number of instances currently checked out.
    #[inline]
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.instances.len() - self.inactive.len()
    }

    /// Number of instances parked for reuse.
    #[inline]
    #[must_use]
    pub fn inactive_count(&self) -> usize {
        self.inactive.len()
    }

    /// Number of instances ever constructed.
    #[inline]
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.instances.len()
    }

    /// Gets a reference to an instance.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        self.instances.get(handle.index())
    }

    /// Gets a mutable reference to an instance.
    #[inline]
    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        self.instances.get_mut(handle.index())
    }

    /// Iterates over every instance ever constructed, parked or not.
    pub fn iter(&self) -> impl Iterator<Item = (PoolHandle, &T)> {
        self.instances
            .iter()
            .enumerate()
            .map(|(index, instance)| (PoolHandle { index: index as u32 }, instance))
    }

    fn construct(&mut self) -> PoolHandle {
        let handle = PoolHandle {
            index: self.instances.len() as u32,
        };
        self.instances.push((self.factory)());
        handle
    }
}

impl<T> Index<PoolHandle> for ReusePool<T> {
    type Output = T;

    #[inline]
    fn index(&self, handle: PoolHandle) -> &T {
        &self.instances[handle.index()]
    }
}

impl<T> IndexMut<PoolHandle> for ReusePool<T> {
    #[inline]
    fn index_mut(&mut self, handle: PoolHandle) -> &mut T {
        &mut self.instances[handle.index()]
    }
}

impl<T> fmt::Debug for ReusePool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReusePool")
            .field("total", &self.total_count())
            .field("inactive", &self.inactive_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[derive(Default)]
    struct Token {
        serial: u32,
        visible: bool,
    }

    fn counting_pool() -> ReusePool<Token> {
        let mut next = 0;
        ReusePool::new(8, move || {
            next += 1;
            Token { serial: next, visible: true }
        })
        .with_on_acquire(|t| t.visible = true)
        .with_on_release(|t| t.visible = false)
    }

    #[test]
    fn test_prewarm_parks_instances() {
        let mut pool = counting_pool();
        pool.prewarm(4);

        assert_eq!(pool.total_count(), 4);
        assert_eq!(pool.inactive_count(), 4);
        assert_eq!(pool.active_count(), 0);
        assert!(pool.iter().all(|(_, t)| !t.visible));
    }

    #[test]
    fn test_acquire_is_lifo() {
        let mut pool = counting_pool();
        pool.prewarm(3);

        let a = pool.acquire();
        let b = pool.acquire();
        pool.release(a);
        pool.release(b);

        // Most recently released comes back first
        assert_eq!(pool.acquire(), b);
        assert_eq!(pool.acquire(), a);
    }

    #[test]
    fn test_hooks_toggle_visibility() {
        let mut pool = counting_pool();
        pool.prewarm(1);

        let h = pool.acquire();
        assert!(pool[h].visible);
        pool.release(h);
        assert!(!pool[h].visible);
    }

    #[test]
    fn test_prewarmed_600_then_grow() {
        let mut pool = counting_pool();
        pool.prewarm(600);

        let handles: HashSet<PoolHandle> = (0..600).map(|_| pool.acquire()).collect();
        assert_eq!(handles.len(), 600);
        assert_eq!(pool.inactive_count(), 0);
        assert_eq!(pool.total_count(), 600);

        let extra = pool.acquire();
        assert!(!handles.contains(&extra));
        assert_eq!(pool.total_count(), 601);
        assert_eq!(pool[extra].serial, 601);
    }

    #[test]
    fn test_conservation() {
        let mut pool = counting_pool();
        pool.prewarm(5);
        let mut held = Vec::new();

        for round in 0..20 {
            if round % 3 == 2 {
                if let Some(h) = held.pop() {
                    pool.release(h);
                }
            } else {
                held.push(pool.acquire());
            }
            assert_eq!(pool.total_count(), pool.inactive_count() + held.len());
            assert_eq!(pool.active_count(), held.len());
        }
    }

    #[test]
    fn test_release_foreign_handle_ignored() {
        let mut big = counting_pool();
        big.prewarm(10);
        let foreign = (0..10).map(|_| big.acquire()).last().unwrap();

        let mut small = counting_pool();
        small.prewarm(1);
        small.release(foreign);
        assert_eq!(small.inactive_count(), 1);
    }
}
