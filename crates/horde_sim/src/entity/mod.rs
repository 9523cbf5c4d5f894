//! # Pooled Entities
//!
//! Payload types for the three entity kinds the simulation churns through.
//!
//! Every payload is built once by its directory's pool factory and then
//! recycled forever. Spawning re-initializes the payload in place; nothing
//! is allocated or dropped while the simulation runs.
//!
//! The three kinds share one capability, [`Pooled`]: knowing where they sit
//! in their directory's dense active array and whether they are visible.

use std::fmt;

use horde_core::PoolHandle;

/// Implements [`Pooled`] for a payload with `slot` and `visible` fields.
///
/// Defined ahead of the payload modules so they see it by textual scope.
macro_rules! impl_pooled {
    ($ty:ty) => {
        impl $crate::entity::Pooled for $ty {
            #[inline]
            fn slot(&self) -> &$crate::entity::ActiveSlot {
                &self.slot
            }

            #[inline]
            fn slot_mut(&mut self) -> &mut $crate::entity::ActiveSlot {
                &mut self.slot
            }

            #[inline]
            fn set_visible(&mut self, visible: bool) {
                self.visible = visible;
            }
        }
    };
}

mod enemy;
mod orb;
mod projectile;

pub(crate) use enemy::EnemySpawn;
pub use enemy::{Enemy, EnemyModifiers, EnemyTemplate, Health, HealthChange, MIN_MULTIPLIER};
pub(crate) use orb::OrbAction;
pub use orb::{Orb, OrbTemplate};
pub use projectile::{Projectile, ProjectileTemplate};

/// Handle to a pooled enemy.
pub type EnemyId = PoolHandle;

/// Handle to a pooled projectile.
pub type ProjectileId = PoolHandle;

/// Handle to a pooled experience orb.
pub type OrbId = PoolHandle;

/// The kinds of entity the simulation manages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Hostile that chases the player.
    Enemy,
    /// Player shot.
    Projectile,
    /// Experience pickup.
    Orb,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Enemy => "enemy",
            EntityKind::Projectile => "projectile",
            EntityKind::Orb => "orb",
        })
    }
}

/// Membership of an entity in its directory's dense active array.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActiveSlot {
    /// Position in the dense array, `None` while pooled.
    index: Option<usize>,
    /// Visible to queries and ticking.
    active: bool,
}

impl ActiveSlot {
    /// Position in the dense active array, `None` while pooled.
    #[inline]
    #[must_use]
    pub const fn index(&self) -> Option<usize> {
        self.index
    }

    /// True between spawn and despawn.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn activate(&mut self, index: usize) {
        self.index = Some(index);
        self.active = true;
    }

    pub(crate) fn relocate(&mut self, index: usize) {
        self.index = Some(index);
    }

    pub(crate) fn deactivate(&mut self) {
        self.index = None;
        self.active = false;
    }
}

/// Capability shared by every pooled payload.
pub trait Pooled {
    /// Dense-array membership.
    fn slot(&self) -> &ActiveSlot;

    /// Mutable dense-array membership.
    fn slot_mut(&mut self) -> &mut ActiveSlot;

    /// Shows or hides the entity for the render collaborator.
    fn set_visible(&mut self, visible: bool);

    /// True between spawn and despawn.
    #[inline]
    fn is_active(&self) -> bool {
        self.slot().is_active()
    }

    /// Position in the dense active array, `None` while pooled.
    #[inline]
    fn active_index(&self) -> Option<usize> {
        self.slot().index()
    }
}
