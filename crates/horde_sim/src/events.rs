//! # HORDE Event System
//!
//! Outbound notifications from the simulation core to its collaborators.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐      ┌─────────────┐      ┌─────────────┐
//! │ Directories │─────>│   Bounded   │─────>│  HUD / SFX  │
//! │  Leveling   │      │   Channel   │      │  Telemetry  │
//! └─────────────┘      └─────────────┘      └─────────────┘
//! ```
//!
//! Gameplay-critical reactions (death → despawn → orb) happen synchronously
//! inside the step. Events only tell the outside world what happened; they
//! are drained once per step by whoever cares. The channel is bounded and
//! sends never block: when it is full the event is dropped and counted.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use horde_core::Vec3;

use crate::entity::EnemyId;

/// Notifications emitted by the simulation.
#[derive(Clone, Debug, PartialEq)]
pub enum SimEvent {
    // =========================================================================
    // Enemy Events
    // =========================================================================
    /// An enemy took damage and survived.
    EnemyDamaged {
        /// Enemy that was hit.
        enemy: EnemyId,
        /// Damage applied.
        amount: f32,
        /// Health left after the hit.
        hp_remaining: f32,
    },

    /// An enemy's health reached zero.
    ///
    /// Emitted before the enemy is despawned and its reward orb spawned.
    EnemyDied {
        /// Enemy that died. The handle is recycled right after.
        enemy: EnemyId,
        /// Position of death.
        position: Vec3,
        /// Experience carried by the dropped orb.
        xp_reward: f32,
    },

    // =========================================================================
    // Player Events
    // =========================================================================
    /// An enemy landed a contact hit on the player.
    PlayerDamaged {
        /// Damage applied.
        amount: f32,
        /// Player health after the hit.
        hp_remaining: f32,
        /// Player maximum health.
        max_hp: f32,
    },

    /// The player picked up an experience orb.
    OrbCollected {
        /// Where the orb was when it was collected.
        position: Vec3,
        /// Experience granted.
        xp_value: f32,
    },

    // =========================================================================
    // Progression Events
    // =========================================================================
    /// Experience total changed.
    XpChanged {
        /// Experience accumulated towards the next level.
        current: f32,
        /// Experience required for the next level.
        to_next_level: f32,
    },

    /// The player gained a level.
    LevelChanged {
        /// New level.
        level: u32,
    },

    /// A set of upgrade choices is waiting for a decision.
    UpgradeOffered {
        /// Level the offer belongs to.
        level: u32,
        /// Number of choices on offer.
        choices: usize,
    },
}

/// Event bus between the simulation and its collaborators.
///
/// Pre-allocates a bounded channel to prevent memory growth in the hot path.
pub struct EventBus {
    /// Sender end - held by event producers.
    sender: Sender<SimEvent>,
    /// Receiver end - held by event consumers.
    receiver: Receiver<SimEvent>,
    /// Events dropped because the channel was full.
    dropped: Arc<AtomicU64>,
}

impl EventBus {
    /// Creates a new event bus.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum events in flight before new ones are dropped.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        Self {
            sender,
            receiver,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Creates a sender handle (clone for multiple producers).
    #[must_use]
    pub fn sender(&self) -> EventSender {
        EventSender {
            sender: self.sender.clone(),
            dropped: Arc::clone(&self.dropped),
        }
    }

    /// Creates a receiver handle (clone for multiple consumers).
    #[must_use]
    pub fn receiver(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.receiver.clone(),
        }
    }

    /// Total events dropped on a full channel since creation.
    #[must_use]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Handle for sending events.
#[derive(Clone)]
pub struct EventSender {
    sender: Sender<SimEvent>,
    dropped: Arc<AtomicU64>,
}

impl EventSender {
    /// Sends an event (non-blocking).
    ///
    /// Returns `false` if the channel is full or closed; the event is dropped
    /// to keep the step within budget.
    #[inline]
    pub fn send(&self, event: SimEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_) | TrySendError::Disconnected(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }
}

/// Handle for receiving events.
#[derive(Clone)]
pub struct EventReceiver {
    receiver: Receiver<SimEvent>,
}

impl EventReceiver {
    /// Receives all pending events (non-blocking).
    #[inline]
    pub fn drain(&self) -> Vec<SimEvent> {
        self.receiver.try_iter().collect()
    }

    /// Appends all pending events to `out` without allocating a new vector.
    ///
    /// Returns the number of events appended.
    #[inline]
    pub fn drain_into(&self, out: &mut Vec<SimEvent>) -> usize {
        let before = out.len();
        out.extend(self.receiver.try_iter());
        out.len() - before
    }

    /// Receives one event (non-blocking).
    #[inline]
    pub fn try_recv(&self) -> Option<SimEvent> {
        self.receiver.try_recv().ok()
    }

    /// Returns the number of pending events.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Checks if there are pending events.
    #[inline]
    #[must_use]
    pub fn has_events(&self) -> bool {
        !self.receiver.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_send_receive() {
        let bus = EventBus::new(16);
        let sender = bus.sender();
        let receiver = bus.receiver();

        assert!(sender.send(SimEvent::LevelChanged { level: 2 }));
        assert!(receiver.has_events());
        assert_eq!(receiver.try_recv(), Some(SimEvent::LevelChanged { level: 2 }));
        assert!(!receiver.has_events());
    }

    #[test]
    fn test_full_channel_drops_and_counts() {
        let bus = EventBus::new(2);
        let sender = bus.sender();

        assert!(sender.send(SimEvent::LevelChanged { level: 1 }));
        assert!(sender.send(SimEvent::LevelChanged { level: 2 }));
        assert!(!sender.send(SimEvent::LevelChanged { level: 3 }));
        assert!(!sender.clone().send(SimEvent::LevelChanged { level: 4 }));

        assert_eq!(bus.dropped_count(), 2);
        assert_eq!(bus.receiver().drain().len(), 2);
    }

    #[test]
    fn test_drain_into_reuses_buffer() {
        let bus = EventBus::new(8);
        let sender = bus.sender();
        let receiver = bus.receiver();
        let mut out = Vec::with_capacity(8);

        sender.send(SimEvent::LevelChanged { level: 1 });
        sender.send(SimEvent::LevelChanged { level: 2 });
        assert_eq!(receiver.drain_into(&mut out), 2);
        assert_eq!(receiver.drain_into(&mut out), 0);
        assert_eq!(out.len(), 2);
    }
}
