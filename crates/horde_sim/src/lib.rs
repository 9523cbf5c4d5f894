//! # HORDE Simulation
//!
//! Real-time survivor-style swarm simulation on top of [`horde_core`].
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           Simulation                             │
//! │                                                                  │
//! │  EnemySpawner ──spawn──> EnemyDirectory <──query── AutoAttack    │
//! │                          (pool + grid +            │             │
//! │                           round-robin tick)        │ spawn       │
//! │                               ▲    │               ▼             │
//! │                 apply_damage  │    │ despawn  ProjectileDirectory│
//! │                               └────┼───────────────┘             │
//! │                                    ▼                             │
//! │                              OrbDirectory ──add_xp──> Leveling   │
//! │                                                                  │
//! │  EventBus ──> HUD / audio / telemetry (drained once per step)    │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Architecture Rules
//!
//! 1. **No allocation in the step** - every entity comes from a prewarmed
//!    pool, every query writes into a buffer owned by its directory
//! 2. **Bounded step cost** - at most `tick_budget` enemies run their AI per
//!    step; the rest integrate their elapsed time on their next turn
//! 3. **Nothing in the step fails** - capacity, missing players and stale
//!    handles degrade to no-ops; only configuration can return an error
//!
//! ## Example
//!
//! ```rust
//! use horde_sim::{SimConfig, Simulation};
//!
//! let mut sim = Simulation::new(SimConfig::default()).unwrap();
//! for _ in 0..60 {
//!     sim.step(1.0 / 60.0);
//! }
//! assert!(sim.counters().enemies.is_conserved());
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod auto_attack;
pub mod config;
pub mod directory;
pub mod entity;
pub mod error;
pub mod events;
pub mod leveling;
pub mod player;
pub mod simulation;
pub mod spawner;

pub use auto_attack::{AutoAttack, AutoAttackConfig};
pub use config::SimConfig;
pub use directory::{
    ActiveSet, DamageOutcome, DirectoryCounters, EnemyDirectory, EnemyDirectoryConfig,
    EnemyTickStats, OrbDirectory, OrbDirectoryConfig, OrbTickStats, ProjectileDirectory,
    ProjectileDirectoryConfig, ProjectileTickStats,
};
pub use entity::{
    Enemy, EnemyId, EnemyModifiers, EnemyTemplate, EntityKind, Orb, OrbId, OrbTemplate, Pooled,
    Projectile, ProjectileId, ProjectileTemplate,
};
pub use error::{SimError, SimResult, SimWarning};
pub use events::{EventBus, EventReceiver, EventSender, SimEvent};
pub use leveling::{Leveling, LevelingConfig, XpSink};
pub use player::{Player, PlayerConfig, PlayerStats, Upgrade, UpgradeKind};
pub use simulation::{FrameStats, FrameStatsAccumulator, SimCounters, Simulation, SimulationConfig};
pub use spawner::{EnemySpawner, SpawnStats, SpawnerConfig};
