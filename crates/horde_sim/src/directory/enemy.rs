//! # Enemy Directory
//!
//! Pool, dense active array, spatial index and amortized tick scheduler for
//! enemies.
//!
//! ## Amortized Ticking
//!
//! A step ticks at most `tick_budget` enemies, resuming from a rotating
//! cursor. Each enemy integrates the real time elapsed since its own last
//! tick, so a population larger than the budget moves at the right speed,
//! just in coarser increments.

use horde_core::{SpatialIndex2D, Vec3};
use serde::Deserialize;

use super::{ActiveSet, DirectoryCounters, OrbDirectory};
use crate::entity::{
    Enemy, EnemyId, EnemyModifiers, EnemySpawn, EnemyTemplate, EntityKind, HealthChange, Pooled,
    MIN_MULTIPLIER,
};
use crate::error::SimWarning;
use crate::events::{EventSender, SimEvent};
use crate::player::Player;

/// Lower bound on the per-enemy integration step (seconds).
const MIN_TICK_DT: f32 = 0.001;

/// Enemy directory settings (`[enemies]`).
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnemyDirectoryConfig {
    /// Instances built at startup.
    pub prewarm: usize,
    /// Spawns beyond this many active enemies are rejected.
    pub max_active: usize,
    /// Enemies ticked per step.
    pub tick_budget: usize,
    /// Spatial index cell edge.
    pub cell_size: f32,
    /// Capacity of the nearest-enemy query buffer.
    pub query_buffer: usize,
    /// Health before the spawn multiplier.
    pub base_hp: f32,
    /// Speed multiplier applied to every spawn.
    pub base_speed_mul: f32,
    /// Damage multiplier applied to every spawn.
    pub base_damage_mul: f32,
    /// Experience reward before the spawn multiplier.
    pub base_xp_reward: f32,
    /// Enemy behaviour. `None` falls back to the built-in template.
    pub template: Option<EnemyTemplate>,
}

impl Default for EnemyDirectoryConfig {
    fn default() -> Self {
        Self {
            prewarm: 600,
            max_active: 500,
            tick_budget: 180,
            cell_size: 2.2,
            query_buffer: 256,
            base_hp: 25.0,
            base_speed_mul: 1.0,
            base_damage_mul: 1.0,
            base_xp_reward: 1.0,
            template: None,
        }
    }
}

/// What an [`EnemyDirectory::apply_damage`] call did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DamageOutcome {
    /// Non-positive damage, unknown handle or already dead.
    Ignored,
    /// Enemy survived.
    Damaged {
        /// Health left.
        remaining: f32,
    },
    /// Enemy died and was despawned; an orb was dropped.
    Killed {
        /// Experience carried by the dropped orb.
        xp_reward: f32,
    },
}

/// Work done by one [`EnemyDirectory::tick`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EnemyTickStats {
    /// Enemies that ran their AI.
    pub processed: usize,
    /// Stale entries dropped from the active array.
    pub evicted: usize,
    /// Contact hits landed on the player.
    pub contact_hits: u32,
    /// Total contact damage dealt.
    pub damage_dealt: f32,
}

/// Owner of every enemy.
pub struct EnemyDirectory {
    set: ActiveSet<Enemy>,
    grid: SpatialIndex2D<EnemyId>,
    config: EnemyDirectoryConfig,
    /// Next dense index the scheduler ticks.
    cursor: usize,
    /// Simulation time as of the last clock update.
    now: f32,
    query_buffer: Vec<EnemyId>,
    events: EventSender,
    warnings: Vec<SimWarning>,
    /// Killing blows since creation, whatever dealt them.
    kills: u64,
}

impl EnemyDirectory {
    /// Creates the directory and prewarms its pool.
    ///
    /// # Arguments
    ///
    /// * `config` - Capacity, scheduling and base stats
    /// * `events` - Where damage and death notifications go
    #[must_use]
    pub fn new(config: EnemyDirectoryConfig, events: EventSender) -> Self {
        let mut warnings = Vec::new();
        let template = config.template.unwrap_or_else(|| {
            let warning = SimWarning::MissingTemplate {
                kind: EntityKind::Enemy,
            };
            tracing::warn!(%warning);
            warnings.push(warning);
            EnemyTemplate::default()
        });

        let set = ActiveSet::new(config.prewarm, move || Enemy::from_template(template));
        let grid = SpatialIndex2D::new(config.cell_size);
        let query_buffer = vec![EnemyId::NULL; config.query_buffer.max(1)];

        tracing::info!(
            prewarm = config.prewarm,
            max_active = config.max_active,
            tick_budget = config.tick_budget,
            cell_size = grid.cell_size(),
            "enemy directory ready"
        );

        Self {
            set,
            grid,
            config,
            cursor: 0,
            now: 0.0,
            query_buffer,
            events,
            warnings,
            kills: 0,
        }
    }

    /// Sets the simulation time used to stamp new spawns.
    #[inline]
    pub fn advance_clock(&mut self, now: f32) {
        self.now = now;
    }

    /// Spawns an enemy at `position`.
    ///
    /// Returns `None` without side effects when `max_active` enemies are
    /// already active.
    pub fn spawn(&mut self, position: Vec3, modifiers: EnemyModifiers) -> Option<EnemyId> {
        if self.set.len() >= self.config.max_active {
            tracing::trace!(max_active = self.config.max_active, "enemy spawn rejected");
            return None;
        }

        let cell = self.grid.cell_of(position.planar());
        let spawn = EnemySpawn {
            position,
            cell,
            max_hp: self.config.base_hp * modifiers.hp.max(MIN_MULTIPLIER),
            speed_mul: self.config.base_speed_mul * modifiers.speed,
            damage_mul: self.config.base_damage_mul * modifiers.damage,
            xp_reward: self.config.base_xp_reward * modifiers.xp,
            now: self.now,
        };

        let id = self.set.activate();
        self.set[id].reset(&spawn);
        self.grid.add(id, cell.0, cell.1);
        Some(id)
    }

    /// Removes an enemy from the simulation and parks it.
    ///
    /// With `award_reward` an orb carrying the enemy's reward is dropped at
    /// its position. Returns `false` (no-op) when the enemy is not active.
    pub fn despawn(&mut self, id: EnemyId, award_reward: bool, orbs: &mut OrbDirectory) -> bool {
        let Some(index) = self.set.index_of(id) else {
            return false;
        };

        let enemy = &self.set[id];
        let (cell_x, cell_y) = enemy.cell();
        let position = enemy.position();
        let xp_reward = enemy.xp_reward();

        self.grid.remove(id, cell_x, cell_y);
        self.remove_active_at(index);

        if award_reward {
            orbs.spawn(position, xp_reward);
        }
        true
    }

    /// Applies damage to an enemy, killing and despawning it on depletion.
    pub fn apply_damage(
        &mut self,
        id: EnemyId,
        amount: f32,
        orbs: &mut OrbDirectory,
    ) -> DamageOutcome {
        if amount <= 0.0 {
            return DamageOutcome::Ignored;
        }
        let Some(enemy) = self.set.get_mut(id) else {
            return DamageOutcome::Ignored;
        };

        match enemy.health_mut().apply_damage(amount) {
            HealthChange::Ignored => DamageOutcome::Ignored,
            HealthChange::Damaged => {
                let remaining = enemy.health().current_hp();
                self.events.send(SimEvent::EnemyDamaged {
                    enemy: id,
                    amount,
                    hp_remaining: remaining,
                });
                DamageOutcome::Damaged { remaining }
            }
            HealthChange::Depleted => {
                let xp_reward = enemy.xp_reward();
                self.events.send(SimEvent::EnemyDied {
                    enemy: id,
                    position: enemy.position(),
                    xp_reward,
                });
                self.despawn(id, true, orbs);
                self.kills += 1;
                DamageOutcome::Killed { xp_reward }
            }
        }
    }

    /// Enemies killed through [`Self::apply_damage`] since creation.
    #[inline]
    #[must_use]
    pub fn total_kills(&self) -> u64 {
        self.kills
    }

    /// Ticks up to `tick_budget` enemies from the rotating cursor.
    ///
    /// Does nothing without a player.
    pub fn tick(&mut self, now: f32, player: Option<&mut Player>) -> EnemyTickStats {
        self.now = now;
        let mut stats = EnemyTickStats::default();
        let Some(player) = player else {
            return stats;
        };

        let to_process = self.set.len().min(self.config.tick_budget.max(1));
        if self.cursor >= self.set.len() {
            self.cursor = 0;
        }

        let mut visited = 0;
        while visited < to_process.min(self.set.len()) {
            visited += 1;
            let index = self.cursor;
            let Some(id) = self.set.handle_at(index) else {
                self.cursor = 0;
                continue;
            };

            if !self.set[id].is_active() {
                let (cell_x, cell_y) = self.set[id].cell();
                self.grid.remove(id, cell_x, cell_y);
                self.remove_active_at(index);
                stats.evicted += 1;
                tracing::debug!(?id, index, "evicted stale enemy entry");
                continue;
            }

            let enemy = &mut self.set[id];
            let dt = (now - enemy.last_tick_time()).max(MIN_TICK_DT);
            enemy.set_last_tick_time(now);

            if let Some(amount) = enemy.tick(dt, player) {
                stats.contact_hits += 1;
                stats.damage_dealt += amount;
                self.events.send(SimEvent::PlayerDamaged {
                    amount,
                    hp_remaining: player.stats.current_hp(),
                    max_hp: player.stats.max_hp(),
                });
            }

            let old_cell = enemy.cell();
            let new_cell = self.grid.cell_of(enemy.position().planar());
            if new_cell != old_cell {
                enemy.set_cell(new_cell);
                self.grid
                    .move_item(id, old_cell.0, old_cell.1, new_cell.0, new_cell.1);
            }

            stats.processed += 1;
            self.cursor += 1;
            if self.cursor >= self.set.len() {
                self.cursor = 0;
            }
        }

        stats
    }

    /// Nearest active enemy within `range` of `position`, measured on the
    /// horizontal plane.
    ///
    /// Candidates come from a bounded spatial query, so in a very dense
    /// neighbourhood the true nearest may be missed.
    pub fn find_nearest(&mut self, position: Vec3, range: f32) -> Option<EnemyId> {
        let center = position.planar();
        let set = &self.set;
        let count = self.grid.query(center, range, &mut self.query_buffer, |id| {
            set[*id].position().planar()
        });

        self.query_buffer[..count]
            .iter()
            .copied()
            .filter_map(|id| {
                let enemy = set.get(id)?;
                Some((id, enemy.position().planar_distance_squared(position)))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    /// Writes active enemies within `radius` of `position` into `out`.
    ///
    /// Truncates at `out.len()`; returns the number written.
    pub fn query_radius(&self, position: Vec3, radius: f32, out: &mut [EnemyId]) -> usize {
        self.grid
            .query(position.planar(), radius, out, |id| self.set[*id].position().planar())
    }

    /// Active enemy behind `id`.
    #[inline]
    #[must_use]
    pub fn get(&self, id: EnemyId) -> Option<&Enemy> {
        self.set.get(id)
    }

    /// Active enemies in dense order.
    pub fn iter_active(&self) -> impl Iterator<Item = (EnemyId, &Enemy)> + '_ {
        self.set.iter_active()
    }

    /// Number of active enemies.
    #[inline]
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.set.len()
    }

    /// Instances ever constructed.
    #[inline]
    #[must_use]
    pub fn pool_total_count(&self) -> usize {
        self.set.counters().pool_total
    }

    /// Instances parked for reuse.
    #[inline]
    #[must_use]
    pub fn pool_inactive_count(&self) -> usize {
        self.set.counters().pool_inactive
    }

    /// Population counters.
    #[must_use]
    pub fn counters(&self) -> DirectoryCounters {
        self.set.counters()
    }

    /// Spatial index over active enemies.
    #[must_use]
    pub fn spatial_index(&self) -> &SpatialIndex2D<EnemyId> {
        &self.grid
    }

    /// Dense index the next tick starts from.
    #[inline]
    #[must_use]
    pub fn tick_cursor(&self) -> usize {
        self.cursor
    }

    /// Settings in use.
    #[must_use]
    pub fn config(&self) -> &EnemyDirectoryConfig {
        &self.config
    }

    /// Conditions recorded at construction.
    #[must_use]
    pub fn warnings(&self) -> &[SimWarning] {
        &self.warnings
    }

    /// Swap-removes dense `index`, keeping the scheduler cursor honest.
    ///
    /// The entry swapped into `index` has not been ticked this round. When
    /// it lands behind the cursor it is exchanged with the last ticked entry
    /// and the cursor steps back onto it.
    fn remove_active_at(&mut self, index: usize) {
        if self.set.remove_at(index).is_none() {
            return;
        }

        if index < self.set.len() && index < self.cursor {
            let last_ticked = self.cursor - 1;
            self.set.swap(index, last_ticked);
            self.cursor = last_ticked;
        }
        if self.cursor >= self.set.len() {
            self.cursor = 0;
        }

        tracing::trace!(index, active = self.set.len(), "enemy removed");
    }
}
