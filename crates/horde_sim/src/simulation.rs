//! # HORDE Simulation Step
//!
//! The context object that owns every collaborator and steps them in a
//! fixed order:
//! ```text
//! Step N:
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │ 0. PAUSE CHECK                                                      │
//! │    └─ Upgrade choice open → clock frozen, nothing runs             │
//! │                                                                     │
//! │ 1. CLOCK                                                            │
//! │    └─ elapsed += dt, enemy directory stamps spawns with it          │
//! │                                                                     │
//! │ 2. SPAWNER         → EnemyDirectory::spawn                         │
//! │ 3. AUTO-ATTACK     → find_nearest → ProjectileDirectory::spawn     │
//! │ 4. ENEMY TICK      → amortized AI, contact damage, index sync      │
//! │ 5. PROJECTILE TICK → hits → apply_damage → despawn → orb drop      │
//! │ 6. ORB TICK        → attraction, pickup → Leveling::add_xp         │
//! │                                                                     │
//! │ 7. STATS                                                            │
//! │    └─ Frame timing, over-budget warning                            │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Later stages observe what earlier stages did within the same step: a
//! projectile can hit an enemy spawned this step, and an orb dropped by a
//! kill this step can be collected this step.

use std::time::Instant;

use serde::Deserialize;

use crate::auto_attack::AutoAttack;
use crate::config::SimConfig;
use crate::directory::{
    DirectoryCounters, EnemyDirectory, OrbDirectory, ProjectileDirectory,
};
use crate::error::{SimResult, SimWarning};
use crate::events::{EventBus, EventReceiver};
use crate::leveling::Leveling;
use crate::player::Player;
use crate::spawner::EnemySpawner;

/// Largest `dt` a single step integrates (seconds).
///
/// Longer gaps (a stalled host, a debugger break) are clamped to keep
/// enemies from teleporting.
pub const MAX_STEP_DT: f32 = 0.1;

/// Step-level settings (`[simulation]`).
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Event bus capacity. Events beyond it are dropped and counted.
    pub event_capacity: usize,
    /// Step duration above which a warning is logged.
    pub frame_budget_ms: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            event_capacity: 1024,
            frame_budget_ms: 16.6,
        }
    }
}

/// What one [`Simulation::step`] did.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameStats {
    /// Step number.
    pub frame: u64,
    /// Wall-clock time spent in the step, in microseconds.
    pub total_us: u64,
    /// Simulated seconds integrated (0 while paused).
    pub dt: f32,
    /// Step skipped because an upgrade choice is open.
    pub paused: bool,
    /// Enemies spawned.
    pub spawned: u32,
    /// Spawns refused by capacity.
    pub spawn_rejected: u32,
    /// Whether auto-attack fired.
    pub shot_fired: bool,
    /// Enemies whose AI ran.
    pub enemies_ticked: usize,
    /// Contact hits on the player.
    pub contact_hits: u32,
    /// Projectile hits on enemies.
    pub projectile_hits: u32,
    /// Enemies killed since the previous step, by projectiles or by direct
    /// damage through [`Simulation::combat_mut`].
    pub kills: u32,
    /// Orbs collected.
    pub orbs_collected: u32,
}

/// Population and progression snapshot for debug overlays.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SimCounters {
    /// Enemy directory.
    pub enemies: DirectoryCounters,
    /// Projectile directory.
    pub projectiles: DirectoryCounters,
    /// Orb directory.
    pub orbs: DirectoryCounters,
    /// Simulated seconds.
    pub elapsed: f32,
    /// Steps taken, paused ones included.
    pub frame: u64,
    /// Player level.
    pub level: u32,
    /// Events dropped on a full bus.
    pub events_dropped: u64,
}

/// The simulation context.
///
/// Replaces process-wide singletons: every collaborator lives here and is
/// handed to the others as an explicit `&mut` borrow.
pub struct Simulation {
    config: SimulationConfig,
    enemies: EnemyDirectory,
    projectiles: ProjectileDirectory,
    orbs: OrbDirectory,
    player: Option<Player>,
    leveling: Leveling,
    spawner: EnemySpawner,
    auto_attack: AutoAttack,
    bus: EventBus,
    elapsed: f32,
    frame: u64,
    /// Enemy kill total already reported in a `FrameStats`.
    kills_reported: u64,
    warnings: Vec<SimWarning>,
    stats: FrameStatsAccumulator,
}

impl Simulation {
    /// Builds every collaborator and prewarms the pools.
    ///
    /// The player from `[player]` is registered immediately.
    ///
    /// # Errors
    ///
    /// [`crate::SimError::InvalidConfig`] if the config fails validation.
    pub fn new(config: SimConfig) -> SimResult<Self> {
        config.validate()?;

        let bus = EventBus::new(config.simulation.event_capacity);
        let enemies = EnemyDirectory::new(config.enemies, bus.sender());
        let projectiles = ProjectileDirectory::new(config.projectiles);
        let orbs = OrbDirectory::new(config.orbs, bus.sender());
        let leveling = Leveling::new(config.leveling, bus.sender());

        let warnings = enemies
            .warnings()
            .iter()
            .chain(projectiles.warnings())
            .chain(orbs.warnings())
            .copied()
            .collect();

        tracing::info!(
            enemy_pool = enemies.pool_total_count(),
            projectile_pool = projectiles.pool_total_count(),
            orb_pool = orbs.pool_total_count(),
            frame_budget_ms = config.simulation.frame_budget_ms,
            "simulation ready"
        );

        Ok(Self {
            player: Some(Player::from_config(&config.player)),
            spawner: EnemySpawner::new(config.spawner),
            auto_attack: AutoAttack::new(config.auto_attack),
            stats: FrameStatsAccumulator::new(config.simulation.frame_budget_ms),
            config: config.simulation,
            enemies,
            projectiles,
            orbs,
            leveling,
            bus,
            elapsed: 0.0,
            frame: 0,
            kills_reported: 0,
            warnings,
        })
    }

    /// Runs one step of `dt` seconds.
    ///
    /// `dt` is clamped to `[0, MAX_STEP_DT]`. While an upgrade choice is
    /// open the step only counts the frame.
    pub fn step(&mut self, dt: f32) -> FrameStats {
        let start = Instant::now();
        self.frame += 1;
        let mut stats = FrameStats {
            frame: self.frame,
            ..FrameStats::default()
        };

        if self.leveling.is_choosing() {
            stats.paused = true;
            stats.kills = self.take_kills();
            self.stats.record(&stats);
            return stats;
        }

        let dt = dt.clamp(0.0, MAX_STEP_DT);
        stats.dt = dt;
        self.elapsed += dt;
        self.enemies.advance_clock(self.elapsed);

        let player_position = self.player.as_ref().map(|player| player.position);

        let spawn = self.spawner.update(dt, player_position, &mut self.enemies);
        stats.spawned = spawn.spawned;
        stats.spawn_rejected = spawn.rejected;

        if let Some(player) = self.player.as_ref() {
            stats.shot_fired = self
                .auto_attack
                .update(dt, player, &mut self.enemies, &mut self.projectiles)
                .is_some();
        }

        let enemy = self.enemies.tick(self.elapsed, self.player.as_mut());
        stats.enemies_ticked = enemy.processed;
        stats.contact_hits = enemy.contact_hits;

        let projectile = self
            .projectiles
            .tick(dt, &mut self.enemies, &mut self.orbs);
        stats.projectile_hits = projectile.hits;

        let orb = self.orbs.tick(dt, player_position, &mut self.leveling);
        stats.orbs_collected = orb.collected;
        stats.kills = self.take_kills();

        stats.total_us = start.elapsed().as_micros() as u64;
        if stats.total_us as f32 > self.config.frame_budget_ms * 1000.0 {
            tracing::warn!(
                frame = self.frame,
                elapsed_ms = stats.total_us as f64 / 1000.0,
                budget_ms = self.config.frame_budget_ms,
                enemies = self.enemies.active_count(),
                "step exceeded budget"
            );
        }

        self.stats.record(&stats);
        stats
    }

    fn take_kills(&mut self) -> u32 {
        let total = self.enemies.total_kills();
        let fresh = total - self.kills_reported;
        self.kills_reported = total;
        fresh as u32
    }

    /// Replaces the player. `None` leaves every player-dependent stage idle.
    pub fn register_player(&mut self, player: Option<Player>) {
        self.player = player;
    }

    /// The player, if registered.
    #[must_use]
    pub fn player(&self) -> Option<&Player> {
        self.player.as_ref()
    }

    /// Mutable player, for the input collaborator.
    pub fn player_mut(&mut self) -> Option<&mut Player> {
        self.player.as_mut()
    }

    /// Answers the open upgrade offer with slot `slot`.
    ///
    /// Returns `false` when no offer is open, the slot is out of range or no
    /// player is registered.
    pub fn choose_upgrade(&mut self, slot: usize) -> bool {
        let Some(player) = self.player.as_mut() else {
            return false;
        };
        self.leveling.choose(slot, &mut player.stats)
    }

    /// Population and progression snapshot.
    #[must_use]
    pub fn counters(&self) -> SimCounters {
        SimCounters {
            enemies: self.enemies.counters(),
            projectiles: self.projectiles.counters(),
            orbs: self.orbs.counters(),
            elapsed: self.elapsed,
            frame: self.frame,
            level: self.leveling.level(),
            events_dropped: self.bus.dropped_count(),
        }
    }

    /// A receiver for outbound events. Drain it once per step.
    #[must_use]
    pub fn events(&self) -> EventReceiver {
        self.bus.receiver()
    }

    /// Conditions recorded at construction.
    #[must_use]
    pub fn warnings(&self) -> &[SimWarning] {
        &self.warnings
    }

    /// Simulated seconds (frozen while paused).
    #[inline]
    #[must_use]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Steps taken.
    #[inline]
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// True while an upgrade offer is open.
    #[inline]
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.leveling.is_choosing()
    }

    /// Enemy directory.
    #[must_use]
    pub fn enemies(&self) -> &EnemyDirectory {
        &self.enemies
    }

    /// Mutable enemy directory, for external spawns and damage.
    pub fn enemies_mut(&mut self) -> &mut EnemyDirectory {
        &mut self.enemies
    }

    /// Projectile directory.
    #[must_use]
    pub fn projectiles(&self) -> &ProjectileDirectory {
        &self.projectiles
    }

    /// Mutable projectile directory, for external spawns.
    pub fn projectiles_mut(&mut self) -> &mut ProjectileDirectory {
        &mut self.projectiles
    }

    /// Orb directory.
    #[must_use]
    pub fn orbs(&self) -> &OrbDirectory {
        &self.orbs
    }

    /// Mutable orb directory, for external spawns.
    pub fn orbs_mut(&mut self) -> &mut OrbDirectory {
        &mut self.orbs
    }

    /// Enemy directory and orb directory together, as `apply_damage` needs.
    pub fn combat_mut(&mut self) -> (&mut EnemyDirectory, &mut OrbDirectory) {
        (&mut self.enemies, &mut self.orbs)
    }

    /// Leveling state.
    #[must_use]
    pub fn leveling(&self) -> &Leveling {
        &self.leveling
    }

    /// Spawner state.
    #[must_use]
    pub fn spawner(&self) -> &EnemySpawner {
        &self.spawner
    }

    /// Accumulated step timing.
    #[must_use]
    pub fn stats(&self) -> &FrameStatsAccumulator {
        &self.stats
    }
}

/// Accumulator for step statistics.
#[derive(Clone, Debug)]
pub struct FrameStatsAccumulator {
    /// Steps recorded, paused ones included.
    pub frames_recorded: u64,
    /// Steps skipped for an open upgrade choice.
    pub frames_paused: u64,
    /// Sum of step times.
    pub total_us_sum: u64,
    /// Fastest step.
    pub min_frame_us: u64,
    /// Slowest step.
    pub max_frame_us: u64,
    /// Steps that exceeded the budget.
    pub frames_over_budget: u64,
    /// Enemies killed.
    pub kills: u64,
    /// Enemies spawned.
    pub spawned: u64,
    budget_us: u64,
}

impl FrameStatsAccumulator {
    /// Creates an empty accumulator for a budget in milliseconds.
    #[must_use]
    pub fn new(frame_budget_ms: f32) -> Self {
        Self {
            frames_recorded: 0,
            frames_paused: 0,
            total_us_sum: 0,
            min_frame_us: u64::MAX,
            max_frame_us: 0,
            frames_over_budget: 0,
            kills: 0,
            spawned: 0,
            budget_us: (frame_budget_ms * 1000.0) as u64,
        }
    }

    /// Records a step's statistics.
    pub fn record(&mut self, stats: &FrameStats) {
        self.frames_recorded += 1;
        if stats.paused {
            self.frames_paused += 1;
            return;
        }

        self.total_us_sum += stats.total_us;
        self.min_frame_us = self.min_frame_us.min(stats.total_us);
        self.max_frame_us = self.max_frame_us.max(stats.total_us);
        self.kills += u64::from(stats.kills);
        self.spawned += u64::from(stats.spawned);

        if stats.total_us > self.budget_us {
            self.frames_over_budget += 1;
        }
    }

    /// Average step time in milliseconds, paused steps excluded.
    #[must_use]
    pub fn avg_frame_ms(&self) -> f64 {
        let simulated = self.frames_recorded - self.frames_paused;
        if simulated == 0 {
            return 0.0;
        }
        (self.total_us_sum as f64 / simulated as f64) / 1000.0
    }

    /// Fraction of simulated steps over budget.
    #[must_use]
    pub fn over_budget_ratio(&self) -> f64 {
        let simulated = self.frames_recorded - self.frames_paused;
        if simulated == 0 {
            return 0.0;
        }
        self.frames_over_budget as f64 / simulated as f64
    }

    /// Prints a summary of the statistics.
    pub fn print_summary(&self) {
        let min = if self.min_frame_us == u64::MAX {
            0
        } else {
            self.min_frame_us
        };

        println!("╔══════════════════════════════════════════════════════════════════╗");
        println!("║                     STEP STATISTICS SUMMARY                      ║");
        println!("╚══════════════════════════════════════════════════════════════════╝");
        println!();
        println!("┌─ TIMING ─────────────────────────────────────────────────────────┐");
        println!("│ Steps Recorded:     {}", self.frames_recorded);
        println!("│ Steps Paused:       {}", self.frames_paused);
        println!("│ Average Step:       {:.3} ms", self.avg_frame_ms());
        println!("│ Min Step:           {:.3} ms", min as f64 / 1000.0);
        println!("│ Max Step:           {:.3} ms", self.max_frame_us as f64 / 1000.0);
        println!("└──────────────────────────────────────────────────────────────────┘");
        println!();
        println!("┌─ BUDGET ─────────────────────────────────────────────────────────┐");
        println!("│ Target:             {:.3} ms", self.budget_us as f64 / 1000.0);
        println!(
            "│ Over Budget:        {} steps ({:.1}%)",
            self.frames_over_budget,
            self.over_budget_ratio() * 100.0
        );
        println!("└──────────────────────────────────────────────────────────────────┘");
        println!();
        println!("┌─ SWARM ──────────────────────────────────────────────────────────┐");
        println!("│ Spawned:            {}", self.spawned);
        println!("│ Killed:             {}", self.kills);
        println!("└──────────────────────────────────────────────────────────────────┘");
    }
}

#[cfg(test)]
mod tests {
    use horde_core::Vec3;

    use super::*;
    use crate::directory::DamageOutcome;
    use crate::entity::{EnemyModifiers, EnemyTemplate, OrbTemplate, ProjectileTemplate};

    fn quiet_config() -> SimConfig {
        let mut config = SimConfig::default();
        config.enemies.prewarm = 16;
        config.enemies.template = Some(EnemyTemplate::default());
        config.projectiles.prewarm = 16;
        config.projectiles.template = Some(ProjectileTemplate::default());
        config.orbs.prewarm = 16;
        config.orbs.template = Some(OrbTemplate::default());
        config.spawner.initial_rate = 0.0;
        config
    }

    #[test]
    fn test_creation() {
        let sim = Simulation::new(quiet_config()).unwrap();
        assert_eq!(sim.frame(), 0);
        assert!(sim.player().is_some());
        assert!(sim.warnings().is_empty());
    }

    #[test]
    fn test_missing_templates_collected() {
        let sim = Simulation::new(SimConfig::default()).unwrap();
        assert_eq!(sim.warnings().len(), 3);
    }

    #[test]
    fn test_dt_clamped() {
        let mut sim = Simulation::new(quiet_config()).unwrap();
        assert_eq!(sim.step(5.0).dt, MAX_STEP_DT);
        assert_eq!(sim.step(-1.0).dt, 0.0);
        assert!((sim.elapsed() - MAX_STEP_DT).abs() < f32::EPSILON);
    }

    #[test]
    fn test_no_player_idles() {
        let mut config = quiet_config();
        config.spawner.initial_rate = 100.0;
        let mut sim = Simulation::new(config).unwrap();
        sim.register_player(None);

        let stats = sim.step(0.1);
        assert_eq!(stats.spawned, 0);
        assert!(!stats.shot_fired);
        assert!(!sim.choose_upgrade(0));
    }

    #[test]
    fn test_direct_kills_reported_once() {
        let mut sim = Simulation::new(quiet_config()).unwrap();
        let ids: Vec<_> = [-40.0, 40.0]
            .into_iter()
            .filter_map(|z| {
                sim.enemies_mut()
                    .spawn(Vec3::new(0.0, 0.5, z), EnemyModifiers::default())
            })
            .collect();

        let (enemies, orbs) = sim.combat_mut();
        assert!(matches!(
            enemies.apply_damage(ids[0], 1_000.0, orbs),
            DamageOutcome::Killed { .. }
        ));

        let stats = sim.step(0.1);
        assert_eq!(stats.kills, 1);
        assert_eq!(stats.projectile_hits, 0);
        assert_eq!(sim.step(0.1).kills, 0);
        assert_eq!(sim.enemies().total_kills(), 1);
    }

    #[test]
    fn test_accumulator_skips_paused() {
        let mut acc = FrameStatsAccumulator::new(16.6);
        acc.record(&FrameStats {
            total_us: 20_000,
            ..FrameStats::default()
        });
        acc.record(&FrameStats {
            paused: true,
            ..FrameStats::default()
        });

        assert_eq!(acc.frames_recorded, 2);
        assert_eq!(acc.frames_paused, 1);
        assert_eq!(acc.frames_over_budget, 1);
        assert!((acc.avg_frame_ms() - 20.0).abs() < 1e-9);
    }
}
