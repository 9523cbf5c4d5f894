//! # Enemy Spawner
//!
//! Rate accumulator with stepped difficulty. Every `difficulty_step_seconds`
//! the spawn rate is multiplied and every new enemy gets stronger
//! multipliers. Spawns land on a ring around the player.

use std::f32::consts::TAU;

use horde_core::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;

use crate::directory::EnemyDirectory;
use crate::entity::EnemyModifiers;

/// Spawner settings (`[spawner]`).
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpawnerConfig {
    /// Enemies per second at the start.
    pub initial_rate: f32,
    /// Rate multiplier applied at each difficulty step.
    pub rate_multiplier_per_step: f32,
    /// Seconds between difficulty steps.
    pub difficulty_step_seconds: f32,
    /// Inner radius of the spawn ring.
    pub min_distance: f32,
    /// Outer radius of the spawn ring.
    pub max_distance: f32,
    /// Spawn height.
    pub spawn_height: f32,
    /// Health multiplier added per step.
    pub hp_growth_per_step: f32,
    /// Speed multiplier added per step.
    pub speed_growth_per_step: f32,
    /// Damage multiplier added per step.
    pub damage_growth_per_step: f32,
    /// Experience multiplier added per step.
    pub xp_growth_per_step: f32,
    /// Seed for spawn placement.
    pub seed: u64,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            initial_rate: 8.0,
            rate_multiplier_per_step: 1.15,
            difficulty_step_seconds: 30.0,
            min_distance: 18.0,
            max_distance: 24.0,
            spawn_height: 0.5,
            hp_growth_per_step: 0.18,
            speed_growth_per_step: 0.05,
            damage_growth_per_step: 0.08,
            xp_growth_per_step: 0.08,
            seed: 0x5EED_0042,
        }
    }
}

/// Result of one [`EnemySpawner::update`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SpawnStats {
    /// Enemies spawned.
    pub spawned: u32,
    /// Spawns refused by the directory's capacity limit.
    pub rejected: u32,
}

/// Spawns enemies around the player at a rising rate.
pub struct EnemySpawner {
    config: SpawnerConfig,
    rng: ChaCha8Rng,
    spawn_rate: f32,
    accumulator: f32,
    step_timer: f32,
    difficulty_step: u32,
    total_rejected: u64,
}

impl EnemySpawner {
    /// Creates a spawner at difficulty step 0.
    #[must_use]
    pub fn new(config: SpawnerConfig) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            spawn_rate: config.initial_rate,
            accumulator: 0.0,
            step_timer: 0.0,
            difficulty_step: 0,
            total_rejected: 0,
            config,
        }
    }

    /// Advances the clocks and spawns what the accumulator owes.
    ///
    /// Does nothing without a player.
    pub fn update(
        &mut self,
        dt: f32,
        player: Option<Vec3>,
        enemies: &mut EnemyDirectory,
    ) -> SpawnStats {
        let mut stats = SpawnStats::default();
        let Some(center) = player else {
            return stats;
        };

        self.step_timer += dt;
        if self.config.difficulty_step_seconds > 0.0
            && self.step_timer >= self.config.difficulty_step_seconds
        {
            self.step_timer -= self.config.difficulty_step_seconds;
            self.difficulty_step += 1;
            self.spawn_rate *= self.config.rate_multiplier_per_step;
            tracing::info!(
                step = self.difficulty_step,
                rate = self.spawn_rate,
                "difficulty increased"
            );
        }

        self.accumulator += self.spawn_rate * dt;
        while self.accumulator >= 1.0 {
            self.accumulator -= 1.0;
            if enemies.spawn(self.spawn_position(center), self.modifiers()).is_some() {
                stats.spawned += 1;
            } else {
                stats.rejected += 1;
            }
        }

        self.total_rejected += u64::from(stats.rejected);
        stats
    }

    /// Multipliers for an enemy spawned at the current difficulty.
    #[must_use]
    pub fn modifiers(&self) -> EnemyModifiers {
        let step = self.difficulty_step as f32;
        EnemyModifiers {
            hp: 1.0 + step * self.config.hp_growth_per_step,
            speed: 1.0 + step * self.config.speed_growth_per_step,
            damage: 1.0 + step * self.config.damage_growth_per_step,
            xp: 1.0 + step * self.config.xp_growth_per_step,
        }
    }

    /// Current difficulty step (starts at 0).
    #[inline]
    #[must_use]
    pub fn difficulty_step(&self) -> u32 {
        self.difficulty_step
    }

    /// Current enemies per second.
    #[inline]
    #[must_use]
    pub fn spawn_rate(&self) -> f32 {
        self.spawn_rate
    }

    /// Spawns refused by capacity since creation.
    #[inline]
    #[must_use]
    pub fn total_rejected(&self) -> u64 {
        self.total_rejected
    }

    fn spawn_position(&mut self, center: Vec3) -> Vec3 {
        let angle = self.rng.gen::<f32>() * TAU;
        let (min, max) = (self.config.min_distance, self.config.max_distance);
        let distance = if max > min {
            self.rng.gen_range(min..max)
        } else {
            min
        };

        Vec3::new(
            center.x + angle.cos() * distance,
            self.config.spawn_height,
            center.z + angle.sin() * distance,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::EnemyDirectoryConfig;
    use crate::entity::EnemyTemplate;
    use crate::events::EventBus;

    fn enemies(max_active: usize) -> (EnemyDirectory, EventBus) {
        let bus = EventBus::new(64);
        let dir = EnemyDirectory::new(
            EnemyDirectoryConfig {
                prewarm: 16,
                max_active,
                template: Some(EnemyTemplate::default()),
                ..EnemyDirectoryConfig::default()
            },
            bus.sender(),
        );
        (dir, bus)
    }

    #[test]
    fn test_rate_accumulates() {
        let (mut dir, _bus) = enemies(100);
        let mut spawner = EnemySpawner::new(SpawnerConfig::default());

        // 8/s: 0.1s owes 0.8, the next 0.1s crosses 1.0
        assert_eq!(spawner.update(0.1, Some(Vec3::ZERO), &mut dir).spawned, 0);
        assert_eq!(spawner.update(0.1, Some(Vec3::ZERO), &mut dir).spawned, 1);
        assert_eq!(spawner.update(1.0, Some(Vec3::ZERO), &mut dir).spawned, 8);
    }

    #[test]
    fn test_spawns_on_ring() {
        let (mut dir, _bus) = enemies(100);
        let mut spawner = EnemySpawner::new(SpawnerConfig::default());
        let center = Vec3::new(5.0, 0.0, -3.0);
        spawner.update(2.0, Some(center), &mut dir);

        for (_, enemy) in dir.iter_active() {
            let d = enemy.position().planar_distance_squared(center).sqrt();
            assert!((18.0..=24.0).contains(&d), "distance {d}");
            assert_eq!(enemy.position().y, 0.5);
        }
    }

    #[test]
    fn test_difficulty_step_scales() {
        let (mut dir, _bus) = enemies(0);
        let mut spawner = EnemySpawner::new(SpawnerConfig::default());

        spawner.update(30.0, Some(Vec3::ZERO), &mut dir);
        assert_eq!(spawner.difficulty_step(), 1);
        assert!((spawner.spawn_rate() - 9.2).abs() < 1e-4);

        let m = spawner.modifiers();
        assert!((m.hp - 1.18).abs() < 1e-6);
        assert!((m.speed - 1.05).abs() < 1e-6);
        assert!((m.damage - 1.08).abs() < 1e-6);
        assert!((m.xp - 1.08).abs() < 1e-6);
    }

    #[test]
    fn test_capacity_rejections_counted() {
        let (mut dir, _bus) = enemies(3);
        let mut spawner = EnemySpawner::new(SpawnerConfig::default());

        let stats = spawner.update(1.0, Some(Vec3::ZERO), &mut dir);
        assert_eq!(stats.spawned, 3);
        assert_eq!(stats.rejected, 5);
        assert_eq!(spawner.total_rejected(), 5);
    }

    #[test]
    fn test_no_player_no_spawn() {
        let (mut dir, _bus) = enemies(10);
        let mut spawner = EnemySpawner::new(SpawnerConfig::default());
        assert_eq!(spawner.update(5.0, None, &mut dir), SpawnStats::default());
        assert_eq!(dir.active_count(), 0);
    }
}
