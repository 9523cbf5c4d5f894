//! # Auto Attack
//!
//! Fires at the nearest enemy whenever the player's attack cooldown allows.

use horde_core::Vec3;
use serde::Deserialize;

use crate::directory::{EnemyDirectory, ProjectileDirectory};
use crate::entity::ProjectileId;
use crate::player::Player;

/// Slowest allowed attack speed (shots/second).
const MIN_ATTACK_SPEED: f32 = 0.1;

/// Below this squared planar distance the target direction is unreliable.
const MIN_AIM_DISTANCE_SQUARED: f32 = 0.001;

/// Auto-attack settings (`[auto_attack]`).
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AutoAttackConfig {
    /// Targets farther than this are ignored.
    pub range: f32,
    /// Projectile speed.
    pub projectile_speed: f32,
    /// Projectile lifetime (seconds).
    pub projectile_lifetime: f32,
    /// Extra enemies each projectile passes through.
    pub pierce: u32,
    /// Muzzle height above the player's position.
    pub muzzle_height: f32,
}

impl Default for AutoAttackConfig {
    fn default() -> Self {
        Self {
            range: 25.0,
            projectile_speed: 20.0,
            projectile_lifetime: 2.0,
            pierce: 0,
            muzzle_height: 0.75,
        }
    }
}

/// Cooldown-gated nearest-target shooter.
pub struct AutoAttack {
    config: AutoAttackConfig,
    cooldown: f32,
}

impl AutoAttack {
    /// Creates a shooter that may fire immediately.
    #[must_use]
    pub fn new(config: AutoAttackConfig) -> Self {
        Self {
            config,
            cooldown: 0.0,
        }
    }

    /// Ticks the cooldown and fires once if a target is in range.
    ///
    /// The cooldown only restarts when a shot is fired.
    pub fn update(
        &mut self,
        dt: f32,
        player: &Player,
        enemies: &mut EnemyDirectory,
        projectiles: &mut ProjectileDirectory,
    ) -> Option<ProjectileId> {
        self.cooldown -= dt;
        if self.cooldown > 0.0 {
            return None;
        }

        let target = enemies.find_nearest(player.position, self.config.range)?;
        let target_position = enemies.get(target)?.position();

        let aim = (target_position - player.position).flattened();
        let direction = if aim.length_squared() < MIN_AIM_DISTANCE_SQUARED {
            player.facing
        } else {
            aim
        };

        let id = projectiles.spawn(
            player.position + Vec3::UP * self.config.muzzle_height,
            direction,
            player.stats.damage(),
            self.config.projectile_speed,
            self.config.projectile_lifetime,
            self.config.pierce,
        );

        self.cooldown = 1.0 / player.stats.attack_speed().max(MIN_ATTACK_SPEED);
        Some(id)
    }

    /// Seconds until the next shot is allowed (may be negative).
    #[inline]
    #[must_use]
    pub fn cooldown(&self) -> f32 {
        self.cooldown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{EnemyDirectoryConfig, ProjectileDirectoryConfig};
    use crate::entity::{EnemyModifiers, EnemyTemplate, ProjectileTemplate};
    use crate::events::EventBus;
    use crate::player::PlayerStats;

    fn setup() -> (EnemyDirectory, ProjectileDirectory, EventBus) {
        let bus = EventBus::new(64);
        let enemies = EnemyDirectory::new(
            EnemyDirectoryConfig {
                prewarm: 8,
                template: Some(EnemyTemplate::default()),
                ..EnemyDirectoryConfig::default()
            },
            bus.sender(),
        );
        let projectiles = ProjectileDirectory::new(ProjectileDirectoryConfig {
            prewarm: 8,
            hit_buffer: 8,
            template: Some(ProjectileTemplate::default()),
        });
        (enemies, projectiles, bus)
    }

    #[test]
    fn test_fires_at_nearest() {
        let (mut enemies, mut projectiles, _bus) = setup();
        let player = Player::new(Vec3::ZERO, PlayerStats::default());
        enemies.spawn(Vec3::new(10.0, 0.5, 0.0), EnemyModifiers::default());
        enemies.spawn(Vec3::new(0.0, 0.5, -4.0), EnemyModifiers::default());

        let mut attack = AutoAttack::new(AutoAttackConfig::default());
        let shot = attack
            .update(0.016, &player, &mut enemies, &mut projectiles)
            .unwrap();

        let p = projectiles.get(shot).unwrap();
        assert!((p.direction().z + 1.0).abs() < 1e-5);
        assert!((p.position().y - 0.75).abs() < 1e-6);
        assert_eq!(p.damage(), 12.0);
    }

    #[test]
    fn test_respects_cooldown() {
        let (mut enemies, mut projectiles, _bus) = setup();
        let player = Player::new(Vec3::ZERO, PlayerStats::default());
        enemies.spawn(Vec3::new(5.0, 0.0, 0.0), EnemyModifiers::default());

        let mut attack = AutoAttack::new(AutoAttackConfig::default());
        assert!(attack.update(0.1, &player, &mut enemies, &mut projectiles).is_some());
        // 1 / 1.2 = 0.833s between shots
        assert!(attack.update(0.5, &player, &mut enemies, &mut projectiles).is_none());
        assert!(attack.update(0.4, &player, &mut enemies, &mut projectiles).is_some());
        assert_eq!(projectiles.active_count(), 2);
    }

    #[test]
    fn test_no_target_in_range() {
        let (mut enemies, mut projectiles, _bus) = setup();
        let player = Player::new(Vec3::ZERO, PlayerStats::default());
        enemies.spawn(Vec3::new(40.0, 0.0, 0.0), EnemyModifiers::default());

        let mut attack = AutoAttack::new(AutoAttackConfig::default());
        assert!(attack.update(0.1, &player, &mut enemies, &mut projectiles).is_none());
        assert_eq!(projectiles.active_count(), 0);
    }

    #[test]
    fn test_target_on_top_uses_facing() {
        let (mut enemies, mut projectiles, _bus) = setup();
        let mut player = Player::new(Vec3::ZERO, PlayerStats::default());
        player.facing = Vec3::new(1.0, 0.0, 0.0);
        enemies.spawn(Vec3::new(0.0, 0.5, 0.0), EnemyModifiers::default());

        let mut attack = AutoAttack::new(AutoAttackConfig::default());
        let shot = attack
            .update(0.1, &player, &mut enemies, &mut projectiles)
            .unwrap();
        assert_eq!(projectiles.get(shot).unwrap().direction(), player.facing);
    }
}
