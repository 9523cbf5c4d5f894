//! # Enemy Payload
//!
//! Chaser AI: walk straight at the player on the horizontal plane and deal
//! contact damage on a cooldown.

use horde_core::Vec3;
use serde::Deserialize;

use super::ActiveSlot;
use crate::player::Player;

/// Floor applied to every spawn multiplier.
pub const MIN_MULTIPLIER: f32 = 0.1;

/// Closer than this (squared) the enemy stops steering.
const ARRIVAL_DISTANCE_SQUARED: f32 = 0.0001;

/// Base behaviour shared by every enemy built from the same template.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnemyTemplate {
    /// Walk speed before multipliers (units/second).
    pub move_speed: f32,
    /// Contact damage before multipliers.
    pub contact_damage: f32,
    /// Seconds between two contact hits.
    pub contact_cooldown: f32,
    /// Planar distance at which contact damage applies.
    pub contact_range: f32,
}

impl Default for EnemyTemplate {
    fn default() -> Self {
        Self {
            move_speed: 2.5,
            contact_damage: 5.0,
            contact_cooldown: 0.8,
            contact_range: 0.9,
        }
    }
}

/// Per-spawn scaling requested by the spawner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyModifiers {
    /// Health multiplier.
    pub hp: f32,
    /// Speed multiplier.
    pub speed: f32,
    /// Damage multiplier.
    pub damage: f32,
    /// Experience reward multiplier.
    pub xp: f32,
}

impl Default for EnemyModifiers {
    fn default() -> Self {
        Self {
            hp: 1.0,
            speed: 1.0,
            damage: 1.0,
            xp: 1.0,
        }
    }
}

/// Result of applying damage to a [`Health`] pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HealthChange {
    /// Non-positive damage or already depleted.
    Ignored,
    /// Health dropped but is still above zero.
    Damaged,
    /// This hit brought health to zero.
    Depleted,
}

/// Hit points.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Health {
    max_hp: f32,
    current_hp: f32,
}

impl Health {
    /// Refills to a new maximum (at least 1).
    pub fn reset(&mut self, max_hp: f32) {
        self.max_hp = max_hp.max(1.0);
        self.current_hp = self.max_hp;
    }

    /// Subtracts `value`, clamping at zero.
    ///
    /// Reports [`HealthChange::Depleted`] exactly once per life.
    pub fn apply_damage(&mut self, value: f32) -> HealthChange {
        if value <= 0.0 || self.current_hp <= 0.0 {
            return HealthChange::Ignored;
        }

        self.current_hp -= value;
        if self.current_hp <= 0.0 {
            self.current_hp = 0.0;
            return HealthChange::Depleted;
        }
        HealthChange::Damaged
    }

    /// Maximum hit points.
    #[must_use]
    pub fn max_hp(&self) -> f32 {
        self.max_hp
    }

    /// Current hit points.
    #[must_use]
    pub fn current_hp(&self) -> f32 {
        self.current_hp
    }
}

/// Everything a spawn writes into a recycled enemy.
pub(crate) struct EnemySpawn {
    pub position: Vec3,
    pub cell: (i32, i32),
    pub max_hp: f32,
    pub speed_mul: f32,
    pub damage_mul: f32,
    pub xp_reward: f32,
    pub now: f32,
}

/// A pooled enemy.
#[derive(Clone, Debug)]
pub struct Enemy {
    slot: ActiveSlot,
    visible: bool,
    template: EnemyTemplate,
    position: Vec3,
    facing: Vec3,
    health: Health,
    /// Cell last registered with the spatial index.
    cell: (i32, i32),
    last_tick_time: f32,
    xp_reward: f32,
    speed_mul: f32,
    damage_mul: f32,
    move_speed: f32,
    contact_damage: f32,
    cooldown_remaining: f32,
}

impl_pooled!(Enemy);

impl Enemy {
    pub(crate) fn from_template(template: EnemyTemplate) -> Self {
        Self {
            slot: ActiveSlot::default(),
            visible: false,
            template,
            position: Vec3::ZERO,
            facing: Vec3::FORWARD,
            health: Health::default(),
            cell: (0, 0),
            last_tick_time: 0.0,
            xp_reward: 0.0,
            speed_mul: 1.0,
            damage_mul: 1.0,
            move_speed: template.move_speed,
            contact_damage: template.contact_damage,
            cooldown_remaining: 0.0,
        }
    }

    /// Re-initializes the payload for a new life.
    pub(crate) fn reset(&mut self, spawn: &EnemySpawn) {
        self.position = spawn.position;
        self.facing = Vec3::FORWARD;
        self.cell = spawn.cell;
        self.health.reset(spawn.max_hp);
        self.speed_mul = spawn.speed_mul;
        self.damage_mul = spawn.damage_mul;
        self.xp_reward = spawn.xp_reward.max(1.0);
        self.move_speed = self.template.move_speed * spawn.speed_mul.max(MIN_MULTIPLIER);
        self.contact_damage = self.template.contact_damage * spawn.damage_mul.max(MIN_MULTIPLIER);
        self.cooldown_remaining = 0.0;
        self.last_tick_time = spawn.now;
    }

    /// Advances the chaser AI by `dt` seconds.
    ///
    /// Returns the contact damage dealt to the player, if any.
    pub(crate) fn tick(&mut self, dt: f32, player: &mut Player) -> Option<f32> {
        if dt <= 0.0 {
            return None;
        }

        let delta = (player.position - self.position).flattened();
        let distance_sq = delta.length_squared();
        if distance_sq > ARRIVAL_DISTANCE_SQUARED {
            let direction = delta * (1.0 / distance_sq.sqrt());
            self.position += direction * (self.move_speed * dt);
            self.facing = direction;
        }

        self.cooldown_remaining -= dt;
        let range_sq = self.template.contact_range * self.template.contact_range;
        if self.cooldown_remaining > 0.0 || distance_sq > range_sq {
            return None;
        }

        self.cooldown_remaining = self.template.contact_cooldown;
        player
            .stats
            .apply_damage(self.contact_damage)
            .then_some(self.contact_damage)
    }

    /// World position.
    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Unit facing on the horizontal plane.
    #[inline]
    #[must_use]
    pub fn facing(&self) -> Vec3 {
        self.facing
    }

    /// Hit points.
    #[inline]
    #[must_use]
    pub fn health(&self) -> &Health {
        &self.health
    }

    #[inline]
    pub(crate) fn health_mut(&mut self) -> &mut Health {
        &mut self.health
    }

    /// Cell last registered with the spatial index.
    #[inline]
    #[must_use]
    pub fn cell(&self) -> (i32, i32) {
        self.cell
    }

    #[inline]
    pub(crate) fn set_cell(&mut self, cell: (i32, i32)) {
        self.cell = cell;
    }

    /// Simulation time of the last tick (or of the spawn).
    #[inline]
    #[must_use]
    pub fn last_tick_time(&self) -> f32 {
        self.last_tick_time
    }

    #[inline]
    pub(crate) fn set_last_tick_time(&mut self, now: f32) {
        self.last_tick_time = now;
    }

    /// Experience carried by the orb this enemy drops.
    #[inline]
    #[must_use]
    pub fn xp_reward(&self) -> f32 {
        self.xp_reward
    }

    /// Speed multiplier applied at spawn.
    #[inline]
    #[must_use]
    pub fn speed_mul(&self) -> f32 {
        self.speed_mul
    }

    /// Damage multiplier applied at spawn.
    #[inline]
    #[must_use]
    pub fn damage_mul(&self) -> f32 {
        self.damage_mul
    }

    /// Effective walk speed.
    #[inline]
    #[must_use]
    pub fn move_speed(&self) -> f32 {
        self.move_speed
    }

    /// Effective contact damage.
    #[inline]
    #[must_use]
    pub fn contact_damage(&self) -> f32 {
        self.contact_damage
    }

    /// Whether the render collaborator should draw this enemy.
    #[inline]
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Pooled;
    use crate::player::{Player, PlayerStats};

    fn spawned_at(position: Vec3) -> Enemy {
        let mut enemy = Enemy::from_template(EnemyTemplate::default());
        enemy.reset(&EnemySpawn {
            position,
            cell: (0, 0),
            max_hp: 25.0,
            speed_mul: 1.0,
            damage_mul: 1.0,
            xp_reward: 1.0,
            now: 0.0,
        });
        enemy
    }

    #[test]
    fn test_health_depletes_once() {
        let mut health = Health::default();
        health.reset(10.0);

        assert_eq!(health.apply_damage(0.0), HealthChange::Ignored);
        assert_eq!(health.apply_damage(4.0), HealthChange::Damaged);
        assert_eq!(health.apply_damage(40.0), HealthChange::Depleted);
        assert_eq!(health.current_hp(), 0.0);
        assert_eq!(health.apply_damage(1.0), HealthChange::Ignored);
    }

    #[test]
    fn test_health_floor_of_one() {
        let mut health = Health::default();
        health.reset(0.2);
        assert_eq!(health.max_hp(), 1.0);
    }

    #[test]
    fn test_moves_toward_player_on_plane() {
        let mut enemy = spawned_at(Vec3::new(10.0, 0.5, 0.0));
        let mut player = Player::new(Vec3::new(0.0, 3.0, 0.0), PlayerStats::default());

        assert!(enemy.tick(1.0, &mut player).is_none());
        let p = enemy.position();
        assert!((p.x - 7.5).abs() < 1e-5);
        assert!((p.y - 0.5).abs() < f32::EPSILON);
        assert!((enemy.facing().x + 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_contact_damage_respects_cooldown() {
        let mut enemy = spawned_at(Vec3::new(0.5, 0.0, 0.0));
        let mut player = Player::new(Vec3::ZERO, PlayerStats::default());

        assert_eq!(enemy.tick(0.1, &mut player), Some(5.0));
        assert!((player.stats.current_hp() - 95.0).abs() < 1e-5);

        // Cooldown 0.8s: a 0.5s tick is not enough
        assert_eq!(enemy.tick(0.5, &mut player), None);
        assert_eq!(enemy.tick(0.4, &mut player), Some(5.0));
    }

    #[test]
    fn test_multipliers_scale_ai() {
        let mut enemy = Enemy::from_template(EnemyTemplate::default());
        enemy.reset(&EnemySpawn {
            position: Vec3::ZERO,
            cell: (0, 0),
            max_hp: 50.0,
            speed_mul: 2.0,
            damage_mul: 0.0,
            xp_reward: 0.5,
            now: 3.0,
        });

        assert!((enemy.move_speed() - 5.0).abs() < 1e-6);
        assert!((enemy.contact_damage() - 0.5).abs() < 1e-6);
        assert_eq!(enemy.xp_reward(), 1.0);
        assert_eq!(enemy.last_tick_time(), 3.0);
        assert!(!enemy.is_active());
    }
}
