//! # Player
//!
//! The single target every enemy chases, plus the stats upgrades modify.

use horde_core::Vec3;
use serde::Deserialize;

/// Lower bound on max health after upgrades.
const MIN_MAX_HP: f32 = 1.0;

/// Lower bound on attack and walk speed after upgrades.
const MIN_UPGRADED_SPEED: f32 = 0.1;

/// Player starting stats (`[player]`).
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerConfig {
    /// Starting maximum health.
    pub max_hp: f32,
    /// Walk speed (units/second).
    pub move_speed: f32,
    /// Damage per projectile.
    pub damage: f32,
    /// Shots per second.
    pub attack_speed: f32,
    /// Where the player stands at startup.
    pub spawn_position: [f32; 3],
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_hp: 100.0,
            move_speed: 6.0,
            damage: 12.0,
            attack_speed: 1.2,
            spawn_position: [0.0, 0.0, 0.0],
        }
    }
}

/// Which stat an [`Upgrade`] raises.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeKind {
    /// Adds to projectile damage.
    Damage,
    /// Adds to shots per second, floored at 0.1.
    AttackSpeed,
    /// Adds to walk speed, floored at 0.1.
    MoveSpeed,
    /// Adds to maximum health and heals to full.
    MaxHp,
}

/// A level-up reward (`[[leveling.upgrades]]`).
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Upgrade {
    /// Short title.
    pub name: String,
    /// One-line description for the offer screen.
    #[serde(default)]
    pub description: String,
    /// Stat affected.
    pub kind: UpgradeKind,
    /// Amount added.
    pub value: f32,
}

/// Mutable player stats.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerStats {
    max_hp: f32,
    current_hp: f32,
    move_speed: f32,
    damage: f32,
    attack_speed: f32,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self::from_config(&PlayerConfig::default())
    }
}

impl PlayerStats {
    /// Full-health stats from the config.
    #[must_use]
    pub fn from_config(config: &PlayerConfig) -> Self {
        let max_hp = config.max_hp.max(MIN_MAX_HP);
        Self {
            max_hp,
            current_hp: max_hp,
            move_speed: config.move_speed,
            damage: config.damage,
            attack_speed: config.attack_speed,
        }
    }

    /// Subtracts `value` from health, clamping at zero.
    ///
    /// Returns `false` when nothing happened (non-positive damage or the
    /// player is already dead).
    pub fn apply_damage(&mut self, value: f32) -> bool {
        if value <= 0.0 || self.is_dead() {
            return false;
        }
        self.current_hp = (self.current_hp - value).max(0.0);
        true
    }

    /// Restores up to `value` health. Dead players stay dead.
    pub fn heal(&mut self, value: f32) {
        if value <= 0.0 || self.is_dead() {
            return;
        }
        self.current_hp = (self.current_hp + value).min(self.max_hp);
    }

    /// Sets the maximum health, clamping current health to it.
    pub fn set_max_hp(&mut self, value: f32, heal_to_full: bool) {
        self.max_hp = value.max(MIN_MAX_HP);
        self.current_hp = if heal_to_full {
            self.max_hp
        } else {
            self.current_hp.min(self.max_hp)
        };
    }

    /// Applies an upgrade's bonus.
    pub fn apply_upgrade(&mut self, upgrade: &Upgrade) {
        match upgrade.kind {
            UpgradeKind::Damage => self.damage += upgrade.value,
            UpgradeKind::AttackSpeed => {
                self.attack_speed = (self.attack_speed + upgrade.value).max(MIN_UPGRADED_SPEED);
            }
            UpgradeKind::MoveSpeed => {
                self.move_speed = (self.move_speed + upgrade.value).max(MIN_UPGRADED_SPEED);
            }
            UpgradeKind::MaxHp => self.set_max_hp(self.max_hp + upgrade.value, true),
        }
        tracing::debug!(name = %upgrade.name, kind = ?upgrade.kind, value = upgrade.value, "upgrade applied");
    }

    /// True at zero health.
    #[inline]
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.current_hp <= 0.0
    }

    /// Maximum health.
    #[inline]
    #[must_use]
    pub fn max_hp(&self) -> f32 {
        self.max_hp
    }

    /// Current health.
    #[inline]
    #[must_use]
    pub fn current_hp(&self) -> f32 {
        self.current_hp
    }

    /// Walk speed.
    #[inline]
    #[must_use]
    pub fn move_speed(&self) -> f32 {
        self.move_speed
    }

    /// Damage per projectile.
    #[inline]
    #[must_use]
    pub fn damage(&self) -> f32 {
        self.damage
    }

    /// Shots per second.
    #[inline]
    #[must_use]
    pub fn attack_speed(&self) -> f32 {
        self.attack_speed
    }
}

/// The player as seen by the simulation.
#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    /// World position, written by the input collaborator.
    pub position: Vec3,
    /// Unit facing on the horizontal plane.
    pub facing: Vec3,
    /// Health and combat stats.
    pub stats: PlayerStats,
}

impl Player {
    /// Creates a player facing forward.
    #[must_use]
    pub fn new(position: Vec3, stats: PlayerStats) -> Self {
        Self {
            position,
            facing: Vec3::FORWARD,
            stats,
        }
    }

    /// Creates a player from the `[player]` config.
    #[must_use]
    pub fn from_config(config: &PlayerConfig) -> Self {
        Self::new(
            Vec3::from_array(config.spawn_position),
            PlayerStats::from_config(config),
        )
    }
}
