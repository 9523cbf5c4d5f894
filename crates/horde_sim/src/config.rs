//! # Simulation Configuration
//!
//! Everything tunable, loaded once at startup from TOML. Every table and
//! field is optional; omitted values take the built-in defaults.
//!
//! ```toml
//! [enemies]
//! max_active = 500
//! tick_budget = 180
//!
//! [enemies.template]
//! move_speed = 2.5
//!
//! [[leveling.upgrades]]
//! name = "Sharpened"
//! kind = "damage"
//! value = 3.0
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::auto_attack::AutoAttackConfig;
use crate::directory::{EnemyDirectoryConfig, OrbDirectoryConfig, ProjectileDirectoryConfig};
use crate::error::{SimError, SimResult};
use crate::leveling::LevelingConfig;
use crate::player::PlayerConfig;
use crate::simulation::SimulationConfig;
use crate::spawner::SpawnerConfig;

/// Complete simulation configuration.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    /// `[enemies]`
    pub enemies: EnemyDirectoryConfig,
    /// `[projectiles]`
    pub projectiles: ProjectileDirectoryConfig,
    /// `[orbs]`
    pub orbs: OrbDirectoryConfig,
    /// `[player]`
    pub player: PlayerConfig,
    /// `[leveling]`
    pub leveling: LevelingConfig,
    /// `[spawner]`
    pub spawner: SpawnerConfig,
    /// `[auto_attack]`
    pub auto_attack: AutoAttackConfig,
    /// `[simulation]`
    pub simulation: SimulationConfig,
}

impl SimConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// [`SimError::ConfigParse`] for malformed TOML or unknown keys,
    /// [`SimError::InvalidConfig`] for out-of-range values.
    pub fn from_toml_str(text: &str) -> SimResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// [`SimError::ConfigRead`] when the file cannot be read, otherwise as
    /// [`Self::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SimError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_toml_str(&text)?;
        tracing::info!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Checks value ranges the simulation relies on.
    ///
    /// # Errors
    ///
    /// [`SimError::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> SimResult<()> {
        for (value, field) in self.float_fields() {
            if !value.is_finite() {
                return Err(SimError::InvalidConfig(format!("{field} must be finite")));
            }
        }

        let e = &self.enemies;
        require(e.cell_size > 0.0, "enemies.cell_size must be positive")?;
        require(e.query_buffer > 0, "enemies.query_buffer must be at least 1")?;
        require(e.base_hp > 0.0, "enemies.base_hp must be positive")?;
        if let Some(t) = &e.template {
            require(t.move_speed >= 0.0, "enemies.template.move_speed must not be negative")?;
            require(t.contact_range >= 0.0, "enemies.template.contact_range must not be negative")?;
            require(
                t.contact_cooldown >= 0.0,
                "enemies.template.contact_cooldown must not be negative",
            )?;
        }

        let p = &self.projectiles;
        require(p.hit_buffer > 0, "projectiles.hit_buffer must be at least 1")?;
        if let Some(t) = &p.template {
            require(t.hit_radius > 0.0, "projectiles.template.hit_radius must be positive")?;
        }

        if let Some(t) = &self.orbs.template {
            require(t.pickup_radius >= 0.0, "orbs.template.pickup_radius must not be negative")?;
            require(
                t.attraction_radius >= t.pickup_radius,
                "orbs.template.attraction_radius must be at least pickup_radius",
            )?;
            require(t.move_speed >= 0.0, "orbs.template.move_speed must not be negative")?;
        }

        require(self.player.max_hp > 0.0, "player.max_hp must be positive")?;

        let l = &self.leveling;
        require(l.base_xp_to_level > 0.0, "leveling.base_xp_to_level must be positive")?;
        require(l.xp_growth >= 1.0, "leveling.xp_growth must be at least 1")?;
        require(l.choices > 0, "leveling.choices must be at least 1")?;

        let s = &self.spawner;
        require(s.initial_rate >= 0.0, "spawner.initial_rate must not be negative")?;
        require(s.min_distance >= 0.0, "spawner.min_distance must not be negative")?;
        require(
            s.max_distance >= s.min_distance,
            "spawner.max_distance must be at least min_distance",
        )?;
        require(
            s.difficulty_step_seconds > 0.0,
            "spawner.difficulty_step_seconds must be positive",
        )?;

        let a = &self.auto_attack;
        require(a.range > 0.0, "auto_attack.range must be positive")?;
        require(a.projectile_lifetime > 0.0, "auto_attack.projectile_lifetime must be positive")?;

        let sim = &self.simulation;
        require(sim.event_capacity > 0, "simulation.event_capacity must be at least 1")?;
        require(sim.frame_budget_ms > 0.0, "simulation.frame_budget_ms must be positive")?;

        Ok(())
    }
}

impl SimConfig {
    /// Every float the simulation reads, with its TOML path.
    fn float_fields(&self) -> Vec<(f32, &'static str)> {
        let e = &self.enemies;
        let mut fields = vec![
            (e.cell_size, "enemies.cell_size"),
            (e.base_hp, "enemies.base_hp"),
            (e.base_speed_mul, "enemies.base_speed_mul"),
            (e.base_damage_mul, "enemies.base_damage_mul"),
            (e.base_xp_reward, "enemies.base_xp_reward"),
            (self.player.max_hp, "player.max_hp"),
            (self.player.move_speed, "player.move_speed"),
            (self.player.damage, "player.damage"),
            (self.player.attack_speed, "player.attack_speed"),
            (self.player.spawn_position[0], "player.spawn_position"),
            (self.player.spawn_position[1], "player.spawn_position"),
            (self.player.spawn_position[2], "player.spawn_position"),
            (self.leveling.base_xp_to_level, "leveling.base_xp_to_level"),
            (self.leveling.xp_growth, "leveling.xp_growth"),
            (self.spawner.initial_rate, "spawner.initial_rate"),
            (self.spawner.rate_multiplier_per_step, "spawner.rate_multiplier_per_step"),
            (self.spawner.difficulty_step_seconds, "spawner.difficulty_step_seconds"),
            (self.spawner.min_distance, "spawner.min_distance"),
            (self.spawner.max_distance, "spawner.max_distance"),
            (self.spawner.spawn_height, "spawner.spawn_height"),
            (self.spawner.hp_growth_per_step, "spawner.hp_growth_per_step"),
            (self.spawner.speed_growth_per_step, "spawner.speed_growth_per_step"),
            (self.spawner.damage_growth_per_step, "spawner.damage_growth_per_step"),
            (self.spawner.xp_growth_per_step, "spawner.xp_growth_per_step"),
            (self.auto_attack.range, "auto_attack.range"),
            (self.auto_attack.projectile_speed, "auto_attack.projectile_speed"),
            (self.auto_attack.projectile_lifetime, "auto_attack.projectile_lifetime"),
            (self.auto_attack.muzzle_height, "auto_attack.muzzle_height"),
            (self.simulation.frame_budget_ms, "simulation.frame_budget_ms"),
        ];
        if let Some(t) = &e.template {
            fields.extend([
                (t.move_speed, "enemies.template.move_speed"),
                (t.contact_damage, "enemies.template.contact_damage"),
                (t.contact_cooldown, "enemies.template.contact_cooldown"),
                (t.contact_range, "enemies.template.contact_range"),
            ]);
        }
        if let Some(t) = &self.projectiles.template {
            fields.push((t.hit_radius, "projectiles.template.hit_radius"));
        }
        if let Some(t) = &self.orbs.template {
            fields.extend([
                (t.attraction_radius, "orbs.template.attraction_radius"),
                (t.pickup_radius, "orbs.template.pickup_radius"),
                (t.move_speed, "orbs.template.move_speed"),
            ]);
        }
        for upgrade in &self.leveling.upgrades {
            fields.push((upgrade.value, "leveling.upgrades.value"));
        }

        fields
    }
}

fn require(condition: bool, message: &str) -> SimResult<()> {
    if condition {
        Ok(())
    } else {
        Err(SimError::InvalidConfig(message.to_string()))
    }
}
