//! # Projectile Directory
//!
//! Straight-line shots that collide against the enemy spatial index. A hit
//! may kill the enemy, which despawns it and drops an orb before the next
//! projectile is examined.

use horde_core::Vec3;
use serde::Deserialize;

use super::{ActiveSet, DamageOutcome, DirectoryCounters, EnemyDirectory, OrbDirectory};
use crate::entity::{EnemyId, EntityKind, Projectile, ProjectileId, ProjectileTemplate};
use crate::error::SimWarning;

/// Projectile directory settings (`[projectiles]`).
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectileDirectoryConfig {
    /// Instances built at startup.
    pub prewarm: usize,
    /// Capacity of the per-projectile hit query buffer.
    pub hit_buffer: usize,
    /// Collision shape. `None` falls back to the built-in template.
    pub template: Option<ProjectileTemplate>,
}

impl Default for ProjectileDirectoryConfig {
    fn default() -> Self {
        Self {
            prewarm: 260,
            hit_buffer: 64,
            template: None,
        }
    }
}

/// Work done by one [`ProjectileDirectory::tick`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProjectileTickStats {
    /// Enemies damaged.
    pub hits: u32,
    /// Enemies killed.
    pub kills: u32,
    /// Projectiles that ran out of lifetime.
    pub expired: u32,
    /// Projectiles that ran out of pierce.
    pub spent: u32,
}

/// Owner of every projectile.
pub struct ProjectileDirectory {
    set: ActiveSet<Projectile>,
    hits: Vec<EnemyId>,
    warnings: Vec<SimWarning>,
}

impl ProjectileDirectory {
    /// Creates the directory and prewarms its pool.
    #[must_use]
    pub fn new(config: ProjectileDirectoryConfig) -> Self {
        let mut warnings = Vec::new();
        let template = config.template.unwrap_or_else(|| {
            let warning = SimWarning::MissingTemplate {
                kind: EntityKind::Projectile,
            };
            tracing::warn!(%warning);
            warnings.push(warning);
            ProjectileTemplate::default()
        });

        let set = ActiveSet::new(config.prewarm, move || Projectile::from_template(template));
        tracing::info!(
            prewarm = config.prewarm,
            hit_buffer = config.hit_buffer,
            "projectile directory ready"
        );

        Self {
            set,
            hits: vec![EnemyId::NULL; config.hit_buffer.max(1)],
            warnings,
        }
    }

    /// Fires a projectile.
    ///
    /// # Arguments
    ///
    /// * `direction` - Normalized internally; zero falls back to forward
    /// * `pierce` - Extra enemies it may pass through (0 = single hit)
    pub fn spawn(
        &mut self,
        position: Vec3,
        direction: Vec3,
        damage: f32,
        speed: f32,
        lifetime: f32,
        pierce: u32,
    ) -> ProjectileId {
        let id = self.set.activate();
        self.set[id].reset(position, direction, damage, speed, lifetime, pierce);
        id
    }

    /// Ages, moves and collides every projectile.
    ///
    /// Each projectile damages at most one enemy per step: the nearest
    /// candidate within its hit radius, skipping the enemy it hit last.
    pub fn tick(
        &mut self,
        dt: f32,
        enemies: &mut EnemyDirectory,
        orbs: &mut OrbDirectory,
    ) -> ProjectileTickStats {
        let mut stats = ProjectileTickStats::default();

        for index in (0..self.set.len()).rev() {
            let Some(id) = self.set.handle_at(index) else {
                continue;
            };
            let projectile = &mut self.set[id];

            if !projectile.age(dt) {
                self.set.remove_at(index);
                stats.expired += 1;
                continue;
            }
            projectile.advance(dt);

            let position = projectile.position();
            let damage = projectile.damage();
            let last_hit = projectile.last_hit();
            let count = enemies.query_radius(position, projectile.hit_radius(), &mut self.hits);

            let target = self.hits[..count]
                .iter()
                .copied()
                .filter(|candidate| Some(*candidate) != last_hit)
                .filter_map(|candidate| {
                    let enemy = enemies.get(candidate)?;
                    Some((candidate, enemy.position().planar_distance_squared(position)))
                })
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(candidate, _)| candidate);
            let Some(target) = target else {
                continue;
            };

            // A hit is spent on the target even when the damage does nothing.
            match enemies.apply_damage(target, damage, orbs) {
                DamageOutcome::Ignored => {}
                DamageOutcome::Damaged { .. } => stats.hits += 1,
                DamageOutcome::Killed { .. } => {
                    stats.hits += 1;
                    stats.kills += 1;
                }
            }

            if !self.set[id].register_hit(target) {
                self.set.remove_at(index);
                stats.spent += 1;
            }
        }

        stats
    }

    /// Active projectile behind `id`.
    #[inline]
    #[must_use]
    pub fn get(&self, id: ProjectileId) -> Option<&Projectile> {
        self.set.get(id)
    }

    /// Active projectiles in dense order.
    pub fn iter_active(&self) -> impl Iterator<Item = (ProjectileId, &Projectile)> + '_ {
        self.set.iter_active()
    }

    /// Number of active projectiles.
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

    /// Conditions recorded at construction.
    #[must_use]
    pub fn warnings(&self) -> &[SimWarning] {
        &self.warnings
    }
}
