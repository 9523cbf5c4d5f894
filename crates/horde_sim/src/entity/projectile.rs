//! # Projectile Payload

use horde_core::Vec3;
use serde::Deserialize;

use super::{ActiveSlot, EnemyId};

/// Collision shape shared by projectiles built from the same template.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectileTemplate {
    /// Radius within which an enemy counts as hit.
    pub hit_radius: f32,
}

impl Default for ProjectileTemplate {
    fn default() -> Self {
        Self { hit_radius: 0.5 }
    }
}

/// A pooled projectile flying in a straight line.
#[derive(Clone, Debug)]
pub struct Projectile {
    slot: ActiveSlot,
    visible: bool,
    template: ProjectileTemplate,
    position: Vec3,
    direction: Vec3,
    damage: f32,
    speed: f32,
    lifetime_remaining: f32,
    /// Hits left before the projectile is spent.
    pierce_remaining: u32,
    last_hit: Option<EnemyId>,
}

impl_pooled!(Projectile);

impl Projectile {
    pub(crate) fn from_template(template: ProjectileTemplate) -> Self {
        Self {
            slot: ActiveSlot::default(),
            visible: false,
            template,
            position: Vec3::ZERO,
            direction: Vec3::FORWARD,
            damage: 0.0,
            speed: 0.0,
            lifetime_remaining: 0.0,
            pierce_remaining: 0,
            last_hit: None,
        }
    }

    pub(crate) fn reset(
        &mut self,
        position: Vec3,
        direction: Vec3,
        damage: f32,
        speed: f32,
        lifetime: f32,
        pierce: u32,
    ) {
        self.position = position;
        self.direction = direction.try_normalize().unwrap_or(Vec3::FORWARD);
        self.damage = damage;
        self.speed = speed;
        self.lifetime_remaining = lifetime;
        self.pierce_remaining = pierce.saturating_add(1);
        self.last_hit = None;
    }

    /// Burns `dt` seconds of lifetime. Returns `false` once expired.
    pub(crate) fn age(&mut self, dt: f32) -> bool {
        self.lifetime_remaining -= dt;
        self.lifetime_remaining > 0.0
    }

    pub(crate) fn advance(&mut self, dt: f32) {
        self.position += self.direction * (self.speed * dt);
    }

    /// Records a hit on `enemy`. Returns `false` once the projectile is spent.
    pub(crate) fn register_hit(&mut self, enemy: EnemyId) -> bool {
        self.last_hit = Some(enemy);
        self.pierce_remaining = self.pierce_remaining.saturating_sub(1);
        self.pierce_remaining > 0
    }

    /// World position.
    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Unit flight direction.
    #[inline]
    #[must_use]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Damage per hit.
    #[inline]
    #[must_use]
    pub fn damage(&self) -> f32 {
        self.damage
    }

    /// Flight speed (units/second).
    #[inline]
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Seconds left before expiry.
    #[inline]
    #[must_use]
    pub fn lifetime_remaining(&self) -> f32 {
        self.lifetime_remaining
    }

    /// Hits left before the projectile is spent.
    #[inline]
    #[must_use]
    pub fn pierce_remaining(&self) -> u32 {
        self.pierce_remaining
    }

    /// Most recent enemy hit, excluded from the next hit test.
    #[inline]
    #[must_use]
    pub fn last_hit(&self) -> Option<EnemyId> {
        self.last_hit
    }

    /// Hit radius from the template.
    #[inline]
    #[must_use]
    pub fn hit_radius(&self) -> f32 {
        self.template.hit_radius
    }

    /// Whether the render collaborator should draw this projectile.
    #[inline]
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use horde_core::PoolHandle;

    #[test]
    fn test_reset_normalizes_and_adds_one_pierce() {
        let mut p = Projectile::from_template(ProjectileTemplate::default());
        p.reset(Vec3::ZERO, Vec3::new(3.0, 0.0, 4.0), 10.0, 20.0, 2.0, 0);

        assert!((p.direction().length() - 1.0).abs() < 1e-6);
        assert_eq!(p.pierce_remaining(), 1);
        assert!(p.last_hit().is_none());
    }

    #[test]
    fn test_zero_direction_falls_back_to_forward() {
        let mut p = Projectile::from_template(ProjectileTemplate::default());
        p.reset(Vec3::ZERO, Vec3::ZERO, 1.0, 1.0, 1.0, 0);
        assert_eq!(p.direction(), Vec3::FORWARD);
    }

    #[test]
    fn test_pierce_two_allows_three_hits() {
        let mut p = Projectile::from_template(ProjectileTemplate::default());
        p.reset(Vec3::ZERO, Vec3::FORWARD, 1.0, 1.0, 1.0, 2);

        let id = PoolHandle::default();
        assert!(p.register_hit(id));
        assert!(p.register_hit(id));
        assert!(!p.register_hit(id));
    }

    #[test]
    fn test_age_expires() {
        let mut p = Projectile::from_template(ProjectileTemplate::default());
        p.reset(Vec3::ZERO, Vec3::FORWARD, 1.0, 1.0, 0.5, 0);

        assert!(p.age(0.25));
        assert!(!p.age(0.25));
    }
}
