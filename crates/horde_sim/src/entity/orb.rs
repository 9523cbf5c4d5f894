//! # Experience Orb Payload

use horde_core::Vec3;
use serde::Deserialize;

use super::ActiveSlot;

/// Pickup radii shared by orbs built from the same template.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrbTemplate {
    /// Within this planar distance the orb flies toward the player.
    pub attraction_radius: f32,
    /// Within this planar distance the orb is collected.
    pub pickup_radius: f32,
    /// Flight speed while attracted (units/second).
    pub move_speed: f32,
}

impl Default for OrbTemplate {
    fn default() -> Self {
        Self {
            attraction_radius: 7.0,
            pickup_radius: 1.0,
            move_speed: 14.0,
        }
    }
}

/// What an orb does this step given the player's position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum OrbAction {
    /// Inside the pickup radius.
    Collect,
    /// Inside the attraction radius; moved toward the player.
    Attracted,
    /// Out of range.
    Idle,
}

/// A pooled experience orb.
#[derive(Clone, Debug)]
pub struct Orb {
    slot: ActiveSlot,
    visible: bool,
    template: OrbTemplate,
    position: Vec3,
    xp_value: f32,
}

impl_pooled!(Orb);

impl Orb {
    pub(crate) fn from_template(template: OrbTemplate) -> Self {
        Self {
            slot: ActiveSlot::default(),
            visible: false,
            template,
            position: Vec3::ZERO,
            xp_value: 0.0,
        }
    }

    pub(crate) fn reset(&mut self, position: Vec3, xp_value: f32) {
        self.position = position;
        self.xp_value = xp_value;
    }

    /// Pickup check then attraction step. Both radii are inclusive.
    pub(crate) fn step_toward(&mut self, target: Vec3, dt: f32) -> OrbAction {
        let delta = (target - self.position).flattened();
        let distance_sq = delta.length_squared();

        let pickup = self.template.pickup_radius;
        if distance_sq <= pickup * pickup {
            return OrbAction::Collect;
        }

        let attraction = self.template.attraction_radius;
        if distance_sq > attraction * attraction {
            return OrbAction::Idle;
        }

        let distance = distance_sq.sqrt();
        let travel = (self.template.move_speed * dt).min(distance);
        self.position += delta * (travel / distance);
        OrbAction::Attracted
    }

    /// World position.
    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Experience granted on pickup.
    #[inline]
    #[must_use]
    pub fn xp_value(&self) -> f32 {
        self.xp_value
    }

    /// Radii and speed this orb was built with.
    #[inline]
    #[must_use]
    pub fn template(&self) -> &OrbTemplate {
        &self.template
    }

    /// Whether the render collaborator should draw this orb.
    #[inline]
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn orb_at(x: f32) -> Orb {
        let mut orb = Orb::from_template(OrbTemplate::default());
        orb.reset(Vec3::new(x, 0.0, 0.0), 3.0);
        orb
    }

    #[test]
    fn test_pickup_radius_inclusive() {
        let mut orb = orb_at(1.0);
        assert_eq!(orb.step_toward(Vec3::ZERO, 0.016), OrbAction::Collect);
    }

    #[test]
    fn test_attraction_moves_toward_player() {
        let mut orb = orb_at(5.0);
        assert_eq!(orb.step_toward(Vec3::ZERO, 0.1), OrbAction::Attracted);
        assert!((orb.position().x - 3.6).abs() < 1e-5);
    }

    #[test]
    fn test_attraction_does_not_overshoot() {
        let mut orb = orb_at(2.0);
        assert_eq!(orb.step_toward(Vec3::ZERO, 1.0), OrbAction::Attracted);
        assert!(orb.position().x.abs() < 1e-5);
    }

    #[test]
    fn test_out_of_range_is_idle() {
        let mut orb = orb_at(7.5);
        assert_eq!(orb.step_toward(Vec3::ZERO, 0.1), OrbAction::Idle);
        assert_eq!(orb.position().x, 7.5);
    }

    #[test]
    fn test_height_is_ignored() {
        let mut orb = orb_at(0.5);
        assert_eq!(
            orb.step_toward(Vec3::new(0.0, 50.0, 0.0), 0.1),
            OrbAction::Collect
        );
    }
}
