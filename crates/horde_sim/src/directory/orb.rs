//! # Orb Directory
//!
//! Experience pickups. Queries are player-centric single points, so orbs
//! are scanned linearly and never enter a spatial index.

use horde_core::Vec3;
use serde::Deserialize;

use super::{ActiveSet, DirectoryCounters};
use crate::entity::{EntityKind, Orb, OrbAction, OrbId, OrbTemplate};
use crate::error::SimWarning;
use crate::events::{EventSender, SimEvent};
use crate::leveling::XpSink;

/// Orb directory settings (`[orbs]`).
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrbDirectoryConfig {
    /// Instances built at startup.
    pub prewarm: usize,
    /// Pickup radii. `None` falls back to the built-in template.
    pub template: Option<OrbTemplate>,
}

impl Default for OrbDirectoryConfig {
    fn default() -> Self {
        Self {
            prewarm: 1200,
            template: None,
        }
    }
}

/// Work done by one [`OrbDirectory::tick`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OrbTickStats {
    /// Orbs picked up.
    pub collected: u32,
    /// Experience handed to the sink.
    pub xp_collected: f32,
    /// Orbs that moved toward the player.
    pub attracted: u32,
}

/// Owner of every experience orb.
pub struct OrbDirectory {
    set: ActiveSet<Orb>,
    events: EventSender,
    warnings: Vec<SimWarning>,
}

impl OrbDirectory {
    /// Creates the directory and prewarms its pool.
    #[must_use]
    pub fn new(config: OrbDirectoryConfig, events: EventSender) -> Self {
        let mut warnings = Vec::new();
        let template = config.template.unwrap_or_else(|| {
            let warning = SimWarning::MissingTemplate {
                kind: EntityKind::Orb,
            };
            tracing::warn!(%warning);
            warnings.push(warning);
            OrbTemplate::default()
        });

        let set = ActiveSet::new(config.prewarm, move || Orb::from_template(template));
        tracing::info!(prewarm = config.prewarm, "orb directory ready");

        Self {
            set,
            events,
            warnings,
        }
    }

    /// Drops an orb worth `xp_value` at `position`.
    pub fn spawn(&mut self, position: Vec3, xp_value: f32) -> OrbId {
        let id = self.set.activate();
        self.set[id].reset(position, xp_value);
        id
    }

    /// Attracts and collects orbs around the player.
    ///
    /// Orbs within the pickup radius feed `xp` and are despawned; orbs within
    /// the attraction radius fly toward the player. Does nothing without a
    /// player.
    pub fn tick(&mut self, dt: f32, player: Option<Vec3>, xp: &mut dyn XpSink) -> OrbTickStats {
        let mut stats = OrbTickStats::default();
        let Some(target) = player else {
            return stats;
        };

        for index in (0..self.set.len()).rev() {
            let Some(id) = self.set.handle_at(index) else {
                continue;
            };
            let orb = &mut self.set[id];

            match orb.step_toward(target, dt) {
                OrbAction::Collect => {
                    let (position, xp_value) = (orb.position(), orb.xp_value());
                    self.events.send(SimEvent::OrbCollected { position, xp_value });
                    xp.add_xp(xp_value);
                    self.set.remove_at(index);
                    stats.collected += 1;
                    stats.xp_collected += xp_value;
                }
                OrbAction::Attracted => stats.attracted += 1,
                OrbAction::Idle => {}
            }
        }

        stats
    }

    /// Active orb behind `id`.
    #[inline]
    #[must_use]
    pub fn get(&self, id: OrbId) -> Option<&Orb> {
        self.set.get(id)
    }

    /// Active orbs in dense order.
    pub fn iter_active(&self) -> impl Iterator<Item = (OrbId, &Orb)> + '_ {
        self.set.iter_active()
    }

    /// Number of active orbs.
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
