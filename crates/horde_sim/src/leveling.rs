//! # Leveling
//!
//! Experience curve, pending level-ups and upgrade offers.
//!
//! Collected experience rolls over into as many levels as it covers. Each
//! level-up owes the player one upgrade choice; while a choice is open the
//! simulation is paused and the next offer is only built once the current
//! one is answered.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;

use crate::events::{EventSender, SimEvent};
use crate::player::{PlayerStats, Upgrade};

/// Receiver of collected experience.
pub trait XpSink {
    /// Adds experience. Non-positive amounts are ignored.
    fn add_xp(&mut self, amount: f32);
}

/// Leveling settings (`[leveling]`).
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LevelingConfig {
    /// Experience needed for level 2.
    pub base_xp_to_level: f32,
    /// Requirement multiplier per level, rounded up.
    pub xp_growth: f32,
    /// Upgrades offered per level-up.
    pub choices: usize,
    /// Seed for offer selection.
    pub seed: u64,
    /// Upgrade catalogue. Empty means level-ups grant nothing.
    pub upgrades: Vec<Upgrade>,
}

impl Default for LevelingConfig {
    fn default() -> Self {
        Self {
            base_xp_to_level: 20.0,
            xp_growth: 1.28,
            choices: 3,
            seed: 0x1E7E_1000,
            upgrades: Vec::new(),
        }
    }
}

/// Experience and level state.
pub struct Leveling {
    config: LevelingConfig,
    rng: ChaCha8Rng,
    events: EventSender,
    level: u32,
    current_xp: f32,
    xp_to_next_level: f32,
    pending_level_ups: u32,
    choosing: bool,
    /// Catalogue indices on offer.
    offer: Vec<usize>,
    /// Shuffle space for offer selection.
    shuffle: Vec<usize>,
}

impl Leveling {
    /// Starts at level 1 with no experience.
    #[must_use]
    pub fn new(config: LevelingConfig, events: EventSender) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        let offer = Vec::with_capacity(config.choices);
        let shuffle = (0..config.upgrades.len()).collect();
        let xp_to_next_level = config.base_xp_to_level;

        Self {
            config,
            rng,
            events,
            level: 1,
            current_xp: 0.0,
            xp_to_next_level,
            pending_level_ups: 0,
            choosing: false,
            offer,
            shuffle,
        }
    }

    /// Applies the upgrade in offer slot `slot` and moves on.
    ///
    /// Opens the next offer if more level-ups are pending, otherwise closes
    /// the choice and resumes the simulation. Returns `false` when no choice
    /// is open or `slot` is out of range.
    pub fn choose(&mut self, slot: usize, stats: &mut PlayerStats) -> bool {
        if !self.choosing {
            return false;
        }
        let Some(&index) = self.offer.get(slot) else {
            return false;
        };

        stats.apply_upgrade(&self.config.upgrades[index]);
        self.pending_level_ups = self.pending_level_ups.saturating_sub(1);

        if self.pending_level_ups > 0 {
            self.open_offer();
            return true;
        }

        self.choosing = false;
        self.offer.clear();
        self.send_xp_changed();
        true
    }

    /// Upgrades currently on offer, in slot order.
    pub fn offered(&self) -> impl Iterator<Item = &Upgrade> + '_ {
        self.offer.iter().map(|&index| &self.config.upgrades[index])
    }

    /// Current level (starts at 1).
    #[inline]
    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Experience accumulated towards the next level.
    #[inline]
    #[must_use]
    pub fn current_xp(&self) -> f32 {
        self.current_xp
    }

    /// Experience required for the next level.
    #[inline]
    #[must_use]
    pub fn xp_to_next_level(&self) -> f32 {
        self.xp_to_next_level
    }

    /// Level-ups still owed a choice.
    #[inline]
    #[must_use]
    pub fn pending_level_ups(&self) -> u32 {
        self.pending_level_ups
    }

    /// True while an upgrade offer is open.
    #[inline]
    #[must_use]
    pub fn is_choosing(&self) -> bool {
        self.choosing
    }

    fn open_offer(&mut self) {
        if self.config.upgrades.is_empty() {
            tracing::debug!(
                discarded = self.pending_level_ups,
                "no upgrades configured, level-ups discarded"
            );
            self.pending_level_ups = 0;
            return;
        }

        self.choosing = true;
        self.build_offer();
        self.events.send(SimEvent::UpgradeOffered {
            level: self.level,
            choices: self.offer.len(),
        });
    }

    /// Picks distinct catalogue entries with a partial Fisher-Yates shuffle.
    fn build_offer(&mut self) {
        let len = self.shuffle.len();
        let count = self.config.choices.min(len);

        self.offer.clear();
        for i in 0..count {
            let j = self.rng.gen_range(i..len);
            self.shuffle.swap(i, j);
            self.offer.push(self.shuffle[i]);
        }
    }

    fn send_xp_changed(&self) {
        self.events.send(SimEvent::XpChanged {
            current: self.current_xp,
            to_next_level: self.xp_to_next_level,
        });
    }
}

impl XpSink for Leveling {
    fn add_xp(&mut self, amount: f32) {
        if amount <= 0.0 {
            return;
        }

        self.current_xp += amount;
        while self.current_xp >= self.xp_to_next_level {
            self.current_xp -= self.xp_to_next_level;
            self.level += 1;
            self.xp_to_next_level = (self.xp_to_next_level * self.config.xp_growth).ceil();
            self.pending_level_ups += 1;

            tracing::debug!(level = self.level, next = self.xp_to_next_level, "level up");
            self.events.send(SimEvent::LevelChanged { level: self.level });
        }

        self.send_xp_changed();

        if !self.choosing && self.pending_level_ups > 0 {
            self.open_offer();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;
    use crate::player::UpgradeKind;

    fn catalogue(n: usize) -> Vec<Upgrade> {
        (0..n)
            .map(|i| Upgrade {
                name: format!("upgrade {i}"),
                description: String::new(),
                kind: UpgradeKind::Damage,
                value: 1.0,
            })
            .collect()
    }

    fn leveling(upgrades: usize) -> (Leveling, EventBus) {
        let bus = EventBus::new(256);
        let leveling = Leveling::new(
            LevelingConfig {
                upgrades: catalogue(upgrades),
                ..LevelingConfig::default()
            },
            bus.sender(),
        );
        (leveling, bus)
    }

    #[test]
    fn test_curve_rounds_up() {
        let (mut lv, _bus) = leveling(0);

        lv.add_xp(20.0);
        assert_eq!(lv.level(), 2);
        // ceil(20 * 1.28) = ceil(25.6)
        assert_eq!(lv.xp_to_next_level(), 26.0);
    }

    #[test]
    fn test_roll_over_multiple_levels() {
        let (mut lv, bus) = leveling(4);

        // 20 + 26 = 46 for level 3, 4 left over
        lv.add_xp(50.0);
        assert_eq!(lv.level(), 3);
        assert_eq!(lv.current_xp(), 4.0);
        assert_eq!(lv.pending_level_ups(), 2);
        assert!(lv.is_choosing());

        let levels: Vec<u32> = bus
            .receiver()
            .drain()
            .into_iter()
            .filter_map(|e| match e {
                SimEvent::LevelChanged { level } => Some(level),
                _ => None,
            })
            .collect();
        assert_eq!(levels, vec![2, 3]);
    }

    #[test]
    fn test_ignores_non_positive() {
        let (mut lv, bus) = leveling(1);
        lv.add_xp(0.0);
        lv.add_xp(-3.0);
        assert_eq!(lv.current_xp(), 0.0);
        assert!(!bus.receiver().has_events());
    }

    #[test]
    fn test_offer_is_distinct() {
        let (mut lv, _bus) = leveling(5);
        lv.add_xp(20.0);

        let mut names: Vec<&str> = lv.offered().map(|u| u.name.as_str()).collect();
        assert_eq!(names.len(), 3);
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 3);
    }

    #[test]
    fn test_small_catalogue_offers_all() {
        let (mut lv, _bus) = leveling(2);
        lv.add_xp(20.0);
        assert_eq!(lv.offered().count(), 2);
    }

    #[test]
    fn test_choose_applies_and_resumes() {
        let (mut lv, _bus) = leveling(3);
        let mut stats = PlayerStats::default();
        lv.add_xp(50.0);

        assert!(!lv.choose(7, &mut stats));
        assert!(lv.choose(0, &mut stats));
        assert!(lv.is_choosing());
        assert!(lv.choose(1, &mut stats));
        assert!(!lv.is_choosing());
        assert_eq!(stats.damage(), 14.0);
        assert!(!lv.choose(0, &mut stats));
    }

    #[test]
    fn test_empty_catalogue_discards_level_ups() {
        let (mut lv, _bus) = leveling(0);
        lv.add_xp(100.0);
        assert!(lv.level() > 1);
        assert_eq!(lv.pending_level_ups(), 0);
        assert!(!lv.is_choosing());
    }

    #[test]
    fn test_seeded_offers_repeat() {
        let (mut a, _bus_a) = leveling(6);
        let (mut b, _bus_b) = leveling(6);
        a.add_xp(20.0);
        b.add_xp(20.0);

        let a_names: Vec<_> = a.offered().map(|u| u.name.clone()).collect();
        let b_names: Vec<_> = b.offered().map(|u| u.name.clone()).collect();
        assert_eq!(a_names, b_names);
    }
}
