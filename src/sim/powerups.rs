//! Power-up effects: bomb blasts and timed chain modifiers

use serde::{Deserialize, Serialize};

use super::chain::OrbChain;
use super::orb::OrbKind;
use crate::consts::BOMB_POINTS_PER_ORB;

/// Orbs cleared on each side of a triggered bomb
pub const BOMB_RADIUS: usize = 2;

pub const SLOW_DURATION: f32 = 5.0;
pub const SLOW_FACTOR: f32 = 0.3;
pub const REVERSE_DURATION: f32 = 3.0;
pub const REVERSE_FACTOR: f32 = -0.8;
pub const ACCURACY_DURATION: f32 = 10.0;

/// A countdown that is active while time remains
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TimedEffect {
    pub remaining: f32,
}

impl TimedEffect {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.remaining > 0.0
    }

    /// Re-triggering restarts the full duration
    pub fn start(&mut self, duration: f32) {
        self.remaining = duration;
    }

    pub fn tick(&mut self, dt: f32) {
        if self.remaining > 0.0 {
            self.remaining = (self.remaining - dt).max(0.0);
        }
    }
}

/// What an activation did, for scoring and events
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PowerUpOutcome {
    /// Orbs the bomb started exploding
    pub orbs_destroyed: usize,
    pub bonus_score: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PowerUpManager {
    pub slow: TimedEffect,
    pub reverse: TimedEffect,
    pub accuracy: TimedEffect,
}

impl PowerUpManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a power-up. `source_id` identifies the triggering orb for bombs;
    /// a bomb whose source is no longer in the chain does nothing.
    pub fn activate(&mut self, kind: OrbKind, source_id: Option<u32>, chain: &mut OrbChain) -> PowerUpOutcome {
        log::info!("Power-up activated: {:?}", kind);
        match kind {
            OrbKind::Bomb => Self::detonate(source_id, chain),
            OrbKind::Slow => {
                self.slow.start(SLOW_DURATION);
                PowerUpOutcome::default()
            }
            OrbKind::Reverse => {
                self.reverse.start(REVERSE_DURATION);
                PowerUpOutcome::default()
            }
            OrbKind::Accuracy => {
                self.accuracy.start(ACCURACY_DURATION);
                PowerUpOutcome::default()
            }
            other => {
                log::warn!("{:?} is not a power-up", other);
                PowerUpOutcome::default()
            }
        }
    }

    fn detonate(source_id: Option<u32>, chain: &mut OrbChain) -> PowerUpOutcome {
        let Some(center) = source_id.and_then(|id| chain.index_of(id)) else {
            log::debug!("Bomb source no longer in chain");
            return PowerUpOutcome::default();
        };

        let start = center.saturating_sub(BOMB_RADIUS);
        let end = (center + BOMB_RADIUS + 1).min(chain.len());
        let orbs_destroyed = chain.remove_orbs(start..end);

        log::debug!("Bomb at {} cleared {} orbs", center, orbs_destroyed);
        PowerUpOutcome {
            orbs_destroyed,
            bonus_score: orbs_destroyed as u64 * BOMB_POINTS_PER_ORB,
        }
    }

    /// Start every timed effect at once
    pub fn activate_all_timed(&mut self) {
        self.slow.start(SLOW_DURATION);
        self.reverse.start(REVERSE_DURATION);
        self.accuracy.start(ACCURACY_DURATION);
    }

    pub fn update(&mut self, dt: f32) {
        self.slow.tick(dt);
        self.reverse.tick(dt);
        self.accuracy.tick(dt);
    }

    /// Product of the active chain-speed effects (1.0 when none)
    pub fn speed_multiplier(&self) -> f32 {
        let mut multiplier = 1.0;
        if self.slow.is_active() {
            multiplier *= SLOW_FACTOR;
        }
        if self.reverse.is_active() {
            multiplier *= REVERSE_FACTOR;
        }
        multiplier
    }

    #[inline]
    pub fn aim_assist(&self) -> bool {
        self.accuracy.is_active()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
