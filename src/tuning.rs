//! Data-driven game balance
//!
//! Every per-level number the simulation needs is derived here, so a level
//! can be rebalanced (or a test scenario built) without touching the sim.

use serde::{Deserialize, Serialize};

use crate::consts::FINAL_LEVEL;

/// A step in a level-indexed table: applies to every level `<= up_to_level`
/// not already covered by an earlier step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelStep {
    pub up_to_level: u32,
    pub value: u32,
}

impl LevelStep {
    pub const fn new(up_to_level: u32, value: u32) -> Self {
        Self { up_to_level, value }
    }
}

/// Look up a level in a step table
fn step_lookup(steps: &[LevelStep], level: u32) -> Option<u32> {
    steps
        .iter()
        .find(|step| level <= step.up_to_level)
        .map(|step| step.value)
}

/// Game balance knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Chain speed (path units/sec) = base + level * per_level
    pub base_speed: f32,
    pub speed_per_level: f32,

    /// Spawn interval (sec) = base - level * per_level, floored
    pub base_spawn_interval: f32,
    pub spawn_interval_per_level: f32,
    pub min_spawn_interval: f32,

    /// Minimum gap between orb centers along the path
    pub orb_spacing: f32,
    /// Extra gap tolerated before the chain starts closing it
    pub spacing_tolerance: f32,

    /// Total orbs a level will ever spawn
    pub max_orbs: Vec<LevelStep>,
    pub max_orbs_cap: u32,

    /// Orbs already in the chain when a level starts
    pub initial_orbs: Vec<LevelStep>,
    /// Used past the table: min(base + level, cap)
    pub initial_orbs_base: u32,
    pub initial_orbs_cap: u32,
    /// How far behind the path start the initial chain is placed
    pub initial_offset: f32,

    /// Power-up spawn odds
    pub powerup_chance: f64,
    /// Normal spawns after which a power-up is forced
    pub powerup_guarantee: u32,

    /// Path shape
    pub max_complexity: u32,
    pub amplitude_growth_per_level: f32,
    pub max_amplitude_scale: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            base_speed: 12.0,
            speed_per_level: 2.0,

            base_spawn_interval: 2.5,
            spawn_interval_per_level: 0.08,
            min_spawn_interval: 0.8,

            orb_spacing: 34.0,
            spacing_tolerance: 5.0,

            max_orbs: vec![
                LevelStep::new(1, 15),
                LevelStep::new(2, 20),
                LevelStep::new(3, 25),
                LevelStep::new(5, 30),
                LevelStep::new(10, 40),
            ],
            max_orbs_cap: 50,

            initial_orbs: vec![
                LevelStep::new(1, 4),
                LevelStep::new(2, 5),
                LevelStep::new(3, 6),
            ],
            initial_orbs_base: 5,
            initial_orbs_cap: 12,
            initial_offset: 200.0,

            powerup_chance: 0.12,
            powerup_guarantee: 15,

            max_complexity: 5,
            amplitude_growth_per_level: 0.05,
            max_amplitude_scale: 1.5,
        }
    }
}

/// Everything an `OrbChain` needs to know about its level
#[derive(Debug, Clone, PartialEq)]
pub struct ChainConfig {
    pub speed: f32,
    pub spawn_interval: f32,
    pub min_spacing: f32,
    pub spacing_tolerance: f32,
    pub max_total_orbs: u32,
    pub initial_orbs: u32,
    pub initial_offset: f32,
    pub powerup_chance: f64,
    pub powerup_guarantee: u32,
}

impl Tuning {
    /// Parse a tuning override; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Clamp a requested level into the playable range
    pub fn clamp_level(level: u32) -> u32 {
        let clamped = level.clamp(1, FINAL_LEVEL);
        if clamped != level {
            log::warn!("Level {} out of range, using {}", level, clamped);
        }
        clamped
    }

    pub fn chain_speed(&self, level: u32) -> f32 {
        self.base_speed + level as f32 * self.speed_per_level
    }

    pub fn spawn_interval(&self, level: u32) -> f32 {
        (self.base_spawn_interval - level as f32 * self.spawn_interval_per_level)
            .max(self.min_spawn_interval)
    }

    pub fn max_total_orbs(&self, level: u32) -> u32 {
        step_lookup(&self.max_orbs, level).unwrap_or(self.max_orbs_cap)
    }

    pub fn initial_orbs(&self, level: u32) -> u32 {
        let count = step_lookup(&self.initial_orbs, level)
            .unwrap_or_else(|| (self.initial_orbs_base + level).min(self.initial_orbs_cap));
        count.min(self.max_total_orbs(level))
    }

    /// Number of curve segments the path generator uses
    pub fn path_complexity(&self, level: u32) -> u32 {
        level.min(self.max_complexity)
    }

    /// Curve amplitude multiplier, growing with level and capped
    pub fn amplitude_scale(&self, level: u32) -> f32 {
        (1.0 + level.saturating_sub(1) as f32 * self.amplitude_growth_per_level)
            .min(self.max_amplitude_scale)
    }

    pub fn chain_config(&self, level: u32) -> ChainConfig {
        ChainConfig {
            speed: self.chain_speed(level),
            spawn_interval: self.spawn_interval(level),
            min_spacing: self.orb_spacing,
            spacing_tolerance: self.spacing_tolerance,
            max_total_orbs: self.max_total_orbs(level),
            initial_orbs: self.initial_orbs(level),
            initial_offset: self.initial_offset,
            powerup_chance: self.powerup_chance,
            powerup_guarantee: self.powerup_guarantee,
        }
    }
}
