//! Achievement definitions and unlock tracking
//!
//! The session forwards gameplay notifications through `AchievementHook`;
//! the tracker turns them into stats and idempotent unlocks.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::highscores::now_timestamp;
use crate::persistence::StoreError;
use crate::settings::SettingsStore;

pub const ACHIEVEMENTS_KEY: &str = "achievements";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementId {
    FirstLaunch,
    IntoPortal,
    FirstEscape,
    BeyondVoid,
    EdgeCosmos,
    DimensionMaster,
    OrbBreaker,
    OrbHunter,
    OrbAnnihilator,
    ComboApprentice,
    ComboMaster,
    UnstoppableChain,
    NoPanic,
    CalmPressure,
    FirstDefeat,
    DeveloperSecret,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AchievementCategory {
    Progress,
    Skill,
    Secret,
}

/// Static description of an achievement
#[derive(Debug, Clone, Copy)]
pub struct AchievementDef {
    pub id: AchievementId,
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: AchievementCategory,
    pub hidden: bool,
}

const fn def(
    id: AchievementId,
    key: &'static str,
    name: &'static str,
    description: &'static str,
    category: AchievementCategory,
    hidden: bool,
) -> AchievementDef {
    AchievementDef {
        id,
        key,
        name,
        description,
        category,
        hidden,
    }
}

use AchievementCategory::*;
use AchievementId as A;

pub const ACHIEVEMENTS: &[AchievementDef] = &[
    def(A::FirstLaunch, "first_launch", "First Launch", "Start your first game", Progress, false),
    def(A::IntoPortal, "into_portal", "Into the Portal", "Let an orb reach the portal", Progress, false),
    def(A::FirstEscape, "first_escape", "First Escape", "Complete level 1", Progress, false),
    def(A::BeyondVoid, "beyond_void", "Beyond the Void", "Complete level 10", Progress, false),
    def(A::EdgeCosmos, "edge_cosmos", "Edge of the Cosmos", "Complete level 25", Progress, false),
    def(A::DimensionMaster, "dimension_master", "Master of the Dimension", "Complete level 50", Progress, false),
    def(A::OrbBreaker, "orb_breaker", "Orb Breaker", "Destroy 50 orbs", Progress, false),
    def(A::OrbHunter, "orb_hunter", "Orb Hunter", "Destroy 250 orbs", Progress, false),
    def(A::OrbAnnihilator, "orb_annihilator", "Orb Annihilator", "Destroy 1000 orbs", Progress, false),
    def(A::ComboApprentice, "combo_apprentice", "Combo Apprentice", "Reach a x5 combo", Skill, false),
    def(A::ComboMaster, "combo_master", "Combo Master", "Reach a x10 combo", Skill, false),
    def(A::UnstoppableChain, "unstoppable_chain", "Unstoppable Chain", "Destroy 15 orbs in one match", Skill, false),
    def(A::NoPanic, "no_panic", "No Panic", "Survive 5 seconds in the danger zone", Skill, false),
    def(A::CalmPressure, "calm_pressure", "Calm Under Pressure", "Survive 10 seconds in the danger zone", Skill, false),
    def(A::FirstDefeat, "first_defeat", "Swallowed by the Void", "Run out of lives", Progress, false),
    def(A::DeveloperSecret, "developer_secret", "Developer", "Found the developer console", Secret, true),
];

impl AchievementId {
    pub fn def(self) -> &'static AchievementDef {
        // Every id has exactly one table row
        ACHIEVEMENTS
            .iter()
            .find(|d| d.id == self)
            .unwrap_or(&ACHIEVEMENTS[0])
    }

    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim().to_ascii_lowercase();
        ACHIEVEMENTS.iter().find(|d| d.key == key).map(|d| d.id)
    }
}

/// Gameplay notifications an achievement system listens to
pub trait AchievementHook {
    fn on_game_start(&mut self) {}
    /// One match event clearing `count` orbs
    fn on_match(&mut self, _count: usize) {}
    fn on_combo(&mut self, _combo: u32) {}
    fn on_level_complete(&mut self, _level: u32) {}
    fn on_portal_entered(&mut self) {}
    fn on_game_over(&mut self) {}
    fn on_danger_survived(&mut self, _seconds: f32) {}
}

/// Lifetime counters the unlock rules read
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AchievementStats {
    pub orbs_destroyed: u64,
    pub levels_completed: u32,
    pub max_level_reached: u32,
    pub max_combo: u32,
    pub longest_danger: f32,
    pub game_overs: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AchievementTracker {
    pub stats: AchievementStats,
    /// Unlock timestamps (Unix seconds)
    pub unlocked: BTreeMap<AchievementId, u64>,
    /// Unlocked since the last drain
    #[serde(skip)]
    fresh: Vec<AchievementId>,
}

impl AchievementTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unlock `id`. Returns false if it already was.
    pub fn unlock(&mut self, id: AchievementId) -> bool {
        if self.unlocked.contains_key(&id) {
            return false;
        }
        self.unlocked.insert(id, now_timestamp());
        self.fresh.push(id);
        log::info!("Achievement unlocked: {}", id.def().name);
        true
    }

    pub fn is_unlocked(&self, id: AchievementId) -> bool {
        self.unlocked.contains_key(&id)
    }

    pub fn unlock_all(&mut self) -> usize {
        ACHIEVEMENTS.iter().filter(|d| self.unlock(d.id)).count()
    }

    pub fn reset(&mut self) {
        self.unlocked.clear();
        self.fresh.clear();
        self.stats = AchievementStats::default();
    }

    pub fn drain_unlocked(&mut self) -> Vec<AchievementId> {
        std::mem::take(&mut self.fresh)
    }

    /// Apply every threshold rule against the current stats
    fn check_all(&mut self) {
        let s = self.stats.clone();
        let rules = [
            (A::OrbBreaker, s.orbs_destroyed >= 50),
            (A::OrbHunter, s.orbs_destroyed >= 250),
            (A::OrbAnnihilator, s.orbs_destroyed >= 1000),
            (A::FirstEscape, s.max_level_reached >= 1),
            (A::BeyondVoid, s.max_level_reached >= 10),
            (A::EdgeCosmos, s.max_level_reached >= 25),
            (A::DimensionMaster, s.max_level_reached >= 50),
            (A::ComboApprentice, s.max_combo >= 5),
            (A::ComboMaster, s.max_combo >= 10),
            (A::NoPanic, s.longest_danger >= 5.0),
            (A::CalmPressure, s.longest_danger >= 10.0),
            (A::FirstDefeat, s.game_overs >= 1),
        ];
        for (id, met) in rules {
            if met {
                self.unlock(id);
            }
        }
    }

    pub fn load(store: &dyn SettingsStore) -> Self {
        let value = store.get(ACHIEVEMENTS_KEY, serde_json::Value::Null);
        if value.is_null() {
            return Self::new();
        }
        serde_json::from_value(value).unwrap_or_else(|e| {
            log::warn!("Achievements unreadable ({}), starting fresh", e);
            Self::new()
        })
    }

    pub fn save(&self, store: &mut dyn SettingsStore) -> Result<(), StoreError> {
        store.set(ACHIEVEMENTS_KEY, serde_json::to_value(self)?)
    }
}

impl AchievementHook for AchievementTracker {
    fn on_game_start(&mut self) {
        self.unlock(A::FirstLaunch);
    }

    fn on_match(&mut self, count: usize) {
        self.stats.orbs_destroyed += count as u64;
        if count >= 15 {
            self.unlock(A::UnstoppableChain);
        }
        self.check_all();
    }

    fn on_combo(&mut self, combo: u32) {
        self.stats.max_combo = self.stats.max_combo.max(combo);
        self.check_all();
    }

    fn on_level_complete(&mut self, level: u32) {
        self.stats.levels_completed += 1;
        self.stats.max_level_reached = self.stats.max_level_reached.max(level);
        self.check_all();
    }

    fn on_portal_entered(&mut self) {
        self.unlock(A::IntoPortal);
    }

    fn on_game_over(&mut self) {
        self.stats.game_overs += 1;
        self.check_all();
    }

    fn on_danger_survived(&mut self, seconds: f32) {
        self.stats.longest_danger = self.stats.longest_danger.max(seconds);
        self.check_all();
    }
}
