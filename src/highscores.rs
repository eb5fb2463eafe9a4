//! High score leaderboard
//!
//! Top 10 runs, kept in the settings store under `high_scores`. The single
//! best score also lives under `high_score` for the HUD.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::persistence::StoreError;
use crate::settings::SettingsStore;

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

pub const HIGH_SCORES_KEY: &str = "high_scores";

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    pub score: u64,
    /// Level reached
    pub level: u32,
    /// Unix timestamp (seconds) when achieved
    pub timestamp: u64,
}

/// High score leaderboard, sorted descending by score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().is_none_or(|e| score > e.score)
    }

    /// Add a score if it qualifies. Returns the rank achieved (1-indexed).
    pub fn add_score(&mut self, score: u64, level: u32, timestamp: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }

        let entry = HighScoreEntry {
            score,
            level,
            timestamp,
        };

        // Ties rank below existing entries
        let pos = self
            .entries
            .iter()
            .position(|e| score > e.score)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, entry);
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(pos + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Read the leaderboard; anything unreadable starts fresh
    pub fn load(store: &dyn SettingsStore) -> Self {
        let value = store.get(HIGH_SCORES_KEY, serde_json::Value::Null);
        if value.is_null() {
            return Self::new();
        }
        match serde_json::from_value::<HighScores>(value) {
            Ok(mut scores) => {
                scores.entries.sort_by(|a, b| b.score.cmp(&a.score));
                scores.entries.truncate(MAX_HIGH_SCORES);
                log::info!("Loaded {} high scores", scores.entries.len());
                scores
            }
            Err(e) => {
                log::warn!("High scores unreadable ({}), starting fresh", e);
                Self::new()
            }
        }
    }

    pub fn save(&self, store: &mut dyn SettingsStore) -> Result<(), StoreError> {
        store.set(HIGH_SCORES_KEY, serde_json::to_value(self)?)
    }
}

/// Seconds since the Unix epoch (0 if the clock is before it)
pub fn now_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MemorySettings;

    #[test]
    fn test_ranking() {
        let mut hs = HighScores::new();
        assert_eq!(hs.add_score(100, 1, 0), Some(1));
        assert_eq!(hs.add_score(300, 3, 0), Some(1));
        assert_eq!(hs.add_score(200, 2, 0), Some(2));
        assert_eq!(hs.add_score(200, 2, 0), Some(3));
        assert_eq!(hs.top_score(), Some(300));
        assert_eq!(hs.add_score(0, 1, 0), None);
    }

    #[test]
    fn test_capped_at_ten() {
        let mut hs = HighScores::new();
        for i in 1..=12 {
            hs.add_score(i * 10, 1, 0);
        }
        assert_eq!(hs.entries.len(), MAX_HIGH_SCORES);
        assert!(!hs.qualifies(30));
        assert!(hs.qualifies(31));
        assert_eq!(hs.entries.last().unwrap().score, 30);
    }

    #[test]
    fn test_store_round_trip() {
        let mut store = MemorySettings::new();
        assert!(HighScores::load(&store).is_empty());
        let mut hs = HighScores::new();
        hs.add_score(500, 4, 1_700_000_000);
        hs.save(&mut store).unwrap();
        assert_eq!(HighScores::load(&store), hs);
    }
}
