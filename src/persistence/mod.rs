//! Save/load of game progress
//!
//! Features:
//! - `SaveData {level, score, lives}` with range sanitizing on load
//! - `SaveStore` trait so the session can run against memory or disk
//! - Versioned JSON envelope with tmp → save, old save → backup rotation

pub mod file;

pub use file::JsonFileStore;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{FINAL_LEVEL, STARTING_LIVES};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed save data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported save version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },
}

/// Persisted progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveData {
    pub level: u32,
    pub score: u64,
    pub lives: u32,
}

impl Default for SaveData {
    fn default() -> Self {
        Self {
            level: 1,
            score: 0,
            lives: STARTING_LIVES,
        }
    }
}

impl SaveData {
    /// Clamp values a hand-edited or stale save could carry
    pub fn sanitized(self) -> Self {
        Self {
            level: self.level.clamp(1, FINAL_LEVEL),
            score: self.score,
            lives: self.lives,
        }
    }

    /// A run that ended in game over is kept for the record but cannot resume
    pub fn is_continuable(&self) -> bool {
        self.lives > 0
    }
}

/// Progress storage
pub trait SaveStore {
    fn save(&mut self, data: &SaveData) -> Result<(), StoreError>;
    /// `Ok(None)` when nothing has been saved yet
    fn load(&self) -> Result<Option<SaveData>, StoreError>;
    fn clear(&mut self) -> Result<(), StoreError>;
}

/// Store that lives only as long as the process
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub data: Option<SaveData>,
    /// Number of successful saves
    pub saves: usize,
}

impl SaveStore for MemoryStore {
    fn save(&mut self, data: &SaveData) -> Result<(), StoreError> {
        self.data = Some(*data);
        self.saves += 1;
        Ok(())
    }

    fn load(&self) -> Result<Option<SaveData>, StoreError> {
        Ok(self.data.map(SaveData::sanitized))
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.data = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitized() {
        let data = SaveData {
            level: 0,
            score: 10,
            lives: 0,
        }
        .sanitized();
        assert_eq!(data.level, 1);
        assert_eq!(data.lives, 0);
        assert!(!data.is_continuable());
        assert!(SaveData::default().is_continuable());
        let data = SaveData {
            level: 999,
            ..SaveData::default()
        }
        .sanitized();
        assert_eq!(data.level, FINAL_LEVEL);
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::default();
        assert!(store.load().unwrap().is_none());
        let data = SaveData {
            level: 4,
            score: 1200,
            lives: 2,
        };
        store.save(&data).unwrap();
        assert_eq!(store.load().unwrap(), Some(data));
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
