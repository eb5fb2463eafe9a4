//! Combo streak: rapid successive matches multiply their score

use serde::{Deserialize, Serialize};

pub const COMBO_TIMEOUT: f32 = 2.0;
pub const MAX_COMBO: u32 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComboSystem {
    pub current_combo: u32,
    /// Seconds left before the streak lapses
    pub combo_timer: f32,
    pub timeout: f32,
    pub max_combo: u32,
    /// Best streak since the last reset
    pub best_combo: u32,
}

impl Default for ComboSystem {
    fn default() -> Self {
        Self {
            current_combo: 0,
            combo_timer: 0.0,
            timeout: COMBO_TIMEOUT,
            max_combo: MAX_COMBO,
            best_combo: 0,
        }
    }
}

impl ComboSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one match event (its orb count does not matter) and return
    /// the multiplier for it
    pub fn add_match(&mut self, _orbs: usize) -> u32 {
        self.current_combo += 1;
        self.combo_timer = self.timeout;
        self.best_combo = self.best_combo.max(self.current_combo);
        self.multiplier()
    }

    #[inline]
    pub fn multiplier(&self) -> u32 {
        self.current_combo.clamp(1, self.max_combo)
    }

    pub fn update(&mut self, dt: f32) {
        if self.current_combo == 0 {
            return;
        }
        self.combo_timer -= dt;
        if self.combo_timer <= 0.0 {
            log::debug!("Combo x{} lapsed", self.current_combo);
            self.current_combo = 0;
            self.combo_timer = 0.0;
        }
    }

    pub fn reset(&mut self) {
        self.current_combo = 0;
        self.combo_timer = 0.0;
    }
}
