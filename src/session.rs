//! Game session: the sim plus everything outside it
//!
//! Owns the `GameState`, runs it at a fixed timestep, and routes the
//! `GameEvent`s each tick raises to the optional collaborators (audio,
//! save store, settings store, achievements). Collaborator failures are
//! logged and never interrupt play.

use glam::Vec2;
use serde::Serialize;
use serde_json::Value;

use crate::achievements::{AchievementHook, AchievementTracker};
use crate::audio::{AudioManager, AudioSink};
use crate::cheats::{CheatAction, CheatError, CheatOutcome, CheatSystem};
use crate::consts::*;
use crate::highscores::{HighScores, now_timestamp};
use crate::persistence::{SaveData, SaveStore};
use crate::settings::{HIGH_SCORE_KEY, Settings, SettingsStore};
use crate::sim::{
    GameEvent, GamePhase, GameState, OrbKind, OrbProgress, TickInput, complete_level, tick,
};
use crate::tuning::Tuning;

/// What a HUD needs to draw one frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HudSnapshot {
    pub level: u32,
    pub lives: u32,
    pub score: u64,
    pub high_score: u64,
    pub combo: u32,
    pub multiplier: u32,
    pub phase: GamePhase,
    pub progress: OrbProgress,
    pub slow_active: bool,
    pub reverse_active: bool,
    pub accuracy_active: bool,
    /// Danger-zone slow motion factor (1.0 = none)
    pub slow_motion: f32,
    /// End point of the aim guide line
    pub aim_guide: Vec2,
}

pub struct Session {
    pub state: GameState,
    accumulator: f32,
    /// Inputs gathered since the last tick
    input: TickInput,
    autoplay: bool,
    audio: AudioManager,
    saves: Option<Box<dyn SaveStore>>,
    store: Option<Box<dyn SettingsStore>>,
    settings: Settings,
    achievements: Option<AchievementTracker>,
    cheats: CheatSystem,
    high_scores: HighScores,
    /// Rank reached by the last finished run, if it made the board
    last_rank: Option<usize>,
    /// Events dispatched since the last `drain_events`
    recent: Vec<GameEvent>,
}

impl Session {
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(seed, Tuning::default())
    }

    pub fn with_tuning(seed: u64, tuning: Tuning) -> Self {
        Self {
            state: GameState::with_tuning(seed, tuning),
            accumulator: 0.0,
            input: TickInput::default(),
            autoplay: false,
            audio: AudioManager::default(),
            saves: None,
            store: None,
            settings: Settings::default(),
            achievements: None,
            cheats: CheatSystem::new(),
            high_scores: HighScores::new(),
            last_rank: None,
            recent: Vec::new(),
        }
    }

    pub fn with_audio(mut self, sink: Box<dyn AudioSink>) -> Self {
        self.audio.set_sink(Some(sink));
        self
    }

    pub fn with_save_store(mut self, store: Box<dyn SaveStore>) -> Self {
        self.saves = Some(store);
        self
    }

    /// Attach a settings store and load preferences, the best score, the
    /// leaderboard and achievements from it
    pub fn with_settings_store(mut self, store: Box<dyn SettingsStore>) -> Self {
        self.settings = Settings::load(store.as_ref());
        self.audio.apply_settings(&self.settings);
        self.state.high_score = store.get_u64(HIGH_SCORE_KEY, 0);
        self.high_scores = HighScores::load(store.as_ref());
        self.achievements = Some(AchievementTracker::load(store.as_ref()));
        log::info!("Best score on record: {}", self.state.high_score);
        self.store = Some(store);
        self
    }

    pub fn with_achievements(mut self, tracker: AchievementTracker) -> Self {
        self.achievements = Some(tracker);
        self
    }

    // === Lifecycle ===

    pub fn new_game(&mut self, level: u32) {
        self.reset_loop();
        self.last_rank = None;
        if let Some(ach) = &mut self.achievements {
            ach.on_game_start();
        }
        self.state.new_game(level);
        self.dispatch();
    }

    /// Resume from the save store. Returns false if there is nothing to
    /// resume (no store, no save, or an unreadable one).
    pub fn continue_game(&mut self) -> bool {
        let Some(data) = self.load_save() else {
            return false;
        };
        self.reset_loop();
        self.last_rank = None;
        self.state.continue_game(data.level, data.score, data.lives);
        self.dispatch();
        true
    }

    pub fn has_save(&self) -> bool {
        self.load_save().is_some()
    }

    /// The stored run, if it can still be continued
    fn load_save(&self) -> Option<SaveData> {
        match self.saves.as_ref()?.load() {
            Ok(data) => data.filter(SaveData::is_continuable),
            Err(e) => {
                log::warn!("Could not load save: {}", e);
                None
            }
        }
    }

    fn reset_loop(&mut self) {
        self.accumulator = 0.0;
        self.input = TickInput::default();
    }

    // === Input ===

    pub fn aim_at(&mut self, point: Vec2) {
        self.input.aim = Some(point);
    }

    pub fn fire(&mut self) {
        self.input.fire = true;
    }

    pub fn swap(&mut self) {
        self.input.swap = true;
    }

    /// Toggle pause on the next tick
    pub fn toggle_pause(&mut self) {
        self.input.pause = true;
    }

    pub fn pause(&mut self) -> bool {
        let paused = self.state.pause();
        self.dispatch();
        paused
    }

    pub fn resume(&mut self) -> bool {
        let resumed = self.state.resume();
        self.dispatch();
        resumed
    }

    pub fn set_autoplay(&mut self, on: bool) {
        self.autoplay = on;
    }

    // === Simulation ===

    /// Advance by a frame's worth of real time using fixed substeps.
    /// Returns the number of ticks run.
    pub fn update(&mut self, frame_dt: f32) -> u32 {
        let dt = if frame_dt.is_finite() {
            frame_dt.clamp(0.0, MAX_TICK_DT)
        } else {
            0.0
        };
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.step();
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        substeps
    }

    /// Run exactly one tick
    pub fn step(&mut self) {
        let mut input = self.input.clone();
        input.autoplay = self.autoplay;
        input.modifiers = Some(self.cheats.modifiers());
        tick(&mut self.state, &input, SIM_DT);

        // Clear one-shot inputs after processing
        self.input.fire = false;
        self.input.swap = false;
        self.input.pause = false;

        self.dispatch();
    }

    /// Route pending sim events to the collaborators
    fn dispatch(&mut self) {
        for event in self.state.drain_events() {
            self.handle_event(&event);
            self.recent.push(event);
        }
        if let Some(ach) = &mut self.achievements {
            if !ach.drain_unlocked().is_empty() {
                if let Some(store) = &mut self.store {
                    if let Err(e) = ach.save(store.as_mut()) {
                        log::warn!("Could not save achievements: {}", e);
                    }
                }
            }
        }
    }

    fn handle_event(&mut self, event: &GameEvent) {
        match *event {
            GameEvent::Sound(cue) => self.audio.play(cue),
            GameEvent::SaveRequested { level, score, lives } => {
                if let Some(saves) = &mut self.saves {
                    let data = SaveData { level, score, lives };
                    if let Err(e) = saves.save(&data) {
                        log::warn!("Could not save progress: {}", e);
                    }
                }
            }
            GameEvent::HighScore { score } => {
                if let Some(store) = &mut self.store {
                    if let Err(e) = store.set(HIGH_SCORE_KEY, Value::from(score)) {
                        log::warn!("Could not store high score: {}", e);
                    }
                }
            }
            GameEvent::MatchOccurred { orbs, combo, .. } => {
                if let Some(ach) = &mut self.achievements {
                    ach.on_match(orbs);
                    ach.on_combo(combo);
                }
            }
            GameEvent::LevelComplete { level, .. } => {
                if let Some(ach) = &mut self.achievements {
                    ach.on_level_complete(level);
                }
            }
            GameEvent::LevelFailed { .. } => {
                if let Some(ach) = &mut self.achievements {
                    ach.on_portal_entered();
                }
            }
            GameEvent::DangerEscaped { seconds } => {
                if let Some(ach) = &mut self.achievements {
                    ach.on_danger_survived(seconds);
                }
            }
            GameEvent::GameOver { level, score } => {
                if let Some(ach) = &mut self.achievements {
                    ach.on_game_over();
                }
                self.record_score(score, level);
            }
            GameEvent::Victory { score } => {
                self.record_score(score, self.state.level);
            }
            _ => {}
        }
    }

    fn record_score(&mut self, score: u64, level: u32) {
        self.last_rank = self.high_scores.add_score(score, level, now_timestamp());
        let Some(rank) = self.last_rank else {
            return;
        };
        log::info!("New leaderboard entry #{}: {} (level {})", rank, score, level);
        if let Some(store) = &mut self.store {
            if let Err(e) = self.high_scores.save(store.as_mut()) {
                log::warn!("Could not save high scores: {}", e);
            }
        }
    }

    /// Events dispatched since the last call, oldest first
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.recent)
    }

    // === Cheats ===

    /// Run a cheat console line against this session
    pub fn execute_cheat(&mut self, line: &str) -> Result<CheatOutcome, CheatError> {
        let outcome = self.cheats.execute(line)?;
        self.state.modifiers = self.cheats.modifiers();
        self.state.apply_modifiers();
        if let Some(action) = outcome.action {
            self.apply_cheat(action);
        }
        self.dispatch();
        Ok(outcome)
    }

    fn apply_cheat(&mut self, action: CheatAction) {
        let state = &mut self.state;
        match action {
            CheatAction::AddLives(n) => state.lives = state.lives.saturating_add(n),
            CheatAction::SetLives(n) => state.lives = n,
            CheatAction::AddScore(points) => state.set_score(state.score.saturating_add(points)),
            CheatAction::SetScore(score) => state.set_score(score),
            CheatAction::SkipLevel => complete_level(state),
            CheatAction::NextLevel => {
                let next = (state.level + 1).min(FINAL_LEVEL);
                state.start_level(next);
            }
            CheatAction::GotoLevel(level) => state.start_level(level),
            CheatAction::Freeze(seconds) => state.chain.freeze(seconds),
            CheatAction::SpawnPowerUp => {
                let kind = OrbKind::random_powerup(&mut state.rng);
                state.chain.convert_random(kind, 1, &mut state.rng);
            }
            CheatAction::AllPowerUps => state.powerups.activate_all_timed(),
            CheatAction::BombRain(count) => {
                state.chain.convert_random(OrbKind::Bomb, count, &mut state.rng);
            }
            CheatAction::ClearOrbs => {
                let cleared = state.chain.clear_all();
                log::debug!("Cleared {} orbs", cleared);
            }
            CheatAction::RainbowMode => {
                let len = state.chain.len();
                state.chain.convert_random(OrbKind::Rainbow, len, &mut state.rng);
            }
            CheatAction::UnlockAllAchievements => {
                if let Some(ach) = &mut self.achievements {
                    ach.unlock_all();
                }
            }
            CheatAction::ResetAchievements => {
                if let Some(ach) = &mut self.achievements {
                    ach.reset();
                    if let Some(store) = &mut self.store {
                        if let Err(e) = ach.save(store.as_mut()) {
                            log::warn!("Could not save achievements: {}", e);
                        }
                    }
                }
            }
            CheatAction::GiveAchievement(id) => {
                if let Some(ach) = &mut self.achievements {
                    ach.unlock(id);
                }
            }
        }
    }

    // === Queries ===

    pub fn hud(&self) -> HudSnapshot {
        let state = &self.state;
        HudSnapshot {
            level: state.level,
            lives: state.lives,
            score: state.score,
            high_score: state.high_score,
            combo: state.combo.current_combo,
            multiplier: state.combo.multiplier(),
            phase: state.phase,
            progress: state.chain.progress(),
            slow_active: state.powerups.slow.is_active(),
            reverse_active: state.powerups.reverse.is_active(),
            accuracy_active: state.powerups.accuracy.is_active(),
            slow_motion: state.slow_motion_factor,
            aim_guide: state.shooter.aim_guide(state.aim_assist()),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace preferences and persist them if a store is attached
    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings.sanitized();
        self.audio.apply_settings(&self.settings);
        if let Some(store) = &mut self.store {
            if let Err(e) = self.settings.save(store.as_mut()) {
                log::warn!("Could not save settings: {}", e);
            }
        }
    }

    pub fn audio_mut(&mut self) -> &mut AudioManager {
        &mut self.audio
    }

    pub fn high_scores(&self) -> &HighScores {
        &self.high_scores
    }

    pub fn last_rank(&self) -> Option<usize> {
        self.last_rank
    }

    pub fn achievements(&self) -> Option<&AchievementTracker> {
        self.achievements.as_ref()
    }

    pub fn cheats(&self) -> &CheatSystem {
        &self.cheats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::achievements::AchievementId;
    use crate::persistence::MemoryStore;
    use crate::settings::MemorySettings;

    #[test]
    fn test_update_runs_fixed_substeps() {
        let mut session = Session::new(3);
        session.new_game(1);
        assert_eq!(session.update(SIM_DT * 3.5), 3);
        assert_eq!(session.state.time_ticks, 3);
        // Leftover carries into the next frame
        assert_eq!(session.update(SIM_DT * 0.6), 1);
        // Huge frames are clamped
        assert!(session.update(10.0) <= MAX_SUBSTEPS);
        assert_eq!(session.update(f32::NAN), 0);
    }

    #[test]
    fn test_one_shot_inputs_clear() {
        let mut session = Session::new(3);
        session.new_game(1);
        session.toggle_pause();
        session.step();
        assert_eq!(session.state.phase, GamePhase::Paused);
        session.step();
        assert_eq!(session.state.phase, GamePhase::Paused);
        assert!(session.resume());
        assert_eq!(session.state.phase, GamePhase::Running);
    }

    #[test]
    fn test_cheat_modifiers_reach_the_sim() {
        let mut session = Session::new(3);
        session.new_game(1);
        session.execute_cheat("godmode").unwrap();
        session.execute_cheat("bighead").unwrap();
        assert!(session.state.modifiers.god_mode);
        assert_eq!(session.state.shooter.projectile_radius, PROJECTILE_RADIUS * 2.0);
        session.step();
        assert!(session.state.modifiers.god_mode);
    }

    #[test]
    fn test_cheat_actions() {
        let mut session = Session::new(3);
        session.new_game(1);
        session.execute_cheat("maxlives").unwrap();
        assert_eq!(session.state.lives, 99);
        session.execute_cheat("richman").unwrap();
        assert_eq!(session.state.score, 10_000);
        session.execute_cheat("gotolevel 7").unwrap();
        assert_eq!(session.state.level, 7);
        session.execute_cheat("clearorbs").unwrap();
        assert!(session.state.chain.orbs().iter().all(|o| !o.is_normal()));
        session.execute_cheat("skipthis").unwrap();
        assert_eq!(session.state.phase, GamePhase::LevelComplete);
        assert!(session.execute_cheat("warpdrive").is_err());
    }

    #[test]
    fn test_high_score_and_achievements_persist() {
        let mut session = Session::new(3).with_settings_store(Box::new(MemorySettings::new()));
        session.new_game(1);
        session.execute_cheat("richman").unwrap();
        session.execute_cheat("developer").unwrap();
        let ach = session.achievements().unwrap();
        assert!(ach.is_unlocked(AchievementId::FirstLaunch));
        assert!(ach.is_unlocked(AchievementId::DeveloperSecret));
        let store = session.store.as_ref().unwrap();
        assert_eq!(store.get_u64(HIGH_SCORE_KEY, 0), 10_000);
        let saved = AchievementTracker::load(store.as_ref());
        assert!(saved.is_unlocked(AchievementId::DeveloperSecret));
    }

    #[test]
    fn test_continue_without_save() {
        let mut session = Session::new(3).with_save_store(Box::new(MemoryStore::default()));
        assert!(!session.has_save());
        assert!(!session.continue_game());
        assert_eq!(session.state.phase, GamePhase::Idle);
    }

    #[test]
    fn test_hud_snapshot() {
        let mut session = Session::new(3);
        session.new_game(1);
        let hud = session.hud();
        assert_eq!(hud.level, 1);
        assert_eq!(hud.lives, STARTING_LIVES);
        assert_eq!(hud.multiplier, 1);
        assert_eq!(hud.progress.max, session.state.chain.max_total_orbs());
        assert!(!hud.accuracy_active);
    }
}
