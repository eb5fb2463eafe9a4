//! Game state definitions

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::chain::OrbChain;
use super::combo::ComboSystem;
use super::orb::OrbKind;
use super::path::PathGeometry;
use super::powerups::PowerUpManager;
use super::shooter::Shooter;
use crate::consts::*;
use crate::tuning::Tuning;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Constructed, no level started yet
    Idle,
    /// Active gameplay
    Running,
    /// Tick loop halted; resumes into the phase it left
    Paused,
    /// Fade-in before a new level, progress in [0, 1]
    LevelTransition { progress: f32 },
    /// Level cleared, next level (or victory) scheduled
    LevelComplete,
    /// Life lost, same level scheduled to restart
    Retry,
    /// Out of lives
    GameOver,
    /// Final level cleared
    Victory,
}

impl GamePhase {
    /// Phases in which the chain moves or is about to
    pub fn is_live(&self) -> bool {
        matches!(self, GamePhase::Running | GamePhase::LevelTransition { .. })
    }
}

/// Sound effects the presentation layer may play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    Shoot,
    Match,
    Combo,
    Power,
    GameOver,
    BgmStart,
    BgmPause,
    BgmResume,
}

impl SoundCue {
    /// Collaborator event name
    pub fn name(self) -> &'static str {
        match self {
            SoundCue::Shoot => "shoot",
            SoundCue::Match => "match",
            SoundCue::Combo => "combo",
            SoundCue::Power => "power",
            SoundCue::GameOver => "game_over",
            SoundCue::BgmStart => "bgm_start",
            SoundCue::BgmPause => "bgm_pause",
            SoundCue::BgmResume => "bgm_resume",
        }
    }
}

/// Lifecycle events raised during a tick, drained by the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    LevelStarted { level: u32 },
    Sound(SoundCue),
    /// One batch of matched orbs cleared
    MatchOccurred { orbs: usize, combo: u32, points: u64 },
    PowerUpActivated { kind: OrbKind },
    LifeBonus { lives: u32 },
    HighScore { score: u64 },
    LevelComplete { level: u32, score: u64 },
    /// Progress worth persisting
    SaveRequested { level: u32, score: u64, lives: u32 },
    LevelFailed { level: u32, lives_left: u32 },
    GameOver { level: u32, score: u64 },
    /// Delayed after `GameOver` so the presentation can linger
    ShowGameOverScreen,
    Victory { score: u64 },
    /// The head left the danger zone after spending `seconds` in it
    DangerEscaped { seconds: f32 },
}

/// Deferred lifecycle step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduledAction {
    StartLevel(u32),
    ShowGameOver,
    ShowVictory,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scheduled {
    pub action: ScheduledAction,
    /// Seconds until it fires
    pub remaining: f32,
}

/// Gameplay modifiers supplied from outside the sim (cheats)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuntimeModifiers {
    pub speed_multiplier: f32,
    pub no_spawn: bool,
    /// The head reaching the portal does not lose the level
    pub no_clip: bool,
    pub orb_size_multiplier: f32,
    /// Losing a level does not cost a life
    pub god_mode: bool,
}

impl Default for RuntimeModifiers {
    fn default() -> Self {
        Self {
            speed_multiplier: 1.0,
            no_spawn: false,
            no_clip: false,
            orb_size_multiplier: 1.0,
            god_mode: false,
        }
    }
}

/// Complete game state (deterministic for a given seed and input stream)
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub tuning: Tuning,
    /// Logical play field size
    pub field: Vec2,
    pub level: u32,
    pub lives: u32,
    pub score: u64,
    /// Best score known to the session (seeded from settings)
    pub high_score: u64,
    pub phase: GamePhase,
    /// Phase to return to when unpausing
    pub resume_phase: GamePhase,
    pub pending: Option<Scheduled>,
    pub chain: OrbChain,
    pub shooter: Shooter,
    pub powerups: PowerUpManager,
    pub combo: ComboSystem,
    /// 1.0 normally, down to `DANGER_MIN_FACTOR` at the portal
    pub slow_motion_factor: f32,
    /// Seconds the head has spent in the danger zone (0 outside it)
    pub danger_time: f32,
    pub modifiers: RuntimeModifiers,
    /// Orbs destroyed this run
    pub orbs_destroyed: u64,
    /// Seconds of simulated time (cosmetic)
    pub time: f32,
    pub time_ticks: u64,
    pub events: Vec<GameEvent>,
}

impl GameState {
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(seed, Tuning::default())
    }

    /// Idle state with level 1 laid out but not running
    pub fn with_tuning(seed: u64, tuning: Tuning) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let field = Vec2::new(FIELD_WIDTH, FIELD_HEIGHT);
        let path = PathGeometry::generate(field.x, field.y, 1, &tuning);
        let chain = OrbChain::new(path, tuning.chain_config(1), &mut rng);
        let shooter = Shooter::new(shooter_position(field), field, &mut rng);

        Self {
            seed,
            rng,
            tuning,
            field,
            level: 1,
            lives: STARTING_LIVES,
            score: 0,
            high_score: 0,
            phase: GamePhase::Idle,
            resume_phase: GamePhase::Running,
            pending: None,
            chain,
            shooter,
            powerups: PowerUpManager::new(),
            combo: ComboSystem::new(),
            slow_motion_factor: 1.0,
            danger_time: 0.0,
            modifiers: RuntimeModifiers::default(),
            orbs_destroyed: 0,
            time: 0.0,
            time_ticks: 0,
            events: Vec::new(),
        }
    }

    #[inline]
    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    #[inline]
    pub fn play(&mut self, cue: SoundCue) {
        self.events.push(GameEvent::Sound(cue));
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Fresh run: score 0, full lives
    pub fn new_game(&mut self, level: u32) {
        self.score = 0;
        self.lives = STARTING_LIVES;
        self.orbs_destroyed = 0;
        log::info!("New game from level {}", level);
        self.start_level(level);
    }

    /// Resume a saved run
    pub fn continue_game(&mut self, level: u32, score: u64, lives: u32) {
        self.score = score;
        self.lives = lives.max(1);
        log::info!(
            "Continuing at level {} (score {}, lives {})",
            level,
            score,
            self.lives
        );
        self.start_level(level);
    }

    /// Lay out a level from scratch. Moving to a different level above 1
    /// plays the fade-in first; restarting the same level does not.
    pub fn start_level(&mut self, level: u32) {
        let level = Tuning::clamp_level(level);
        let fade = level > 1 && level != self.level;
        self.level = level;

        let path = PathGeometry::generate(self.field.x, self.field.y, level, &self.tuning);
        self.chain = OrbChain::new(path, self.tuning.chain_config(level), &mut self.rng);
        self.shooter = Shooter::new(shooter_position(self.field), self.field, &mut self.rng);
        self.apply_modifiers();

        self.powerups.reset();
        self.combo.reset();
        self.slow_motion_factor = 1.0;
        self.danger_time = 0.0;
        self.pending = None;
        self.phase = if fade {
            GamePhase::LevelTransition { progress: 0.0 }
        } else {
            GamePhase::Running
        };

        log::info!(
            "Level {} started: {} orbs, path {:.0} long",
            level,
            self.chain.max_total_orbs(),
            self.chain.path().total_length()
        );
        self.emit(GameEvent::LevelStarted { level });
        self.play(SoundCue::BgmStart);
    }

    /// Push the current modifiers into the chain and shooter
    pub fn apply_modifiers(&mut self) {
        let scale = self.modifiers.orb_size_multiplier.max(0.1);
        self.chain.set_orb_radius(ORB_RADIUS * scale);
        self.shooter.projectile_radius = PROJECTILE_RADIUS * scale;
        self.chain.no_spawn = self.modifiers.no_spawn;
    }

    pub fn pause(&mut self) -> bool {
        if !self.phase.is_live() {
            return false;
        }
        self.resume_phase = self.phase;
        self.phase = GamePhase::Paused;
        log::info!("Paused");
        self.play(SoundCue::BgmPause);
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.phase != GamePhase::Paused {
            return false;
        }
        self.phase = self.resume_phase;
        log::info!("Resumed");
        self.play(SoundCue::BgmResume);
        true
    }

    /// Add points and grant one life per bonus threshold crossed
    pub fn award_points(&mut self, points: u64) {
        if points == 0 {
            return;
        }
        let before = self.score;
        self.score = self.score.saturating_add(points);

        let crossed = self.score / LIFE_BONUS_THRESHOLD - before / LIFE_BONUS_THRESHOLD;
        if crossed > 0 {
            self.lives = self.lives.saturating_add(crossed as u32);
            log::info!("Bonus life! Score {} -> lives {}", self.score, self.lives);
            self.emit(GameEvent::LifeBonus { lives: self.lives });
            self.request_save(self.level);
        }
        self.check_high_score();
    }

    /// Overwrite the score (cheats); no life bonus
    pub fn set_score(&mut self, score: u64) {
        self.score = score;
        self.check_high_score();
    }

    fn check_high_score(&mut self) {
        if self.score > self.high_score {
            self.high_score = self.score;
            self.emit(GameEvent::HighScore { score: self.score });
        }
    }

    pub fn request_save(&mut self, level: u32) {
        self.emit(GameEvent::SaveRequested {
            level,
            score: self.score,
            lives: self.lives,
        });
    }

    pub fn schedule(&mut self, action: ScheduledAction, delay: f32) {
        self.pending = Some(Scheduled {
            action,
            remaining: delay,
        });
    }

    /// Whether the aim guide should be drawn long
    #[inline]
    pub fn aim_assist(&self) -> bool {
        self.powerups.aim_assist()
    }
}

/// Where the turret sits on a field
pub fn shooter_position(field: Vec2) -> Vec2 {
    Vec2::new(field.x / 2.0, field.y - SHOOTER_OFFSET_Y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_idle() {
        let state = GameState::new(1);
        assert_eq!(state.phase, GamePhase::Idle);
        assert_eq!(state.lives, STARTING_LIVES);
        assert_eq!(state.chain.spawned(), 4);
    }

    #[test]
    fn test_start_level_fades_only_into_new_levels() {
        let mut state = GameState::new(1);
        state.new_game(1);
        assert_eq!(state.phase, GamePhase::Running);
        state.start_level(2);
        assert!(matches!(state.phase, GamePhase::LevelTransition { .. }));
        state.start_level(2);
        assert_eq!(state.phase, GamePhase::Running);
    }

    #[test]
    fn test_start_level_clamps() {
        let mut state = GameState::new(1);
        state.start_level(0);
        assert_eq!(state.level, 1);
        state.start_level(500);
        assert_eq!(state.level, FINAL_LEVEL);
    }

    #[test]
    fn test_life_bonus_once_per_threshold() {
        let mut state = GameState::new(1);
        state.lives = 3;
        state.score = 4990;
        state.award_points(20);
        assert_eq!(state.lives, 4);
        state.award_points(20);
        assert_eq!(state.lives, 4);
        // Two thresholds at once
        state.award_points(10_000);
        assert_eq!(state.lives, 6);
        let bonuses = state
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::LifeBonus { .. }))
            .count();
        assert_eq!(bonuses, 2);
    }

    #[test]
    fn test_pause_resume_round_trip() {
        let mut state = GameState::new(1);
        assert!(!state.pause());
        state.new_game(3);
        let before = state.phase;
        assert!(state.pause());
        assert_eq!(state.phase, GamePhase::Paused);
        assert!(state.resume());
        assert_eq!(state.phase, before);
        let cues: Vec<_> = state
            .drain_events()
            .into_iter()
            .filter_map(|e| match e {
                GameEvent::Sound(c) => Some(c),
                _ => None,
            })
            .collect();
        assert_eq!(
            cues,
            vec![SoundCue::BgmStart, SoundCue::BgmPause, SoundCue::BgmResume]
        );
    }

    #[test]
    fn test_sound_cue_names() {
        assert_eq!(SoundCue::GameOver.name(), "game_over");
        assert_eq!(SoundCue::BgmResume.name(), "bgm_resume");
    }
}
