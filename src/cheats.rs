//! Developer cheat console
//!
//! `CheatSystem::execute` parses one console line. Toggles and speed/size
//! changes live in the system's `RuntimeModifiers`, which the session hands
//! to the sim every tick. Everything that touches game state comes back as
//! a `CheatAction` for the session to apply.

use thiserror::Error;

use crate::achievements::AchievementId;
use crate::consts::FINAL_LEVEL;
use crate::sim::RuntimeModifiers;

/// Orbs converted by BOMBRAIN
pub const BOMB_RAIN_COUNT: usize = 10;
/// FREEZEORBS duration (seconds)
pub const FREEZE_DURATION: f32 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheatCode {
    GodMode,
    MoreLives,
    MaxLives,
    RichMan,
    Millionaire,
    HighScore,
    SkipThis,
    LevelUp,
    GotoLevel,
    FinalLevel,
    SlowMo,
    Turbo,
    NormalSpeed,
    FreezeOrbs,
    PowerUp,
    AllPower,
    BombRain,
    ClearOrbs,
    Rainbow,
    NoSpawn,
    NoClip,
    BigHead,
    Tiny,
    UnlockAll,
    ResetAch,
    GiveAch,
    Developer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheatCategory {
    Lives,
    Score,
    Level,
    Speed,
    PowerUps,
    Orbs,
    Achievements,
    Debug,
    Fun,
}

#[derive(Debug, Clone, Copy)]
pub struct CheatInfo {
    pub code: CheatCode,
    /// What the player types
    pub name: &'static str,
    pub description: &'static str,
    pub category: CheatCategory,
    pub needs_param: bool,
}

const fn info(
    code: CheatCode,
    name: &'static str,
    description: &'static str,
    category: CheatCategory,
) -> CheatInfo {
    CheatInfo {
        code,
        name,
        description,
        category,
        needs_param: false,
    }
}

const fn with_param(mut cheat: CheatInfo) -> CheatInfo {
    cheat.needs_param = true;
    cheat
}

use CheatCategory as Cat;
use CheatCode as C;

pub const CHEATS: &[CheatInfo] = &[
    info(C::GodMode, "GODMODE", "Losing a level costs no life", Cat::Lives),
    info(C::MoreLives, "MORELIVES", "Add 5 lives", Cat::Lives),
    info(C::MaxLives, "MAXLIVES", "Set lives to 99", Cat::Lives),
    info(C::RichMan, "RICHMAN", "Add 10000 points", Cat::Score),
    info(C::Millionaire, "MILLIONAIRE", "Add 100000 points", Cat::Score),
    info(C::HighScore, "HIGHSCORE", "Set score to 999999", Cat::Score),
    info(C::SkipThis, "SKIPTHIS", "Complete the current level", Cat::Level),
    info(C::LevelUp, "LEVELUP", "Go to the next level", Cat::Level),
    with_param(info(C::GotoLevel, "GOTOLEVEL", "Go to a level (usage: GOTOLEVEL 10)", Cat::Level)),
    info(C::FinalLevel, "FINALLEVEL", "Jump to the final level", Cat::Level),
    info(C::SlowMo, "SLOWMO", "Half speed", Cat::Speed),
    info(C::Turbo, "TURBO", "Double speed", Cat::Speed),
    info(C::NormalSpeed, "NORMALSPEED", "Normal speed", Cat::Speed),
    info(C::FreezeOrbs, "FREEZEORBS", "Freeze the chain for 30 seconds", Cat::Speed),
    info(C::PowerUp, "POWERUP", "Turn a chain orb into a random power-up", Cat::PowerUps),
    info(C::AllPower, "ALLPOWER", "Activate every timed power-up", Cat::PowerUps),
    info(C::BombRain, "BOMBRAIN", "Turn 10 chain orbs into bombs", Cat::PowerUps),
    info(C::ClearOrbs, "CLEARORBS", "Destroy every orb in the chain", Cat::Orbs),
    info(C::Rainbow, "RAINBOW", "Turn every chain orb into a rainbow orb", Cat::Orbs),
    info(C::NoSpawn, "NOSPAWN", "Toggle orb spawning", Cat::Orbs),
    info(C::NoClip, "NOCLIP", "Toggle losing at the portal", Cat::Debug),
    info(C::BigHead, "BIGHEAD", "Double orb size", Cat::Fun),
    info(C::Tiny, "TINY", "Half orb size", Cat::Fun),
    info(C::UnlockAll, "UNLOCKALL", "Unlock every achievement", Cat::Achievements),
    info(C::ResetAch, "RESETACH", "Reset all achievements", Cat::Achievements),
    with_param(info(C::GiveAch, "GIVEACH", "Unlock one achievement (usage: GIVEACH combo_master)", Cat::Achievements)),
    info(C::Developer, "DEVELOPER", "Hello, developer", Cat::Debug),
];

impl CheatCode {
    pub fn info(self) -> &'static CheatInfo {
        CHEATS.iter().find(|c| c.code == self).unwrap_or(&CHEATS[0])
    }

    /// Case-insensitive lookup by console name
    pub fn parse(name: &str) -> Option<Self> {
        CHEATS
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .map(|c| c.code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheatError {
    #[error("no cheat code entered")]
    Empty,
    #[error("unknown cheat: {0}")]
    Unknown(String),
    #[error("missing parameter for {0}")]
    MissingParam(&'static str),
    #[error("invalid parameter {param:?} for {code}")]
    InvalidParam { code: &'static str, param: String },
    #[error("level must be between 1 and {max}")]
    LevelOutOfRange { max: u32 },
    #[error("unknown achievement: {0}")]
    UnknownAchievement(String),
}

/// State change the session carries out on behalf of a cheat
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CheatAction {
    AddLives(u32),
    SetLives(u32),
    AddScore(u64),
    SetScore(u64),
    /// Finish the level as if it had been cleared
    SkipLevel,
    GotoLevel(u32),
    NextLevel,
    Freeze(f32),
    SpawnPowerUp,
    AllPowerUps,
    BombRain(usize),
    ClearOrbs,
    RainbowMode,
    UnlockAllAchievements,
    ResetAchievements,
    GiveAchievement(AchievementId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheatOutcome {
    pub code: CheatCode,
    pub message: String,
    /// `None` when the cheat only changed modifiers
    pub action: Option<CheatAction>,
}

#[derive(Debug, Clone, Default)]
pub struct CheatSystem {
    modifiers: RuntimeModifiers,
    /// Every successfully executed code, oldest first
    history: Vec<CheatCode>,
}

impl CheatSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Modifiers the sim should run with
    pub fn modifiers(&self) -> RuntimeModifiers {
        self.modifiers
    }

    pub fn history(&self) -> &[CheatCode] {
        &self.history
    }

    pub fn is_active(&self, code: CheatCode) -> bool {
        self.history.contains(&code)
    }

    /// Parse and run one console line, e.g. `gotolevel 10`
    pub fn execute(&mut self, line: &str) -> Result<CheatOutcome, CheatError> {
        let mut parts = line.split_whitespace();
        let Some(name) = parts.next() else {
            return Err(CheatError::Empty);
        };
        let code =
            CheatCode::parse(name).ok_or_else(|| CheatError::Unknown(name.to_ascii_uppercase()))?;
        let info = code.info();
        let param = parts.next();
        if info.needs_param && param.is_none() {
            return Err(CheatError::MissingParam(info.name));
        }

        let outcome = self.apply(code, param.unwrap_or_default())?;
        self.history.push(code);
        log::info!("Cheat {} activated: {}", info.name, outcome.message);
        Ok(outcome)
    }

    fn apply(&mut self, code: CheatCode, param: &str) -> Result<CheatOutcome, CheatError> {
        let m = &mut self.modifiers;
        let (message, action) = match code {
            C::GodMode => {
                m.god_mode = !m.god_mode;
                (format!("God mode {}", on_off(m.god_mode)), None)
            }
            C::MoreLives => ("+5 lives".to_string(), Some(CheatAction::AddLives(5))),
            C::MaxLives => ("Lives set to 99".to_string(), Some(CheatAction::SetLives(99))),
            C::RichMan => ("+10000 points".to_string(), Some(CheatAction::AddScore(10_000))),
            C::Millionaire => ("+100000 points".to_string(), Some(CheatAction::AddScore(100_000))),
            C::HighScore => ("Score set to 999999".to_string(), Some(CheatAction::SetScore(999_999))),
            C::SkipThis => ("Level skipped".to_string(), Some(CheatAction::SkipLevel)),
            C::LevelUp => ("Next level".to_string(), Some(CheatAction::NextLevel)),
            C::GotoLevel => {
                let level: u32 = param.parse().map_err(|_| CheatError::InvalidParam {
                    code: code.info().name,
                    param: param.to_string(),
                })?;
                if !(1..=FINAL_LEVEL).contains(&level) {
                    return Err(CheatError::LevelOutOfRange { max: FINAL_LEVEL });
                }
                (format!("Going to level {}", level), Some(CheatAction::GotoLevel(level)))
            }
            C::FinalLevel => (
                format!("Going to level {}", FINAL_LEVEL),
                Some(CheatAction::GotoLevel(FINAL_LEVEL)),
            ),
            C::SlowMo => {
                m.speed_multiplier = 0.5;
                ("Slow motion".to_string(), None)
            }
            C::Turbo => {
                m.speed_multiplier = 2.0;
                ("Turbo".to_string(), None)
            }
            C::NormalSpeed => {
                m.speed_multiplier = 1.0;
                ("Speed normalized".to_string(), None)
            }
            C::FreezeOrbs => (
                format!("Chain frozen for {}s", FREEZE_DURATION),
                Some(CheatAction::Freeze(FREEZE_DURATION)),
            ),
            C::PowerUp => ("Power-up spawned".to_string(), Some(CheatAction::SpawnPowerUp)),
            C::AllPower => ("All power-ups active".to_string(), Some(CheatAction::AllPowerUps)),
            C::BombRain => (
                "Bomb rain".to_string(),
                Some(CheatAction::BombRain(BOMB_RAIN_COUNT)),
            ),
            C::ClearOrbs => ("Chain cleared".to_string(), Some(CheatAction::ClearOrbs)),
            C::Rainbow => ("Rainbow mode".to_string(), Some(CheatAction::RainbowMode)),
            C::NoSpawn => {
                m.no_spawn = !m.no_spawn;
                (format!("No spawn {}", on_off(m.no_spawn)), None)
            }
            C::NoClip => {
                m.no_clip = !m.no_clip;
                (format!("No clip {}", on_off(m.no_clip)), None)
            }
            C::BigHead => {
                m.orb_size_multiplier = 2.0;
                ("Big orbs".to_string(), None)
            }
            C::Tiny => {
                m.orb_size_multiplier = 0.5;
                ("Tiny orbs".to_string(), None)
            }
            C::UnlockAll => (
                "All achievements unlocked".to_string(),
                Some(CheatAction::UnlockAllAchievements),
            ),
            C::ResetAch => (
                "Achievements reset".to_string(),
                Some(CheatAction::ResetAchievements),
            ),
            C::GiveAch => {
                let id = AchievementId::from_key(param)
                    .ok_or_else(|| CheatError::UnknownAchievement(param.to_string()))?;
                (
                    format!("Achievement unlocked: {}", id.def().name),
                    Some(CheatAction::GiveAchievement(id)),
                )
            }
            C::Developer => (
                "Developer mode".to_string(),
                Some(CheatAction::GiveAchievement(AchievementId::DeveloperSecret)),
            ),
        };
        Ok(CheatOutcome {
            code,
            message,
            action,
        })
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag { "ON" } else { "OFF" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(CheatCode::parse("godmode"), Some(C::GodMode));
        assert_eq!(CheatCode::parse("GotoLevel"), Some(C::GotoLevel));
        assert_eq!(CheatCode::parse("KONAMI"), None);
        for cheat in CHEATS {
            assert_eq!(cheat.code.info().name, cheat.name);
        }
    }

    #[test]
    fn test_errors() {
        let mut cheats = CheatSystem::new();
        assert_eq!(cheats.execute("   "), Err(CheatError::Empty));
        assert_eq!(cheats.execute("xyzzy"), Err(CheatError::Unknown("XYZZY".into())));
        assert_eq!(cheats.execute("gotolevel"), Err(CheatError::MissingParam("GOTOLEVEL")));
        assert!(matches!(
            cheats.execute("gotolevel ten"),
            Err(CheatError::InvalidParam { .. })
        ));
        assert_eq!(
            cheats.execute("gotolevel 51"),
            Err(CheatError::LevelOutOfRange { max: FINAL_LEVEL })
        );
        assert!(matches!(
            cheats.execute("giveach nope"),
            Err(CheatError::UnknownAchievement(_))
        ));
        assert!(cheats.history().is_empty());
    }

    #[test]
    fn test_toggles_flip_modifiers() {
        let mut cheats = CheatSystem::new();
        let outcome = cheats.execute("godmode").unwrap();
        assert!(outcome.action.is_none());
        assert!(cheats.modifiers().god_mode);
        cheats.execute("GODMODE").unwrap();
        assert!(!cheats.modifiers().god_mode);

        cheats.execute("nospawn").unwrap();
        cheats.execute("noclip").unwrap();
        let m = cheats.modifiers();
        assert!(m.no_spawn && m.no_clip);
        assert!(cheats.is_active(C::NoClip));
    }

    #[test]
    fn test_speed_and_size() {
        let mut cheats = CheatSystem::new();
        cheats.execute("slowmo").unwrap();
        assert_eq!(cheats.modifiers().speed_multiplier, 0.5);
        cheats.execute("turbo").unwrap();
        assert_eq!(cheats.modifiers().speed_multiplier, 2.0);
        cheats.execute("normalspeed").unwrap();
        assert_eq!(cheats.modifiers().speed_multiplier, 1.0);
        cheats.execute("bighead").unwrap();
        assert_eq!(cheats.modifiers().orb_size_multiplier, 2.0);
        cheats.execute("tiny").unwrap();
        assert_eq!(cheats.modifiers().orb_size_multiplier, 0.5);
    }

    #[test]
    fn test_actions() {
        let mut cheats = CheatSystem::new();
        let action = |c: &mut CheatSystem, line: &str| c.execute(line).unwrap().action;
        assert_eq!(action(&mut cheats, "gotolevel 10"), Some(CheatAction::GotoLevel(10)));
        assert_eq!(
            action(&mut cheats, "finallevel"),
            Some(CheatAction::GotoLevel(FINAL_LEVEL))
        );
        assert_eq!(action(&mut cheats, "bombrain"), Some(CheatAction::BombRain(10)));
        assert_eq!(action(&mut cheats, "freezeorbs"), Some(CheatAction::Freeze(30.0)));
        assert_eq!(action(&mut cheats, "morelives"), Some(CheatAction::AddLives(5)));
        assert_eq!(
            action(&mut cheats, "giveach COMBO_MASTER"),
            Some(CheatAction::GiveAchievement(AchievementId::ComboMaster))
        );
        assert_eq!(cheats.history().len(), 6);
    }
}
