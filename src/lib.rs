//! Orb Portal - a Zuma-style orb chain shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (path, chain, shooter, collisions, game state)
//! - `session`: Owns the game state and dispatches events to collaborators
//! - `persistence`: Save/load of `{level, score, lives}`
//! - `settings`: Typed preferences and the string-keyed settings store
//! - `tuning`: Data-driven game balance
//! - `cheats` / `achievements`: Closed-enum developer tools and unlock tracking

pub mod achievements;
pub mod audio;
pub mod cheats;
pub mod highscores;
pub mod persistence;
pub mod session;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use highscores::HighScores;
pub use session::{HudSnapshot, Session};
pub use settings::Settings;
pub use tuning::Tuning;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (16 ms nominal, ~60 Hz)
    pub const SIM_DT: f32 = 0.016;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Largest dt a single tick accepts
    pub const MAX_TICK_DT: f32 = 0.1;

    /// Logical play field
    pub const FIELD_WIDTH: f32 = 1366.0;
    pub const FIELD_HEIGHT: f32 = 768.0;

    /// Orb defaults
    pub const ORB_RADIUS: f32 = 15.0;
    pub const PROJECTILE_RADIUS: f32 = 12.0;
    /// Explosion progress gained per second (0.2 s animation)
    pub const EXPLOSION_RATE: f32 = 5.0;
    /// Distance before the portal over which orbs visually shrink
    pub const PORTAL_SHRINK_DISTANCE: f32 = 60.0;

    /// Shooter
    pub const SHOOTER_OFFSET_Y: f32 = 100.0;
    pub const PROJECTILE_SPEED: f32 = 600.0;
    /// Projectiles are discarded once this far outside the field
    pub const PROJECTILE_BOUNDS_MARGIN: f32 = 200.0;
    pub const AIM_GUIDE_LENGTH: f32 = 150.0;
    pub const AIM_GUIDE_ASSISTED_LENGTH: f32 = 600.0;

    /// Danger zone (fraction of path length where slow motion kicks in)
    pub const DANGER_ZONE_START: f32 = 0.85;
    /// Slowest slow-motion factor, reached at the portal
    pub const DANGER_MIN_FACTOR: f32 = 0.6;
    /// How far past the portal the head may travel before the level is lost
    pub const PORTAL_BUFFER: f32 = 10.0;

    /// Scoring
    pub const POINTS_PER_ORB: u64 = 10;
    pub const BOMB_POINTS_PER_ORB: u64 = 50;
    pub const LIFE_BONUS_THRESHOLD: u64 = 5000;

    /// Progression
    pub const STARTING_LIVES: u32 = 5;
    pub const FINAL_LEVEL: u32 = 50;

    /// Scheduled transition delays (seconds)
    pub const LEVEL_COMPLETE_DELAY: f32 = 3.0;
    pub const RETRY_DELAY: f32 = 2.0;
    pub const GAME_OVER_DELAY: f32 = 3.0;
    /// Fade-in progress gained per second when entering a new level
    pub const LEVEL_TRANSITION_RATE: f32 = 2.0;
}

/// Angle (radians) of the vector from `from` to `to`
#[inline]
pub fn angle_to(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

/// Unit direction for an angle in radians
#[inline]
pub fn direction(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Clamp a frame delta to something the simulation can digest
#[inline]
pub fn sanitize_dt(dt: f32) -> f32 {
    if dt.is_finite() {
        dt.clamp(0.0, consts::MAX_TICK_DT)
    } else {
        0.0
    }
}
