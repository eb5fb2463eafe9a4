//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Caller-supplied timestep, sanitized on entry
//! - Seeded RNG only
//! - Stable iteration order (chain order, sorted by path distance)
//! - No audio, persistence or platform dependencies; lifecycle changes are
//!   reported as `GameEvent`s

pub mod chain;
pub mod collision;
pub mod combo;
pub mod orb;
pub mod path;
pub mod powerups;
pub mod shooter;
pub mod state;
pub mod tick;

pub use chain::{MatchRun, OrbChain, OrbProgress};
pub use collision::{CollisionHit, check_collision, find_insertion_point};
pub use combo::ComboSystem;
pub use orb::{Orb, OrbKind, OrbState};
pub use path::{PathGeometry, PathPattern};
pub use powerups::{PowerUpManager, PowerUpOutcome};
pub use shooter::{Projectile, Shooter};
pub use state::{
    GameEvent, GamePhase, GameState, RuntimeModifiers, Scheduled, ScheduledAction, SoundCue,
};
pub use tick::{TickInput, complete_level, defeat, tick};
