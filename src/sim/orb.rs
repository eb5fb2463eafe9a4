//! Orb entity: a single chain element or projectile payload

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::{EXPLOSION_RATE, ORB_RADIUS};

/// Orb type: one of five colors, the rainbow wildcard, or a power-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrbKind {
    Red,
    Blue,
    Green,
    Yellow,
    Purple,
    /// Matches any color
    Rainbow,
    /// Power-up: clears neighbors
    Bomb,
    /// Power-up: slows the chain
    Slow,
    /// Power-up: runs the chain backward
    Reverse,
    /// Power-up: long aim guide
    Accuracy,
}

impl OrbKind {
    pub const COLORS: [OrbKind; 5] = [
        OrbKind::Red,
        OrbKind::Blue,
        OrbKind::Green,
        OrbKind::Yellow,
        OrbKind::Purple,
    ];

    pub const POWERUPS: [OrbKind; 4] = [
        OrbKind::Bomb,
        OrbKind::Slow,
        OrbKind::Reverse,
        OrbKind::Accuracy,
    ];

    #[inline]
    pub fn is_powerup(self) -> bool {
        matches!(
            self,
            OrbKind::Bomb | OrbKind::Slow | OrbKind::Reverse | OrbKind::Accuracy
        )
    }

    pub fn random_color<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::COLORS[rng.random_range(0..Self::COLORS.len())]
    }

    pub fn random_powerup<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::POWERUPS[rng.random_range(0..Self::POWERUPS.len())]
    }

    /// Display color (0xRRGGBB)
    pub fn rgb(self) -> u32 {
        match self {
            OrbKind::Red => 0xff3232,
            OrbKind::Blue => 0x3264ff,
            OrbKind::Green => 0x32ff32,
            OrbKind::Yellow => 0xffff32,
            OrbKind::Purple => 0xc832ff,
            OrbKind::Rainbow => 0xffffff,
            OrbKind::Bomb => 0x282828,
            OrbKind::Slow => 0x64ffff,
            OrbKind::Reverse => 0xff64ff,
            OrbKind::Accuracy => 0xffffff,
        }
    }
}

/// Orb lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrbState {
    #[default]
    Normal,
    /// Playing the explosion animation; still occupies its slot
    Exploding,
    /// Animation finished; purged from the chain on the next update
    Removed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Orb {
    pub id: u32,
    pub kind: OrbKind,
    /// Arc length along the path; negative while waiting behind the start
    pub path_distance: f32,
    /// Cached from `path_distance`
    pub pos: Vec2,
    /// Collision radius
    pub radius: f32,
    /// Cosmetic shrink near the portal, in [0, 1]
    pub visual_scale: f32,
    pub state: OrbState,
    /// Pulse animation phase
    pub pulse: f32,
    /// Explosion animation progress, in [0, 1]
    pub explosion_progress: f32,
}

impl Orb {
    pub fn new(id: u32, kind: OrbKind) -> Self {
        Self {
            id,
            kind,
            path_distance: 0.0,
            pos: Vec2::ZERO,
            radius: ORB_RADIUS,
            visual_scale: 1.0,
            state: OrbState::Normal,
            pulse: 0.0,
            explosion_progress: 0.0,
        }
    }

    #[inline]
    pub fn is_powerup(&self) -> bool {
        self.kind.is_powerup()
    }

    #[inline]
    pub fn is_normal(&self) -> bool {
        self.state == OrbState::Normal
    }

    #[inline]
    pub fn is_removed(&self) -> bool {
        self.state == OrbState::Removed
    }

    /// Advance animations. Reaching full explosion progress retires the orb.
    pub fn update(&mut self, dt: f32) {
        self.pulse += dt * 3.0;

        if self.state == OrbState::Exploding {
            self.explosion_progress += dt * EXPLOSION_RATE;
            if self.explosion_progress >= 1.0 {
                self.explosion_progress = 1.0;
                self.state = OrbState::Removed;
            }
        }
    }

    /// Whether two orbs can sit in the same run.
    ///
    /// Only normal-state colored orbs match; rainbow matches any color and
    /// power-ups match nothing.
    pub fn matches(&self, other: &Orb) -> bool {
        if !self.is_normal() || !other.is_normal() {
            return false;
        }
        if self.is_powerup() || other.is_powerup() {
            return false;
        }
        self.kind == other.kind || self.kind == OrbKind::Rainbow || other.kind == OrbKind::Rainbow
    }

    /// Start exploding. Returns false if the orb was already on its way out.
    pub fn explode(&mut self) -> bool {
        if self.state != OrbState::Normal {
            return false;
        }
        self.state = OrbState::Exploding;
        self.explosion_progress = 0.0;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_same_color() {
        let a = Orb::new(1, OrbKind::Red);
        let b = Orb::new(2, OrbKind::Red);
        let c = Orb::new(3, OrbKind::Blue);
        assert!(a.matches(&b));
        assert!(!a.matches(&c));
    }

    #[test]
    fn test_rainbow_is_wildcard() {
        let rainbow = Orb::new(1, OrbKind::Rainbow);
        for kind in OrbKind::COLORS {
            assert!(rainbow.matches(&Orb::new(2, kind)));
            assert!(Orb::new(2, kind).matches(&rainbow));
        }
    }

    #[test]
    fn test_powerups_never_match() {
        let bomb = Orb::new(1, OrbKind::Bomb);
        assert!(!bomb.matches(&Orb::new(2, OrbKind::Bomb)));
        assert!(!bomb.matches(&Orb::new(3, OrbKind::Rainbow)));
        assert!(!Orb::new(4, OrbKind::Red).matches(&bomb));
    }

    #[test]
    fn test_exploding_orbs_never_match() {
        let mut a = Orb::new(1, OrbKind::Red);
        let b = Orb::new(2, OrbKind::Red);
        a.explode();
        assert!(!a.matches(&b));
        assert!(!b.matches(&a));
    }

    #[test]
    fn test_explode_is_idempotent() {
        let mut orb = Orb::new(1, OrbKind::Green);
        assert!(orb.explode());
        orb.update(0.1);
        let progress = orb.explosion_progress;
        assert!(!orb.explode());
        assert_eq!(orb.state, OrbState::Exploding);
        // A second explode must not restart the animation
        assert_eq!(orb.explosion_progress, progress);
    }

    #[test]
    fn test_explosion_finishes_as_removed() {
        let mut orb = Orb::new(1, OrbKind::Green);
        orb.explode();
        orb.update(0.1);
        assert_eq!(orb.state, OrbState::Exploding);
        orb.update(0.1);
        assert_eq!(orb.state, OrbState::Removed);
        assert!(!orb.explode());
        assert_eq!(orb.state, OrbState::Removed);
    }

    #[test]
    fn test_normal_orb_never_removes_itself() {
        let mut orb = Orb::new(1, OrbKind::Purple);
        for _ in 0..100 {
            orb.update(0.1);
        }
        assert_eq!(orb.state, OrbState::Normal);
    }
}
