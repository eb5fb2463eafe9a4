//! Orb chain: the ordered train of orbs marching toward the portal
//!
//! Orbs are kept sorted ascending by `path_distance` (index 0 is the tail,
//! the last index is the head nearest the portal). All structural mutations
//! go through this type so the ordering and spacing invariants hold after
//! every operation.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::orb::{Orb, OrbKind, OrbState};
use super::path::PathGeometry;
use crate::consts::PORTAL_SHRINK_DISTANCE;
use crate::tuning::ChainConfig;

/// A run of at least three consecutive matching orbs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRun {
    pub start: usize,
    pub len: usize,
}

impl MatchRun {
    pub fn indices(&self) -> std::ops::Range<usize> {
        self.start..self.start + self.len
    }

    /// One past the last index
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Orb counters for the HUD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrbProgress {
    pub current: u32,
    pub spawned: u32,
    pub max: u32,
    pub remaining: u32,
}

/// Minimum run length that clears
pub const MIN_MATCH: usize = 3;

#[derive(Debug, Clone)]
pub struct OrbChain {
    path: PathGeometry,
    orbs: Vec<Orb>,
    config: ChainConfig,
    spawn_timer: f32,
    spawned: u32,
    orbs_since_powerup: u32,
    /// Seconds of freeze left (0 = moving)
    freeze_timer: f32,
    /// Spawning suspended by a runtime modifier
    pub no_spawn: bool,
    orb_radius: f32,
    next_id: u32,
}

impl OrbChain {
    /// Create the chain for a level, including its initial orbs
    pub fn new<R: Rng + ?Sized>(path: PathGeometry, config: ChainConfig, rng: &mut R) -> Self {
        let mut chain = Self::empty(path, config);

        // Initial orbs wait behind the start of the path
        for i in 0..chain.config.initial_orbs {
            let distance = -(i as f32) * chain.config.min_spacing - chain.config.initial_offset;
            let kind = chain.roll_spawn_kind(rng);
            chain.add_orb_at_distance(kind, distance);
        }
        chain.spawned = chain.config.initial_orbs;

        log::debug!(
            "Chain: {} initial orbs, {} max, speed {:.1}",
            chain.spawned,
            chain.config.max_total_orbs,
            chain.config.speed
        );
        chain
    }

    /// Chain with no orbs and nothing spawned yet
    pub fn empty(path: PathGeometry, config: ChainConfig) -> Self {
        Self {
            path,
            orbs: Vec::new(),
            config,
            spawn_timer: 0.0,
            spawned: 0,
            orbs_since_powerup: 0,
            freeze_timer: 0.0,
            no_spawn: false,
            orb_radius: crate::consts::ORB_RADIUS,
            next_id: 1,
        }
    }

    /// Chain holding exactly `kinds` (tail first), counted as spawned
    pub fn from_kinds(path: PathGeometry, config: ChainConfig, kinds: &[OrbKind]) -> Self {
        let mut chain = Self::empty(path, config);
        for (i, &kind) in kinds.iter().enumerate() {
            chain.add_orb_at_distance(kind, i as f32 * chain.config.min_spacing);
        }
        chain.spawned = kinds.len() as u32;
        chain
    }

    #[inline]
    pub fn path(&self) -> &PathGeometry {
        &self.path
    }

    #[inline]
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    #[inline]
    pub fn orbs(&self) -> &[Orb] {
        &self.orbs
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Orb> {
        self.orbs.get(index)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.orbs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.orbs.is_empty()
    }

    #[inline]
    pub fn spawned(&self) -> u32 {
        self.spawned
    }

    #[inline]
    pub fn max_total_orbs(&self) -> u32 {
        self.config.max_total_orbs
    }

    #[inline]
    pub fn min_spacing(&self) -> f32 {
        self.config.min_spacing
    }

    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.freeze_timer > 0.0
    }

    pub fn index_of(&self, id: u32) -> Option<usize> {
        self.orbs.iter().position(|o| o.id == id)
    }

    /// Level is won exactly when every orb has spawned and none remain
    pub fn is_cleared(&self) -> bool {
        self.orbs.is_empty() && self.spawned >= self.config.max_total_orbs
    }

    pub fn progress(&self) -> OrbProgress {
        OrbProgress {
            current: self.orbs.len() as u32,
            spawned: self.spawned,
            max: self.config.max_total_orbs,
            remaining: self.config.max_total_orbs.saturating_sub(self.spawned),
        }
    }

    fn next_orb_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Allocate an orb carrying this chain's id sequence and radius
    pub fn make_orb(&mut self, kind: OrbKind) -> Orb {
        let id = self.next_orb_id();
        let mut orb = Orb::new(id, kind);
        orb.radius = self.orb_radius;
        orb
    }

    /// Place a new orb at `distance`, keeping the chain sorted
    pub fn add_orb_at_distance(&mut self, kind: OrbKind, distance: f32) {
        let mut orb = self.make_orb(kind);
        orb.path_distance = distance;
        orb.pos = self.path.position_at_distance(distance);

        let idx = self.orbs.partition_point(|o| o.path_distance <= distance);
        self.orbs.insert(idx, orb);
        self.maintain_spacing();
    }

    /// Seat `orb` at `index` without pushing its neighbors yet.
    ///
    /// The orb takes the distance of the orb currently at `index`, or one
    /// spacing ahead of the head when appended, or 0 on an empty chain. The
    /// next spacing pass resolves the overlap. Returns the index used.
    pub fn insert_orb(&mut self, mut orb: Orb, index: usize) -> usize {
        let index = if index > self.orbs.len() {
            log::warn!(
                "Chain: insert index {} past end ({}), appending",
                index,
                self.orbs.len()
            );
            self.orbs.len()
        } else {
            index
        };

        orb.path_distance = if let Some(at) = self.orbs.get(index) {
            at.path_distance
        } else if let Some(prev) = index.checked_sub(1).and_then(|i| self.orbs.get(i)) {
            prev.path_distance + self.config.min_spacing
        } else {
            0.0
        };
        orb.radius = self.orb_radius;
        orb.pos = self.path.position_at_distance(orb.path_distance);
        self.orbs.insert(index, orb);
        index
    }

    /// Advance the chain by `dt` (already scaled by any speed multipliers)
    pub fn update<R: Rng + ?Sized>(&mut self, dt: f32, rng: &mut R) {
        if self.freeze_timer > 0.0 {
            self.freeze_timer = (self.freeze_timer - dt.abs()).max(0.0);
            return;
        }

        let step = self.config.speed * dt;
        for orb in &mut self.orbs {
            if orb.state != OrbState::Removed {
                orb.path_distance += step;
            }
            // Animations run forward even while the chain reverses
            orb.update(dt.abs());
        }

        self.maintain_spacing();

        // Reversing the chain pauses the spawn clock
        self.spawn_timer += dt.max(0.0);
        let can_spawn = self.spawn_timer >= self.config.spawn_interval
            && self.spawned < self.config.max_total_orbs
            && (self.orbs.len() as u32) < self.config.max_total_orbs
            && !self.no_spawn;
        if can_spawn {
            self.spawn_timer = 0.0;
            self.spawn_at_tail(rng);
        }

        self.purge_removed();
        self.refresh_positions();
    }

    /// Spawn one orb strictly behind the current tail
    fn spawn_at_tail<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let tail = self
            .orbs
            .iter()
            .filter(|o| o.state != OrbState::Removed)
            .map(|o| o.path_distance)
            .min_by(|a, b| a.total_cmp(b));
        let distance = tail.unwrap_or(0.0) - self.config.min_spacing;

        let kind = self.roll_spawn_kind(rng);
        self.add_orb_at_distance(kind, distance);
        self.spawned += 1;
        log::debug!(
            "Chain: spawned {:?} ({}/{})",
            kind,
            self.spawned,
            self.config.max_total_orbs
        );
    }

    /// Random color, or a power-up by chance or once the drought guarantee hits
    fn roll_spawn_kind<R: Rng + ?Sized>(&mut self, rng: &mut R) -> OrbKind {
        let forced = self.orbs_since_powerup >= self.config.powerup_guarantee;
        let lucky = rng.random_bool(self.config.powerup_chance.clamp(0.0, 1.0));
        if forced || lucky {
            self.orbs_since_powerup = 0;
            OrbKind::random_powerup(rng)
        } else {
            self.orbs_since_powerup += 1;
            OrbKind::random_color(rng)
        }
    }

    /// Restore the spacing invariants.
    ///
    /// Pass 1 (tail to head) snaps any orb closer than `min_spacing` to its
    /// predecessor forward to exactly `min_spacing`. Pass 2 (head to tail)
    /// pulls an orb back by half the excess when its gap exceeds
    /// `min_spacing + tolerance`, closing gaps over several ticks.
    pub fn maintain_spacing(&mut self) {
        self.orbs
            .sort_by(|a, b| a.path_distance.total_cmp(&b.path_distance));

        let live: Vec<usize> = (0..self.orbs.len())
            .filter(|&i| self.orbs[i].state != OrbState::Removed)
            .collect();
        if live.len() < 2 {
            self.refresh_positions();
            return;
        }

        let spacing = self.config.min_spacing;
        for pair in live.windows(2) {
            let min = self.orbs[pair[0]].path_distance + spacing;
            let current = &mut self.orbs[pair[1]];
            if current.path_distance < min {
                current.path_distance = min;
            }
        }

        let max_gap = spacing + self.config.spacing_tolerance;
        for pair in live.windows(2).rev() {
            let gap = self.orbs[pair[1]].path_distance - self.orbs[pair[0]].path_distance;
            if gap > max_gap {
                self.orbs[pair[1]].path_distance -= (gap - spacing) * 0.5;
            }
        }

        // Removed orbs may now sit out of order; they are purged anyway
        self.orbs
            .sort_by(|a, b| a.path_distance.total_cmp(&b.path_distance));
        self.refresh_positions();
    }

    /// Push orbs from `start` toward the head so none overlaps its predecessor
    pub fn resolve_overlaps_from(&mut self, start: usize) {
        let spacing = self.config.min_spacing;
        for i in start.max(1)..self.orbs.len() {
            let required = self.orbs[i - 1].path_distance + spacing;
            let orb = &mut self.orbs[i];
            if orb.path_distance < required {
                orb.path_distance = required;
            }
            orb.pos = self.path.position_at_distance(orb.path_distance);
        }
        if let Some(orb) = self.orbs.get_mut(start) {
            orb.pos = self.path.position_at_distance(orb.path_distance);
        }
    }

    /// Recompute cached positions and portal shrink from path distances
    pub fn refresh_positions(&mut self) {
        let total = self.path.total_length();
        for orb in &mut self.orbs {
            orb.pos = self.path.position_at_distance(orb.path_distance);
            let to_portal = total - orb.path_distance;
            orb.visual_scale = (to_portal / PORTAL_SHRINK_DISTANCE).clamp(0.0, 1.0);
        }
    }

    /// Drop orbs whose explosion finished. Returns how many were dropped.
    pub fn purge_removed(&mut self) -> usize {
        let before = self.orbs.len();
        self.orbs.retain(|o| o.state != OrbState::Removed);
        let purged = before - self.orbs.len();
        if purged > 0 {
            log::debug!("Chain: purged {} exploded orbs, {} left", purged, self.orbs.len());
        }
        purged
    }

    /// Find every run holding `MIN_MATCH` or more matching colored orbs.
    ///
    /// Adjacent orbs extend a run when they `matches()` the previous colored
    /// orb in it, so a rainbow bridges two different colors. A power-up inside
    /// a run is passed over only if the orb right after it also matches; a
    /// power-up never starts or ends a run. Exploding and removed orbs always
    /// break a run. Bridged power-ups count toward a run's length but not
    /// toward the threshold.
    pub fn check_matches(&self) -> Vec<MatchRun> {
        let n = self.orbs.len();
        let mut runs = Vec::new();
        if n < MIN_MATCH {
            return runs;
        }

        let mut i = 0;
        while i < n {
            let anchor = &self.orbs[i];
            if !anchor.is_normal() || anchor.is_powerup() {
                i += 1;
                continue;
            }

            let mut last_color = i;
            let mut colored = 1;
            let mut j = i + 1;
            while j < n {
                let orb = &self.orbs[j];
                if !orb.is_normal() {
                    break;
                }
                if orb.is_powerup() {
                    let bridged = self
                        .orbs
                        .get(j + 1)
                        .is_some_and(|next| next.matches(&self.orbs[last_color]));
                    if bridged {
                        j += 1;
                        continue;
                    }
                    break;
                }
                if !orb.matches(&self.orbs[last_color]) {
                    break;
                }
                last_color = j;
                colored += 1;
                j += 1;
            }

            if colored >= MIN_MATCH {
                let len = last_color + 1 - i;
                runs.push(MatchRun { start: i, len });
                i = last_color + 1;
            } else {
                i += 1;
            }
        }
        runs
    }

    /// Start the explosion of every in-range index. Orbs stay in place until
    /// their animation ends and the next update purges them. Returns how
    /// many orbs began exploding.
    pub fn remove_orbs<I: IntoIterator<Item = usize>>(&mut self, indices: I) -> usize {
        let mut exploded = 0;
        for idx in indices {
            if let Some(orb) = self.orbs.get_mut(idx) {
                if orb.explode() {
                    exploded += 1;
                }
            }
        }
        exploded
    }

    /// Explode every orb
    pub fn clear_all(&mut self) -> usize {
        let n = self.orbs.len();
        self.remove_orbs(0..n)
    }

    /// Suspend movement and spawning for `duration` seconds
    pub fn freeze(&mut self, duration: f32) {
        self.freeze_timer = duration.max(0.0);
        log::info!("Chain: frozen for {:.1}s", self.freeze_timer);
    }

    /// Furthest path distance of any orb still in play (0 when empty)
    pub fn head_distance(&self) -> f32 {
        self.orbs
            .iter()
            .filter(|o| o.state != OrbState::Removed)
            .map(|o| o.path_distance)
            .max_by(|a, b| a.total_cmp(b))
            .unwrap_or(0.0)
    }

    /// Change the kind of a normal orb. Returns false for stale indices or
    /// orbs already exploding.
    pub fn set_kind(&mut self, index: usize, kind: OrbKind) -> bool {
        match self.orbs.get_mut(index) {
            Some(orb) if orb.is_normal() => {
                orb.kind = kind;
                true
            }
            _ => false,
        }
    }

    /// Turn up to `count` randomly chosen normal orbs into `kind`.
    /// Returns how many changed.
    pub fn convert_random<R: Rng + ?Sized>(&mut self, kind: OrbKind, count: usize, rng: &mut R) -> usize {
        let mut candidates: Vec<usize> = (0..self.orbs.len())
            .filter(|&i| self.orbs[i].is_normal() && self.orbs[i].kind != kind)
            .collect();
        let mut changed = 0;
        while changed < count && !candidates.is_empty() {
            let pick = candidates.swap_remove(rng.random_range(0..candidates.len()));
            if self.set_kind(pick, kind) {
                changed += 1;
            }
        }
        changed
    }

    /// Resize every orb's collision radius
    pub fn set_orb_radius(&mut self, radius: f32) {
        if (self.orb_radius - radius).abs() <= f32::EPSILON {
            return;
        }
        self.orb_radius = radius;
        for orb in &mut self.orbs {
            orb.radius = radius;
        }
    }
}
