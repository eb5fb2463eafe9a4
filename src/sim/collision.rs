//! Collision detection between the projectile and the chain
//!
//! The chain holds at most a few dozen orbs, so a straight O(n) scan in
//! chain order is all that is needed.

use glam::Vec2;

use super::chain::OrbChain;
use super::orb::OrbState;
use super::shooter::Projectile;

/// Where a projectile struck the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionHit {
    /// Chain index of the struck orb (the insertion index)
    pub index: usize,
    /// Id of the struck orb, to re-resolve the index if the chain shifts
    pub orb_id: u32,
}

#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let r = ra + rb;
    a.distance_squared(b) < r * r
}

/// First orb in chain order whose circle overlaps the projectile
pub fn check_collision(projectile: &Projectile, chain: &OrbChain) -> Option<CollisionHit> {
    chain
        .orbs()
        .iter()
        .enumerate()
        .filter(|(_, orb)| orb.state != OrbState::Removed)
        .find(|(_, orb)| circles_overlap(projectile.pos, projectile.radius, orb.pos, orb.radius))
        .map(|(index, orb)| CollisionHit {
            index,
            orb_id: orb.id,
        })
}

/// Insertion index closest to `pos`.
///
/// Candidates are each orb's position (insert before it) and the midpoint
/// between each adjacent pair (insert between them). Appending past the head
/// is chosen when `pos` is nearest the head orb and lies beyond it along the
/// path. Returns 0 for an empty chain.
pub fn find_insertion_point(pos: Vec2, chain: &OrbChain) -> usize {
    let orbs = chain.orbs();
    if orbs.is_empty() {
        return 0;
    }

    let mut best = 0;
    let mut best_dist = f32::INFINITY;
    for (i, orb) in orbs.iter().enumerate() {
        let d = pos.distance_squared(orb.pos);
        if d < best_dist {
            best_dist = d;
            best = i;
        }
        if let Some(next) = orbs.get(i + 1) {
            let mid = (orb.pos + next.pos) * 0.5;
            let d = pos.distance_squared(mid);
            if d < best_dist {
                best_dist = d;
                best = i + 1;
            }
        }
    }

    // Past the head: compare against the point one spacing further along
    let last = orbs.len() - 1;
    if best == last {
        let head = &orbs[last];
        let ahead = chain
            .path()
            .position_at_distance(head.path_distance + chain.min_spacing());
        if pos.distance_squared(ahead) < pos.distance_squared(head.pos) {
            return orbs.len();
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::orb::OrbKind;
    use crate::sim::path::PathGeometry;
    use crate::tuning::Tuning;

    fn chain() -> OrbChain {
        let path = PathGeometry::from_points(vec![Vec2::new(0.0, 100.0), Vec2::new(1000.0, 100.0)]);
        let mut config = Tuning::default().chain_config(1);
        config.initial_orbs = 0;
        OrbChain::from_kinds(path, config, &[OrbKind::Red, OrbKind::Blue, OrbKind::Green])
    }

    fn projectile_at(pos: Vec2) -> Projectile {
        Projectile::new(OrbKind::Yellow, pos, 0.0, 0.0)
    }

    #[test]
    fn test_circles_overlap() {
        assert!(circles_overlap(Vec2::ZERO, 1.0, Vec2::new(1.5, 0.0), 1.0));
        assert!(!circles_overlap(Vec2::ZERO, 1.0, Vec2::new(2.0, 0.0), 1.0));
    }

    #[test]
    fn test_hit_returns_first_in_chain_order() {
        let chain = chain();
        // Between orb 0 (x=0) and orb 1 (x=34): overlaps both
        let hit = check_collision(&projectile_at(Vec2::new(17.0, 100.0)), &chain).unwrap();
        assert_eq!(hit.index, 0);
        assert_eq!(hit.orb_id, chain.orbs()[0].id);
    }

    #[test]
    fn test_miss() {
        let chain = chain();
        assert!(check_collision(&projectile_at(Vec2::new(17.0, 300.0)), &chain).is_none());
    }

    #[test]
    fn test_exploding_orbs_still_collide() {
        let mut chain = chain();
        chain.remove_orbs([1]);
        let hit = check_collision(&projectile_at(Vec2::new(40.0, 110.0)), &chain).unwrap();
        assert_eq!(hit.index, 1);
    }

    #[test]
    fn test_find_insertion_point() {
        let chain = chain();
        assert_eq!(find_insertion_point(Vec2::new(-5.0, 120.0), &chain), 0);
        assert_eq!(find_insertion_point(Vec2::new(17.0, 160.0), &chain), 1);
        assert_eq!(find_insertion_point(Vec2::new(51.0, 160.0), &chain), 2);
        assert_eq!(find_insertion_point(Vec2::new(95.0, 100.0), &chain), 3);
    }

    #[test]
    fn test_find_insertion_point_empty_chain() {
        let path = PathGeometry::from_points(vec![Vec2::ZERO, Vec2::new(10.0, 0.0)]);
        let chain = OrbChain::empty(path, Tuning::default().chain_config(1));
        assert_eq!(find_insertion_point(Vec2::new(3.0, 3.0), &chain), 0);
    }
}
