//! Shooter turret and the projectile it fires

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::orb::OrbKind;
use crate::consts::{
    AIM_GUIDE_ASSISTED_LENGTH, AIM_GUIDE_LENGTH, PROJECTILE_BOUNDS_MARGIN, PROJECTILE_RADIUS,
    PROJECTILE_SPEED,
};
use crate::{angle_to, direction};

/// Axis-aligned rectangle a projectile may travel in
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    /// The field `width` x `height`, grown by `margin` on every side
    pub fn around_field(width: f32, height: f32, margin: f32) -> Self {
        Self {
            min: Vec2::splat(-margin),
            max: Vec2::new(width + margin, height + margin),
        }
    }

    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

/// An orb in flight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub kind: OrbKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub out_of_bounds: bool,
}

impl Projectile {
    pub fn new(kind: OrbKind, pos: Vec2, angle: f32, speed: f32) -> Self {
        Self {
            kind,
            pos,
            vel: direction(angle) * speed,
            radius: PROJECTILE_RADIUS,
            out_of_bounds: false,
        }
    }

    /// Linear motion; flags itself once it leaves `bounds`
    pub fn update(&mut self, dt: f32, bounds: &Bounds) {
        self.pos += self.vel * dt;
        if !bounds.contains(self.pos) {
            self.out_of_bounds = true;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shooter {
    pub pos: Vec2,
    /// Aim angle in radians (0 = right, positive = down the screen)
    pub angle: f32,
    pub loaded: OrbKind,
    pub next: OrbKind,
    pub projectile: Option<Projectile>,
    pub bounds: Bounds,
    /// Projectile collision radius, scaled by the orb-size modifier
    pub projectile_radius: f32,
}

impl Shooter {
    pub fn new<R: Rng + ?Sized>(pos: Vec2, field: Vec2, rng: &mut R) -> Self {
        Self {
            pos,
            angle: -std::f32::consts::FRAC_PI_2,
            loaded: OrbKind::random_color(rng),
            next: OrbKind::random_color(rng),
            projectile: None,
            bounds: Bounds::around_field(field.x, field.y, PROJECTILE_BOUNDS_MARGIN),
            projectile_radius: PROJECTILE_RADIUS,
        }
    }

    pub fn aim_at(&mut self, point: Vec2) {
        if point == self.pos {
            return;
        }
        self.angle = angle_to(self.pos, point);
    }

    #[inline]
    pub fn is_busy(&self) -> bool {
        self.projectile.is_some()
    }

    /// Launch the loaded orb. No-op (returns false) while a shot is in flight.
    pub fn fire<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if self.projectile.is_some() {
            return false;
        }
        let mut projectile = Projectile::new(self.loaded, self.pos, self.angle, PROJECTILE_SPEED);
        projectile.radius = self.projectile_radius;
        self.projectile = Some(projectile);
        self.loaded = self.next;
        self.next = OrbKind::random_color(rng);
        true
    }

    /// Exchange loaded and next. No-op while a shot is in flight.
    pub fn swap(&mut self) -> bool {
        if self.projectile.is_some() {
            return false;
        }
        std::mem::swap(&mut self.loaded, &mut self.next);
        true
    }

    /// Move the projectile and drop it once it leaves the bounds
    pub fn update(&mut self, dt: f32) {
        let bounds = self.bounds;
        if let Some(projectile) = &mut self.projectile {
            projectile.update(dt, &bounds);
            if projectile.out_of_bounds {
                log::debug!("Shooter: projectile left the field at {:?}", projectile.pos);
                self.projectile = None;
            }
        }
    }

    /// Take the projectile out of flight (it hit something)
    pub fn take_projectile(&mut self) -> Option<Projectile> {
        self.projectile.take()
    }

    /// End point of the aim guide line; longer while aim assist is active
    pub fn aim_guide(&self, assisted: bool) -> Vec2 {
        let length = if assisted {
            AIM_GUIDE_ASSISTED_LENGTH
        } else {
            AIM_GUIDE_LENGTH
        };
        self.pos + direction(self.angle) * length
    }
}
