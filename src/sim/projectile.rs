//! Straight-line ranged shots

use glam::Vec2;

use super::geometry::{Aabb, Arena};
use super::kinematics::Facing;
use crate::consts::CELL_SIZE;
use crate::tuning::Tuning;

/// Which side fired a projectile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    Player,
    Opponent,
}

#[derive(Debug, Clone)]
pub struct Projectile {
    pub pos: Vec2,
    /// Position at the start of the last advance (swept collision)
    pub prev_pos: Vec2,
    pub dir: Facing,
    pub owner: Owner,
    /// Animation frame, alternates the drawn glyph
    pub frame: u32,
    pub active: bool,
}

impl Projectile {
    pub fn new(pos: Vec2, dir: Facing, owner: Owner) -> Self {
        Self {
            pos,
            prev_pos: pos,
            dir,
            owner,
            frame: 0,
            active: true,
        }
    }

    pub fn speed(&self, tuning: &Tuning) -> f32 {
        match self.owner {
            Owner::Player => tuning.player_shot_speed,
            Owner::Opponent => tuning.opponent_shot_speed,
        }
    }

    /// Bounding box at an arbitrary point along the path
    #[inline]
    pub fn bounds_at(pos: Vec2) -> Aabb {
        Aabb::new(pos, CELL_SIZE, CELL_SIZE)
    }

    #[inline]
    pub fn bounds(&self) -> Aabb {
        Self::bounds_at(self.pos)
    }

    pub fn glyph(&self) -> char {
        if self.frame % 2 == 0 { '-' } else { '+' }
    }

    /// Advance one tick; deactivates once the shot leaves the viewport
    pub fn advance(&mut self, tuning: &Tuning, arena: &Arena, dt: f32) {
        self.prev_pos = self.pos;
        self.pos.x += self.dir.sign() * self.speed(tuning) * dt;
        self.frame = self.frame.wrapping_add(1);

        if self.pos.x < 0.0 || self.pos.x > arena.width_f() {
            self.active = false;
        }
    }
}

/// Advance every live projectile, then drop the dead ones
pub fn update_projectiles(projectiles: &mut Vec<Projectile>, tuning: &Tuning, arena: &Arena, dt: f32) {
    for projectile in projectiles.iter_mut().filter(|p| p.active) {
        projectile.advance(tuning, arena, dt);
    }
    projectiles.retain(|p| p.active);
}
