//! Shared motion primitives
//!
//! Screen convention: +Y points down, so gravity increases `vel.y`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Horizontal facing of an actor or body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Facing {
    Left,
    Right,
}

impl Facing {
    /// -1.0 for left, +1.0 for right
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }

    /// Facing that points along `dx` (right for zero)
    #[inline]
    pub fn toward(dx: f32) -> Self {
        if dx < 0.0 { Facing::Left } else { Facing::Right }
    }

    #[inline]
    pub fn flipped(self) -> Self {
        match self {
            Facing::Left => Facing::Right,
            Facing::Right => Facing::Left,
        }
    }
}

/// Accelerate downward
#[inline]
pub fn apply_gravity(vel: &mut Vec2, gravity: f32, dt: f32) {
    vel.y += gravity * dt;
}

/// Explicit Euler step, returns the position before the step
#[inline]
pub fn integrate(pos: &mut Vec2, vel: Vec2, dt: f32) -> Vec2 {
    let prev = *pos;
    *pos += vel * dt;
    prev
}

/// True if either velocity component is meaningfully non-zero
#[inline]
pub fn is_moving(vel: Vec2) -> bool {
    vel.x.abs() > 0.1 || vel.y.abs() > 0.1
}
