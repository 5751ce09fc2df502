//! Blood spray particles
//!
//! Spray is emitted by bursting bodies, bouncing and trailing fragments and
//! wandering corpses. Particles fall under gravity and stain whatever surface
//! they hit first.

use std::f32::consts::PI;

use glam::Vec2;

use super::debris::SourceId;
use super::geometry::{Aabb, Arena, Platform};
use super::kinematics::{apply_gravity, integrate, is_moving};
use super::rng::SimRng;
use super::stain::StainRegistry;
use crate::consts::{CELL_SIZE, OFFSCREEN_MARGIN};

pub const BLOOD_GLYPH: char = '.';

/// Shape of an emission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitMode {
    /// A splash along the source's direction of travel
    Impact,
    /// A thin trail spraying backwards from a moving source
    Continuous,
}

#[derive(Debug, Clone)]
pub struct BloodParticle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub glyph: char,
    /// Seconds left before the droplet evaporates
    pub life: f32,
    pub source: SourceId,
    pub active: bool,
}

/// Emit a blood spray from a body at `pos` moving with `vel`.
///
/// `intensity` in [0, 1] scales the impact splash count.
pub fn emit_blood(
    particles: &mut Vec<BloodParticle>,
    rng: &mut SimRng,
    pos: Vec2,
    vel: Vec2,
    source: SourceId,
    intensity: f32,
    mode: EmitMode,
) {
    let intensity = intensity.clamp(0.0, 1.0);
    let heading = vel.y.atan2(vel.x);
    let impact_speed = vel.length();

    let count = match mode {
        EmitMode::Impact => {
            let base = rng.int_inclusive(3, 6) as f32;
            (base * (0.5 + 0.5 * intensity)).floor() as u32
        }
        EmitMode::Continuous => rng.int_inclusive(1, 2),
    };

    for _ in 0..count {
        let (angle, speed, life) = match mode {
            EmitMode::Impact => (
                heading + rng.range(-0.4 * PI, 0.4 * PI),
                20.0 + impact_speed * 0.3 + rng.range(0.0, 30.0),
                rng.range(0.4, 1.0),
            ),
            EmitMode::Continuous => {
                let angle = if is_moving(vel) {
                    heading + PI + rng.range(-0.3 * PI, 0.3 * PI)
                } else {
                    rng.range(0.0, 2.0 * PI)
                };
                (angle, rng.range(10.0, 35.0), rng.range(0.3, 0.8))
            }
        };

        let mut drop_vel = Vec2::new(angle.cos(), angle.sin()) * speed;
        drop_vel.y -= 5.0 + rng.range(0.0, 10.0);
        let jitter = Vec2::new(rng.range(-1.0, 1.0), rng.range(-1.0, 1.0));

        particles.push(BloodParticle {
            pos: pos + jitter,
            vel: drop_vel,
            glyph: BLOOD_GLYPH,
            life,
            source,
            active: true,
        });
    }
}

/// Advance all droplets, committing stains on contact, then drop dead ones
pub fn update_blood(
    particles: &mut Vec<BloodParticle>,
    stains: &mut StainRegistry,
    platforms: &[Platform],
    arena: &Arena,
    gravity: f32,
    dt: f32,
) {
    let ground = arena.ground_y();

    for drop in particles.iter_mut().filter(|b| b.active) {
        apply_gravity(&mut drop.vel, gravity, dt);
        integrate(&mut drop.pos, drop.vel, dt);

        let cell = Aabb::new(drop.pos, CELL_SIZE, CELL_SIZE);
        if let Some(index) = platforms.iter().position(|p| p.bounds().overlaps(&cell)) {
            stains.mark_platform(index, &platforms[index], drop.pos.x, drop.source);
            drop.active = false;
            continue;
        }
        if drop.pos.y >= ground {
            stains.mark_ground(drop.pos.x, drop.source, false, arena, platforms);
            drop.active = false;
            continue;
        }

        drop.life -= dt;
        if drop.life <= 0.0
            || drop.pos.x < -OFFSCREEN_MARGIN
            || drop.pos.x > arena.width_f() + OFFSCREEN_MARGIN
            || drop.pos.y > arena.height_f()
        {
            drop.active = false;
        }
    }
    particles.retain(|b| b.active);
}
