//! Player and opponent movement, jumping and landing
//!
//! Both actor kinds share the 4x3 sprite box and the same vertical
//! resolution: platforms are tested before the ground, and the ground is only
//! consulted when no platform caught the actor this tick.

use glam::Vec2;

use super::geometry::{Aabb, Arena, Platform, find_landing};
use super::kinematics::{Facing, apply_gravity};
use super::projectile::{Owner, Projectile};
use super::rng::SimRng;
use crate::consts::*;
use crate::input::MoveKey;
use crate::tuning::Tuning;

/// What an actor is standing on after vertical resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Support {
    Platform(usize),
    Ground,
    Airborne,
}

/// Land an actor that has just moved vertically.
///
/// `prev_bottom` is the actor's bottom edge before this tick's vertical move.
pub fn resolve_support(
    pos: &mut Vec2,
    vel: &mut Vec2,
    prev_bottom: f32,
    platforms: &[Platform],
    arena: &Arena,
) -> Support {
    let bottom = pos.y + ACTOR_HEIGHT;
    if let Some(index) = find_landing(platforms, pos.x, ACTOR_WIDTH, prev_bottom, bottom, vel.y) {
        pos.y = platforms[index].y - ACTOR_HEIGHT;
        vel.y = 0.0;
        return Support::Platform(index);
    }

    let standing_y = arena.ground_y() - ACTOR_HEIGHT;
    if pos.y >= standing_y {
        pos.y = standing_y;
        if vel.y > 0.0 {
            vel.y = 0.0;
        }
        return Support::Ground;
    }
    Support::Airborne
}

/// Keep an actor's box inside the viewport horizontally
#[inline]
fn clamp_to_viewport(pos: &mut Vec2, arena: &Arena) {
    pos.x = pos.x.clamp(0.0, (arena.width_f() - ACTOR_WIDTH).max(0.0));
}

/// Spawn point for shots: the sprite's centre cell
#[inline]
fn muzzle(pos: Vec2) -> Vec2 {
    pos + Vec2::new((ACTOR_WIDTH / 2.0).floor(), (ACTOR_HEIGHT / 2.0).floor())
}

/// Last key-down time per movement key (sim clock seconds)
#[derive(Debug, Clone, Default)]
pub struct KeyState {
    left: Option<f32>,
    right: Option<f32>,
    up: Option<f32>,
}

/// Movement intents valid for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveIntent {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
}

impl KeyState {
    pub fn press(&mut self, key: MoveKey, now: f32) {
        let slot = match key {
            MoveKey::Left => &mut self.left,
            MoveKey::Right => &mut self.right,
            MoveKey::Up => &mut self.up,
        };
        *slot = Some(now);
    }

    /// A key counts as held for a short window after its last key-down
    pub fn held(&self, key: MoveKey, now: f32) -> bool {
        let pressed = match key {
            MoveKey::Left => self.left,
            MoveKey::Right => self.right,
            MoveKey::Up => self.up,
        };
        pressed.is_some_and(|t| now - t < KEY_HOLD_TIMEOUT)
    }

    pub fn intent(&self, now: f32) -> MoveIntent {
        MoveIntent {
            left: self.held(MoveKey::Left, now),
            right: self.held(MoveKey::Right, now),
            jump: self.held(MoveKey::Up, now),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// The controllable fighter
#[derive(Debug, Clone)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    pub facing: Facing,
    pub on_ground: bool,
    pub on_platform: bool,
    /// When support was last held; None once a jump consumed the leniency window
    pub last_support: Option<f32>,
    pub last_shot: Option<f32>,
}

impl Player {
    /// Standing on the ground in the middle of the arena
    pub fn new(arena: &Arena, now: f32) -> Self {
        Self {
            pos: Vec2::new((arena.width / 2) as f32, arena.ground_y() - ACTOR_HEIGHT),
            vel: Vec2::ZERO,
            facing: Facing::Right,
            on_ground: true,
            on_platform: false,
            last_support: Some(now),
            last_shot: None,
        }
    }

    #[inline]
    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.pos, ACTOR_WIDTH, ACTOR_HEIGHT)
    }

    #[inline]
    pub fn supported(&self) -> bool {
        self.on_ground || self.on_platform
    }

    /// Grounded, platform-grounded, or still inside the leniency window
    pub fn can_jump(&self, now: f32) -> bool {
        self.supported() || self.last_support.is_some_and(|t| now - t < JUMP_LENIENCY)
    }

    /// Fire if the re-fire interval has elapsed
    pub fn try_fire(&mut self, tuning: &Tuning, now: f32) -> Option<Projectile> {
        if self
            .last_shot
            .is_some_and(|t| now - t <= tuning.player_fire_cooldown)
        {
            return None;
        }
        self.last_shot = Some(now);
        Some(Projectile::new(muzzle(self.pos), self.facing, Owner::Player))
    }

    /// Advance the player by one tick of held-key movement and gravity
    pub fn update(
        &mut self,
        intent: MoveIntent,
        platforms: &[Platform],
        arena: &Arena,
        tuning: &Tuning,
        now: f32,
        dt: f32,
    ) {
        let speed = if self.supported() {
            tuning.player_ground_speed
        } else {
            tuning.player_air_speed
        };

        if intent.left {
            self.facing = Facing::Left;
            self.pos.x -= speed * dt;
        }
        if intent.right {
            self.facing = Facing::Right;
            self.pos.x += speed * dt;
        }

        if intent.jump && self.can_jump(now) {
            self.vel.y = -tuning.jump_speed;
            self.on_ground = false;
            self.on_platform = false;
            self.last_support = None;
        }

        if !self.on_ground {
            apply_gravity(&mut self.vel, tuning.gravity, dt);
        }

        let prev_bottom = self.pos.y + ACTOR_HEIGHT;
        self.pos.y += self.vel.y * dt;

        match resolve_support(&mut self.pos, &mut self.vel, prev_bottom, platforms, arena) {
            Support::Platform(_) => {
                self.on_ground = false;
                self.on_platform = true;
                self.last_support = Some(now);
            }
            Support::Ground => {
                if self.vel.y == 0.0 {
                    self.on_ground = true;
                    self.on_platform = false;
                    self.last_support = Some(now);
                }
            }
            Support::Airborne => {
                if self.supported() {
                    self.last_support = Some(now);
                }
                self.on_ground = false;
                self.on_platform = false;
            }
        }

        clamp_to_viewport(&mut self.pos, arena);
    }

    /// Re-seat the player after the viewport changed size
    pub fn refit(&mut self, arena: &Arena) {
        clamp_to_viewport(&mut self.pos, arena);
        self.pos.y = arena.ground_y() - ACTOR_HEIGHT;
        self.vel.y = 0.0;
        self.on_ground = true;
        self.on_platform = false;
    }
}

/// How an opponent chooses its horizontal movement this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Steering {
    /// Round in progress: chase (or keep range from) the player at `target`
    Engage { target: Vec2 },
    /// Round over: walk off through the nearest edge
    Retreat,
}

/// A spawned opponent
#[derive(Debug, Clone)]
pub struct Opponent {
    pub pos: Vec2,
    pub vel: Vec2,
    pub facing: Facing,
    pub on_ground: bool,
    pub active: bool,
    /// Ranged opponents keep their distance and shoot
    pub ranged: bool,
    pub last_shot: Option<f32>,
    pub next_shot_delay: f32,
    pub last_jump: Option<f32>,
}

impl Opponent {
    /// Enter from the edge opposite to `facing`, standing on the ground
    pub fn spawn(facing: Facing, ranged: bool, arena: &Arena) -> Self {
        let x = match facing {
            Facing::Right => -ACTOR_WIDTH,
            Facing::Left => arena.width_f(),
        };
        Self::at(Vec2::new(x, arena.ground_y() - ACTOR_HEIGHT), facing, ranged)
    }

    pub fn at(pos: Vec2, facing: Facing, ranged: bool) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            facing,
            on_ground: true,
            active: true,
            ranged,
            last_shot: None,
            next_shot_delay: 0.0,
            last_jump: None,
        }
    }

    #[inline]
    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.pos, ACTOR_WIDTH, ACTOR_HEIGHT)
    }

    /// Fully past either side of the viewport
    #[inline]
    pub fn is_offscreen(&self, arena: &Arena) -> bool {
        self.pos.x < -ACTOR_WIDTH || self.pos.x > arena.width_f()
    }

    /// Step horizontally in `facing`'s direction
    #[inline]
    fn walk(&mut self, facing: Facing, speed: f32, dt: f32) {
        self.facing = facing;
        self.pos.x += facing.sign() * speed * dt;
    }

    fn steer(&mut self, steering: Steering, arena: &Arena, speed: f32, dt: f32) {
        match steering {
            Steering::Retreat => {
                let dx = self.pos.x - arena.width_f() / 2.0;
                let out = if dx > 0.0 { Facing::Right } else { Facing::Left };
                self.walk(out, speed, dt);
            }
            Steering::Engage { target } => {
                let dx = target.x - self.pos.x;
                let toward = if dx > 0.0 { Facing::Right } else { Facing::Left };
                if !self.ranged {
                    self.walk(toward, speed, dt);
                    return;
                }
                let distance = dx.abs();
                if distance < STANDOFF_MIN {
                    self.walk(toward.flipped(), speed, dt);
                } else if distance > STANDOFF_MIN + STANDOFF_BAND {
                    self.walk(toward, speed, dt);
                }
            }
        }
    }

    /// Arm the first shot, then fire on a randomized cadence
    fn think_fire(&mut self, rng: &mut SimRng, tuning: &Tuning, now: f32) -> Option<Projectile> {
        match self.last_shot {
            None => {
                self.next_shot_delay =
                    rng.range(tuning.opponent_fire_delay_min, tuning.opponent_fire_delay_max);
                self.last_shot = Some(now);
                None
            }
            Some(t) if now - t >= self.next_shot_delay => {
                self.last_shot = Some(now);
                self.next_shot_delay =
                    rng.range(tuning.opponent_fire_delay_min, tuning.opponent_fire_delay_max);
                Some(Projectile::new(muzzle(self.pos), self.facing, Owner::Opponent))
            }
            Some(_) => None,
        }
    }

    /// Hop toward a higher player or a nearby platform, at most once per cooldown
    fn think_jump(&mut self, target: Vec2, platforms: &[Platform], tuning: &Tuning, now: f32) {
        let ready = self.on_ground
            && self
                .last_jump
                .is_none_or(|t| now - t > tuning.opponent_jump_cooldown);
        if !ready {
            return;
        }

        let player_above = target.y - self.pos.y < -10.0;
        let platform_near = platforms.iter().any(|p| {
            p.y - ACTOR_HEIGHT < self.pos.y - 5.0 && (self.pos.x - p.center_x()).abs() < 30.0
        });

        if player_above || platform_near {
            self.vel.y = -tuning.jump_speed;
            self.on_ground = false;
            self.last_jump = Some(now);
        }
    }

    /// Menu backdrop: stroll toward the screen centre along the ground, no
    /// gravity. Vanishes near the centre or off-screen.
    pub fn parade(&mut self, arena: &Arena, speed: f32, dt: f32) {
        let center = (arena.width / 2) as f32;
        self.walk(Facing::toward(center - self.pos.x), speed, dt);
        if (self.pos.x - center).abs() < 5.0 || self.is_offscreen(arena) {
            self.active = false;
        }
    }

    /// Advance one tick. Returns a projectile if the opponent fired.
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        steering: Steering,
        platforms: &[Platform],
        arena: &Arena,
        tuning: &Tuning,
        rng: &mut SimRng,
        now: f32,
        dt: f32,
    ) -> Option<Projectile> {
        self.steer(steering, arena, tuning.opponent_speed, dt);

        let mut shot = None;
        if let Steering::Engage { target } = steering {
            if self.ranged {
                shot = self.think_fire(rng, tuning, now);
            }
            self.think_jump(target, platforms, tuning, now);
        }

        if !self.on_ground {
            apply_gravity(&mut self.vel, tuning.gravity, dt);
        }
        let prev_bottom = self.pos.y + ACTOR_HEIGHT;
        self.pos.y += self.vel.y * dt;

        self.on_ground = match resolve_support(&mut self.pos, &mut self.vel, prev_bottom, platforms, arena) {
            Support::Platform(_) => true,
            Support::Ground => self.on_ground || self.vel.y == 0.0,
            Support::Airborne => false,
        };

        if self.is_offscreen(arena) {
            self.active = false;
        }
        shot
    }
}
