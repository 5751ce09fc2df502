//! Gore pipeline: shattering bodies into fragments, rolling heads and
//! wandering corpses
//!
//! A defeated body becomes one fragment per glyph of its sprite. Fragments
//! fly, bounce at most twice, settle (or, for a chosen head, roll first) and
//! finally blink out unless they belong to the player. Everything in flight
//! leaves a blood trail.

use std::collections::HashSet;

use glam::Vec2;
use serde::Serialize;

use super::actor::{Support, resolve_support};
use super::blood::{BloodParticle, EmitMode, emit_blood, update_blood};
use super::geometry::{Arena, LANDING_EPSILON, Platform, find_landing};
use super::kinematics::{Facing, apply_gravity, integrate, is_moving};
use super::rng::SimRng;
use super::stain::StainRegistry;
use crate::consts::*;
use crate::tuning::Tuning;

/// Identity of the body a piece of debris came from.
///
/// The player is always 0; opponents are numbered from 1 per round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SourceId(pub u32);

impl SourceId {
    pub const PLAYER: SourceId = SourceId(0);

    #[inline]
    pub fn is_player(self) -> bool {
        self == Self::PLAYER
    }
}

/// Which sprite a body uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BodyKind {
    Player,
    Opponent,
}

/// One glyph of a sprite, offset from the sprite's top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub glyph: char,
    pub dx: u8,
    pub dy: u8,
    pub head: bool,
}

const fn piece(glyph: char, dx: u8, dy: u8) -> Piece {
    Piece {
        glyph,
        dx,
        dy,
        head: false,
    }
}

const fn head(glyph: char, dx: u8, dy: u8) -> Piece {
    Piece {
        glyph,
        dx,
        dy,
        head: true,
    }
}

/// Player head is a zero, opponent head a capital O; both can roll
const PLAYER_RIGHT: [Piece; 7] = [
    piece('~', 0, 0),
    head('0', 1, 0),
    piece('(', 0, 1),
    piece('|', 1, 1),
    piece('\\', 2, 1),
    piece('/', 0, 2),
    piece(')', 2, 2),
];

const PLAYER_LEFT: [Piece; 7] = [
    head('0', 1, 0),
    piece('~', 2, 0),
    piece('/', 0, 1),
    piece('|', 1, 1),
    piece(')', 2, 1),
    piece('(', 0, 2),
    piece('\\', 2, 2),
];

const OPPONENT_RIGHT: [Piece; 6] = [
    head('O', 1, 0),
    piece('(', 0, 1),
    piece('|', 1, 1),
    piece('\\', 2, 1),
    piece('/', 0, 2),
    piece(')', 2, 2),
];

const OPPONENT_LEFT: [Piece; 6] = [
    head('O', 1, 0),
    piece('/', 0, 1),
    piece('|', 1, 1),
    piece(')', 2, 1),
    piece('(', 0, 2),
    piece('\\', 2, 2),
];

/// Sprite layout for a body kind facing a given way
pub fn layout(kind: BodyKind, facing: Facing) -> &'static [Piece] {
    match (kind, facing) {
        (BodyKind::Player, Facing::Right) => &PLAYER_RIGHT,
        (BodyKind::Player, Facing::Left) => &PLAYER_LEFT,
        (BodyKind::Opponent, Facing::Right) => &OPPONENT_RIGHT,
        (BodyKind::Opponent, Facing::Left) => &OPPONENT_LEFT,
    }
}

/// True if an actor-sized body at `pos` is standing on (or within reach of) a platform
pub fn standing_on_platform(platforms: &[Platform], pos: Vec2) -> bool {
    let bottom = pos.y + ACTOR_HEIGHT;
    platforms
        .iter()
        .any(|p| p.overlaps_x(pos.x, ACTOR_WIDTH) && (bottom - p.y).abs() < 2.0)
}

/// World data every debris update reads
#[derive(Debug, Clone, Copy)]
pub struct Surroundings<'a> {
    pub platforms: &'a [Platform],
    pub arena: &'a Arena,
    pub tuning: &'a Tuning,
    pub now: f32,
    pub dt: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Surface {
    Ground,
    Platform(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FragmentState {
    Airborne,
    /// A head rolling along the ground until `remaining` distance is used up
    Rolling { remaining: f32 },
    /// At rest since sim time `since`
    Settled { surface: Surface, since: f32 },
}

/// Distance and signed speed a head rolls once it settles on the ground
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RollPlan {
    pub distance: f32,
    pub speed: f32,
}

impl RollPlan {
    fn roll(rng: &mut SimRng) -> Self {
        let distance = rng.range(20.0, 50.0);
        let speed = rng.range(40.0, 60.0) * rng.sign();
        Self { distance, speed }
    }
}

#[derive(Debug, Clone)]
pub struct Fragment {
    pub pos: Vec2,
    pub vel: Vec2,
    pub glyph: char,
    pub source: SourceId,
    pub state: FragmentState,
    pub bounces: u8,
    /// Degrees
    pub angle: f32,
    pub angular_vel: f32,
    pub colored: bool,
    pub falls_through: bool,
    pub head: bool,
    pub roll: Option<RollPlan>,
    /// The body was standing on a platform when it burst
    pub from_platform: bool,
    pub bounced_from_platform: bool,
    /// A falls-through piece has already passed the ground line once
    pub passed_ground: bool,
    pub has_hit_ground: bool,
    pub stained: bool,
    pub last_trail: f32,
    pub active: bool,
}

impl Fragment {
    pub fn new(pos: Vec2, vel: Vec2, glyph: char, source: SourceId, now: f32) -> Self {
        Self {
            pos,
            vel,
            glyph,
            source,
            state: FragmentState::Airborne,
            bounces: 0,
            angle: 0.0,
            angular_vel: 0.0,
            colored: false,
            falls_through: false,
            head: false,
            roll: None,
            from_platform: false,
            bounced_from_platform: false,
            passed_ground: false,
            has_hit_ground: false,
            stained: false,
            last_trail: now,
            active: true,
        }
    }

    /// Fragments hit the ground one row above the ground line
    #[inline]
    fn ground_line(arena: &Arena) -> f32 {
        arena.ground_y() - CELL_SIZE
    }

    /// Settled opponent pieces blink during the last moments of their dwell
    pub fn visible(&self, now: f32, tuning: &Tuning) -> bool {
        match self.state {
            FragmentState::Settled { since, .. } if !self.source.is_player() => {
                let left = tuning.fragment_dwell - (now - since);
                if left > FLASH_WINDOW {
                    return true;
                }
                (now / FLASH_PERIOD).floor() as i64 % 2 != 0
            }
            _ => true,
        }
    }

    fn splash(&self, blood: &mut Vec<BloodParticle>, rng: &mut SimRng, intensity: f32) {
        emit_blood(blood, rng, self.pos, self.vel, self.source, intensity, EmitMode::Impact);
    }

    /// Advance one tick
    pub fn update(
        &mut self,
        blood: &mut Vec<BloodParticle>,
        stains: &mut StainRegistry,
        rng: &mut SimRng,
        env: &Surroundings,
    ) {
        match self.state {
            FragmentState::Airborne => self.fly(blood, stains, rng, env),
            FragmentState::Rolling { remaining } => self.roll_on(remaining, blood, rng, env),
            FragmentState::Settled { since, .. } => {
                if !self.source.is_player() && env.now - since >= env.tuning.fragment_dwell {
                    self.active = false;
                }
            }
        }

        let arena = env.arena;
        if self.pos.y > arena.height_f()
            || self.pos.x < -OFFSCREEN_MARGIN
            || self.pos.x > arena.width_f() + OFFSCREEN_MARGIN
        {
            self.active = false;
        }
    }

    fn fly(
        &mut self,
        blood: &mut Vec<BloodParticle>,
        stains: &mut StainRegistry,
        rng: &mut SimRng,
        env: &Surroundings,
    ) {
        if is_moving(self.vel) {
            let speed = self.vel.length();
            let interval = (0.15 - 0.0008 * speed).max(0.03);
            if env.now - self.last_trail >= interval {
                let intensity = (speed / 100.0).min(0.7);
                emit_blood(blood, rng, self.pos, self.vel, self.source, intensity, EmitMode::Continuous);
                self.last_trail = env.now;
            }
        }

        apply_gravity(&mut self.vel, env.tuning.gravity, env.dt);
        let prev = integrate(&mut self.pos, self.vel, env.dt);
        self.angle = (self.angle + self.angular_vel * env.dt) % 360.0;

        if let Some(index) = find_landing(
            env.platforms,
            self.pos.x,
            CELL_SIZE,
            prev.y + CELL_SIZE,
            self.pos.y + CELL_SIZE,
            self.vel.y,
        ) {
            self.pos.y = env.platforms[index].y - CELL_SIZE;
            self.land(Surface::Platform(index), blood, stains, rng, env);
            return;
        }

        let ground = Self::ground_line(env.arena);
        let crossed = self.vel.y > 0.0 && prev.y <= ground + LANDING_EPSILON && self.pos.y >= ground;
        if !crossed {
            return;
        }

        if self.falls_through && !self.passed_ground {
            self.passed_ground = true;
            self.splash(blood, rng, (self.vel.y.abs() / 60.0).min(1.0));
            return;
        }

        self.pos.y = ground;
        if !self.has_hit_ground {
            self.has_hit_ground = true;
            self.splash(blood, rng, (self.vel.y.abs() / 60.0).min(1.0));
            self.last_trail = env.now;
        }
        self.land(Surface::Ground, blood, stains, rng, env);
    }

    /// Bounce off or come to rest on a surface the piece just reached
    fn land(
        &mut self,
        surface: Surface,
        blood: &mut Vec<BloodParticle>,
        stains: &mut StainRegistry,
        rng: &mut SimRng,
        env: &Surroundings,
    ) {
        if self.colored && !self.stained {
            self.stained = true;
            let x = self.pos.x;
            match surface {
                Surface::Ground => stains.mark_ground(x, self.source, self.from_platform, env.arena, env.platforms),
                Surface::Platform(index) => stains.mark_platform(index, &env.platforms[index], x, self.source),
            }
        }

        let impact = self.vel.y;
        if self.bounces < MAX_BOUNCES && impact > BOUNCE_MIN_SPEED {
            self.bounces += 1;
            self.vel.y = -impact * BOUNCE_DAMPING;
            self.vel.x *= BOUNCE_FRICTION;
            match surface {
                Surface::Platform(_) => self.bounced_from_platform = true,
                Surface::Ground => self.bounced_from_platform = false,
            }
            self.splash(blood, rng, (self.vel.y.abs() / 60.0).min(1.0));
            return;
        }

        if self.bounced_from_platform && surface == Surface::Ground {
            self.bounced_from_platform = false;
            self.splash(blood, rng, (impact.abs() / 60.0).min(1.0));
        }

        self.vel = Vec2::ZERO;
        let plan = self.roll.take();
        self.state = match (surface, plan) {
            (Surface::Ground, Some(plan)) => {
                self.vel.x = plan.speed;
                FragmentState::Rolling {
                    remaining: plan.distance,
                }
            }
            _ => {
                self.angular_vel = 0.0;
                FragmentState::Settled {
                    surface,
                    since: env.now,
                }
            }
        };
    }

    fn roll_on(
        &mut self,
        remaining: f32,
        blood: &mut Vec<BloodParticle>,
        rng: &mut SimRng,
        env: &Surroundings,
    ) {
        let step = self.vel.x * env.dt;
        self.pos.x += step;
        self.angle = (self.angle + self.angular_vel * env.dt) % 360.0;
        let remaining = remaining - step.abs();

        let speed = self.vel.x.abs();
        if speed > 0.1 {
            let interval = (0.2 - 0.0015 * speed).max(0.05);
            if env.now - self.last_trail >= interval {
                let intensity = (speed / 60.0).min(0.6);
                emit_blood(blood, rng, self.pos, self.vel, self.source, intensity, EmitMode::Continuous);
                self.last_trail = env.now;
            }
        }

        self.vel.x *= ROLL_FRICTION;
        self.state = if remaining <= 0.0 || self.vel.x.abs() < ROLL_STOP_SPEED {
            self.vel = Vec2::ZERO;
            self.angular_vel = 0.0;
            FragmentState::Settled {
                surface: Surface::Ground,
                since: env.now,
            }
        } else {
            FragmentState::Rolling { remaining }
        };
    }
}

/// Headless body left behind by a decapitation
#[derive(Debug, Clone)]
pub struct Corpse {
    pub pos: Vec2,
    pub vel: Vec2,
    pub facing: Facing,
    pub move_dir: Facing,
    pub dir_changed: f32,
    pub dir_dwell: f32,
    pub source: SourceId,
    pub expires: f32,
    pub last_blood: f32,
    pub on_platform: bool,
    pub active: bool,
}

impl Corpse {
    /// Wander, bleed and report whether the corpse has run out of time
    fn update(&mut self, blood: &mut Vec<BloodParticle>, rng: &mut SimRng, env: &Surroundings) -> bool {
        let now = env.now;
        if now - self.dir_changed >= self.dir_dwell {
            self.dir_changed = now;
            self.dir_dwell = rng.range(0.2, 0.8);
            if rng.chance(0.5) {
                self.move_dir = self.move_dir.flipped();
            }
        }

        self.pos.x += self.move_dir.sign() * CORPSE_SPEED * env.dt;

        apply_gravity(&mut self.vel, env.tuning.gravity, env.dt);
        let prev_bottom = self.pos.y + ACTOR_HEIGHT;
        self.pos.y += self.vel.y * env.dt;
        if let Support::Platform(_) =
            resolve_support(&mut self.pos, &mut self.vel, prev_bottom, env.platforms, env.arena)
        {
            self.on_platform = true;
        }

        let max_x = (env.arena.width_f() - ACTOR_WIDTH).max(0.0);
        if self.pos.x < 0.0 {
            self.pos.x = 0.0;
            self.move_dir = Facing::Right;
        }
        if self.pos.x > max_x {
            self.pos.x = max_x;
            self.move_dir = Facing::Left;
        }

        if now - self.last_blood >= CORPSE_BLOOD_INTERVAL {
            let spout = self.pos + Vec2::new(1.0, 1.0);
            let spray = Vec2::new(self.move_dir.sign() * CORPSE_SPEED, -10.0 - rng.range(0.0, 20.0));
            let intensity = ((CORPSE_SPEED / 80.0) * 1.4 + 0.15).min(1.0);
            emit_blood(blood, rng, spout, spray, self.source, intensity, EmitMode::Continuous);
            self.last_blood = now;
        }

        now >= self.expires
    }
}

/// All debris of the round: fragments, corpses and blood
#[derive(Debug, Clone, Default)]
pub struct Debris {
    pub fragments: Vec<Fragment>,
    pub corpses: Vec<Corpse>,
    pub blood: Vec<BloodParticle>,
}

impl Debris {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shatter a body into one fragment per sprite glyph
    #[allow(clippy::too_many_arguments)]
    pub fn spawn_burst(
        &mut self,
        rng: &mut SimRng,
        tuning: &Tuning,
        kind: BodyKind,
        pos: Vec2,
        facing: Facing,
        source: SourceId,
        from_platform: bool,
        now: f32,
    ) {
        for piece in layout(kind, facing) {
            let angle = rng.range(0.0, std::f32::consts::TAU);
            let speed = rng.range(20.0, 50.0);
            let vel = Vec2::new(
                angle.cos() * speed,
                -15.0 - rng.range(0.0, 25.0) + angle.sin() * speed * 0.5,
            );
            let offset = Vec2::new(piece.dx as f32, piece.dy as f32);

            let mut fragment = Fragment::new(pos + offset, vel, piece.glyph, source, now);
            fragment.angular_vel = rng.range(-180.0, 180.0);
            fragment.colored = rng.chance(tuning.colored_chance);
            fragment.falls_through = rng.chance(tuning.fall_through_chance);
            fragment.head = piece.head;
            fragment.from_platform = from_platform;
            if piece.head && rng.chance(tuning.roll_chance) {
                fragment.roll = Some(RollPlan::roll(rng));
            }

            fragment.splash(&mut self.blood, rng, (vel.length() / 80.0).min(1.0));
            self.fragments.push(fragment);
        }
        log::trace!("burst {:?} source={} at ({:.1}, {:.1})", kind, source.0, pos.x, pos.y);
    }

    /// Pop an opponent's head off and leave its body wandering
    #[allow(clippy::too_many_arguments)]
    pub fn decapitate(
        &mut self,
        rng: &mut SimRng,
        tuning: &Tuning,
        pos: Vec2,
        vel: Vec2,
        facing: Facing,
        source: SourceId,
        from_platform: bool,
        now: f32,
    ) {
        let angle = rng.range(0.0, std::f32::consts::TAU);
        let speed = rng.range(20.0, 50.0);
        let head_vel = Vec2::new(
            angle.cos() * speed,
            -15.0 - rng.range(0.0, 25.0) + angle.sin() * speed * 0.5,
        );

        let mut head = Fragment::new(pos + Vec2::new(1.0, 0.0), head_vel, 'O', source, now);
        head.angular_vel = rng.range(-180.0, 180.0);
        head.colored = true;
        head.head = true;
        head.from_platform = from_platform;
        head.roll = Some(RollPlan::roll(rng));
        head.splash(&mut self.blood, rng, (head_vel.length() / 80.0).min(1.0));
        self.fragments.push(head);

        let lifetime = rng.range(tuning.corpse_lifetime_min, tuning.corpse_lifetime_max);
        let move_dir = if rng.chance(0.5) { Facing::Left } else { Facing::Right };
        self.corpses.push(Corpse {
            pos,
            vel,
            facing,
            move_dir,
            dir_changed: now,
            dir_dwell: rng.range(0.2, 0.8),
            source,
            expires: now + lifetime,
            last_blood: now,
            on_platform: from_platform,
            active: true,
        });
        log::debug!("decapitation source={} corpse lives {:.2}s", source.0, lifetime);
    }

    /// Advance corpses, fragments and blood by one tick
    pub fn update(&mut self, stains: &mut StainRegistry, rng: &mut SimRng, env: &Surroundings) {
        let mut expired = Vec::new();
        for corpse in self.corpses.iter_mut().filter(|c| c.active) {
            if corpse.update(&mut self.blood, rng, env) {
                corpse.active = false;
                expired.push((corpse.pos, corpse.facing, corpse.source, corpse.on_platform));
            }
        }
        self.corpses.retain(|c| c.active);
        for (pos, facing, source, on_platform) in expired {
            self.spawn_burst(rng, env.tuning, BodyKind::Opponent, pos, facing, source, on_platform, env.now);
        }

        for fragment in self.fragments.iter_mut().filter(|f| f.active) {
            fragment.update(&mut self.blood, stains, rng, env);
        }
        self.fragments.retain(|f| f.active);

        update_blood(&mut self.blood, stains, env.platforms, env.arena, env.tuning.gravity, env.dt);
    }

    /// Drop everything that did not come from the player
    pub fn purge_opponents(&mut self) {
        self.fragments.retain(|f| f.source.is_player());
        self.blood.retain(|b| b.source.is_player());
        self.corpses.retain(|c| c.source.is_player());
    }

    /// Sources still referenced by an active fragment or blood droplet
    pub fn live_sources(&self) -> HashSet<SourceId> {
        self.fragments
            .iter()
            .filter(|f| f.active)
            .map(|f| f.source)
            .chain(self.blood.iter().filter(|b| b.active).map(|b| b.source))
            .collect()
    }

    pub fn clear(&mut self) {
        self.fragments.clear();
        self.corpses.clear();
        self.blood.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = TICK_DT;

    fn arena() -> Arena {
        Arena::new(120, 30)
    }

    /// Run `ticks` debris updates starting at `start`, returns the final time
    fn run(
        debris: &mut Debris,
        stains: &mut StainRegistry,
        rng: &mut SimRng,
        platforms: &[Platform],
        tuning: &Tuning,
        start: f32,
        ticks: u32,
    ) -> f32 {
        let arena = arena();
        let mut now = start;
        for _ in 0..ticks {
            now += DT;
            let env = Surroundings {
                platforms,
                arena: &arena,
                tuning,
                now,
                dt: DT,
            };
            debris.update(stains, rng, &env);
        }
        now
    }

    #[test]
    fn test_layouts_have_one_head() {
        for kind in [BodyKind::Player, BodyKind::Opponent] {
            for facing in [Facing::Left, Facing::Right] {
                let pieces = layout(kind, facing);
                assert_eq!(pieces.iter().filter(|p| p.head).count(), 1);
                assert!(pieces.iter().all(|p| (p.dx as f32) < ACTOR_WIDTH && (p.dy as f32) < ACTOR_HEIGHT));
            }
        }
        assert_eq!(layout(BodyKind::Player, Facing::Right).len(), 7);
        assert_eq!(layout(BodyKind::Opponent, Facing::Left).len(), 6);
    }

    #[test]
    fn test_burst_spawns_one_fragment_per_glyph() {
        let mut rng = SimRng::new(11);
        let tuning = Tuning::default();
        let mut debris = Debris::new();
        let pos = Vec2::new(50.0, 26.0);
        debris.spawn_burst(&mut rng, &tuning, BodyKind::Opponent, pos, Facing::Right, SourceId(4), false, 0.0);

        assert_eq!(debris.fragments.len(), 6);
        assert!(!debris.blood.is_empty());
        for f in &debris.fragments {
            assert_eq!(f.source, SourceId(4));
            assert_eq!(f.state, FragmentState::Airborne);
            assert!(f.vel.y <= 10.0);
            assert!((f.pos - pos).length() < 3.0);
            assert!(f.roll.is_none() || f.head);
        }
    }

    #[test]
    fn test_decapitation_makes_head_and_corpse() {
        let mut rng = SimRng::new(2);
        let tuning = Tuning::default();
        let mut debris = Debris::new();
        let pos = Vec2::new(50.0, 26.0);
        debris.decapitate(&mut rng, &tuning, pos, Vec2::ZERO, Facing::Left, SourceId(3), false, 1.0);

        assert_eq!(debris.fragments.len(), 1);
        let head = &debris.fragments[0];
        assert_eq!(head.glyph, 'O');
        assert!(head.colored && head.head && !head.falls_through);
        assert!(head.roll.is_some());
        assert_eq!(head.pos, pos + Vec2::new(1.0, 0.0));

        assert_eq!(debris.corpses.len(), 1);
        let corpse = &debris.corpses[0];
        assert_eq!(corpse.source, SourceId(3));
        assert!((3.0..5.0).contains(&corpse.expires));
    }

    #[test]
    fn test_bounces_capped_and_settles_at_rest() {
        let tuning = Tuning::default();
        let mut rng = SimRng::new(1);
        let mut stains = StainRegistry::new();
        let mut debris = Debris::new();
        debris
            .fragments
            .push(Fragment::new(Vec2::new(30.0, 2.0), Vec2::new(5.0, 60.0), '|', SourceId(1), 0.0));

        let mut now = 0.0;
        let mut max_bounces = 0;
        for _ in 0..200 {
            now = run(&mut debris, &mut stains, &mut rng, &[], &tuning, now, 1);
            let Some(f) = debris.fragments.first() else { break };
            max_bounces = max_bounces.max(f.bounces);
            if let FragmentState::Settled { .. } = f.state {
                assert_eq!(f.vel, Vec2::ZERO);
                assert_eq!(f.pos.y, arena().ground_y() - 1.0);
                break;
            }
        }
        assert!(max_bounces >= 1);
        assert!(max_bounces <= MAX_BOUNCES);
        assert!(matches!(debris.fragments[0].state, FragmentState::Settled { surface: Surface::Ground, .. }));
    }

    #[test]
    fn test_opponent_fragment_expires_after_dwell() {
        let tuning = Tuning::default();
        let mut rng = SimRng::new(1);
        let mut stains = StainRegistry::new();
        let mut debris = Debris::new();
        let mut settled = Fragment::new(Vec2::new(30.0, 28.0), Vec2::ZERO, '|', SourceId(5), 0.0);
        settled.state = FragmentState::Settled {
            surface: Surface::Ground,
            since: 0.0,
        };
        let mut keeper = settled.clone();
        keeper.source = SourceId::PLAYER;
        debris.fragments.push(settled);
        debris.fragments.push(keeper);

        // 2.9s later both are still there
        let now = run(&mut debris, &mut stains, &mut rng, &[], &tuning, 0.0, 87);
        assert!(now < tuning.fragment_dwell);
        assert_eq!(debris.fragments.len(), 2);

        run(&mut debris, &mut stains, &mut rng, &[], &tuning, now, 4);
        assert_eq!(debris.fragments.len(), 1);
        assert!(debris.fragments[0].source.is_player());

        // Player pieces never expire
        run(&mut debris, &mut stains, &mut rng, &[], &tuning, 10.0, 300);
        assert_eq!(debris.fragments.len(), 1);
    }

    #[test]
    fn test_flash_only_in_last_half_second() {
        let tuning = Tuning::default();
        let mut f = Fragment::new(Vec2::ZERO, Vec2::ZERO, '|', SourceId(2), 0.0);
        f.state = FragmentState::Settled {
            surface: Surface::Ground,
            since: 0.0,
        };
        assert!(f.visible(1.0, &tuning));
        assert!(f.visible(2.4, &tuning));
        // 2.55 -> slot 25 (odd) visible, 2.65 -> slot 26 (even) hidden
        assert!(f.visible(2.55, &tuning));
        assert!(!f.visible(2.65, &tuning));

        f.source = SourceId::PLAYER;
        assert!(f.visible(2.65, &tuning));
    }

    #[test]
    fn test_falls_through_keeps_falling() {
        let tuning = Tuning::default();
        let mut rng = SimRng::new(1);
        let mut stains = StainRegistry::new();
        let mut debris = Debris::new();
        let mut f = Fragment::new(Vec2::new(30.0, 27.5), Vec2::new(0.0, 40.0), '|', SourceId(1), 0.0);
        f.falls_through = true;
        debris.fragments.push(f);

        run(&mut debris, &mut stains, &mut rng, &[], &tuning, 0.0, 1);
        let f = &debris.fragments[0];
        assert!(f.passed_ground);
        assert_eq!(f.state, FragmentState::Airborne);
        // The splash either is still in the air or already stained the ground
        assert!(!debris.blood.is_empty() || !stains.is_empty());

        run(&mut debris, &mut stains, &mut rng, &[], &tuning, DT, 30);
        assert!(debris.fragments.is_empty());
    }

    #[test]
    fn test_head_rolls_then_settles() {
        let tuning = Tuning::default();
        let mut rng = SimRng::new(1);
        let mut stains = StainRegistry::new();
        let mut debris = Debris::new();
        let mut f = Fragment::new(Vec2::new(60.0, 27.8), Vec2::new(0.0, 2.0), 'O', SourceId(1), 0.0);
        f.head = true;
        f.roll = Some(RollPlan {
            distance: 20.0,
            speed: 40.0,
        });
        debris.fragments.push(f);

        let now = run(&mut debris, &mut stains, &mut rng, &[], &tuning, 0.0, 2);
        let f = &debris.fragments[0];
        assert!(matches!(f.state, FragmentState::Rolling { .. }));
        assert!(f.vel.x > 0.0);
        assert_eq!(f.vel.y, 0.0);

        run(&mut debris, &mut stains, &mut rng, &[], &tuning, now, 60);
        let f = &debris.fragments[0];
        assert!(matches!(f.state, FragmentState::Settled { surface: Surface::Ground, .. }));
        assert_eq!(f.vel, Vec2::ZERO);
        assert!(f.pos.x > 60.0);
    }

    #[test]
    fn test_platform_settle_cancels_roll() {
        let tuning = Tuning::default();
        let mut rng = SimRng::new(1);
        let mut stains = StainRegistry::new();
        let mut debris = Debris::new();
        let platforms = [Platform {
            x: 50.0,
            y: 20.0,
            width: 20.0,
        }];
        let mut f = Fragment::new(Vec2::new(60.0, 18.9), Vec2::new(0.0, 2.0), 'O', SourceId(1), 0.0);
        f.head = true;
        f.colored = true;
        f.roll = Some(RollPlan {
            distance: 20.0,
            speed: 40.0,
        });
        debris.fragments.push(f);

        run(&mut debris, &mut stains, &mut rng, &platforms, &tuning, 0.0, 2);
        let f = &debris.fragments[0];
        assert_eq!(
            f.state,
            FragmentState::Settled {
                surface: Surface::Platform(0),
                since: DT
            }
        );
        assert!(f.roll.is_none());
        assert_eq!(f.pos.y, 19.0);
        assert_eq!(stains.platform_stain(0, 60), Some(SourceId(1)));
    }

    #[test]
    fn test_corpse_bursts_exactly_once() {
        let tuning = Tuning::default();
        let mut rng = SimRng::new(6);
        let mut stains = StainRegistry::new();
        let mut debris = Debris::new();
        let pos = Vec2::new(40.0, arena().ground_y() - ACTOR_HEIGHT);
        debris.decapitate(&mut rng, &tuning, pos, Vec2::ZERO, Facing::Right, SourceId(9), false, 0.0);
        let expires = debris.corpses[0].expires;
        debris.fragments.clear();

        let mut now = 0.0;
        let mut seen_bursts = 0;
        while now < expires + 1.0 {
            let before = debris.corpses.len();
            now = run(&mut debris, &mut stains, &mut rng, &[], &tuning, now, 1);
            if before == 1 && debris.corpses.is_empty() {
                seen_bursts += 1;
                assert!(now >= expires);
                let pieces: Vec<_> = debris.fragments.iter().filter(|f| f.source == SourceId(9)).collect();
                assert_eq!(pieces.len(), 6);
            }
        }
        assert_eq!(seen_bursts, 1);
        assert!(debris.corpses.is_empty());
    }

    #[test]
    fn test_corpse_bleeds_and_stays_in_view() {
        let tuning = Tuning::default();
        let mut rng = SimRng::new(6);
        let mut stains = StainRegistry::new();
        let mut debris = Debris::new();
        debris.corpses.push(Corpse {
            pos: Vec2::new(0.5, arena().ground_y() - ACTOR_HEIGHT),
            vel: Vec2::ZERO,
            facing: Facing::Left,
            move_dir: Facing::Left,
            dir_changed: 0.0,
            dir_dwell: 10.0,
            source: SourceId(2),
            expires: 10.0,
            last_blood: 0.0,
            on_platform: false,
            active: true,
        });
        let now = run(&mut debris, &mut stains, &mut rng, &[], &tuning, 0.0, 1);
        let corpse = &debris.corpses[0];
        assert_eq!(corpse.pos.x, 0.0);
        assert_eq!(corpse.move_dir, Facing::Right);
        assert_eq!(corpse.pos.y, arena().ground_y() - ACTOR_HEIGHT);
        assert!(debris.blood.is_empty());

        // First spurt once the blood interval has passed
        run(&mut debris, &mut stains, &mut rng, &[], &tuning, now, 2);
        assert!(debris.corpses[0].pos.x > 0.0);
        assert!(!debris.blood.is_empty() || !stains.is_empty());
    }

    #[test]
    fn test_purge_keeps_player_debris() {
        let mut rng = SimRng::new(3);
        let tuning = Tuning::default();
        let mut debris = Debris::new();
        let pos = Vec2::new(50.0, 26.0);
        debris.spawn_burst(&mut rng, &tuning, BodyKind::Player, pos, Facing::Left, SourceId::PLAYER, false, 0.0);
        debris.spawn_burst(&mut rng, &tuning, BodyKind::Opponent, pos, Facing::Left, SourceId(1), false, 0.0);
        debris.decapitate(&mut rng, &tuning, pos, Vec2::ZERO, Facing::Left, SourceId(2), false, 0.0);

        debris.purge_opponents();
        assert_eq!(debris.fragments.len(), 7);
        assert!(debris.corpses.is_empty());
        let live = debris.live_sources();
        assert_eq!(live.len(), 1);
        assert!(live.contains(&SourceId::PLAYER));
    }

    #[test]
    fn test_standing_on_platform() {
        let platforms = [Platform {
            x: 10.0,
            y: 20.0,
            width: 10.0,
        }];
        assert!(standing_on_platform(&platforms, Vec2::new(12.0, 17.0)));
        assert!(!standing_on_platform(&platforms, Vec2::new(12.0, 10.0)));
        assert!(!standing_on_platform(&platforms, Vec2::new(30.0, 17.0)));
    }
}
