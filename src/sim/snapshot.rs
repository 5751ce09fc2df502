//! Read-only view of the world for renderers and tooling.
//!
//! Building a snapshot never mutates the world.

use glam::Vec2;
use serde::Serialize;

use super::debris::{BodyKind, layout};
use super::geometry::Platform;
use super::kinematics::Facing;
use super::projectile::Owner;
use super::state::{BloodColorMode, GamePhase, World};

/// Number of hues in the rainbow cycle
pub const RAINBOW_HUES: u8 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntityKind {
    Player,
    Opponent,
    Corpse,
    PlayerShot,
    OpponentShot,
    Fragment,
    Blood,
}

/// Colour category; the renderer maps these to actual colours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Tint {
    Plain,
    Red,
    Green,
    /// Index into the rainbow cycle
    Rainbow(u8),
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityView {
    pub kind: EntityKind,
    pub pos: Vec2,
    pub glyph: char,
    pub facing: Option<Facing>,
    pub visible: bool,
    pub tint: Tint,
    /// Spin in degrees; only tumbling fragments are ever non-zero
    pub rotation: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StainView {
    /// None for the ground line
    pub platform: Option<usize>,
    pub tile_x: u16,
    pub tint: Tint,
}

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub width: u16,
    pub height: u16,
    pub ground_y: f32,
    pub time: f32,
    pub platforms: Vec<Platform>,
    pub entities: Vec<EntityView>,
    pub stains: Vec<StainView>,
    pub score: u64,
    pub kills: u32,
    pub in_menu: bool,
    pub round_over: bool,
    pub paused: bool,
    pub blood_mode: BloodColorMode,
}

/// Tint for blood-coloured things at a cell, or None when blood colour is off
fn blood_tint(mode: BloodColorMode, hue_key: i64) -> Option<Tint> {
    match mode {
        BloodColorMode::Red => Some(Tint::Red),
        BloodColorMode::Green => Some(Tint::Green),
        BloodColorMode::Rainbow => Some(Tint::Rainbow(hue_key.rem_euclid(RAINBOW_HUES as i64) as u8)),
        BloodColorMode::Off => None,
    }
}

#[inline]
fn cell_key(pos: Vec2) -> i64 {
    pos.x.floor() as i64 + pos.y.floor() as i64
}

/// Push one view per sprite glyph
fn push_sprite(
    out: &mut Vec<EntityView>,
    kind: EntityKind,
    body: BodyKind,
    pos: Vec2,
    facing: Facing,
    headless: bool,
) {
    for piece in layout(body, facing) {
        if headless && piece.head {
            continue;
        }
        out.push(EntityView {
            kind,
            pos: pos + Vec2::new(piece.dx as f32, piece.dy as f32),
            glyph: piece.glyph,
            facing: Some(facing),
            visible: true,
            tint: Tint::Plain,
            rotation: 0.0,
        });
    }
}

/// Build a complete snapshot of the current world
pub fn build_snapshot(world: &World) -> Snapshot {
    let mode = world.blood_mode;
    let now = world.time;
    let mut entities = Vec::new();

    if world.player_alive {
        let player = &world.player;
        push_sprite(&mut entities, EntityKind::Player, BodyKind::Player, player.pos, player.facing, false);
    }

    for opponent in world.opponents.iter().filter(|o| o.active) {
        push_sprite(
            &mut entities,
            EntityKind::Opponent,
            BodyKind::Opponent,
            opponent.pos,
            opponent.facing,
            false,
        );
    }

    for corpse in world.debris.corpses.iter().filter(|c| c.active) {
        push_sprite(&mut entities, EntityKind::Corpse, BodyKind::Opponent, corpse.pos, corpse.facing, true);
    }

    entities.extend(world.projectiles.iter().filter(|p| p.active).map(|p| EntityView {
        kind: match p.owner {
            Owner::Player => EntityKind::PlayerShot,
            Owner::Opponent => EntityKind::OpponentShot,
        },
        pos: p.pos,
        glyph: p.glyph(),
        facing: Some(p.dir),
        visible: true,
        tint: Tint::Plain,
        rotation: 0.0,
    }));

    entities.extend(world.debris.fragments.iter().filter(|f| f.active).map(|f| {
        let tint = if f.colored {
            blood_tint(mode, cell_key(f.pos)).unwrap_or(Tint::Plain)
        } else {
            Tint::Plain
        };
        EntityView {
            kind: EntityKind::Fragment,
            pos: f.pos,
            glyph: f.glyph,
            facing: None,
            visible: f.visible(now, &world.tuning),
            tint,
            rotation: f.angle,
        }
    }));

    entities.extend(world.debris.blood.iter().filter(|b| b.active).map(|b| {
        let tint = blood_tint(mode, cell_key(b.pos));
        EntityView {
            kind: EntityKind::Blood,
            pos: b.pos,
            glyph: b.glyph,
            facing: None,
            visible: tint.is_some(),
            tint: tint.unwrap_or(Tint::Plain),
            rotation: 0.0,
        }
    }));

    let stain_tint = |x: u16| blood_tint(mode, x as i64).unwrap_or(Tint::Plain);
    let mut stains: Vec<StainView> = world
        .stains
        .ground_tiles()
        .map(|(x, _)| StainView {
            platform: None,
            tile_x: x,
            tint: stain_tint(x),
        })
        .chain(world.stains.platform_tiles().map(|(i, x, _)| StainView {
            platform: Some(i),
            tile_x: x,
            tint: stain_tint(x),
        }))
        .collect();
    stains.sort_by_key(|s| (s.platform, s.tile_x));

    Snapshot {
        width: world.arena.width,
        height: world.arena.height,
        ground_y: world.arena.ground_y(),
        time: now,
        platforms: world.platforms.clone(),
        entities,
        stains,
        score: world.score,
        kills: world.kills,
        in_menu: world.phase == GamePhase::Menu,
        round_over: world.is_round_over(),
        paused: world.phase == GamePhase::Paused,
        blood_mode: mode,
    }
}
