//! Combat hit detection
//!
//! The fast part of the fight: shots move several cells per tick, so player
//! shots are tested along their whole path, not just where they ended up.

use super::actor::{Opponent, Player};
use super::geometry::Aabb;
use super::projectile::{Owner, Projectile};
use crate::consts::SWEEP_SAMPLES;

/// Outcome of one combat pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombatResult {
    /// The player touched an opponent or was hit by an opponent shot
    pub player_defeated: bool,
    /// Indices of opponents killed by player shots this tick
    pub killed: Vec<usize>,
}

/// Check a shot against a box along the path it travelled this tick.
///
/// Tests the current cell, the previous cell, then evenly spaced samples in
/// between, so a shot that jumped clean over a thin target still connects.
pub fn swept_hit(projectile: &Projectile, target: &Aabb) -> bool {
    if Projectile::bounds_at(projectile.pos).overlaps(target)
        || Projectile::bounds_at(projectile.prev_pos).overlaps(target)
    {
        return true;
    }
    (1..SWEEP_SAMPLES).any(|k| {
        let t = k as f32 / SWEEP_SAMPLES as f32;
        let sample = projectile.prev_pos.lerp(projectile.pos, t);
        Projectile::bounds_at(sample).overlaps(target)
    })
}

/// True if the player's box touches an active opponent or an opponent shot
pub fn player_struck(player: &Player, opponents: &[Opponent], projectiles: &[Projectile]) -> bool {
    let body = player.bounds();
    opponents
        .iter()
        .filter(|o| o.active)
        .any(|o| o.bounds().overlaps(&body))
        || projectiles
            .iter()
            .filter(|p| p.active && p.owner == Owner::Opponent)
            .any(|p| p.bounds().overlaps(&body))
}

/// Resolve player shots against opponents.
///
/// The first opponent a shot touches consumes it. Killed opponents and spent
/// shots are deactivated; the killed indices are returned in hit order.
pub fn resolve_player_shots(projectiles: &mut [Projectile], opponents: &mut [Opponent]) -> Vec<usize> {
    let mut killed = Vec::new();
    for shot in projectiles
        .iter_mut()
        .filter(|p| p.active && p.owner == Owner::Player)
    {
        let hit = opponents
            .iter()
            .position(|o| o.active && swept_hit(shot, &o.bounds()));
        if let Some(index) = hit {
            shot.active = false;
            opponents[index].active = false;
            killed.push(index);
        }
    }
    killed
}

/// Full combat pass for an active round
pub fn resolve_combat(
    player: &Player,
    projectiles: &mut [Projectile],
    opponents: &mut [Opponent],
) -> CombatResult {
    if player_struck(player, opponents, projectiles) {
        return CombatResult {
            player_defeated: true,
            killed: Vec::new(),
        };
    }
    CombatResult {
        player_defeated: false,
        killed: resolve_player_shots(projectiles, opponents),
    }
}
