//! Fixed timestep simulation tick
//!
//! Advances the world deterministically: the same seed and the same event
//! stream always produce the same state.

use super::actor::{Opponent, Steering};
use super::collision::{resolve_combat, resolve_player_shots};
use super::debris::{BodyKind, SourceId, Surroundings, standing_on_platform};
use super::kinematics::Facing;
use super::projectile::update_projectiles;
use super::state::{GamePhase, World};
use crate::clamp_dt;
use crate::consts::KILL_SCORE;
use crate::input::InputEvent;

/// Attract-mode player fire cadence (seconds)
const ATTRACT_FIRE_INTERVAL: f32 = 0.8;
/// Attract-mode opponent spawn delay range (seconds)
const ATTRACT_SPAWN_MIN: f32 = 1.5;
const ATTRACT_SPAWN_MAX: f32 = 3.0;

/// Input events drained for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub events: Vec<InputEvent>,
}

impl TickInput {
    pub fn new(events: Vec<InputEvent>) -> Self {
        Self { events }
    }
}

/// Advance the world by one timestep
pub fn tick(world: &mut World, input: &TickInput, dt: f32) {
    let dt = clamp_dt(dt);

    for &event in &input.events {
        handle_event(world, event);
    }

    match world.phase {
        GamePhase::Paused => return,
        GamePhase::Menu => {
            world.time += dt;
            attract(world, dt);
        }
        GamePhase::Playing => {
            world.time += dt;
            play(world, dt);
        }
        GamePhase::GameOver => {
            world.time += dt;
            wind_down(world, dt);
        }
    }

    update_debris(world, dt);
}

fn handle_event(world: &mut World, event: InputEvent) {
    match event {
        InputEvent::Key(key) => world.keys.press(key, world.time),
        InputEvent::Fire => {
            if world.phase == GamePhase::Playing && world.player_alive {
                if let Some(shot) = world.player.try_fire(&world.tuning, world.time) {
                    world.projectiles.push(shot);
                }
            }
        }
        InputEvent::ToggleBloodColor => {
            world.blood_mode = world.blood_mode.next();
            log::debug!("blood colour: {:?}", world.blood_mode);
        }
        InputEvent::Advance => match world.phase {
            GamePhase::Menu => world.start_round(),
            GamePhase::Playing => {
                world.phase = GamePhase::Paused;
                log::info!("paused");
            }
            GamePhase::Paused => {
                world.phase = GamePhase::Playing;
                log::info!("resumed");
            }
            GamePhase::GameOver => world.return_to_menu(),
        },
        InputEvent::Resize { width, height } => world.resize(width, height),
    }
}

/// Active round: player, combat, shots, opponents, spawning
fn play(world: &mut World, dt: f32) {
    let now = world.time;

    let intent = world.keys.intent(now);
    world
        .player
        .update(intent, &world.platforms, &world.arena, &world.tuning, now, dt);

    let result = resolve_combat(&world.player, &mut world.projectiles, &mut world.opponents);
    if result.player_defeated {
        defeat_player(world);
        return;
    }
    for index in result.killed {
        kill_opponent(world, index, true);
    }

    update_projectiles(&mut world.projectiles, &world.tuning, &world.arena, dt);

    let steering = Steering::Engage {
        target: world.player.pos,
    };
    for opponent in world.opponents.iter_mut().filter(|o| o.active) {
        let shot = opponent.update(
            steering,
            &world.platforms,
            &world.arena,
            &world.tuning,
            &mut world.rng,
            now,
            dt,
        );
        if let Some(shot) = shot {
            world.projectiles.push(shot);
        }
    }
    world.opponents.retain(|o| o.active);

    if world.spawning && world.rng.chance(world.tuning.spawn_chance(world.kills)) {
        spawn_opponent(world);
    }
}

/// Round over: opponents walk off, opponent debris is swept away
fn wind_down(world: &mut World, dt: f32) {
    let now = world.time;
    world.projectiles.clear();
    world.debris.purge_opponents();

    for opponent in world.opponents.iter_mut().filter(|o| o.active) {
        opponent.update(
            Steering::Retreat,
            &world.platforms,
            &world.arena,
            &world.tuning,
            &mut world.rng,
            now,
            dt,
        );
    }
    world.opponents.retain(|o| o.active);
}

/// Menu backdrop: an idle player plinks at opponents parading in
fn attract(world: &mut World, dt: f32) {
    let now = world.time;

    if now >= world.attract.next_fire {
        world.player.facing = if world.rng.chance(0.5) {
            Facing::Left
        } else {
            Facing::Right
        };
        if let Some(shot) = world.player.try_fire(&world.tuning, now) {
            world.projectiles.push(shot);
        }
        world.attract.next_fire = now + ATTRACT_FIRE_INTERVAL;
    }

    if now >= world.attract.next_spawn {
        let facing = if world.rng.chance(0.5) {
            Facing::Right
        } else {
            Facing::Left
        };
        world
            .opponents
            .push(Opponent::spawn(facing, false, &world.arena));
        world.attract.next_spawn = now + world.rng.range(ATTRACT_SPAWN_MIN, ATTRACT_SPAWN_MAX);
    }

    for opponent in world.opponents.iter_mut().filter(|o| o.active) {
        opponent.parade(&world.arena, world.tuning.opponent_speed, dt);
    }

    update_projectiles(&mut world.projectiles, &world.tuning, &world.arena, dt);

    for index in resolve_player_shots(&mut world.projectiles, &mut world.opponents) {
        kill_opponent(world, index, false);
    }
    world.projectiles.retain(|p| p.active);
    world.opponents.retain(|o| o.active);
}

fn spawn_opponent(world: &mut World) {
    let ranged = world.spawn_counter % 2 == 1;
    world.spawn_counter += 1;
    let facing = if world.rng.chance(0.5) {
        Facing::Right
    } else {
        Facing::Left
    };
    let opponent = Opponent::spawn(facing, ranged, &world.arena);
    log::trace!(
        "spawned {} opponent at x={:.0}",
        if ranged { "ranged" } else { "melee" },
        opponent.pos.x
    );
    world.opponents.push(opponent);
}

/// Shatter or decapitate an opponent. Only round kills score.
fn kill_opponent(world: &mut World, index: usize, in_round: bool) {
    let Some(opponent) = world.opponents.get(index).cloned() else {
        return;
    };
    world.opponents[index].active = false;

    let source = world.next_source_id();
    let from_platform = standing_on_platform(&world.platforms, opponent.pos);
    let now = world.time;

    if world.rng.chance(world.tuning.decapitation_chance) {
        world.debris.decapitate(
            &mut world.rng,
            &world.tuning,
            opponent.pos,
            opponent.vel,
            opponent.facing,
            source,
            from_platform,
            now,
        );
    } else {
        world.debris.spawn_burst(
            &mut world.rng,
            &world.tuning,
            BodyKind::Opponent,
            opponent.pos,
            opponent.facing,
            source,
            from_platform,
            now,
        );
    }

    if in_round {
        world.score += KILL_SCORE;
        world.kills += 1;
        log::debug!("kill #{} (source {}), score {}", world.kills, source.0, world.score);
    }
}

fn defeat_player(world: &mut World) {
    let player = &world.player;
    let from_platform = standing_on_platform(&world.platforms, player.pos);
    let (pos, facing) = (player.pos, player.facing);
    world.debris.spawn_burst(
        &mut world.rng,
        &world.tuning,
        BodyKind::Player,
        pos,
        facing,
        SourceId::PLAYER,
        from_platform,
        world.time,
    );
    world.player_alive = false;
    world.phase = GamePhase::GameOver;
    log::info!("game over: score {} with {} kills", world.score, world.kills);
}

/// Debris, blood and the stain sweep run in every phase except pause
fn update_debris(world: &mut World, dt: f32) {
    let env = Surroundings {
        platforms: &world.platforms,
        arena: &world.arena,
        tuning: &world.tuning,
        now: world.time,
        dt,
    };
    world.debris.update(&mut world.stains, &mut world.rng, &env);
    let live = world.debris.live_sources();
    world.stains.sweep(&live);
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::consts::{ACTOR_HEIGHT, TICK_DT};
    use crate::sim::projectile::{Owner, Projectile};
    use crate::input::MoveKey;
    use crate::sim::geometry::Arena;
    use crate::tuning::Tuning;

    fn playing_world(seed: u64) -> World {
        let mut world = World::new(seed, Arena::new(120, 30), Tuning::default());
        world.start_round();
        world.spawning = false;
        world.platforms.clear();
        world
    }

    fn events(list: &[InputEvent]) -> TickInput {
        TickInput::new(list.to_vec())
    }

    #[test]
    fn test_advance_cycles_phases() {
        let mut world = World::new(3, Arena::new(120, 30), Tuning::default());
        tick(&mut world, &events(&[InputEvent::Advance]), TICK_DT);
        assert_eq!(world.phase, GamePhase::Playing);
        tick(&mut world, &events(&[InputEvent::Advance]), TICK_DT);
        assert_eq!(world.phase, GamePhase::Paused);

        let frozen = world.time;
        tick(&mut world, &TickInput::default(), TICK_DT);
        assert_eq!(world.time, frozen);

        tick(&mut world, &events(&[InputEvent::Advance]), TICK_DT);
        assert_eq!(world.phase, GamePhase::Playing);
    }

    #[test]
    fn test_fire_only_while_playing() {
        let mut world = World::new(3, Arena::new(120, 30), Tuning::default());
        world.spawning = false;
        tick(&mut world, &events(&[InputEvent::Fire]), TICK_DT);
        // Attract mode fires on its own; the Fire event itself is ignored in the menu
        let attract_shots = world.projectiles.len();
        assert!(attract_shots <= 1);

        let mut world = playing_world(3);
        tick(&mut world, &events(&[InputEvent::Fire]), TICK_DT);
        assert_eq!(world.projectiles.len(), 1);
        assert_eq!(world.projectiles[0].owner, Owner::Player);
    }

    #[test]
    fn test_held_key_moves_player() {
        let mut world = playing_world(4);
        let x0 = world.player.pos.x;
        tick(&mut world, &events(&[InputEvent::Key(MoveKey::Right)]), TICK_DT);
        assert!(world.player.pos.x > x0);

        // Without a repeat the key lapses after the hold timeout
        for _ in 0..6 {
            tick(&mut world, &TickInput::default(), TICK_DT);
        }
        let x1 = world.player.pos.x;
        tick(&mut world, &TickInput::default(), TICK_DT);
        assert_eq!(world.player.pos.x, x1);
    }

    #[test]
    fn test_contact_ends_round_and_flushes() {
        let mut world = playing_world(5);
        let pos = world.player.pos;
        world.opponents.push(Opponent::at(pos + Vec2::new(1.0, 0.0), Facing::Left, false));
        world
            .projectiles
            .push(Projectile::new(Vec2::new(5.0, 5.0), Facing::Right, Owner::Player));

        tick(&mut world, &TickInput::default(), TICK_DT);
        assert_eq!(world.phase, GamePhase::GameOver);
        assert!(!world.player_alive);
        assert!(world.debris.fragments.iter().all(|f| f.source == SourceId::PLAYER));
        assert_eq!(world.debris.fragments.len(), 7);

        tick(&mut world, &TickInput::default(), TICK_DT);
        assert!(world.projectiles.is_empty());

        // Opponents walk off and the round waits for an advance
        for _ in 0..400 {
            tick(&mut world, &TickInput::default(), TICK_DT);
        }
        assert!(world.opponents.is_empty());
        assert_eq!(world.phase, GamePhase::GameOver);
        assert!(world.debris.fragments.iter().all(|f| f.source.is_player()));

        tick(&mut world, &events(&[InputEvent::Advance]), TICK_DT);
        assert_eq!(world.phase, GamePhase::Menu);
        assert_eq!(world.score, 0);
    }

    #[test]
    fn test_spawns_alternate_melee_and_ranged() {
        let mut world = playing_world(6);
        for _ in 0..4 {
            spawn_opponent(&mut world);
        }
        let ranged: Vec<bool> = world.opponents.iter().map(|o| o.ranged).collect();
        assert_eq!(ranged, vec![false, true, false, true]);
        for o in &world.opponents {
            assert_eq!(o.pos.y, world.arena.ground_y() - ACTOR_HEIGHT);
            match o.facing {
                Facing::Right => assert_eq!(o.pos.x, -4.0),
                Facing::Left => assert_eq!(o.pos.x, 120.0),
            }
        }
    }

    #[test]
    fn test_same_seed_same_run() {
        let script = |i: u32| -> TickInput {
            match i % 20 {
                0 => events(&[InputEvent::Fire, InputEvent::Key(MoveKey::Left)]),
                7 => events(&[InputEvent::Key(MoveKey::Up)]),
                13 => events(&[InputEvent::Key(MoveKey::Right), InputEvent::Fire]),
                _ => TickInput::default(),
            }
        };
        let run = |seed: u64| {
            let mut world = World::new(seed, Arena::new(120, 30), Tuning::default());
            tick(&mut world, &events(&[InputEvent::Advance]), TICK_DT);
            for i in 0..600 {
                tick(&mut world, &script(i), TICK_DT);
            }
            (
                world.score,
                world.kills,
                world.phase,
                world.player.pos,
                world.opponents.len(),
                world.debris.fragments.len(),
                world.debris.blood.len(),
                world.stains.len(),
            )
        };
        assert_eq!(run(77), run(77));
    }

    #[test]
    fn test_attract_mode_kills_without_score() {
        let tuning = Tuning {
            decapitation_chance: 0.0,
            ..Tuning::default()
        };
        let mut world = World::new(8, Arena::new(120, 30), tuning);
        let y = world.arena.ground_y() - ACTOR_HEIGHT;
        let shot_y = world.player.pos.y + 1.0;
        // An opponent right in front of a shot already in flight
        world.attract.next_fire = 100.0;
        world.attract.next_spawn = 100.0;
        world.opponents.push(Opponent::at(Vec2::new(20.0, y), Facing::Right, false));
        world
            .projectiles
            .push(Projectile::new(Vec2::new(30.0, shot_y), Facing::Left, Owner::Player));

        for _ in 0..5 {
            tick(&mut world, &TickInput::default(), TICK_DT);
        }
        assert!(world.opponents.is_empty());
        assert_eq!(world.score, 0);
        assert_eq!(world.kills, 0);
        assert!(world.debris.corpses.is_empty());
        assert!(world.debris.fragments.iter().any(|f| f.source == SourceId(1)));
    }

    #[test]
    fn test_stains_swept_when_debris_gone() {
        let mut world = playing_world(9);
        world.stains.mark_ground(3.0, SourceId(42), false, &world.arena, &world.platforms);
        tick(&mut world, &TickInput::default(), TICK_DT);
        assert!(world.stains.ground_stain(3).is_none());
    }
}
