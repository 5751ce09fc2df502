//! GNinja headless runner
//!
//! Drives the simulation at a fixed rate with a scripted input thread feeding
//! the bounded input queue, then logs a summary and optionally dumps the final
//! snapshot as JSON. Run with `--help` for options.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use clap::Parser;

use gninja::consts::TICK_DT;
use gninja::sim::{Arena, GamePhase, TickInput, World, build_snapshot, tick};
use gninja::{InputEvent, InputQueue, InputSender, MoveKey, Tuning, clamp_dt};

/// Headless GNinja runner
#[derive(Parser, Debug)]
#[command(name = "gninja")]
#[command(about = "Run the arena simulation headless with a scripted player")]
struct Args {
    /// Seed for the simulation RNG
    #[arg(long, default_value_t = 0x5eed)]
    seed: u64,

    /// Number of fixed ticks to run
    #[arg(long, default_value_t = 300)]
    ticks: u32,

    /// Arena size in cells, as WIDTHxHEIGHT
    #[arg(long, default_value = "120x30", value_parser = parse_size)]
    size: (u16, u16),

    /// JSON file with balance overrides
    #[arg(long)]
    tuning: Option<PathBuf>,

    /// Write the final snapshot as JSON to this file
    #[arg(long)]
    dump: Option<PathBuf>,
}

/// Parse `WIDTHxHEIGHT` into a non-empty arena size
fn parse_size(value: &str) -> Result<(u16, u16), String> {
    let (w, h) = value
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {value:?}"))?;
    let width: u16 = w.parse().map_err(|e| format!("bad width {w:?}: {e}"))?;
    let height: u16 = h.parse().map_err(|e| format!("bad height {h:?}: {e}"))?;
    if width == 0 || height == 0 {
        return Err(format!("arena size must be non-zero, got {value:?}"));
    }
    Ok((width, height))
}

/// Load balance overrides, falling back to defaults on any error
fn load_tuning(path: Option<&Path>) -> Tuning {
    let Some(path) = path else {
        return Tuning::default();
    };
    match Tuning::load(path) {
        Ok(tuning) => tuning,
        Err(e) => {
            log::error!("Failed to load tuning from {}: {}", path.display(), e);
            Tuning::default()
        }
    }
}

/// Ticks spent on the menu or game-over screen before the runner advances
const AUTO_ADVANCE_TICKS: u32 = 45;

/// Scripted player: run and gun, hop now and then
fn script_step(step: u32) -> Vec<InputEvent> {
    let mut events = Vec::new();
    let key = if (step / 60) % 2 == 0 {
        MoveKey::Left
    } else {
        MoveKey::Right
    };
    if step % 3 == 0 {
        events.push(InputEvent::Key(key));
    }
    if step % 7 == 0 {
        events.push(InputEvent::Fire);
    }
    if step % 45 == 20 {
        events.push(InputEvent::Key(MoveKey::Up));
    }
    if step % 250 == 125 {
        events.push(InputEvent::ToggleBloodColor);
    }
    events
}

fn spawn_input_thread(sender: InputSender, steps: u32) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let frame = Duration::from_secs_f32(TICK_DT);
        for step in 0..steps {
            for event in script_step(step) {
                sender.send(event);
            }
            thread::sleep(frame);
        }
        log::debug!("input script finished after {} steps", steps);
    })
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    log::info!("GNinja (headless) starting with seed {}", args.seed);

    let (width, height) = args.size;
    let tuning = load_tuning(args.tuning.as_deref());
    let mut world = World::new(args.seed, Arena::new(width, height), tuning);

    let (sender, queue) = InputQueue::channel();
    let input_thread = spawn_input_thread(sender, args.ticks);

    let frame = Duration::from_secs_f32(TICK_DT);
    let mut last = Instant::now();
    let mut rounds = 0u32;
    let mut best_score = 0u64;
    let mut idle = 0u32;

    for _ in 0..args.ticks {
        let started = Instant::now();
        let dt = clamp_dt(started.duration_since(last).as_secs_f32());
        last = started;

        let mut events = queue.drain();
        match world.phase {
            GamePhase::Menu | GamePhase::GameOver => idle += 1,
            GamePhase::Playing | GamePhase::Paused => idle = 0,
        }
        if idle >= AUTO_ADVANCE_TICKS {
            events.push(InputEvent::Advance);
            idle = 0;
        }

        let input = TickInput::new(events);
        let was_playing = world.phase == GamePhase::Playing;
        tick(&mut world, &input, dt);
        if was_playing && world.phase == GamePhase::GameOver {
            rounds += 1;
            best_score = best_score.max(world.score);
        }

        if let Some(rest) = frame.checked_sub(started.elapsed()) {
            thread::sleep(rest);
        }
    }

    if input_thread.join().is_err() {
        log::warn!("input thread panicked");
    }

    best_score = best_score.max(world.score);
    log::info!(
        "finished: phase {:?}, score {}, kills {}, rounds lost {}, best score {}, {} fragments, {} stains",
        world.phase,
        world.score,
        world.kills,
        rounds,
        best_score,
        world.debris.fragments.len(),
        world.stains.len()
    );

    if let Some(path) = args.dump {
        let snapshot = build_snapshot(&world);
        match serde_json::to_string_pretty(&snapshot) {
            Ok(json) => match std::fs::write(&path, json) {
                Ok(()) => log::info!("snapshot written to {}", path.display()),
                Err(e) => log::error!("Failed to write snapshot: {}", e),
            },
            Err(e) => log::error!("Failed to serialize snapshot: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_parses_width_and_height() {
        assert_eq!(parse_size("80x24"), Ok((80, 24)));
    }

    #[test]
    fn test_malformed_size_is_rejected() {
        assert!(parse_size("80by24").is_err());
        assert!(parse_size("80x").is_err());
        assert!(parse_size("0x24").is_err());
    }

    #[test]
    fn test_malformed_seed_is_an_error() {
        let parsed = Args::try_parse_from(["gninja", "--seed", "not-a-number"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_defaults_and_overrides() {
        let args = Args::try_parse_from(["gninja"]).unwrap();
        assert_eq!(args.seed, 0x5eed);
        assert_eq!(args.ticks, 300);
        assert_eq!(args.size, (120, 30));

        let args = Args::try_parse_from(["gninja", "--seed", "7", "--size", "80x24", "--ticks", "3"]).unwrap();
        assert_eq!(args.seed, 7);
        assert_eq!(args.ticks, 3);
        assert_eq!(args.size, (80, 24));
    }
}
