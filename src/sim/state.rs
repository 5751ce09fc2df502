//! World state and round lifecycle
//!
//! Everything the simulation mutates lives in one `World`, passed by `&mut`
//! to `tick`. Nothing here touches a clock or a terminal.

use serde::{Deserialize, Serialize};

use super::actor::{KeyState, Opponent, Player};
use super::debris::{Debris, SourceId};
use super::geometry::{Arena, Platform, generate_platforms};
use super::projectile::Projectile;
use super::rng::SimRng;
use super::stain::StainRegistry;
use crate::tuning::Tuning;

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen with the attract-mode skirmish running behind it
    Menu,
    /// Active round
    Playing,
    /// Round frozen
    Paused,
    /// Player defeated, waiting for an advance to return to the menu
    GameOver,
}

/// How blood and colored debris are tinted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BloodColorMode {
    #[default]
    Red,
    Green,
    Rainbow,
    Off,
}

impl BloodColorMode {
    /// Next mode in the toggle cycle
    pub fn next(self) -> Self {
        match self {
            Self::Red => Self::Green,
            Self::Green => Self::Rainbow,
            Self::Rainbow => Self::Off,
            Self::Off => Self::Red,
        }
    }
}

/// Menu backdrop timers (absolute sim times)
#[derive(Debug, Clone, Copy, Default)]
pub struct AttractTimers {
    pub next_fire: f32,
    pub next_spawn: f32,
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct World {
    pub arena: Arena,
    pub platforms: Vec<Platform>,
    pub player: Player,
    /// False once the player has been shattered this round
    pub player_alive: bool,
    pub opponents: Vec<Opponent>,
    pub projectiles: Vec<Projectile>,
    pub debris: Debris,
    pub stains: StainRegistry,
    pub rng: SimRng,
    pub tuning: Tuning,
    pub score: u64,
    pub kills: u32,
    pub phase: GamePhase,
    pub blood_mode: BloodColorMode,
    /// Simulation clock (seconds)
    pub time: f32,
    pub keys: KeyState,
    /// Random opponent spawning while playing; tests switch it off
    pub spawning: bool,
    pub attract: AttractTimers,
    /// Opponents spawned this round (every other one is ranged)
    pub spawn_counter: u32,
    next_source: u32,
}

impl World {
    /// Create a world sitting in the menu
    pub fn new(seed: u64, arena: Arena, tuning: Tuning) -> Self {
        let mut rng = SimRng::new(seed);
        let platforms = generate_platforms(&mut rng, &arena);
        Self {
            arena,
            platforms,
            player: Player::new(&arena, 0.0),
            player_alive: true,
            opponents: Vec::new(),
            projectiles: Vec::new(),
            debris: Debris::new(),
            stains: StainRegistry::new(),
            rng,
            tuning,
            score: 0,
            kills: 0,
            phase: GamePhase::Menu,
            blood_mode: BloodColorMode::default(),
            time: 0.0,
            keys: KeyState::default(),
            spawning: true,
            attract: AttractTimers::default(),
            spawn_counter: 0,
            next_source: 1,
        }
    }

    /// Allocate the id for a newly defeated opponent
    pub fn next_source_id(&mut self) -> SourceId {
        let id = SourceId(self.next_source);
        self.next_source += 1;
        id
    }

    /// Clear the round: debris, stains, actors, score. Platforms are regenerated.
    pub fn reset(&mut self) {
        self.platforms = generate_platforms(&mut self.rng, &self.arena);
        self.player = Player::new(&self.arena, self.time);
        self.player_alive = true;
        self.opponents.clear();
        self.projectiles.clear();
        self.debris.clear();
        self.stains.clear();
        self.score = 0;
        self.kills = 0;
        self.keys.clear();
        self.spawn_counter = 0;
        self.next_source = 1;
        self.attract = AttractTimers {
            next_fire: self.time,
            next_spawn: self.time,
        };
    }

    /// Leave the menu and begin a fresh round
    pub fn start_round(&mut self) {
        self.reset();
        self.phase = GamePhase::Playing;
        log::info!(
            "round started: {}x{} arena, {} platforms",
            self.arena.width,
            self.arena.height,
            self.platforms.len()
        );
    }

    /// Return to the menu after a finished round
    pub fn return_to_menu(&mut self) {
        log::info!("back to menu after score {} ({} kills)", self.score, self.kills);
        self.reset();
        self.phase = GamePhase::Menu;
    }

    /// Adopt a new viewport size
    pub fn resize(&mut self, width: u16, height: u16) {
        self.arena = Arena::new(width, height);
        self.player.refit(&self.arena);
        log::info!("resized to {}x{}", width, height);
    }

    pub fn is_round_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }
}
