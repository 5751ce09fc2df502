//! GNinja - simulation core for a side-view combat arena
//!
//! Core modules:
//! - `sim`: Deterministic simulation (actors, projectiles, debris, stains)
//! - `input`: Bounded producer/consumer handoff of raw input events
//! - `tuning`: Data-driven game balance

pub mod input;
pub mod sim;
pub mod tuning;

pub use input::{InputEvent, InputQueue, InputSender, MoveKey};
pub use tuning::{Tuning, TuningError};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (30 Hz, one terminal frame)
    pub const TICK_DT: f32 = 1.0 / 30.0;
    /// Largest delta a single tick may consume (after a stall)
    pub const MAX_DT: f32 = 0.1;

    /// Actor bounding box (player and opponents share the sprite size)
    pub const ACTOR_WIDTH: f32 = 4.0;
    pub const ACTOR_HEIGHT: f32 = 3.0;

    /// How long a key-down keeps its intent alive (models "key held")
    pub const KEY_HOLD_TIMEOUT: f32 = 0.15;
    /// Grace period after losing support during which a jump is honored
    pub const JUMP_LENIENCY: f32 = 0.1;

    /// Platforms are always one cell tall
    pub const PLATFORM_HEIGHT: f32 = 1.0;
    /// Projectiles, fragments and blood all occupy a single cell
    pub const CELL_SIZE: f32 = 1.0;

    /// Interpolated samples between previous and current projectile position
    pub const SWEEP_SAMPLES: u32 = 5;
    /// Score awarded per opponent kill
    pub const KILL_SCORE: u64 = 10;

    /// Horizontal slack before debris is culled off the sides
    pub const OFFSCREEN_MARGIN: f32 = 10.0;

    /// Fragment bounce handling
    pub const MAX_BOUNCES: u8 = 2;
    pub const BOUNCE_DAMPING: f32 = 0.4;
    pub const BOUNCE_FRICTION: f32 = 0.8;
    /// Landing speed at or below which a fragment settles instead of bouncing
    pub const BOUNCE_MIN_SPEED: f32 = 20.0;

    /// Rolling heads lose this fraction of speed per tick
    pub const ROLL_FRICTION: f32 = 0.95;
    pub const ROLL_STOP_SPEED: f32 = 0.5;

    /// Settled opponent fragments blink during the last part of their dwell
    pub const FLASH_WINDOW: f32 = 0.5;
    pub const FLASH_PERIOD: f32 = 0.1;

    /// Mobile corpse (decapitation branch)
    pub const CORPSE_SPEED: f32 = 25.0;
    pub const CORPSE_BLOOD_INTERVAL: f32 = 0.08;

    /// Ranged opponents hold position within [STANDOFF_MIN, STANDOFF_MIN + STANDOFF_BAND]
    pub const STANDOFF_MIN: f32 = 30.0;
    pub const STANDOFF_BAND: f32 = 10.0;

    /// Raw input events buffered between two ticks
    pub const INPUT_QUEUE_CAPACITY: usize = 10;
}

/// Clamp a measured frame delta into the range a tick may consume
#[inline]
pub fn clamp_dt(dt: f32) -> f32 {
    if dt.is_nan() {
        return 0.0;
    }
    dt.clamp(0.0, consts::MAX_DT)
}
