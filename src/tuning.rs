//! Data-driven game balance
//!
//! Every knob defaults to the hand-tuned value; a JSON file may override any
//! subset of them (missing keys keep their defaults).

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to load a tuning override file
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to read tuning file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse tuning file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("tuning value `{name}` = {value} is outside {range}")]
    OutOfRange {
        name: &'static str,
        value: f32,
        range: &'static str,
    },
}

/// Gameplay balance values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Physics ===
    /// Downward acceleration shared by every body (units/s²)
    pub gravity: f32,

    // === Player ===
    pub player_ground_speed: f32,
    /// Air control is reduced, never removed
    pub player_air_speed: f32,
    /// Upward launch speed of a jump (applied as negative vy)
    pub jump_speed: f32,
    /// Minimum time between two player shots (seconds)
    pub player_fire_cooldown: f32,
    pub player_shot_speed: f32,

    // === Opponents ===
    pub opponent_speed: f32,
    pub opponent_shot_speed: f32,
    pub opponent_fire_delay_min: f32,
    pub opponent_fire_delay_max: f32,
    pub opponent_jump_cooldown: f32,

    // === Spawning (per-tick chance) ===
    pub spawn_chance_base: f32,
    pub spawn_chance_step: f32,
    pub spawn_kills_per_step: u32,
    pub spawn_chance_cap: f32,

    // === Debris ===
    pub decapitation_chance: f32,
    pub colored_chance: f32,
    pub fall_through_chance: f32,
    pub roll_chance: f32,
    /// Seconds a settled opponent fragment lingers before vanishing
    pub fragment_dwell: f32,
    pub corpse_lifetime_min: f32,
    pub corpse_lifetime_max: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            gravity: 300.0,

            player_ground_speed: 50.0,
            player_air_speed: 45.0,
            jump_speed: 85.0,
            player_fire_cooldown: 0.2,
            player_shot_speed: 200.0,

            opponent_speed: 20.0,
            // Slower than the player's shots so they can be dodged
            opponent_shot_speed: 80.0,
            opponent_fire_delay_min: 1.0,
            opponent_fire_delay_max: 3.0,
            opponent_jump_cooldown: 1.0,

            spawn_chance_base: 0.008,
            spawn_chance_step: 0.005,
            spawn_kills_per_step: 5,
            spawn_chance_cap: 0.05,

            decapitation_chance: 0.1,
            colored_chance: 0.2,
            fall_through_chance: 0.3,
            roll_chance: 0.05,
            fragment_dwell: 3.0,
            corpse_lifetime_min: 2.0,
            corpse_lifetime_max: 4.0,
        }
    }
}

impl Tuning {
    /// Parse overrides from a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load overrides from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let tuning = Self::from_json_str(&json)?;
        log::info!("Loaded tuning from {}", path.as_ref().display());
        Ok(tuning)
    }

    /// Reject values that would break the simulation's assumptions
    pub fn validate(&self) -> Result<(), TuningError> {
        let probabilities = [
            ("decapitation_chance", self.decapitation_chance),
            ("colored_chance", self.colored_chance),
            ("fall_through_chance", self.fall_through_chance),
            ("roll_chance", self.roll_chance),
            ("spawn_chance_base", self.spawn_chance_base),
            ("spawn_chance_cap", self.spawn_chance_cap),
        ];
        for (name, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(TuningError::OutOfRange {
                    name,
                    value,
                    range: "[0, 1]",
                });
            }
        }

        let positives = [
            ("gravity", self.gravity),
            ("player_shot_speed", self.player_shot_speed),
            ("opponent_shot_speed", self.opponent_shot_speed),
            ("fragment_dwell", self.fragment_dwell),
        ];
        for (name, value) in positives {
            if value.is_nan() || value <= 0.0 {
                return Err(TuningError::OutOfRange {
                    name,
                    value,
                    range: "(0, inf)",
                });
            }
        }

        if self.opponent_fire_delay_min > self.opponent_fire_delay_max {
            return Err(TuningError::OutOfRange {
                name: "opponent_fire_delay_min",
                value: self.opponent_fire_delay_min,
                range: "[0, opponent_fire_delay_max]",
            });
        }
        if self.corpse_lifetime_min > self.corpse_lifetime_max {
            return Err(TuningError::OutOfRange {
                name: "corpse_lifetime_min",
                value: self.corpse_lifetime_min,
                range: "[0, corpse_lifetime_max]",
            });
        }
        Ok(())
    }

    /// Per-tick opponent spawn chance, growing with the kill count
    pub fn spawn_chance(&self, kills: u32) -> f32 {
        let steps = kills / self.spawn_kills_per_step.max(1);
        (self.spawn_chance_base + steps as f32 * self.spawn_chance_step).min(self.spawn_chance_cap)
    }
}
