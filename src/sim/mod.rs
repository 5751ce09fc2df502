//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Sim clock only (advanced by the clamped tick delta)
//! - Seeded RNG only
//! - Stable iteration order (insertion order of every entity list)
//! - No rendering or terminal dependencies

pub mod actor;
pub mod blood;
pub mod collision;
pub mod debris;
pub mod geometry;
pub mod kinematics;
pub mod projectile;
pub mod rng;
pub mod snapshot;
pub mod stain;
pub mod state;
pub mod tick;

pub use actor::{KeyState, MoveIntent, Opponent, Player, Steering, Support, resolve_support};
pub use blood::{BloodParticle, EmitMode, emit_blood, update_blood};
pub use collision::{CombatResult, resolve_combat, resolve_player_shots, swept_hit};
pub use debris::{
    BodyKind, Corpse, Debris, Fragment, FragmentState, RollPlan, SourceId, Surface, Surroundings, layout,
};
pub use geometry::{Aabb, Arena, Platform, generate_platforms, tile_under_platform};
pub use kinematics::Facing;
pub use projectile::{Owner, Projectile};
pub use rng::SimRng;
pub use snapshot::{EntityKind, EntityView, Snapshot, StainView, Tint, build_snapshot};
pub use stain::StainRegistry;
pub use state::{BloodColorMode, GamePhase, World};
pub use tick::{TickInput, tick};
