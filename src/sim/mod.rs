//! Deterministic simulation module
//!
//! All table logic lives here. This module must be pure and deterministic:
//! - Time comes only from the `dt` passed to `Engine::tick`
//! - Seeded RNG only
//! - Stable iteration order (entity collection order)
//! - No rendering or platform dependencies

pub mod attr;
pub mod collision;
pub mod entity;
pub mod rules;
pub mod snapshot;
pub mod state;
pub mod tick;

pub use attr::{Attr, AttrValue};
pub use entity::{
    Ball, BallType, Entity, EntityId, EntityKind, IdAllocator, Pocket, Shooter, ShooterState,
    Table,
};
pub use rules::apply_rules;
pub use snapshot::{BallSnapshot, ShooterSnapshot, Snapshot};
pub use state::{EnginePhase, Foul, GameState, MatchResult, Player, PlayerId, ShotSummary};
pub use tick::{Engine, TickInput};
