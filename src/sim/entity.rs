//! Table entities
//!
//! Every object on the table is an `Entity`: a unique id plus one of a fixed
//! set of kinds. The driver creates entities once at match setup; the engine
//! only mutates them.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Unique entity identifier, assigned in increasing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out monotonically increasing ids
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }
}

/// Ball classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BallType {
    /// Unassigned
    #[default]
    Neutral,
    Stripes,
    Solids,
    Eight,
    Cue,
}

impl BallType {
    /// Stripes <-> Solids; other types map to themselves
    pub fn complement(self) -> Self {
        match self {
            BallType::Stripes => BallType::Solids,
            BallType::Solids => BallType::Stripes,
            other => other,
        }
    }

    /// True for the two assignable object-ball groups
    pub fn is_group(self) -> bool {
        matches!(self, BallType::Stripes | BallType::Solids)
    }
}

/// Shooter sub-state during the `Turn` phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShooterState {
    /// Not accepting input (shot in progress)
    #[default]
    Off,
    /// Placing the cue ball (ball in hand)
    Move,
    /// Aiming and setting power
    Aim,
}

/// A pool ball
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Current radius (shrinks with `scale` while sinking)
    pub radius: f32,
    /// Radius at scale 1.0
    pub base_radius: f32,
    /// 1.0 on the table, falls to 0.0 while sinking
    pub scale: f32,
    pub mass: f32,
    pub ball_type: BallType,
    /// Pocket this ball is currently sinking into
    pub sinking_pocket: Option<EntityId>,
    /// Set once the sink animation completes; the driver then moves the ball
    pub fully_sunk: bool,
}

impl Ball {
    pub fn new(pos: Vec2, radius: f32, mass: f32, ball_type: BallType) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            radius,
            base_radius: radius,
            scale: 1.0,
            mass,
            ball_type,
            sinking_pocket: None,
            fully_sunk: false,
        }
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    #[inline]
    pub fn is_sinking(&self) -> bool {
        self.sinking_pocket.is_some()
    }

    /// Still rolling on the table (not sinking, not sunk)
    #[inline]
    pub fn on_table(&self) -> bool {
        !self.fully_sunk && self.sinking_pocket.is_none()
    }

    /// Put a pocketed ball back in play at full size, at rest
    pub fn restore(&mut self, pos: Vec2) {
        self.pos = pos;
        self.vel = Vec2::ZERO;
        self.scale = 1.0;
        self.radius = self.base_radius;
        self.sinking_pocket = None;
        self.fully_sunk = false;
    }
}

/// The cue stick / aiming controller
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shooter {
    /// Aim origin (tracks the cue ball)
    pub pos: Vec2,
    /// Radians in [0, 2π)
    pub angle: f32,
    pub power: f32,
    pub power_max: f32,
    pub cue_ball: EntityId,
    pub state: ShooterState,
    /// Type of the first ball the cue ball touched this shot
    pub first_hit: Option<BallType>,
}

impl Shooter {
    pub fn new(pos: Vec2, cue_ball: EntityId, power_max: f32) -> Self {
        Self {
            pos,
            angle: 0.0,
            power: 0.0,
            power_max,
            cue_ball,
            state: ShooterState::Move,
            first_hit: None,
        }
    }
}

/// A pocket's capture area
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pocket {
    pub pos: Vec2,
    pub radius: f32,
    /// True while a ball is sinking into this pocket
    pub is_full: bool,
}

impl Pocket {
    pub fn new(pos: Vec2, radius: f32) -> Self {
        Self {
            pos,
            radius,
            is_full: false,
        }
    }
}

/// Playable rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
}

impl Table {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self { pos, size }
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        self.pos
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.pos + self.size
    }
}

/// Entity payload, one variant per kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    Ball(Ball),
    Shooter(Shooter),
    Pocket(Pocket),
    Table(Table),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
}

impl Entity {
    pub fn new(id: EntityId, kind: EntityKind) -> Self {
        Self { id, kind }
    }

    pub fn as_ball(&self) -> Option<&Ball> {
        match &self.kind {
            EntityKind::Ball(ball) => Some(ball),
            _ => None,
        }
    }

    pub fn as_ball_mut(&mut self) -> Option<&mut Ball> {
        match &mut self.kind {
            EntityKind::Ball(ball) => Some(ball),
            _ => None,
        }
    }

    pub fn as_shooter(&self) -> Option<&Shooter> {
        match &self.kind {
            EntityKind::Shooter(shooter) => Some(shooter),
            _ => None,
        }
    }

    pub fn as_shooter_mut(&mut self) -> Option<&mut Shooter> {
        match &mut self.kind {
            EntityKind::Shooter(shooter) => Some(shooter),
            _ => None,
        }
    }

    pub fn as_pocket(&self) -> Option<&Pocket> {
        match &self.kind {
            EntityKind::Pocket(pocket) => Some(pocket),
            _ => None,
        }
    }

    pub fn as_pocket_mut(&mut self) -> Option<&mut Pocket> {
        match &mut self.kind {
            EntityKind::Pocket(pocket) => Some(pocket),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match &self.kind {
            EntityKind::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Ball type, if this is a ball
    pub fn ball_type(&self) -> Option<BallType> {
        self.as_ball().map(|b| b.ball_type)
    }
}

/// Index of the entity with the given id
pub fn index_of(entities: &[Entity], id: EntityId) -> Option<usize> {
    entities.iter().position(|e| e.id == id)
}

/// Index of the first shooter
pub fn find_shooter(entities: &[Entity]) -> Option<usize> {
    entities.iter().position(|e| e.as_shooter().is_some())
}

/// First table in the collection
pub fn find_table(entities: &[Entity]) -> Option<Table> {
    entities.iter().find_map(|e| e.as_table().copied())
}
