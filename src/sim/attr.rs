//! Generic attribute access
//!
//! Entities are plain typed structs; this keyed view exists for
//! serialization boundaries (network sync, scripting, debug tools) that want
//! to read or write fields by name. Lookups never fail: a key that does not
//! apply to an entity's kind yields the caller's default, and a mismatched
//! write is ignored.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{BallType, Entity, EntityId, EntityKind, ShooterState};

use AttrValue as V;

/// Attribute keys across all entity kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attr {
    // shared
    Position,
    // ball
    Velocity,
    Radius,
    Scale,
    Mass,
    BallType,
    SinkingPocket,
    Sunk,
    // shooter
    Angle,
    Power,
    PowerMax,
    CueBall,
    ShooterState,
    FirstHit,
    // pocket
    CaptureRadius,
    IsFull,
    // table
    Size,
}

/// A dynamically typed attribute value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    Float(f32),
    Vec(Vec2),
    Bool(bool),
    BallType(BallType),
    ShooterState(ShooterState),
    Id(Option<EntityId>),
}

impl Entity {
    /// Read an attribute, or `None` if the key does not apply to this kind
    pub fn attr(&self, key: Attr) -> Option<AttrValue> {
        match (&self.kind, key) {
            (EntityKind::Ball(b), Attr::Position) => Some(V::Vec(b.pos)),
            (EntityKind::Ball(b), Attr::Velocity) => Some(V::Vec(b.vel)),
            (EntityKind::Ball(b), Attr::Radius) => Some(V::Float(b.radius)),
            (EntityKind::Ball(b), Attr::Scale) => Some(V::Float(b.scale)),
            (EntityKind::Ball(b), Attr::Mass) => Some(V::Float(b.mass)),
            (EntityKind::Ball(b), Attr::BallType) => Some(V::BallType(b.ball_type)),
            (EntityKind::Ball(b), Attr::SinkingPocket) => Some(V::Id(b.sinking_pocket)),
            (EntityKind::Ball(b), Attr::Sunk) => Some(V::Bool(b.fully_sunk)),

            (EntityKind::Shooter(s), Attr::Position) => Some(V::Vec(s.pos)),
            (EntityKind::Shooter(s), Attr::Angle) => Some(V::Float(s.angle)),
            (EntityKind::Shooter(s), Attr::Power) => Some(V::Float(s.power)),
            (EntityKind::Shooter(s), Attr::PowerMax) => Some(V::Float(s.power_max)),
            (EntityKind::Shooter(s), Attr::CueBall) => Some(V::Id(Some(s.cue_ball))),
            (EntityKind::Shooter(s), Attr::ShooterState) => Some(V::ShooterState(s.state)),
            (EntityKind::Shooter(s), Attr::FirstHit) => {
                Some(V::BallType(s.first_hit.unwrap_or_default()))
            }

            (EntityKind::Pocket(p), Attr::Position) => Some(V::Vec(p.pos)),
            (EntityKind::Pocket(p), Attr::CaptureRadius) => Some(V::Float(p.radius)),
            (EntityKind::Pocket(p), Attr::IsFull) => Some(V::Bool(p.is_full)),

            (EntityKind::Table(t), Attr::Position) => Some(V::Vec(t.pos)),
            (EntityKind::Table(t), Attr::Size) => Some(V::Vec(t.size)),

            _ => None,
        }
    }

    pub fn get_f32(&self, key: Attr, default: f32) -> f32 {
        match self.attr(key) {
            Some(AttrValue::Float(v)) => v,
            _ => default,
        }
    }

    pub fn get_vec2(&self, key: Attr, default: Vec2) -> Vec2 {
        match self.attr(key) {
            Some(AttrValue::Vec(v)) => v,
            _ => default,
        }
    }

    pub fn get_bool(&self, key: Attr, default: bool) -> bool {
        match self.attr(key) {
            Some(AttrValue::Bool(v)) => v,
            _ => default,
        }
    }

    pub fn get_ball_type(&self, key: Attr, default: BallType) -> BallType {
        match self.attr(key) {
            Some(AttrValue::BallType(v)) => v,
            _ => default,
        }
    }

    /// Write an attribute. Returns false (and changes nothing) when the key
    /// does not apply to this kind or the value has the wrong type.
    pub fn set_attr(&mut self, key: Attr, value: AttrValue) -> bool {
        match (&mut self.kind, key, value) {
            (EntityKind::Ball(b), Attr::Position, V::Vec(v)) => b.pos = v,
            (EntityKind::Ball(b), Attr::Velocity, V::Vec(v)) => b.vel = v,
            (EntityKind::Ball(b), Attr::Radius, V::Float(v)) => b.radius = v,
            (EntityKind::Ball(b), Attr::Scale, V::Float(v)) => b.scale = v.clamp(0.0, 1.0),
            (EntityKind::Ball(b), Attr::Mass, V::Float(v)) => b.mass = v,
            (EntityKind::Ball(b), Attr::BallType, V::BallType(v)) => b.ball_type = v,
            (EntityKind::Ball(b), Attr::SinkingPocket, V::Id(v)) => b.sinking_pocket = v,
            (EntityKind::Ball(b), Attr::Sunk, V::Bool(v)) => b.fully_sunk = v,

            (EntityKind::Shooter(s), Attr::Position, V::Vec(v)) => s.pos = v,
            (EntityKind::Shooter(s), Attr::Angle, V::Float(v)) => s.angle = crate::wrap_angle(v),
            (EntityKind::Shooter(s), Attr::Power, V::Float(v)) => {
                s.power = v.max(0.0).min(s.power_max)
            }
            (EntityKind::Shooter(s), Attr::PowerMax, V::Float(v)) => s.power_max = v,
            (EntityKind::Shooter(s), Attr::CueBall, V::Id(Some(v))) => s.cue_ball = v,
            (EntityKind::Shooter(s), Attr::ShooterState, V::ShooterState(v)) => s.state = v,
            (EntityKind::Shooter(s), Attr::FirstHit, V::BallType(v)) => {
                s.first_hit = (v != BallType::Neutral).then_some(v)
            }

            (EntityKind::Pocket(p), Attr::Position, V::Vec(v)) => p.pos = v,
            (EntityKind::Pocket(p), Attr::CaptureRadius, V::Float(v)) => p.radius = v,
            (EntityKind::Pocket(p), Attr::IsFull, V::Bool(v)) => p.is_full = v,

            (EntityKind::Table(t), Attr::Position, V::Vec(v)) => t.pos = v,
            (EntityKind::Table(t), Attr::Size, V::Vec(v)) => t.size = v,

            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::{Ball, Pocket};

    fn ball() -> Entity {
        Entity::new(
            EntityId(1),
            EntityKind::Ball(Ball::new(Vec2::new(1.0, 2.0), 10.0, 1.0, BallType::Solids)),
        )
    }

    #[test]
    fn test_missing_key_returns_default() {
        let e = ball();
        assert_eq!(e.get_f32(Attr::Angle, -1.0), -1.0);
        assert!(e.get_bool(Attr::IsFull, true));
        assert_eq!(e.get_vec2(Attr::Size, Vec2::ONE), Vec2::ONE);
    }

    #[test]
    fn test_typed_get() {
        let e = ball();
        assert_eq!(e.get_vec2(Attr::Position, Vec2::ZERO), Vec2::new(1.0, 2.0));
        assert_eq!(e.get_ball_type(Attr::BallType, BallType::Neutral), BallType::Solids);
        // wrong type for the key also falls back
        assert_eq!(e.get_f32(Attr::Position, 9.0), 9.0);
    }

    #[test]
    fn test_set_rejects_mismatch() {
        let mut e = ball();
        assert!(!e.set_attr(Attr::Radius, AttrValue::Bool(true)));
        assert!(!e.set_attr(Attr::IsFull, AttrValue::Bool(true)));
        assert!(e.set_attr(Attr::Sunk, AttrValue::Bool(true)));
        assert!(e.get_bool(Attr::Sunk, false));
    }

    #[test]
    fn test_pocket_attrs() {
        let mut e = Entity::new(EntityId(2), EntityKind::Pocket(Pocket::new(Vec2::ZERO, 18.0)));
        assert_eq!(e.get_f32(Attr::CaptureRadius, 0.0), 18.0);
        assert!(e.set_attr(Attr::IsFull, AttrValue::Bool(true)));
        assert!(e.as_pocket().is_some_and(|p| p.is_full));
    }
}
