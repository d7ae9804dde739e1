//! On-demand state export for rendering and network sync

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::entity::{BallType, Entity, EntityKind};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallSnapshot {
    pub x: f32,
    pub y: f32,
    pub ball_type: BallType,
    pub sunk: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShooterSnapshot {
    pub angle: f32,
    pub power: f32,
}

/// Ball positions keyed by entity id, plus the cue stick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub balls: BTreeMap<u32, BallSnapshot>,
    pub shooter: Option<ShooterSnapshot>,
}

impl Snapshot {
    /// Capture every ball and the first shooter found in `collections`
    pub fn capture<'a>(collections: impl IntoIterator<Item = &'a [Entity]>) -> Self {
        let mut snapshot = Snapshot::default();
        for entity in collections.into_iter().flatten() {
            match &entity.kind {
                EntityKind::Ball(ball) => {
                    snapshot.balls.insert(
                        entity.id.0,
                        BallSnapshot {
                            x: ball.pos.x,
                            y: ball.pos.y,
                            ball_type: ball.ball_type,
                            sunk: ball.fully_sunk,
                        },
                    );
                }
                EntityKind::Shooter(shooter) if snapshot.shooter.is_none() => {
                    snapshot.shooter = Some(ShooterSnapshot {
                        angle: shooter.angle,
                        power: shooter.power,
                    });
                }
                _ => {}
            }
        }
        snapshot
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
