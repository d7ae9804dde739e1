//! Match setup: table, pockets, racked balls, cue ball and shooter
//!
//! The engine never creates entities; the driver builds them once here.

use glam::Vec2;

use crate::config::TableConfig;
use crate::sim::{Ball, BallType, Entity, EntityId, EntityKind, IdAllocator, Pocket, Shooter, Table};

/// Ball types in rack order (apex first, then row by row, top to bottom).
/// Eight in the middle of the third row, one of each group in the back
/// corners.
const RACK_ORDER: [BallType; 15] = [
    BallType::Solids,
    BallType::Stripes,
    BallType::Solids,
    BallType::Solids,
    BallType::Eight,
    BallType::Stripes,
    BallType::Stripes,
    BallType::Solids,
    BallType::Stripes,
    BallType::Solids,
    BallType::Solids,
    BallType::Stripes,
    BallType::Stripes,
    BallType::Solids,
    BallType::Stripes,
];

/// Triangle rack positions relative to the apex ball.
///
/// The apex points left toward the cue ball and rows spread to the right:
/// ```text
///  0
///  1  2
///  3  4  5
///  6  7  8  9
/// 10 11 12 13 14
/// ```
pub fn rack_positions(apex: Vec2, ball_radius: f32) -> [Vec2; 15] {
    // Small gap so no two racked balls start overlapping
    let gap = ball_radius * 2.0 + 1.0;
    let row_offset = gap * 0.866; // sqrt(3)/2 for an equilateral triangle

    let mut positions = [Vec2::ZERO; 15];
    let mut i = 0;
    for row in 0..5 {
        for slot in 0..=row {
            positions[i] = apex
                + Vec2::new(
                    row as f32 * row_offset,
                    (slot as f32 - row as f32 / 2.0) * gap,
                );
            i += 1;
        }
    }
    positions
}

/// Pocket centers: four corners plus the middle of each long rail
pub fn pocket_positions(origin: Vec2, size: Vec2) -> [Vec2; 6] {
    let mid_x = origin.x + size.x / 2.0;
    let right = origin.x + size.x;
    let bottom = origin.y + size.y;
    [
        origin,
        Vec2::new(mid_x, origin.y),
        Vec2::new(right, origin.y),
        Vec2::new(origin.x, bottom),
        Vec2::new(mid_x, bottom),
        Vec2::new(right, bottom),
    ]
}

/// Everything on the table at the start of a match
#[derive(Debug, Clone)]
pub struct Rack {
    pub entities: Vec<Entity>,
    pub cue_ball: EntityId,
    pub shooter: EntityId,
}

/// Build the table, six pockets, the racked balls, the cue ball floating on
/// the head spot and a shooter ready to place it.
pub fn build(config: &TableConfig, ids: &mut IdAllocator) -> Rack {
    let mut entities = Vec::with_capacity(24);

    entities.push(Entity::new(
        ids.next_id(),
        EntityKind::Table(Table::new(config.origin, config.size)),
    ));

    for pos in pocket_positions(config.origin, config.size) {
        entities.push(Entity::new(
            ids.next_id(),
            EntityKind::Pocket(Pocket::new(pos, config.pocket_radius)),
        ));
    }

    let cue_ball = ids.next_id();
    entities.push(Entity::new(
        cue_ball,
        EntityKind::Ball(Ball::new(
            config.head_spot,
            config.ball_radius,
            config.ball_mass,
            BallType::Cue,
        )),
    ));

    for (pos, ball_type) in rack_positions(config.rack_apex, config.ball_radius)
        .into_iter()
        .zip(RACK_ORDER)
    {
        entities.push(Entity::new(
            ids.next_id(),
            EntityKind::Ball(Ball::new(pos, config.ball_radius, config.ball_mass, ball_type)),
        ));
    }

    let shooter = ids.next_id();
    entities.push(Entity::new(
        shooter,
        EntityKind::Shooter(Shooter::new(config.head_spot, cue_ball, config.power_max)),
    ));

    log::debug!("Racked {} entities", entities.len());

    Rack {
        entities,
        cue_ball,
        shooter,
    }
}
