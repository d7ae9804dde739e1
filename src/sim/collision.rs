//! Swept collision queries for a moving ball
//!
//! Each query takes the ball's position, a unit travel direction and its
//! radius, and returns how far the ball can travel before the event. The
//! stepper compares these distances and advances to the nearest one.

use glam::Vec2;

use super::entity::{Entity, EntityId, EntityKind, Table};

/// Directions shorter than this are treated as "not moving"
const DIR_EPSILON: f32 = 1e-6;
/// Two rail distances within this are hit together (corner)
const CORNER_EPSILON: f32 = 1e-4;
/// Touching balls must close faster than this to count as a new contact
const CONTACT_EPSILON: f32 = 1e-4;

/// Which rails a ball reaches first
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RailHit {
    pub distance: f32,
    /// Reflect the x component (left/right rail)
    pub flip_x: bool,
    /// Reflect the y component (top/bottom rail)
    pub flip_y: bool,
}

/// Distance until the ball's edge reaches a rail
pub fn rail_distance(pos: Vec2, dir: Vec2, radius: f32, table: &Table) -> Option<RailHit> {
    let lo = table.min() + Vec2::splat(radius);
    let hi = table.max() - Vec2::splat(radius);

    let axis = |p: f32, d: f32, lo: f32, hi: f32| -> f32 {
        if d > DIR_EPSILON {
            ((hi - p) / d).max(0.0)
        } else if d < -DIR_EPSILON {
            ((lo - p) / d).max(0.0)
        } else {
            f32::INFINITY
        }
    };

    let tx = axis(pos.x, dir.x, lo.x, hi.x);
    let ty = axis(pos.y, dir.y, lo.y, hi.y);
    let distance = tx.min(ty);
    if !distance.is_finite() {
        return None;
    }

    Some(RailHit {
        distance,
        flip_x: tx <= distance + CORNER_EPSILON,
        flip_y: ty <= distance + CORNER_EPSILON,
    })
}

/// Clamp a ball center into the rail-inset rectangle
pub fn clamp_to_table(pos: Vec2, radius: f32, table: &Table) -> Vec2 {
    let lo = table.min() + Vec2::splat(radius);
    let hi = (table.max() - Vec2::splat(radius)).max(lo);
    pos.clamp(lo, hi)
}

/// Smallest `t >= 0` with `|origin + dir * t - center| == radius`.
/// Returns 0 when `origin` already lies inside the circle.
fn ray_circle(origin: Vec2, dir: Vec2, center: Vec2, radius: f32) -> Option<f32> {
    let m = origin - center;
    let b = m.dot(dir);
    let c = m.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }
    if b >= 0.0 {
        return None;
    }
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    Some((-b - disc.sqrt()).max(0.0))
}

/// Distance until the ball's leading edge enters a pocket's capture circle
pub fn pocket_entry_distance(
    pos: Vec2,
    dir: Vec2,
    radius: f32,
    pocket_pos: Vec2,
    pocket_radius: f32,
) -> Option<f32> {
    if dir.length_squared() < DIR_EPSILON {
        return None;
    }
    let leading_edge = pos + dir * radius;
    ray_circle(leading_edge, dir, pocket_pos, pocket_radius)
}

/// Distance until the moving ball touches another ball.
///
/// Balls already touching only count if the mover is heading into the
/// other ball; separating or grazing pairs are ignored so a freshly
/// resolved contact is not hit again.
pub fn ball_contact_distance(
    pos: Vec2,
    dir: Vec2,
    radius: f32,
    other_pos: Vec2,
    other_radius: f32,
) -> Option<f32> {
    if dir.length_squared() < DIR_EPSILON {
        return None;
    }
    let reach = radius + other_radius;
    let m = pos - other_pos;
    if m.length_squared() <= reach * reach {
        return (m.dot(dir) < -CONTACT_EPSILON).then_some(0.0);
    }
    ray_circle(pos, dir, other_pos, reach)
}

/// Sum-of-radii overlap test
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let reach = ra + rb;
    a.distance_squared(b) < reach * reach
}

/// True if the whole circle lies strictly inside the table
pub fn circle_inside_table(pos: Vec2, radius: f32, table: &Table) -> bool {
    let lo = table.min();
    let hi = table.max();
    pos.x - radius > lo.x && pos.x + radius < hi.x && pos.y - radius > lo.y && pos.y + radius < hi.y
}

/// Check whether the cue ball may be placed at `pos`.
///
/// `radius` should already include any placement padding. The circle must
/// sit strictly inside the table, clear of every open pocket and of every
/// other ball still in play.
pub fn placement_is_legal(entities: &[Entity], cue: EntityId, pos: Vec2, radius: f32) -> bool {
    let mut inside = false;
    for entity in entities {
        match &entity.kind {
            EntityKind::Table(table) => {
                if !circle_inside_table(pos, radius, table) {
                    return false;
                }
                inside = true;
            }
            EntityKind::Pocket(pocket) => {
                if !pocket.is_full && circles_overlap(pos, radius, pocket.pos, pocket.radius) {
                    return false;
                }
            }
            EntityKind::Ball(ball) => {
                if entity.id != cue
                    && !ball.fully_sunk
                    && circles_overlap(pos, radius, ball.pos, ball.radius)
                {
                    return false;
                }
            }
            EntityKind::Shooter(_) => {}
        }
    }
    inside
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}
