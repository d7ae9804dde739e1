//! Eight Ball - a turn-based pool table simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics stepper, shot state machine, rules)
//! - `rack`: Match setup (table, pockets, racked balls, cue ball, shooter)
//! - `game`: Reference driver owning the active/idle/pocketed collections
//! - `config`: Data-driven tuning loaded from JSON

pub mod config;
pub mod game;
pub mod rack;
pub mod sim;

pub use config::{Config, ConfigError, SimConfig, TableConfig};
pub use game::PoolMatch;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Host loop rate used by the demo runner (240 Hz)
    pub const SIM_DT: f32 = 1.0 / 240.0;

    /// Table defaults (top-left corner and size)
    pub const TABLE_X: f32 = 150.0;
    pub const TABLE_Y: f32 = 270.0;
    pub const TABLE_WIDTH: f32 = 700.0;
    pub const TABLE_HEIGHT: f32 = 350.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 10.0;
    pub const BALL_MASS: f32 = 1.0;

    /// Pocket capture radius
    pub const POCKET_RADIUS: f32 = 18.0;

    /// Cue power (initial speed imparted to the cue ball, px/s)
    pub const POWER_MAX: f32 = 1200.0;
    /// Power change per second while increase/decrease is held
    pub const POWER_RATE: f32 = 600.0;
    /// Aim rotation speed (radians/s)
    pub const ROTATE_SPEED: f32 = 2.0;
    /// Drag length that maps to full power
    pub const MAX_DRAG_DISTANCE: f32 = 200.0;
    /// Speed of the floating cue ball while placing (px/s)
    pub const CUE_MOVE_SPEED: f32 = 200.0;
    /// Extra clearance around the cue ball when checking placement
    pub const PLACEMENT_PADDING: f32 = 1.0;

    /// Constant rolling deceleration (px/s²)
    pub const FRICTION_FLOOR: f32 = 200.0;
    /// Speed kept by a mover after a ball-ball impact, on top of half its speed
    pub const FRICTION_BOUNCE: f32 = 5.0;
    /// Fraction of the normal speed handed to a struck ball
    pub const COLLISION_TRANSFER: f32 = 0.9;

    /// Scale lost per second while sinking
    pub const SINK_RATE: f32 = 4.0;
    /// Scale at which a sinking ball counts as fully sunk
    pub const SINK_EPSILON: f32 = 0.01;
    /// Distance from the pocket center at which steering stops
    pub const POCKET_CENTER_EPSILON: f32 = 0.01;

    /// Speed treated as stopped
    pub const SPEED_EPSILON: f32 = 0.01;
    /// All balls must stay stopped this long before the shot settles (seconds)
    pub const SETTLE_TIME: f32 = 0.25;

    /// Maximum nearest-event sub-steps per ball per tick. Distance left over
    /// when the cap is hit is dropped; the ball keeps its velocity and moves
    /// again next tick.
    pub const MAX_SUBSTEPS: u32 = 16;

    /// Shots awarded to the opponent on a foul
    pub const FOUL_SHOTS: u32 = 2;
}

/// Wrap an angle into [0, 2π)
#[inline]
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(std::f32::consts::TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= std::f32::consts::TAU {
        0.0
    } else {
        wrapped
    }
}

/// Unit direction for a shot angle.
///
/// Angles follow screen convention: y grows downward, so 0 points right and
/// π/2 points up.
#[inline]
pub fn angle_to_dir(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), -angle.sin())
}

/// Shot angle for a screen-space vector, wrapped into [0, 2π)
#[inline]
pub fn dir_to_angle(v: Vec2) -> f32 {
    wrap_angle((-v.y).atan2(v.x))
}
