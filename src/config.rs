//! Simulation and table configuration
//!
//! Loaded from JSON; every field falls back to the defaults in `consts`.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Errors from loading or validating a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Physics and input tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Constant rolling deceleration (px/s²)
    pub friction_floor: f32,
    /// Flat speed a mover keeps after a ball-ball impact
    pub friction_bounce: f32,
    /// Share of normal speed transferred to a struck ball
    pub collision_transfer: f32,
    pub cue_move_speed: f32,
    pub power_rate: f32,
    pub rotate_speed: f32,
    pub max_drag_distance: f32,
    /// Scale lost per second while sinking
    pub sink_rate: f32,
    /// Seconds all balls must stay stopped before the shot settles
    pub settle_time: f32,
    /// Nearest-event sub-steps per ball per tick
    pub max_substeps: u32,
    pub placement_padding: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            friction_floor: FRICTION_FLOOR,
            friction_bounce: FRICTION_BOUNCE,
            collision_transfer: COLLISION_TRANSFER,
            cue_move_speed: CUE_MOVE_SPEED,
            power_rate: POWER_RATE,
            rotate_speed: ROTATE_SPEED,
            max_drag_distance: MAX_DRAG_DISTANCE,
            sink_rate: SINK_RATE,
            settle_time: SETTLE_TIME,
            max_substeps: MAX_SUBSTEPS,
            placement_padding: PLACEMENT_PADDING,
        }
    }
}

impl SimConfig {
    /// A frictionless variant, handy for exact-motion checks
    pub fn frictionless() -> Self {
        Self {
            friction_floor: 0.0,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        non_negative("sim.friction_floor", self.friction_floor)?;
        non_negative("sim.friction_bounce", self.friction_bounce)?;
        non_negative("sim.collision_transfer", self.collision_transfer)?;
        non_negative("sim.cue_move_speed", self.cue_move_speed)?;
        non_negative("sim.power_rate", self.power_rate)?;
        non_negative("sim.rotate_speed", self.rotate_speed)?;
        positive("sim.max_drag_distance", self.max_drag_distance)?;
        positive("sim.sink_rate", self.sink_rate)?;
        non_negative("sim.settle_time", self.settle_time)?;
        non_negative("sim.placement_padding", self.placement_padding)?;
        if self.max_substeps == 0 {
            return Err(ConfigError::Invalid {
                field: "sim.max_substeps",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

/// Table geometry and equipment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Top-left corner of the playable rectangle
    pub origin: Vec2,
    pub size: Vec2,
    pub ball_radius: f32,
    pub ball_mass: f32,
    pub pocket_radius: f32,
    pub power_max: f32,
    /// Where the cue ball starts floating for the break
    pub head_spot: Vec2,
    /// Position of the front ball of the rack
    pub rack_apex: Vec2,
}

impl Default for TableConfig {
    fn default() -> Self {
        let origin = Vec2::new(TABLE_X, TABLE_Y);
        let size = Vec2::new(TABLE_WIDTH, TABLE_HEIGHT);
        Self {
            origin,
            size,
            ball_radius: BALL_RADIUS,
            ball_mass: BALL_MASS,
            pocket_radius: POCKET_RADIUS,
            power_max: POWER_MAX,
            head_spot: origin + Vec2::new(size.x * 0.25, size.y * 0.5),
            rack_apex: origin + Vec2::new(size.x * 0.7, size.y * 0.5),
        }
    }
}

impl TableConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("table.size.x", self.size.x)?;
        positive("table.size.y", self.size.y)?;
        positive("table.ball_radius", self.ball_radius)?;
        positive("table.ball_mass", self.ball_mass)?;
        positive("table.pocket_radius", self.pocket_radius)?;
        non_negative("table.power_max", self.power_max)?;
        if self.size.x < self.ball_radius * 12.0 || self.size.y < self.ball_radius * 12.0 {
            return Err(ConfigError::Invalid {
                field: "table.size",
                reason: "too small to hold a rack".into(),
            });
        }
        Ok(())
    }
}

/// Full match configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sim: SimConfig,
    pub table: TableConfig,
    /// Seed for the engine RNG
    pub seed: u64,
}

impl Config {
    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sim.validate()?;
        self.table.validate()
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("expected a positive number, got {value}"),
        })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("expected a non-negative number, got {value}"),
        })
    }
}
