//! Simulation parameters.
//!
//! Every struct here deserializes with `#[serde(default)]`, so a configuration file only
//! needs to mention the values it changes. Parameters are checked by
//! [`SimulationConfig::validate`] before a generation starts; nothing in the simulation
//! re-checks them afterwards.

use serde::{Deserialize, Serialize};

use crate::geometry::Position;

/// Rejected simulation parameters.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum ConfigurationError {
    #[display("{name} must be positive, got {value}")]
    NonPositiveDimension { name: &'static str, value: f32 },
    #[display("gap width {gap_width} does not fit in world height {height}")]
    GapTooWide { gap_width: f32, height: f32 },
    #[display("gap center range [{min}, {max}] contains no whole number")]
    EmptyGapCenterRange { min: f32, max: f32 },
    #[display("{region} solid region is empty when the gap is centered at {gap_center}")]
    EmptySolidRegion {
        region: &'static str,
        gap_center: f32,
    },
    #[display("agent start position ({x}, {y}) lies outside the world")]
    AgentOutsideWorld { x: f32, y: f32 },
    #[display("tick rate must be at least 1 tick per second")]
    ZeroTickRate,
    #[display("{name} of {millis}ms is shorter than one tick at {tick_rate} ticks per second")]
    IntervalTooShort {
        name: &'static str,
        millis: u64,
        tick_rate: u32,
    },
    #[display("{name} must be finite and non-negative, got {value}")]
    InvalidParameter { name: &'static str, value: f32 },
}

/// Checks that `value` is finite and not negative.
pub fn check_parameter(name: &'static str, value: f32) -> Result<(), ConfigurationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidParameter { name, value })
    }
}

fn check_positive(name: &'static str, value: f32) -> Result<(), ConfigurationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigurationError::NonPositiveDimension { name, value })
    }
}

/// World and obstacle geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub width: f32,
    pub height: f32,
    /// Vertical size of the passable gap in every obstacle.
    pub gap_width: f32,
    /// Horizontal size of every obstacle.
    pub obstacle_width: f32,
    pub gap_center_min: f32,
    pub gap_center_max: f32,
    /// Horizontal distance obstacles travel per movement tick.
    pub move_step: f32,
    /// Fixed horizontal lane of every agent.
    pub agent_x: f32,
    pub agent_start_y: f32,
    pub agent_width: f32,
    pub agent_height: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 750.0,
            gap_width: 200.0,
            obstacle_width: 50.0,
            gap_center_min: 350.0,
            gap_center_max: 650.0,
            move_step: 10.0,
            agent_x: 100.0,
            agent_start_y: 200.0,
            agent_width: 50.0,
            agent_height: 50.0,
        }
    }
}

impl WorldConfig {
    #[must_use]
    pub fn gap_half(&self) -> f32 {
        self.gap_width / 2.0
    }

    /// Smallest and largest whole-number gap centers inside the configured range.
    #[must_use]
    pub fn gap_center_steps(&self) -> (f32, f32) {
        (self.gap_center_min.ceil(), self.gap_center_max.floor())
    }

    #[must_use]
    pub fn agent_start(&self) -> Position {
        Position::new(self.agent_x, self.agent_start_y)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        check_positive("world width", self.width)?;
        check_positive("world height", self.height)?;
        check_positive("gap width", self.gap_width)?;
        check_positive("obstacle width", self.obstacle_width)?;
        check_positive("agent width", self.agent_width)?;
        check_positive("agent height", self.agent_height)?;
        check_parameter("move step", self.move_step)?;
        check_parameter("gap center min", self.gap_center_min)?;
        check_parameter("gap center max", self.gap_center_max)?;

        if self.gap_width >= self.height {
            return Err(ConfigurationError::GapTooWide {
                gap_width: self.gap_width,
                height: self.height,
            });
        }
        let (lowest, highest) = self.gap_center_steps();
        if lowest > highest {
            return Err(ConfigurationError::EmptyGapCenterRange {
                min: self.gap_center_min,
                max: self.gap_center_max,
            });
        }
        if self.gap_center_min - self.gap_half() <= 0.0 {
            return Err(ConfigurationError::EmptySolidRegion {
                region: "upper",
                gap_center: self.gap_center_min,
            });
        }
        if self.gap_center_max + self.gap_half() > self.height {
            return Err(ConfigurationError::EmptySolidRegion {
                region: "lower",
                gap_center: self.gap_center_max,
            });
        }

        let start = self.agent_start();
        let inside_x = (0.0..self.width).contains(&start.x);
        let inside_y = start.y >= 0.0 && start.y + self.agent_height / 2.0 <= self.height;
        if !(inside_x && inside_y) {
            return Err(ConfigurationError::AgentOutsideWorld {
                x: start.x,
                y: start.y,
            });
        }
        Ok(())
    }
}

/// Timing parameters in wall-clock units.
///
/// Intervals are converted to whole ticks by [`CadenceConfig::to_cadence`], so the
/// simulation itself never reads a clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CadenceConfig {
    pub tick_rate: u32,
    pub move_interval_ms: u64,
    pub spawn_interval_ms: u64,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            move_interval_ms: 100,
            spawn_interval_ms: 2000,
        }
    }
}

impl CadenceConfig {
    pub fn to_cadence(&self) -> Result<Cadence, ConfigurationError> {
        if self.tick_rate == 0 {
            return Err(ConfigurationError::ZeroTickRate);
        }
        let to_ticks = |name, millis: u64| {
            let ticks = millis.saturating_mul(u64::from(self.tick_rate)) / 1000;
            if ticks == 0 {
                Err(ConfigurationError::IntervalTooShort {
                    name,
                    millis,
                    tick_rate: self.tick_rate,
                })
            } else {
                Ok(ticks)
            }
        };
        Ok(Cadence {
            move_every: to_ticks("move interval", self.move_interval_ms)?,
            spawn_every: to_ticks("spawn interval", self.spawn_interval_ms)?,
        })
    }
}

/// Obstacle schedule expressed in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    move_every: u64,
    spawn_every: u64,
}

impl Cadence {
    /// # Panics
    ///
    /// Panics if either interval is zero.
    #[must_use]
    pub const fn new(move_every: u64, spawn_every: u64) -> Self {
        assert!(move_every > 0 && spawn_every > 0);
        Self {
            move_every,
            spawn_every,
        }
    }

    #[must_use]
    pub const fn move_every(&self) -> u64 {
        self.move_every
    }

    #[must_use]
    pub const fn spawn_every(&self) -> u64 {
        self.spawn_every
    }

    #[must_use]
    pub const fn is_move_tick(&self, tick: u64) -> bool {
        tick % self.move_every == 0
    }

    #[must_use]
    pub const fn is_spawn_tick(&self, tick: u64) -> bool {
        tick % self.spawn_every == 0
    }
}

/// What an agent does on a tick when no obstacle exists.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::IsVariant,
)]
#[serde(rename_all = "kebab-case")]
pub enum IdleBehavior {
    /// Fall by the passive descent step without consulting the decision function.
    #[default]
    Coast,
    /// Stay in place without consulting the decision function.
    Hold,
    /// Consult the decision function with inputs describing an empty course.
    Decide,
}

/// Impulse model applied after each decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub ascend_step: f32,
    pub descend_step: f32,
    pub idle: IdleBehavior,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            ascend_step: 25.0,
            descend_step: 5.0,
            idle: IdleBehavior::Coast,
        }
    }
}

impl PhysicsConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        check_parameter("ascend step", self.ascend_step)?;
        check_parameter("descend step", self.descend_step)?;
        Ok(())
    }
}

/// Complete set of engine parameters for one generation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub world: WorldConfig,
    pub cadence: CadenceConfig,
    pub physics: PhysicsConfig,
}

impl SimulationConfig {
    /// Validates every section and returns the tick cadence.
    pub fn validate(&self) -> Result<Cadence, ConfigurationError> {
        self.world.validate()?;
        self.physics.validate()?;
        self.cadence.to_cadence()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let cadence = SimulationConfig::default().validate().unwrap();
        assert_eq!(cadence.move_every(), 6);
        assert_eq!(cadence.spawn_every(), 120);
    }

    #[test]
    fn test_gap_wider_than_world_is_rejected() {
        let world = WorldConfig {
            gap_width: 800.0,
            ..WorldConfig::default()
        };
        assert!(matches!(
            world.validate(),
            Err(ConfigurationError::GapTooWide { .. })
        ));
    }

    #[test]
    fn test_inverted_gap_range_is_rejected() {
        let world = WorldConfig {
            gap_center_min: 600.0,
            gap_center_max: 400.0,
            ..WorldConfig::default()
        };
        assert!(matches!(
            world.validate(),
            Err(ConfigurationError::EmptyGapCenterRange { .. })
        ));
    }

    #[test]
    fn test_gap_range_without_whole_number_is_rejected() {
        let world = WorldConfig {
            gap_center_min: 400.2,
            gap_center_max: 400.8,
            ..WorldConfig::default()
        };
        assert!(matches!(
            world.validate(),
            Err(ConfigurationError::EmptyGapCenterRange { .. })
        ));
        let world = WorldConfig {
            gap_center_min: 400.2,
            gap_center_max: 401.0,
            ..WorldConfig::default()
        };
        assert_eq!(world.gap_center_steps(), (401.0, 401.0));
        assert!(world.validate().is_ok());
    }

    #[test]
    fn test_gap_touching_ceiling_is_rejected() {
        let world = WorldConfig {
            gap_center_min: 100.0,
            ..WorldConfig::default()
        };
        assert_eq!(
            world.validate(),
            Err(ConfigurationError::EmptySolidRegion {
                region: "upper",
                gap_center: 100.0,
            })
        );
    }

    #[test]
    fn test_gap_touching_floor_is_rejected() {
        let world = WorldConfig {
            gap_center_max: 650.0,
            height: 750.0,
            gap_width: 220.0,
            ..WorldConfig::default()
        };
        assert!(matches!(
            world.validate(),
            Err(ConfigurationError::EmptySolidRegion { region: "lower", .. })
        ));
    }

    #[test]
    fn test_agent_outside_world_is_rejected() {
        let world = WorldConfig {
            agent_start_y: -1.0,
            ..WorldConfig::default()
        };
        assert!(matches!(
            world.validate(),
            Err(ConfigurationError::AgentOutsideWorld { .. })
        ));
    }

    #[test]
    fn test_nan_dimension_is_rejected() {
        let world = WorldConfig {
            width: f32::NAN,
            ..WorldConfig::default()
        };
        assert!(matches!(
            world.validate(),
            Err(ConfigurationError::NonPositiveDimension { name: "world width", .. })
        ));
    }

    #[test]
    fn test_interval_shorter_than_tick_is_rejected() {
        let cadence = CadenceConfig {
            tick_rate: 60,
            move_interval_ms: 10,
            spawn_interval_ms: 2000,
        };
        assert!(matches!(
            cadence.to_cadence(),
            Err(ConfigurationError::IntervalTooShort { name: "move interval", .. })
        ));
        let cadence = CadenceConfig {
            tick_rate: 0,
            ..CadenceConfig::default()
        };
        assert_eq!(cadence.to_cadence(), Err(ConfigurationError::ZeroTickRate));
    }

    #[test]
    fn test_negative_physics_step_is_rejected() {
        let physics = PhysicsConfig {
            descend_step: -5.0,
            ..PhysicsConfig::default()
        };
        assert!(physics.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "world": { "width": 1200.0 }, "physics": { "idle": "hold" } }"#;
        let config: SimulationConfig = serde_json::from_str(json).unwrap();
        assert!((config.world.width - 1200.0).abs() < f32::EPSILON);
        assert!((config.world.height - 750.0).abs() < f32::EPSILON);
        assert!(config.physics.idle.is_hold());
        assert_eq!(config.cadence, CadenceConfig::default());
    }
}
