//! Obstacle course simulation primitives.
//!
//! This crate owns everything about the simulated world that does not depend on
//! how agents make decisions or how they are scored:
//!
//! - [`config`] - World geometry, cadence and physics parameters with validation
//! - [`geometry`] - Positions and axis-aligned rectangles
//! - [`course`] - Seeded obstacle course generator ([`ObstacleCourse`], [`Obstacle`])
//! - [`body`] - Agent body state and the impulse physics model ([`AgentBody`], [`Action`])
//! - [`collision`] - Pure bounds and collision predicates
//!
//! # Coordinates
//!
//! World coordinates grow right and down: the ceiling is `y = 0` and the floor is
//! `y = world.height`. Agent and obstacle positions are the top-left corners of their
//! bounding boxes.
//!
//! # Example
//!
//! ```
//! use gapwing_engine::{
//!     AgentBody, ObstacleCourse, SimulationConfig,
//!     collision::{collides, is_out_of_bounds},
//!     course::CourseSeed,
//! };
//!
//! let config = SimulationConfig::default();
//! let cadence = config.validate().unwrap();
//! let mut course = ObstacleCourse::with_seed(config.world, cadence, CourseSeed::from_u64(7));
//! let body = AgentBody::spawn(&config.world);
//!
//! for tick in 1..=cadence.spawn_every() {
//!     course.on_tick(tick);
//! }
//! assert_eq!(course.obstacles().len(), 1);
//! assert!(!is_out_of_bounds(&body, &config.world));
//! assert!(!collides(&body, &course.obstacles()[0], &config.world));
//! ```

pub use self::{
    body::{Action, AgentBody},
    config::{
        Cadence, CadenceConfig, ConfigurationError, IdleBehavior, PhysicsConfig,
        SimulationConfig, WorldConfig,
    },
    course::{Obstacle, ObstacleCourse, ObstacleId},
    geometry::{Position, Rect},
};

pub mod body;
pub mod collision;
pub mod config;
pub mod course;
pub mod geometry;
