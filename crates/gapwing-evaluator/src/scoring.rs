//! Fitness accrual rules.
//!
//! Every tick a live agent earns a small survival increment plus a larger bonus for each
//! obstacle it has cleared:
//!
//! ```text
//! gain = survival_increment + clearance_bonus × credited_obstacles
//! cleared(obstacle) ⇔ obstacle.x - clearance_margin < agent.x
//! ```
//!
//! With [`ClearancePolicy::Once`] an obstacle is credited on the first tick it counts as
//! cleared. With [`ClearancePolicy::EveryTick`] it is credited on every tick it stays
//! cleared and on screen, which rewards long survival after a single pass far more than
//! passing further obstacles.

use gapwing_engine::{ConfigurationError, Obstacle, ObstacleId, config::check_parameter};
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, derive_more::IsVariant,
)]
#[serde(rename_all = "kebab-case")]
pub enum ClearancePolicy {
    /// Credit each (agent, obstacle) pair once.
    #[default]
    Once,
    /// Credit every tick an obstacle remains cleared.
    EveryTick,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub survival_increment: f32,
    pub clearance_bonus: f32,
    pub clearance_margin: f32,
    pub policy: ClearancePolicy,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            survival_increment: 0.1,
            clearance_bonus: 10.0,
            clearance_margin: 10.0,
            policy: ClearancePolicy::Once,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        check_parameter("survival increment", self.survival_increment)?;
        check_parameter("clearance bonus", self.clearance_bonus)?;
        if !self.clearance_margin.is_finite() {
            return Err(ConfigurationError::InvalidParameter {
                name: "clearance margin",
                value: self.clearance_margin,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn has_cleared(&self, obstacle: &Obstacle, agent_x: f32) -> bool {
        obstacle.x() - self.clearance_margin < agent_x
    }
}

/// Running score of one agent.
///
/// Fitness accumulates in `f64` while the increments stay `f32`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreCard {
    fitness: f64,
    obstacles_cleared: usize,
    // Obstacles move left at a common speed and are stored in creation order, so the
    // cleared ones always form a prefix. Remembering the last credited id is enough.
    credited_through: Option<ObstacleId>,
}

impl ScoreCard {
    #[must_use]
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    #[must_use]
    pub fn obstacles_cleared(&self) -> usize {
        self.obstacles_cleared
    }

    /// Accrues one tick of survival and clearance; returns the fitness gained.
    pub fn score_tick(
        &mut self,
        agent_x: f32,
        obstacles: &[Obstacle],
        config: &ScoringConfig,
    ) -> f64 {
        let mut gain = f64::from(config.survival_increment);
        for obstacle in obstacles {
            if !config.has_cleared(obstacle, agent_x) {
                continue;
            }
            let first_time = self
                .credited_through
                .is_none_or(|credited| obstacle.id() > credited);
            if first_time {
                self.credited_through = Some(obstacle.id());
                self.obstacles_cleared += 1;
            }
            if first_time || config.policy.is_every_tick() {
                gain += f64::from(config.clearance_bonus);
            }
        }
        self.fitness += gain;
        gain
    }
}
