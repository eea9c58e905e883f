//! The "sense → act" contract between the evaluator and an agent's controller.
//!
//! The evaluator depends only on [`DecisionFunction`]. Anything that maps
//! [`SensorInputs`] to a [`DecisionOutput`] can drive an agent: a trained network, a
//! scripted heuristic or a recorded replay.
//!
//! # Output Interpretation
//!
//! ```text
//! output[0] > 0.5  → ascend
//! otherwise        → descend
//! ```
//!
//! A non-finite output value is a fault, as is an `Err` returned by the function itself.
//! Faults eliminate the offending agent only.

use std::fmt;

use gapwing_engine::{Action, WorldConfig};
use serde::{Deserialize, Serialize};

pub const SENSOR_LEN: usize = 5;
pub const OUTPUT_LEN: usize = 1;

/// Outputs above this value are read as "ascend".
pub const ASCEND_THRESHOLD: f32 = 0.5;

pub type DecisionOutput = [f32; OUTPUT_LEN];

/// What an agent perceives on one tick.
///
/// The order of [`SensorInputs::to_array`] is part of the contract and never changes:
/// `(agent_y, top_x, top_y, bottom_x, bottom_y)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorInputs {
    /// Vertical position of the agent.
    pub agent_y: f32,
    /// Origin of the nearest obstacle's upper solid region.
    pub top_x: f32,
    pub top_y: f32,
    /// Origin of the nearest obstacle's lower solid region.
    pub bottom_x: f32,
    pub bottom_y: f32,
}

impl SensorInputs {
    #[must_use]
    pub const fn to_array(&self) -> [f32; SENSOR_LEN] {
        [
            self.agent_y,
            self.top_x,
            self.top_y,
            self.bottom_x,
            self.bottom_y,
        ]
    }
}

/// Failure reported by, or detected in, a decision function.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum DecisionFault {
    #[display("output {index} is not finite: {value}")]
    NonFiniteOutput { index: usize, value: f32 },
    #[display("decision function failed: {message}")]
    Failed { message: String },
}

impl DecisionFault {
    #[must_use]
    pub fn failed<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// Maps sensory inputs to action outputs.
///
/// Implementations may keep internal state (a recurrent network, a replay cursor), but
/// they only ever see the inputs they are given.
pub trait DecisionFunction: fmt::Debug {
    fn decide(&mut self, inputs: &SensorInputs) -> Result<DecisionOutput, DecisionFault>;
}

impl<T> DecisionFunction for Box<T>
where
    T: DecisionFunction + ?Sized,
{
    fn decide(&mut self, inputs: &SensorInputs) -> Result<DecisionOutput, DecisionFault> {
        (**self).decide(inputs)
    }
}

/// Converts raw outputs into an action.
pub fn interpret(output: &DecisionOutput) -> Result<Action, DecisionFault> {
    if let Some((index, value)) = output
        .iter()
        .copied()
        .enumerate()
        .find(|(_, value)| !value.is_finite())
    {
        return Err(DecisionFault::NonFiniteOutput { index, value });
    }
    if output[0] > ASCEND_THRESHOLD {
        Ok(Action::Ascend)
    } else {
        Ok(Action::Descend)
    }
}

/// Always produces the same output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantDecision(pub f32);

impl DecisionFunction for ConstantDecision {
    fn decide(&mut self, _inputs: &SensorInputs) -> Result<DecisionOutput, DecisionFault> {
        Ok([self.0])
    }
}

/// Plays back a recorded output sequence, repeating the last value once exhausted.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayDecision {
    outputs: Vec<f32>,
    cursor: usize,
}

impl ReplayDecision {
    #[must_use]
    pub fn new(outputs: Vec<f32>) -> Self {
        Self { outputs, cursor: 0 }
    }

    /// Number of decisions made so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.cursor
    }
}

impl DecisionFunction for ReplayDecision {
    fn decide(&mut self, _inputs: &SensorInputs) -> Result<DecisionOutput, DecisionFault> {
        let index = self.cursor.min(self.outputs.len().saturating_sub(1));
        let value = *self
            .outputs
            .get(index)
            .ok_or_else(|| DecisionFault::failed("replay has no recorded outputs"))?;
        self.cursor += 1;
        Ok([value])
    }
}

/// Scripted controller that keeps the agent just above the lower edge of the gap.
///
/// Ascends whenever the agent's bottom edge comes within `clearance` of the lower solid
/// region, otherwise lets it sink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapFollower {
    agent_height: f32,
    clearance: f32,
}

impl GapFollower {
    pub const DEFAULT_CLEARANCE: f32 = 30.0;

    #[must_use]
    pub fn new(world: &WorldConfig) -> Self {
        Self::with_clearance(world, Self::DEFAULT_CLEARANCE)
    }

    #[must_use]
    pub fn with_clearance(world: &WorldConfig, clearance: f32) -> Self {
        Self {
            agent_height: world.agent_height,
            clearance,
        }
    }
}

impl DecisionFunction for GapFollower {
    fn decide(&mut self, inputs: &SensorInputs) -> Result<DecisionOutput, DecisionFault> {
        let agent_bottom = inputs.agent_y + self.agent_height;
        if agent_bottom > inputs.bottom_y - self.clearance {
            Ok([1.0])
        } else {
            Ok([0.0])
        }
    }
}

/// Adapts a closure into a [`DecisionFunction`].
pub struct FnDecision<F>(pub F);

impl<F> fmt::Debug for FnDecision<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FnDecision").finish_non_exhaustive()
    }
}

impl<F> DecisionFunction for FnDecision<F>
where
    F: FnMut(&SensorInputs) -> Result<DecisionOutput, DecisionFault>,
{
    fn decide(&mut self, inputs: &SensorInputs) -> Result<DecisionOutput, DecisionFault> {
        (self.0)(inputs)
    }
}
