//! Fitness evaluation of agents on an obstacle course.
//!
//! This crate turns the simulation primitives of `gapwing-engine` into a scored run over
//! a whole population:
//!
//! 1. **Decision Interface** ([`decision`]) - How an agent's controller is queried, what
//!    it sees ([`SensorInputs`]) and how its output becomes an action.
//!
//! 2. **Scoring** ([`scoring`]) - Survival increments and clearance bonuses.
//!
//! 3. **Generation** ([`generation`]) - The tick loop that advances the course, eliminates
//!    agents, accrues fitness and hands results back to the caller.
//!
//! # Supporting Modules
//!
//! - [`sensors`] - Nearest obstacle selection and sensor construction
//! - [`control`] - Stop signals and tick pacing
//! - [`observer`] - Read-only hooks for rendering or progress reporting
//!
//! # Example
//!
//! ```
//! use gapwing_engine::course::CourseSeed;
//! use gapwing_evaluator::{ConstantDecision, Entrant, GenerationConfig, GenerationEvaluator};
//!
//! let mut sinker = ConstantDecision(0.0);
//! let mut fitness = 0.0;
//! let evaluator = GenerationEvaluator::new(GenerationConfig::default());
//! let report = evaluator
//!     .evaluate(
//!         vec![Entrant::new(&mut sinker, &mut fitness)],
//!         CourseSeed::from_u64(1),
//!     )
//!     .unwrap();
//!
//! assert_eq!(report.outcomes.len(), 1);
//! assert_eq!(report.outcomes[0].fitness, fitness);
//! ```

pub use self::{
    control::{FixedRate, NeverStop, Pacer, StopSignal, Unpaced},
    decision::{
        ConstantDecision, DecisionFault, DecisionFunction, DecisionOutput, FnDecision,
        GapFollower, ReplayDecision, SensorInputs,
    },
    generation::{
        AgentId, AgentOutcome, ContractViolation, EndCause, Entrant, Generation,
        GenerationConfig, GenerationError, GenerationEvaluator, GenerationReport,
        GenerationState, Termination,
    },
    observer::{AgentView, GenerationObserver, TickSnapshot},
    scoring::{ClearancePolicy, ScoreCard, ScoringConfig},
};

pub mod control;
pub mod decision;
pub mod generation;
pub mod observer;
pub mod scoring;
pub mod sensors;
