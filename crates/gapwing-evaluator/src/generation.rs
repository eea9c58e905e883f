//! One generation: every entrant flies the same course until none is left.
//!
//! # Tick Order
//!
//! Each tick runs these phases in a fixed order:
//!
//! ```text
//! 0. stop requested?        → finish everyone as Stopped, Done
//! 1. course cadence         (advance, then spawn)
//! 2. bounds check           → OutOfBounds
//! 3. collision check        → Collision
//! 4. scoring                (survivors only)
//! 5. decision + physics     → DecisionFault
//! 6. prune                  (write fitness back, notify observer)
//! 7. snapshot to observer
//! 8. nobody left?           → Done (Extinct); tick limit reached → Done (TickLimit)
//! ```
//!
//! Bounds and collision checks look at the positions produced by the previous tick, so an
//! agent that leaves the world is eliminated at the start of the following tick, before
//! it is scored again.
//!
//! # Ownership
//!
//! Each [`Entrant`] lends the generation a decision function and a fitness slot. The
//! generation keeps both inside the agent's record. When the agent is removed its final
//! fitness is written into the slot and both borrows are released together, so the
//! pairing between handle and accumulator cannot drift.

use std::{collections::BTreeMap, mem};

use gapwing_engine::{
    Action, AgentBody, Cadence, ConfigurationError, IdleBehavior, Obstacle, ObstacleCourse,
    ObstacleId, PhysicsConfig, SimulationConfig, WorldConfig,
    collision::{collides, is_out_of_bounds},
    course::CourseSeed,
};
use serde::{Deserialize, Serialize};

use crate::{
    control::{NeverStop, Pacer, StopSignal, Unpaced},
    decision::{DecisionFault, DecisionFunction, SensorInputs, interpret},
    observer::{AgentView, GenerationObserver, TickSnapshot},
    scoring::{ScoreCard, ScoringConfig},
    sensors::nearest_obstacle,
};

/// A decision function and the slot its final fitness is written to.
#[derive(Debug)]
pub struct Entrant<'a> {
    pub decision: &'a mut dyn DecisionFunction,
    pub fitness: &'a mut f64,
}

impl<'a> Entrant<'a> {
    #[must_use]
    pub fn new(decision: &'a mut dyn DecisionFunction, fitness: &'a mut f64) -> Self {
        Self { decision, fitness }
    }
}

/// Position of an entrant in the list supplied to the generation.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[display("agent {_0}")]
pub struct AgentId(pub usize);

/// Why an agent stopped flying.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::IsVariant)]
pub enum EndCause {
    #[display("left the world")]
    OutOfBounds,
    #[display("hit obstacle {obstacle}")]
    Collision { obstacle: ObstacleId },
    #[display("{_0}")]
    DecisionFault(DecisionFault),
    #[display("stopped")]
    Stopped,
    #[display("tick limit reached")]
    TickLimit,
}

/// Final result of one agent.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentOutcome {
    pub id: AgentId,
    pub fitness: f64,
    /// Number of ticks the agent was scored for.
    pub ticks_survived: u64,
    pub obstacles_cleared: usize,
    pub end_cause: EndCause,
    /// Tick during which the agent was removed.
    pub finished_at: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::IsVariant)]
pub enum Termination {
    /// Every agent was eliminated.
    #[display("extinct")]
    Extinct,
    #[display("stopped")]
    Stopped,
    #[display("tick limit")]
    TickLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum GenerationState {
    Running,
    Done,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    /// Number of ticks simulated.
    pub ticks: u64,
    pub termination: Termination,
    /// One outcome per entrant, in the order the agents finished.
    pub outcomes: Vec<AgentOutcome>,
}

impl GenerationReport {
    #[must_use]
    pub fn outcome(&self, id: AgentId) -> Option<&AgentOutcome> {
        self.outcomes.iter().find(|outcome| outcome.id == id)
    }

    #[must_use]
    pub fn best(&self) -> Option<&AgentOutcome> {
        self.outcomes
            .iter()
            .max_by(|a, b| a.fitness.total_cmp(&b.fitness))
    }

    /// Fitness values indexed by [`AgentId`].
    #[must_use]
    pub fn fitness_by_agent(&self) -> Vec<f64> {
        let mut fitness = vec![0.0; self.outcomes.len()];
        for outcome in &self.outcomes {
            if let Some(slot) = fitness.get_mut(outcome.id.0) {
                *slot = outcome.fitness;
            }
        }
        fitness
    }
}

/// An internal invariant of the evaluator was broken.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("evaluator contract violated: {message}")]
pub struct ContractViolation {
    message: String,
}

impl ContractViolation {
    fn new<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum GenerationError {
    #[display("invalid configuration: {_0}")]
    Configuration(ConfigurationError),
    #[display("{_0}")]
    ContractViolation(ContractViolation),
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub simulation: SimulationConfig,
    pub scoring: ScoringConfig,
    /// Ends the generation after this many ticks even if agents are still alive.
    pub max_ticks: Option<u64>,
}

impl GenerationConfig {
    pub fn validate(&self) -> Result<Cadence, ConfigurationError> {
        let cadence = self.simulation.validate()?;
        self.scoring.validate()?;
        if self.max_ticks == Some(0) {
            return Err(ConfigurationError::InvalidParameter {
                name: "tick limit",
                value: 0.0,
            });
        }
        Ok(cadence)
    }
}

#[derive(Debug)]
struct AgentRecord<'a> {
    body: AgentBody,
    card: ScoreCard,
    ticks_survived: u64,
    decision: &'a mut dyn DecisionFunction,
    accumulator: &'a mut f64,
    end: Option<EndCause>,
}

impl AgentRecord<'_> {
    fn act(
        &mut self,
        obstacles: &[Obstacle],
        world: &WorldConfig,
        physics: &PhysicsConfig,
    ) -> Result<(), DecisionFault> {
        let position = self.body.position();
        let inputs = match nearest_obstacle(position, obstacles, world) {
            Some(obstacle) => SensorInputs::observe(position, obstacle, world),
            None => match physics.idle {
                IdleBehavior::Coast => {
                    self.body.apply(Action::Descend, physics);
                    return Ok(());
                }
                IdleBehavior::Hold => {
                    self.body.apply(Action::Hold, physics);
                    return Ok(());
                }
                IdleBehavior::Decide => SensorInputs::empty_course(position, world),
            },
        };
        let output = self.decision.decide(&inputs)?;
        let action = interpret(&output)?;
        self.body.apply(action, physics);
        Ok(())
    }
}

/// Step-by-step state machine of a single generation.
///
/// Most callers want [`GenerationEvaluator`], which drives this to completion. Driving it
/// by hand is useful to inspect intermediate states.
#[derive(Debug)]
pub struct Generation<'a> {
    config: GenerationConfig,
    course: ObstacleCourse,
    agents: BTreeMap<AgentId, AgentRecord<'a>>,
    outcomes: Vec<AgentOutcome>,
    entrant_count: usize,
    tick: u64,
    termination: Option<Termination>,
}

impl<'a> Generation<'a> {
    /// Validates `config` and places every entrant at the start position.
    ///
    /// Fitness slots are reset to zero. Nothing is simulated if validation fails.
    pub fn new(
        config: &GenerationConfig,
        entrants: Vec<Entrant<'a>>,
        seed: CourseSeed,
    ) -> Result<Self, ConfigurationError> {
        let cadence = config.validate()?;
        let world = config.simulation.world;
        let entrant_count = entrants.len();
        let agents = entrants
            .into_iter()
            .enumerate()
            .map(|(index, entrant)| {
                *entrant.fitness = 0.0;
                let record = AgentRecord {
                    body: AgentBody::spawn(&world),
                    card: ScoreCard::default(),
                    ticks_survived: 0,
                    decision: entrant.decision,
                    accumulator: entrant.fitness,
                    end: None,
                };
                (AgentId(index), record)
            })
            .collect::<BTreeMap<_, _>>();
        let termination = agents.is_empty().then_some(Termination::Extinct);
        Ok(Self {
            config: *config,
            course: ObstacleCourse::with_seed(world, cadence, seed),
            agents,
            outcomes: Vec::with_capacity(entrant_count),
            entrant_count,
            tick: 0,
            termination,
        })
    }

    /// Number of completed ticks.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    #[must_use]
    pub fn state(&self) -> GenerationState {
        if self.termination.is_some() {
            GenerationState::Done
        } else {
            GenerationState::Running
        }
    }

    #[must_use]
    pub fn termination(&self) -> Option<Termination> {
        self.termination
    }

    #[must_use]
    pub fn alive(&self) -> usize {
        self.agents.len()
    }

    #[must_use]
    pub fn course(&self) -> &ObstacleCourse {
        &self.course
    }

    /// Outcomes of the agents finished so far.
    #[must_use]
    pub fn outcomes(&self) -> &[AgentOutcome] {
        &self.outcomes
    }

    #[must_use]
    pub fn snapshot(&self) -> TickSnapshot<'_> {
        TickSnapshot {
            tick: self.tick,
            agents: self
                .agents
                .iter()
                .map(|(id, record)| AgentView {
                    id: *id,
                    position: record.body.position(),
                    fitness: record.card.fitness(),
                })
                .collect(),
            obstacles: self.course.obstacles(),
            world: self.course.world(),
        }
    }

    /// Runs one tick. Does nothing once the generation is done.
    pub fn step<S, O>(&mut self, stop: &S, observer: &mut O) -> GenerationState
    where
        S: StopSignal + ?Sized,
        O: GenerationObserver + ?Sized,
    {
        if self.termination.is_some() {
            return GenerationState::Done;
        }
        if stop.should_stop() {
            log::debug!("stop requested after tick {}", self.tick);
            self.finish_remaining(&EndCause::Stopped, observer);
            self.termination = Some(Termination::Stopped);
            return GenerationState::Done;
        }

        self.tick += 1;
        let tick = self.tick;
        let course_tick = self.course.on_tick(tick);
        if let Some(id) = course_tick.spawned {
            log::trace!("tick {tick}: spawned obstacle {id}");
        }

        let world = self.config.simulation.world;
        let physics = self.config.simulation.physics;
        let scoring = self.config.scoring;
        let obstacles = self.course.obstacles();
        for (id, record) in &mut self.agents {
            if is_out_of_bounds(&record.body, &world) {
                record.end = Some(EndCause::OutOfBounds);
                continue;
            }
            if let Some(obstacle) = obstacles
                .iter()
                .find(|obstacle| collides(&record.body, obstacle, &world))
            {
                record.end = Some(EndCause::Collision {
                    obstacle: obstacle.id(),
                });
                continue;
            }

            record
                .card
                .score_tick(record.body.position().x, obstacles, &scoring);
            record.ticks_survived += 1;

            if let Err(fault) = record.act(obstacles, &world, &physics) {
                log::warn!("{id} eliminated at tick {tick}: {fault}");
                record.end = Some(EndCause::DecisionFault(fault));
            }
        }

        self.prune(observer);
        if observer.wants_snapshots() {
            observer.on_tick(&self.snapshot());
        }

        if self.agents.is_empty() {
            self.termination = Some(Termination::Extinct);
        } else if self.config.max_ticks.is_some_and(|max| tick >= max) {
            self.finish_remaining(&EndCause::TickLimit, observer);
            self.termination = Some(Termination::TickLimit);
        }
        self.state()
    }

    /// Consumes a finished generation and returns its report.
    pub fn into_report(self) -> Result<GenerationReport, ContractViolation> {
        let Some(termination) = self.termination else {
            return Err(ContractViolation::new(format!(
                "report requested at tick {} with {} agents still alive",
                self.tick,
                self.agents.len()
            )));
        };
        if self.outcomes.len() != self.entrant_count {
            return Err(ContractViolation::new(format!(
                "{} outcomes for {} entrants",
                self.outcomes.len(),
                self.entrant_count
            )));
        }
        if let Some(outcome) = self.outcomes.iter().find(|outcome| outcome.fitness < 0.0) {
            return Err(ContractViolation::new(format!(
                "{} finished with negative fitness {}",
                outcome.id, outcome.fitness
            )));
        }
        Ok(GenerationReport {
            ticks: self.tick,
            termination,
            outcomes: self.outcomes,
        })
    }

    fn prune<O>(&mut self, observer: &mut O)
    where
        O: GenerationObserver + ?Sized,
    {
        let dead = self
            .agents
            .iter_mut()
            .filter_map(|(id, record)| record.end.take().map(|cause| (*id, cause)))
            .collect::<Vec<_>>();
        for (id, cause) in dead {
            if let Some(record) = self.agents.remove(&id) {
                self.finalize(id, record, cause, observer);
            }
        }
    }

    fn finish_remaining<O>(&mut self, cause: &EndCause, observer: &mut O)
    where
        O: GenerationObserver + ?Sized,
    {
        for (id, record) in mem::take(&mut self.agents) {
            self.finalize(id, record, cause.clone(), observer);
        }
    }

    fn finalize<O>(
        &mut self,
        id: AgentId,
        record: AgentRecord<'a>,
        end_cause: EndCause,
        observer: &mut O,
    ) where
        O: GenerationObserver + ?Sized,
    {
        let AgentRecord {
            card,
            ticks_survived,
            accumulator,
            ..
        } = record;
        *accumulator = card.fitness();
        log::debug!(
            "{id} finished at tick {}: {end_cause} (fitness {:.1}, {} cleared)",
            self.tick,
            card.fitness(),
            card.obstacles_cleared()
        );
        let outcome = AgentOutcome {
            id,
            fitness: card.fitness(),
            ticks_survived,
            obstacles_cleared: card.obstacles_cleared(),
            end_cause,
            finished_at: self.tick,
        };
        observer.on_agent_finished(&outcome);
        self.outcomes.push(outcome);
    }
}

/// Runs whole generations with a fixed configuration.
#[derive(Debug, Clone)]
pub struct GenerationEvaluator {
    config: GenerationConfig,
}

impl GenerationEvaluator {
    #[must_use]
    pub fn new(config: GenerationConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Runs one headless generation as fast as possible.
    pub fn evaluate(
        &self,
        entrants: Vec<Entrant<'_>>,
        seed: CourseSeed,
    ) -> Result<GenerationReport, GenerationError> {
        self.run(entrants, seed, &NeverStop, &mut Unpaced, &mut ())
    }

    /// Runs one generation until every agent is eliminated, `stop` fires or the tick
    /// limit is reached.
    pub fn run<S, P, O>(
        &self,
        entrants: Vec<Entrant<'_>>,
        seed: CourseSeed,
        stop: &S,
        pacer: &mut P,
        observer: &mut O,
    ) -> Result<GenerationReport, GenerationError>
    where
        S: StopSignal + ?Sized,
        P: Pacer + ?Sized,
        O: GenerationObserver + ?Sized,
    {
        let mut generation = Generation::new(&self.config, entrants, seed)?;
        pacer.start();
        while generation.step(stop, observer).is_running() {
            pacer.wait_next_tick();
        }
        let report = generation.into_report()?;
        log::info!(
            "generation {} after {} ticks, best fitness {:.1}",
            report.termination,
            report.ticks,
            report.best().map_or(0.0, |outcome| outcome.fitness)
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::{ConstantDecision, FnDecision};

    fn config_with_idle(idle: IdleBehavior) -> GenerationConfig {
        let mut config = GenerationConfig::default();
        config.simulation.physics.idle = idle;
        config
    }

    #[test]
    fn test_fitness_slots_are_reset_and_written() {
        let mut decision = ConstantDecision(0.4);
        let mut fitness = 123.0;
        let report = GenerationEvaluator::new(GenerationConfig::default())
            .evaluate(
                vec![Entrant::new(&mut decision, &mut fitness)],
                CourseSeed::from_u64(1),
            )
            .unwrap();
        assert_eq!(fitness, report.outcomes[0].fitness);
        assert!(fitness < 123.0);
    }

    #[test]
    fn test_step_by_step() {
        let config = config_with_idle(IdleBehavior::Hold);
        let mut decision = ConstantDecision(0.0);
        let mut fitness = 0.0;
        let mut generation = Generation::new(
            &config,
            vec![Entrant::new(&mut decision, &mut fitness)],
            CourseSeed::from_u64(1),
        )
        .unwrap();
        for _ in 0..10 {
            assert!(generation.step(&NeverStop, &mut ()).is_running());
        }
        assert_eq!(generation.tick(), 10);
        assert_eq!(generation.alive(), 1);
        let snapshot = generation.snapshot();
        assert_eq!(snapshot.agents.len(), 1);
        assert_eq!(snapshot.agents[0].position.y, 200.0);
        assert!((snapshot.agents[0].fitness - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_report_before_done_is_violation() {
        let config = GenerationConfig::default();
        let mut decision = ConstantDecision(0.0);
        let mut fitness = 0.0;
        let mut generation = Generation::new(
            &config,
            vec![Entrant::new(&mut decision, &mut fitness)],
            CourseSeed::from_u64(1),
        )
        .unwrap();
        generation.step(&NeverStop, &mut ());
        assert!(generation.into_report().is_err());
    }

    #[test]
    fn test_fault_is_recorded_in_outcome() {
        let config = config_with_idle(IdleBehavior::Decide);
        let mut decision = FnDecision(|_: &SensorInputs| {
            Err::<[f32; 1], _>(DecisionFault::failed("broken"))
        });
        let mut fitness = 0.0;
        let report = GenerationEvaluator::new(config)
            .evaluate(
                vec![Entrant::new(&mut decision, &mut fitness)],
                CourseSeed::from_u64(1),
            )
            .unwrap();
        let outcome = &report.outcomes[0];
        assert!(outcome.end_cause.is_decision_fault());
        assert_eq!(outcome.finished_at, 1);
        // scored for the tick it was alive at the start of
        assert_eq!(outcome.ticks_survived, 1);
    }

    #[test]
    fn test_zero_tick_limit_is_rejected() {
        let config = GenerationConfig {
            max_ticks: Some(0),
            ..GenerationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: GenerationConfig =
            serde_json::from_str(r#"{"max_ticks": 300, "scoring": {"policy": "every-tick"}}"#)
                .unwrap();
        assert_eq!(config.max_ticks, Some(300));
        assert!(config.scoring.policy.is_every_tick());
        assert_eq!(config.simulation, SimulationConfig::default());
        assert_eq!(config.scoring.clearance_bonus, 10.0);
    }

    #[test]
    fn test_end_cause_display() {
        assert_eq!(EndCause::OutOfBounds.to_string(), "left the world");
        assert_eq!(AgentId(3).to_string(), "agent 3");
    }
}
