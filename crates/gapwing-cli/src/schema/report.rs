use gapwing_engine::course::CourseSeed;
use gapwing_evaluator::{AgentOutcome, GenerationReport};
use serde::{Deserialize, Serialize};

/// Result of `gapwing evaluate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRecord {
    /// Decision function the agents ran with
    pub player: String,
    pub seed: CourseSeed,
    pub ticks: u64,
    pub termination: String,
    pub outcomes: Vec<OutcomeRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub agent: usize,
    pub fitness: f64,
    pub ticks_survived: u64,
    pub obstacles_cleared: usize,
    pub end_cause: String,
    pub finished_at: u64,
}

impl EvaluationRecord {
    pub fn new(player: String, seed: CourseSeed, report: &GenerationReport) -> Self {
        let mut outcomes = report
            .outcomes
            .iter()
            .map(OutcomeRecord::from)
            .collect::<Vec<_>>();
        outcomes.sort_by_key(|outcome| outcome.agent);
        Self {
            player,
            seed,
            ticks: report.ticks,
            termination: report.termination.to_string(),
            outcomes,
        }
    }
}

impl From<&AgentOutcome> for OutcomeRecord {
    fn from(outcome: &AgentOutcome) -> Self {
        Self {
            agent: outcome.id.0,
            fitness: outcome.fitness,
            ticks_survived: outcome.ticks_survived,
            obstacles_cleared: outcome.obstacles_cleared,
            end_cause: outcome.end_cause.to_string(),
            finished_at: outcome.finished_at,
        }
    }
}
