use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use gapwing_engine::course::CourseSeed;
use gapwing_evaluator::{
    AgentOutcome, DecisionFunction, Entrant, FixedRate, GapFollower, GenerationEvaluator,
    GenerationObserver, GenerationReport, Pacer, StopSignal, TickSnapshot, Unpaced,
};
use gapwing_training::network::{InputScale, NetworkDecision};

use super::SimulationArg;
use crate::{
    schema::report::EvaluationRecord,
    util,
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct EvaluateArg {
    #[clap(flatten)]
    pub(super) simulation: SimulationArg,
    /// Trained model JSON file; the gap-follower heuristic flies when omitted
    #[arg(long)]
    model: Option<PathBuf>,
    /// Number of agents flying the same decision function
    #[arg(long, default_value_t = 1)]
    agents: usize,
    /// Pace ticks at the configured tick rate instead of running headless
    #[arg(long)]
    realtime: bool,
    /// Stop the generation after this many seconds of wall-clock time
    #[arg(long, value_name = "SECONDS")]
    time_limit: Option<u64>,
    /// Output file path for the evaluation record
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &EvaluateArg) -> anyhow::Result<()> {
    let EvaluateArg {
        simulation,
        model,
        agents,
        realtime,
        time_limit,
        output,
    } = arg;
    anyhow::ensure!(*agents > 0, "at least one agent is required");

    let config = simulation.generation_config()?;
    let seed = simulation.seed();
    let world = config.simulation.world;
    let evaluator = GenerationEvaluator::new(config);
    let mut flight = Flight {
        evaluator: &evaluator,
        seed,
        stop: Deadline::after(time_limit.map(Duration::from_secs)),
        pacer: if *realtime {
            Box::new(FixedRate::new(config.simulation.cadence.tick_rate))
        } else {
            Box::new(Unpaced)
        },
        observer: ProgressLogger {
            interval: u64::from(config.simulation.cadence.tick_rate),
        },
    };
    log::info!("Evaluating {agents} agent(s) on course {seed}");

    let (player, report) = match model {
        Some(path) => {
            let model = util::read_model_file(path)?;
            let network = model.to_network()?;
            let scale = InputScale::for_world(&world);
            let mut decisions = vec![NetworkDecision::new(&network, scale); *agents];
            (format!("model {}", model.name), flight.fly(&mut decisions)?)
        }
        None => {
            let mut decisions = vec![GapFollower::new(&world); *agents];
            ("gap-follower".to_owned(), flight.fly(&mut decisions)?)
        }
    };

    if let Some(best) = report.best() {
        log::info!(
            "Best: {} with fitness {:.1} ({} obstacles cleared, {})",
            best.id,
            best.fitness,
            best.obstacles_cleared,
            best.end_cause
        );
    }
    let record = EvaluationRecord::new(player, seed, &report);
    util::write_json(&record, output.as_deref())?;
    Ok(())
}

struct Flight<'e> {
    evaluator: &'e GenerationEvaluator,
    seed: CourseSeed,
    stop: Deadline,
    pacer: Box<dyn Pacer>,
    observer: ProgressLogger,
}

impl Flight<'_> {
    fn fly<D>(&mut self, decisions: &mut [D]) -> anyhow::Result<GenerationReport>
    where
        D: DecisionFunction,
    {
        let mut fitness = vec![0.0; decisions.len()];
        let entrants = decisions
            .iter_mut()
            .zip(&mut fitness)
            .map(|(decision, fitness)| Entrant::new(decision, fitness))
            .collect();
        let report = self.evaluator.run(
            entrants,
            self.seed,
            &self.stop,
            self.pacer.as_mut(),
            &mut self.observer,
        )?;
        Ok(report)
    }
}

/// Fires once a wall-clock deadline has passed.
#[derive(Debug, Clone, Copy)]
struct Deadline(Option<Instant>);

impl Deadline {
    fn after(limit: Option<Duration>) -> Self {
        Self(limit.map(|limit| Instant::now() + limit))
    }
}

impl StopSignal for Deadline {
    fn should_stop(&self) -> bool {
        self.0.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// Logs a progress line once per simulated second and every finished agent.
#[derive(Debug)]
struct ProgressLogger {
    interval: u64,
}

impl GenerationObserver for ProgressLogger {
    fn on_tick(&mut self, snapshot: &TickSnapshot<'_>) {
        if snapshot.tick % self.interval != 0 {
            return;
        }
        let best = snapshot
            .agents
            .iter()
            .map(|agent| agent.fitness)
            .fold(0.0, f64::max);
        log::info!(
            "tick {:>6}: {} alive, {} obstacles, best fitness {best:.1}",
            snapshot.tick,
            snapshot.agents.len(),
            snapshot.obstacles.len()
        );
    }

    fn on_agent_finished(&mut self, outcome: &AgentOutcome) {
        log::info!(
            "{} finished at tick {}: {} (fitness {:.1})",
            outcome.id,
            outcome.finished_at,
            outcome.end_cause,
            outcome.fitness
        );
    }
}

#[cfg(test)]
mod tests {
    use gapwing_evaluator::GenerationConfig;

    use super::*;

    #[test]
    fn test_deadline() {
        assert!(!Deadline::after(None).should_stop());
        assert!(Deadline::after(Some(Duration::ZERO)).should_stop());
        assert!(!Deadline::after(Some(Duration::from_secs(3600))).should_stop());
    }

    #[test]
    fn test_flight_runs_every_agent() {
        let mut config = GenerationConfig::default();
        config.max_ticks = Some(500);
        let evaluator = GenerationEvaluator::new(config);
        let mut flight = Flight {
            evaluator: &evaluator,
            seed: CourseSeed::from_u64(4),
            stop: Deadline::after(None),
            pacer: Box::new(Unpaced),
            observer: ProgressLogger { interval: 60 },
        };
        let mut decisions = vec![GapFollower::new(&config.simulation.world); 3];
        let report = flight.fly(&mut decisions).unwrap();
        assert_eq!(report.outcomes.len(), 3);
        let fitness = report.fitness_by_agent();
        assert!(fitness.iter().all(|f| *f == fitness[0]));
    }
}
