//! Generation-by-generation training driver.

use gapwing_engine::course::CourseSeed;
use gapwing_evaluator::GenerationEvaluator;
use rand::SeedableRng as _;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::{
    genetic::{Individual, Population, PopulationEvolver, TrainingError},
    stats::FitnessStats,
};

/// What one training generation produced.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSummary {
    pub generation: u64,
    pub course_seed: CourseSeed,
    /// Ticks the evaluator ran before the population died out or was cut off.
    pub ticks: u64,
    pub stats: FitnessStats,
    pub best: Individual,
}

/// Everything needed to resume a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Index of the next generation to run.
    pub generation: u64,
    pub run_seed: CourseSeed,
    pub evolver: PopulationEvolver,
    pub population: Population,
    pub best: Option<Individual>,
}

impl Checkpoint {
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("gapwing-checkpoint-{}.json", self.generation)
    }
}

/// Runs the evaluate → evolve cycle.
///
/// Every random choice is derived from the run seed and the generation index, so a run
/// resumed from a [`Checkpoint`] continues exactly as the uninterrupted run would have.
#[derive(Debug, Clone)]
pub struct Trainer {
    evaluator: GenerationEvaluator,
    evolver: PopulationEvolver,
    run_seed: CourseSeed,
    generation: u64,
    population: Population,
    best: Option<Individual>,
}

impl Trainer {
    pub fn new(
        evaluator: GenerationEvaluator,
        evolver: PopulationEvolver,
        run_seed: CourseSeed,
        population: Population,
    ) -> Result<Self, TrainingError> {
        evolver.validate()?;
        if population.is_empty() {
            return Err(TrainingError::EmptyPopulation);
        }
        Ok(Self {
            evaluator,
            evolver,
            run_seed,
            generation: 0,
            population,
            best: None,
        })
    }

    pub fn resume(
        evaluator: GenerationEvaluator,
        checkpoint: Checkpoint,
    ) -> Result<Self, TrainingError> {
        let Checkpoint {
            generation,
            run_seed,
            evolver,
            population,
            best,
        } = checkpoint;
        let mut trainer = Self::new(evaluator, evolver, run_seed, population)?;
        trainer.generation = generation;
        trainer.best = best;
        Ok(trainer)
    }

    /// Index of the next generation to run.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Best individual seen over all generations run so far.
    #[must_use]
    pub fn best(&self) -> Option<&Individual> {
        self.best.as_ref()
    }

    /// Evaluates the current population, then replaces it with the next one.
    pub fn run_generation(&mut self) -> Result<GenerationSummary, TrainingError> {
        let generation = self.generation;
        log::info!(" ****** Running generation {generation} ****** ");

        let course_seed = self.run_seed.derive(2 * generation);
        let report = self
            .population
            .evaluate_fitness(&self.evaluator, course_seed)?;
        let stats = self
            .population
            .compute_fitness_stats()
            .ok_or(TrainingError::EmptyPopulation)?;
        let best = self
            .population
            .best_individual()
            .cloned()
            .ok_or(TrainingError::EmptyPopulation)?;
        log::info!(
            "Population's average fitness: {:.5} stdev: {:.5}",
            stats.mean,
            stats.std_dev
        );
        log::info!(
            "Best fitness: {:.5} (median {:.5}, worst {:.5}) after {} ticks",
            stats.max,
            stats.median,
            stats.min,
            report.ticks
        );
        if self
            .best
            .as_ref()
            .is_none_or(|current| best.fitness() > current.fitness())
        {
            self.best = Some(best.clone());
        }

        let mut rng = Pcg32::from_seed(self.run_seed.derive(2 * generation + 1).to_bytes());
        self.population = self.evolver.evolve(&self.population, &mut rng)?;
        self.generation += 1;

        Ok(GenerationSummary {
            generation,
            course_seed,
            ticks: report.ticks,
            stats,
            best,
        })
    }

    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            generation: self.generation,
            run_seed: self.run_seed,
            evolver: self.evolver,
            population: self.population.clone(),
            best: self.best.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use gapwing_engine::IdleBehavior;
    use gapwing_evaluator::GenerationConfig;

    use super::*;
    use crate::network::DEFAULT_LAYERS;

    fn trainer(seed: u64) -> Trainer {
        let mut config = GenerationConfig::default();
        config.simulation.physics.idle = IdleBehavior::Decide;
        config.max_ticks = Some(400);
        let mut rng = Pcg32::seed_from_u64(seed);
        let population = Population::random(8, &DEFAULT_LAYERS, 2.0, &mut rng).unwrap();
        Trainer::new(
            GenerationEvaluator::new(config),
            PopulationEvolver::default(),
            CourseSeed::from_u64(seed),
            population,
        )
        .unwrap()
    }

    #[test]
    fn test_run_generation_advances() {
        let mut trainer = trainer(1);
        let summary = trainer.run_generation().unwrap();
        assert_eq!(summary.generation, 0);
        assert_eq!(trainer.generation(), 1);
        assert_eq!(trainer.population().len(), 8);
        assert_eq!(summary.stats.max, summary.best.fitness());
        assert_eq!(trainer.best(), Some(&summary.best));
    }

    #[test]
    fn test_resume_matches_uninterrupted_run() {
        let mut uninterrupted = trainer(2);
        uninterrupted.run_generation().unwrap();
        let checkpoint = uninterrupted.checkpoint();
        let expected = uninterrupted.run_generation().unwrap();

        let json = serde_json::to_string(&checkpoint).unwrap();
        let checkpoint: Checkpoint = serde_json::from_str(&json).unwrap();
        assert_eq!(checkpoint.file_name(), "gapwing-checkpoint-1.json");
        let mut resumed = Trainer::resume(uninterrupted.evaluator.clone(), checkpoint).unwrap();
        let actual = resumed.run_generation().unwrap();
        assert_eq!(actual, expected);
        assert_eq!(resumed.population(), uninterrupted.population());
    }

    #[test]
    fn test_empty_population_is_rejected() {
        let result = Trainer::new(
            GenerationEvaluator::new(GenerationConfig::default()),
            PopulationEvolver::default(),
            CourseSeed::from_u64(0),
            Population::default(),
        );
        assert!(matches!(result, Err(TrainingError::EmptyPopulation)));
    }
}
