//! Genetic algorithm evolving network weights.
//!
//! Each generation every individual's network flies the same course as one agent of a
//! single evaluator generation. Fitness comes straight from the evaluator.
//!
//! # Algorithm Overview
//!
//! 1. **Evaluate Fitness** - All individuals fly one generation together
//! 2. **Elite Selection** - Top performers are copied unchanged
//! 3. **Tournament Selection** - Parents are the best of a small random sample
//! 4. **Crossover (BLX-α)** - Two parents' weights are blended into a child
//! 5. **Mutation** - Gaussian noise is added to some of the child's weights
//!
//! The topology never changes; every individual in a population shares the same layer
//! sizes.

use gapwing_engine::course::CourseSeed;
use gapwing_evaluator::{Entrant, GenerationError, GenerationEvaluator, GenerationReport};
use rand::{Rng, seq::IndexedRandom};
use rand_distr::NormalError;
use serde::{Deserialize, Serialize};

use crate::{
    network::{FeedForwardNetwork, InputScale, NetworkDecision, NetworkError},
    stats::FitnessStats,
    weights,
};

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum TrainingError {
    #[display("generation failed: {_0}")]
    #[from]
    Generation(GenerationError),
    #[display("invalid network: {_0}")]
    #[from]
    Network(NetworkError),
    #[display("invalid mutation strength: {_0}")]
    #[from]
    Mutation(NormalError),
    #[display("{name} is out of range: {value}")]
    InvalidParameter { name: &'static str, value: f32 },
    #[display("population mixes network topologies")]
    TopologyMismatch,
    #[display("population is empty")]
    EmptyPopulation,
}

/// A candidate network and the fitness it last achieved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    network: FeedForwardNetwork,
    fitness: f64,
}

impl Individual {
    #[must_use]
    pub fn new(network: FeedForwardNetwork) -> Self {
        Self {
            network,
            fitness: 0.0,
        }
    }

    pub fn random<R>(
        layers: Vec<usize>,
        max_weight: f32,
        rng: &mut R,
    ) -> Result<Self, NetworkError>
    where
        R: Rng + ?Sized,
    {
        Ok(Self::new(FeedForwardNetwork::random(layers, max_weight, rng)?))
    }

    #[must_use]
    pub fn network(&self) -> &FeedForwardNetwork {
        &self.network
    }

    #[must_use]
    pub fn fitness(&self) -> f64 {
        self.fitness
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Population {
    individuals: Vec<Individual>,
}

impl Population {
    pub fn random<R>(
        count: usize,
        layers: &[usize],
        max_weight: f32,
        rng: &mut R,
    ) -> Result<Self, NetworkError>
    where
        R: Rng + ?Sized,
    {
        let individuals = (0..count)
            .map(|_| Individual::random(layers.to_vec(), max_weight, rng))
            .collect::<Result<_, _>>()?;
        Ok(Self { individuals })
    }

    #[must_use]
    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// Flies every individual through one generation on the course seeded by `seed`.
    ///
    /// Afterwards individuals are sorted by fitness in descending order (best first).
    pub fn evaluate_fitness(
        &mut self,
        evaluator: &GenerationEvaluator,
        seed: CourseSeed,
    ) -> Result<GenerationReport, GenerationError> {
        let scale = InputScale::for_world(&evaluator.config().simulation.world);
        let mut decisions = self
            .individuals
            .iter()
            .map(|ind| NetworkDecision::new(&ind.network, scale))
            .collect::<Vec<_>>();
        let mut fitness = vec![0.0; decisions.len()];
        let entrants = decisions
            .iter_mut()
            .zip(&mut fitness)
            .map(|(decision, fitness)| Entrant::new(decision, fitness))
            .collect();
        let report = evaluator.evaluate(entrants, seed)?;

        for (ind, fitness) in self.individuals.iter_mut().zip(fitness) {
            ind.fitness = fitness;
        }
        // sort by fitness descending
        self.individuals
            .sort_by(|a, b| b.fitness.total_cmp(&a.fitness));
        Ok(report)
    }

    /// The individual with the highest fitness.
    #[must_use]
    pub fn best_individual(&self) -> Option<&Individual> {
        self.individuals
            .iter()
            .max_by(|a, b| a.fitness.total_cmp(&b.fitness))
    }

    #[must_use]
    pub fn compute_fitness_stats(&self) -> Option<FitnessStats> {
        FitnessStats::new(self.individuals.iter().map(|ind| ind.fitness))
    }
}

/// Controls how one population turns into the next.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationEvolver {
    /// Number of top individuals copied unchanged.
    pub elite_count: usize,
    /// Weights are clamped to `[-max_weight, max_weight]`.
    pub max_weight: f32,
    /// Larger tournaments mean stronger selection pressure.
    pub tournament_size: usize,
    pub mutation_sigma: f32,
    pub blx_alpha: f32,
    /// Probability of mutating each weight.
    pub mutation_rate: f32,
}

impl Default for PopulationEvolver {
    fn default() -> Self {
        Self {
            elite_count: 2,
            max_weight: 5.0,
            tournament_size: 3,
            mutation_sigma: 0.5,
            blx_alpha: 0.5,
            mutation_rate: 0.2,
        }
    }
}

impl PopulationEvolver {
    pub fn validate(&self) -> Result<(), TrainingError> {
        let check = |name, value: f32, valid: bool| {
            if valid && value.is_finite() {
                Ok(())
            } else {
                Err(TrainingError::InvalidParameter { name, value })
            }
        };
        check("max weight", self.max_weight, self.max_weight > 0.0)?;
        check("mutation sigma", self.mutation_sigma, self.mutation_sigma >= 0.0)?;
        check("BLX alpha", self.blx_alpha, self.blx_alpha >= 0.0)?;
        check(
            "mutation rate",
            self.mutation_rate,
            (0.0..=1.0).contains(&self.mutation_rate),
        )?;
        if self.tournament_size == 0 {
            return Err(TrainingError::InvalidParameter {
                name: "tournament size",
                value: 0.0,
            });
        }
        Ok(())
    }

    /// Creates the next generation with the same size as `population`.
    ///
    /// The best `elite_count` individuals survive unchanged; the rest are children of
    /// tournament-selected parents. Children start with zero fitness.
    pub fn evolve<R>(
        &self,
        population: &Population,
        rng: &mut R,
    ) -> Result<Population, TrainingError>
    where
        R: Rng + ?Sized,
    {
        self.validate()?;
        let Some(first) = population.individuals.first() else {
            return Ok(Population::default());
        };
        let layers = first.network.layers();
        if population
            .individuals
            .iter()
            .any(|ind| ind.network.layers() != layers)
        {
            return Err(TrainingError::TopologyMismatch);
        }

        let mut ranked = population.individuals.iter().collect::<Vec<_>>();
        ranked.sort_by(|a, b| b.fitness.total_cmp(&a.fitness));

        // elite selection
        let elite_count = self.elite_count.min(ranked.len());
        let mut next = ranked[..elite_count]
            .iter()
            .map(|&ind| ind.clone())
            .collect::<Vec<_>>();

        while next.len() < population.individuals.len() {
            let p1 = tournament_select(&population.individuals, self.tournament_size, rng)?;
            let p2 = tournament_select(&population.individuals, self.tournament_size, rng)?;
            let mut child = weights::blx_alpha(
                p1.network.weights(),
                p2.network.weights(),
                self.blx_alpha,
                self.max_weight,
                rng,
            );
            weights::mutate(
                &mut child,
                self.mutation_sigma,
                self.max_weight,
                self.mutation_rate,
                rng,
            )?;
            next.push(Individual::new(first.network.with_weights(child)?));
        }

        Ok(Population { individuals: next })
    }
}

/// Returns the fittest of `tournament_size` distinct random individuals.
fn tournament_select<'a, R>(
    population: &'a [Individual],
    tournament_size: usize,
    rng: &mut R,
) -> Result<&'a Individual, TrainingError>
where
    R: Rng + ?Sized,
{
    population
        .choose_multiple(rng, tournament_size)
        .max_by(|a, b| a.fitness.total_cmp(&b.fitness))
        .ok_or(TrainingError::EmptyPopulation)
}
