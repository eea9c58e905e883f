//! Neuro-evolution of obstacle course agents.
//!
//! This crate is the population side of the harness. It owns a population of
//! fixed-topology feed-forward networks, lets `gapwing-evaluator` score them and breeds
//! the next generation from the results. It only talks to the evaluator through its
//! public interface: networks become [`DecisionFunction`]s, fitness comes back through
//! the entrants' fitness slots.
//!
//! # How Training Works
//!
//! 1. **Population** - Start with random network weights
//! 2. **Evaluation** - All networks fly one generation on a fresh course
//! 3. **Selection** - Keep the elites, pick parents by tournament
//! 4. **Reproduction** - BLX-α crossover and Gaussian mutation
//! 5. **Repeat** - For the configured number of generations
//!
//! # Architecture
//!
//! ```text
//! Trainer (run seed, generation counter, checkpoints)
//!     ↓ drives
//! Population / PopulationEvolver
//!     ↓ evaluated by
//! GenerationEvaluator (gapwing-evaluator)
//!     ↓ queries
//! FeedForwardNetwork (as a DecisionFunction)
//! ```
//!
//! # Example
//!
//! ```
//! use gapwing_engine::course::CourseSeed;
//! use gapwing_evaluator::{GenerationConfig, GenerationEvaluator};
//! use gapwing_training::{
//!     genetic::{Population, PopulationEvolver},
//!     network::DEFAULT_LAYERS,
//!     trainer::Trainer,
//! };
//!
//! let mut config = GenerationConfig::default();
//! config.max_ticks = Some(300);
//! let population = Population::random(6, &DEFAULT_LAYERS, 2.0, &mut rand::rng()).unwrap();
//! let mut trainer = Trainer::new(
//!     GenerationEvaluator::new(config),
//!     PopulationEvolver::default(),
//!     CourseSeed::from_u64(3),
//!     population,
//! )
//! .unwrap();
//!
//! let summary = trainer.run_generation().unwrap();
//! assert_eq!(summary.generation, 0);
//! assert_eq!(trainer.population().len(), 6);
//! ```
//!
//! [`DecisionFunction`]: gapwing_evaluator::DecisionFunction

pub mod genetic;
pub mod network;
pub mod stats;
pub mod trainer;
pub mod weights;
