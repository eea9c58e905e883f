use std::path::{Path, PathBuf};

use chrono::Utc;
use gapwing_evaluator::{
    GenerationEvaluator,
    decision::{OUTPUT_LEN, SENSOR_LEN},
};
use gapwing_training::{
    genetic::{Population, PopulationEvolver},
    trainer::Trainer,
};

use super::SimulationArg;
use crate::{
    schema::model::TrainedModel,
    util,
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    #[clap(flatten)]
    simulation: SimulationArg,
    /// Generation index to stop before
    #[arg(long, default_value_t = 25)]
    generations: u64,
    /// Number of individuals in a fresh population
    #[arg(long, default_value_t = 50)]
    population: usize,
    /// Hidden layer sizes of a fresh population, comma separated
    #[arg(long, value_delimiter = ',', default_value = "6")]
    hidden: Vec<usize>,
    /// Write a checkpoint every N generations (0 disables checkpoints)
    #[arg(long, default_value_t = 5)]
    checkpoint_every: u64,
    /// Directory checkpoints are written to
    #[arg(long, default_value = ".")]
    checkpoint_dir: PathBuf,
    /// Continue from a checkpoint instead of a fresh population
    #[arg(long)]
    resume: Option<PathBuf>,
    /// Model name
    #[arg(long, default_value = "gapwing")]
    name: String,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

impl TrainArg {
    fn layers(&self) -> Vec<usize> {
        let mut layers = Vec::with_capacity(self.hidden.len() + 2);
        layers.push(SENSOR_LEN);
        layers.extend(self.hidden.iter().copied().filter(|size| *size > 0));
        layers.push(OUTPUT_LEN);
        layers
    }
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let evaluator = GenerationEvaluator::new(arg.simulation.generation_config()?);
    let mut trainer = match &arg.resume {
        Some(path) => {
            if arg.simulation.has_seed() {
                log::warn!("--seed is ignored when resuming; the checkpoint's run seed is used");
            }
            let checkpoint = util::read_checkpoint_file(path)?;
            log::info!(
                "Resuming from {} at generation {}",
                path.display(),
                checkpoint.generation
            );
            Trainer::resume(evaluator, checkpoint)?
        }
        None => {
            let evolver = PopulationEvolver::default();
            let layers = arg.layers();
            let run_seed = arg.simulation.seed();
            log::info!(
                "Training {} networks {layers:?} with run seed {run_seed}",
                arg.population
            );
            let population = Population::random(
                arg.population,
                &layers,
                evolver.max_weight,
                &mut rand::rng(),
            )?;
            Trainer::new(evaluator, evolver, run_seed, population)?
        }
    };

    while trainer.generation() < arg.generations {
        trainer.run_generation()?;
        let done = trainer.generation();
        if arg.checkpoint_every > 0 && done % arg.checkpoint_every == 0 {
            save_checkpoint(&trainer, &arg.checkpoint_dir)?;
        }
    }

    let best = trainer
        .best()
        .ok_or_else(|| anyhow::anyhow!("no generation was run"))?;
    let model = TrainedModel::from_individual(arg.name.clone(), Utc::now(), best);
    util::write_json(&model, arg.output.as_deref())?;

    log::info!("Model saved successfully");
    if let Some(path) = &arg.output {
        log::info!("  Path: {}", path.display());
    }
    log::info!("  Name: {}", model.name);
    log::info!("  Trained at: {}", model.trained_at);
    log::info!("  Final fitness: {:.3}", model.final_fitness);
    log::info!("  Layers: {:?}", model.layers);

    Ok(())
}

fn save_checkpoint(trainer: &Trainer, dir: &Path) -> anyhow::Result<()> {
    let checkpoint = trainer.checkpoint();
    let path = dir.join(checkpoint.file_name());
    util::write_json(&checkpoint, Some(path.as_path()))?;
    log::info!("Saved checkpoint {}", path.display());
    Ok(())
}
