use std::path::PathBuf;

use clap::{Parser, Subcommand};
use gapwing_engine::{IdleBehavior, course::CourseSeed};
use gapwing_evaluator::{ClearancePolicy, GenerationConfig};
use rand::Rng as _;

use self::{config::ConfigArg, evaluate::EvaluateArg, train::TrainArg};
use crate::util;

mod config;
mod evaluate;
mod train;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Evolve a population of networks on fresh courses
    Train(#[clap(flatten)] TrainArg),
    /// Run one generation with a trained model or a heuristic
    Evaluate(#[clap(flatten)] EvaluateArg),
    /// Print the default generation configuration as JSON
    Config(#[clap(flatten)] ConfigArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Train(arg) => train::run(&arg)?,
        Mode::Evaluate(arg) => evaluate::run(&arg)?,
        Mode::Config(arg) => config::run(&arg)?,
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum IdleArg {
    Coast,
    Hold,
    Decide,
}

impl From<IdleArg> for IdleBehavior {
    fn from(value: IdleArg) -> Self {
        match value {
            IdleArg::Coast => IdleBehavior::Coast,
            IdleArg::Hold => IdleBehavior::Hold,
            IdleArg::Decide => IdleBehavior::Decide,
        }
    }
}

/// Spelled as in the configuration file (`every-tick`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum PolicyArg {
    Once,
    #[value(alias = "everytick")]
    EveryTick,
}

impl From<PolicyArg> for ClearancePolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Once => ClearancePolicy::Once,
            PolicyArg::EveryTick => ClearancePolicy::EveryTick,
        }
    }
}

/// Options shared by every command that runs generations.
#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct SimulationArg {
    /// Generation configuration JSON file (see `gapwing config`)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed for the course, or for the whole run when training
    #[arg(long)]
    seed: Option<u64>,
    /// What agents do while no obstacle exists
    #[arg(long, value_enum)]
    idle: Option<IdleArg>,
    /// How often a cleared obstacle is credited
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,
    /// End each generation after this many ticks
    #[arg(long)]
    max_ticks: Option<u64>,
}

impl SimulationArg {
    /// Configuration file contents (or the command-line defaults) with flags applied.
    ///
    /// Without a configuration file, agents consult their decision function on an
    /// empty course instead of coasting.
    pub(crate) fn generation_config(&self) -> anyhow::Result<GenerationConfig> {
        let mut config = match &self.config {
            Some(path) => util::read_json_file("generation config", path)?,
            None => default_generation_config(),
        };
        if let Some(idle) = self.idle {
            config.simulation.physics.idle = idle.into();
        }
        if let Some(policy) = self.policy {
            config.scoring.policy = policy.into();
        }
        if self.max_ticks.is_some() {
            config.max_ticks = self.max_ticks;
        }
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn seed(&self) -> CourseSeed {
        self.seed
            .map_or_else(|| rand::rng().random(), CourseSeed::from_u64)
    }

    pub(crate) fn has_seed(&self) -> bool {
        self.seed.is_some()
    }
}

pub(crate) fn default_generation_config() -> GenerationConfig {
    let mut config = GenerationConfig::default();
    config.simulation.physics.idle = IdleBehavior::Decide;
    config
}
