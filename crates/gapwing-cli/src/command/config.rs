use std::path::PathBuf;

use crate::util;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ConfigArg {
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &ConfigArg) -> anyhow::Result<()> {
    let ConfigArg { output } = arg;
    util::write_json(&super::default_generation_config(), output.as_deref())?;
    if let Some(path) = output {
        log::info!("Default configuration written to {}", path.display());
    }
    Ok(())
}
