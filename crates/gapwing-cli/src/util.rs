use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Write},
    path::Path,
};

use anyhow::Context;
use gapwing_training::trainer::Checkpoint;

use crate::schema::model::TrainedModel;

/// Pretty-print `value` as JSON to `path`, or to stdout when no path is given.
///
/// Missing parent directories of `path` are created.
pub fn write_json<T>(value: &T, path: Option<&Path>) -> anyhow::Result<()>
where
    T: serde::Serialize,
{
    let Some(path) = path else {
        return write_pretty(io::stdout().lock(), value).context("Failed to write JSON to stdout");
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    write_pretty(BufWriter::new(file), value)
        .with_context(|| format!("Failed to write JSON to {}", path.display()))
}

fn write_pretty<W, T>(mut writer: W, value: &T) -> anyhow::Result<()>
where
    W: Write,
    T: serde::Serialize,
{
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {file_kind} file: {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {file_kind} JSON file: {}", path.display()))
}

/// Read a trained model from a JSON file
pub fn read_model_file<P>(path: P) -> anyhow::Result<TrainedModel>
where
    P: AsRef<Path>,
{
    read_json_file("model", path)
}

/// Read a training checkpoint from a JSON file
///
/// The population inside is validated while parsing: a network whose weight
/// count does not match its layers is rejected.
pub fn read_checkpoint_file<P>(path: P) -> anyhow::Result<Checkpoint>
where
    P: AsRef<Path>,
{
    read_json_file("checkpoint", path)
}

#[cfg(test)]
mod tests {
    use std::{env, process};

    use gapwing_evaluator::GenerationConfig;

    use super::*;

    #[test]
    fn test_written_config_reads_back_from_nested_directory() {
        let root = env::temp_dir().join(format!("gapwing-util-{}", process::id()));
        let path = root.join("runs").join("config.json");
        let mut config = GenerationConfig::default();
        config.max_ticks = Some(321);

        write_json(&config, Some(path.as_path())).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        let back: GenerationConfig = read_json_file("generation config", &path).unwrap();
        fs::remove_dir_all(&root).unwrap();

        assert!(text.ends_with("}\n"));
        assert_eq!(back, config);
    }

    #[test]
    fn test_missing_file_names_its_kind() {
        let path = env::temp_dir().join("gapwing-util-missing").join("model.json");
        let err = read_model_file(&path).unwrap_err();
        assert!(err.to_string().starts_with("Failed to open model file"));
    }
}
