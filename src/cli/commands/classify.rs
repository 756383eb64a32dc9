use crate::cli::commands::{print_summary, RunOptions};
use crate::core::pipeline::classify_bodies;
use crate::report::write_report;
use anyhow::Context;
use clap::Args;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// efetch XML files, or directories containing them
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<PathBuf>,

    #[command(flatten)]
    pub options: RunOptions,
}

/// Expand directories to their `.xml` entries, sorted by name.
pub fn collect_inputs(inputs: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(input)
                .with_context(|| format!("Failed to read directory {}", input.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| is_xml(p))
                .collect();
            entries.sort();
            files.extend(entries);
        } else {
            files.push(input.clone());
        }
    }
    Ok(files)
}

fn is_xml(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("xml"))
            .unwrap_or(false)
}

pub fn run(args: ClassifyArgs) -> anyhow::Result<()> {
    let config = args.options.resolve()?;
    config.validate_classification()?;

    let files = collect_inputs(&args.inputs)?;
    if files.is_empty() {
        anyhow::bail!("No XML files found in the given inputs");
    }

    let mut bodies = Vec::with_capacity(files.len());
    for file in &files {
        tracing::info!("reading {}", file.display());
        bodies.push(std::fs::read(file)?);
    }

    let outcome = classify_bodies(&config, &bodies);
    write_report(&config.output.path, &outcome, &config)?;
    print_summary(&outcome, &config);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_inputs_expands_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.xml"), "<GBSet/>").unwrap();
        std::fs::write(dir.path().join("a.XML"), "<GBSet/>").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "skip").unwrap();
        let extra = PathBuf::from("explicit.gb");

        let files = collect_inputs(&[dir.path().to_path_buf(), extra.clone()]).unwrap();
        assert_eq!(
            files,
            vec![dir.path().join("a.XML"), dir.path().join("b.xml"), extra]
        );
    }
}
