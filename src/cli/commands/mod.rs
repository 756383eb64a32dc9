pub mod classify;
pub mod config;
pub mod fetch;

use crate::core::config::{load_config, Config, Preset};
use clap::Args;
use colored::*;
use std::path::PathBuf;

/// Options shared by every command that runs the classifier
#[derive(Args, Debug, Clone, Default)]
pub struct RunOptions {
    /// Configuration file (TOML); missing sections use preset defaults
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Preset used when no configuration file is given
    #[arg(short = 'p', long, value_name = "PRESET")]
    pub preset: Option<Preset>,

    /// Output workbook path
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Disable the coastal region filter
    #[arg(long)]
    pub no_region_filter: bool,

    /// Disable the eDNA split (every kept record becomes an individual)
    #[arg(long)]
    pub no_edna: bool,
}

impl RunOptions {
    /// Load the file or preset, then apply command-line overrides.
    pub fn resolve(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::debug!("loading configuration from {}", path.display());
                load_config(path)?
            }
            None => Config::from_preset(self.preset.unwrap_or_default()),
        };

        if let Some(output) = &self.output {
            config.output.path = output.clone();
        }
        if self.no_region_filter {
            config.region.enabled = false;
        }
        if self.no_edna {
            config.edna.enabled = false;
        }
        Ok(config)
    }
}

pub(crate) fn print_summary(outcome: &crate::core::pipeline::HarvestOutcome, config: &Config) {
    println!();
    println!("{}", "Harvest summary".bold());
    if outcome.unique_ids > 0 {
        println!("  {} {}", "Unique IDs:".green(), outcome.unique_ids);
    }
    println!("  {} {}", "Parsed records:".green(), outcome.diagnostics.records);
    println!("  {} {}", "Individuals:".green(), outcome.individuals.len());
    println!("  {} {}", "eDNA:".green(), outcome.edna.len());
    if config.region.enabled {
        let r = &outcome.diagnostics.reasons;
        println!(
            "  {} text={} latlon={} pacific={} none={}",
            "Region reasons:".green(),
            r.text,
            r.latlon,
            r.pacific,
            r.none
        );
        println!("  {} {}", "Dropped:".green(), outcome.diagnostics.dropped);
    }
    if outcome.failed_batches > 0 {
        println!(
            "  {} {}",
            "Failed batches:".yellow(),
            outcome.failed_batches
        );
    }
    println!(
        "{} Saved {}",
        "✓".green().bold(),
        config.output.path.display()
    );
}
