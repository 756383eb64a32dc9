use crate::core::config::{save_config, to_toml, Config, Preset};
use clap::Args;
use colored::*;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Preset to render
    #[arg(short = 'p', long, default_value = "region-aware")]
    pub preset: Preset,

    /// Write to this file instead of printing
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

pub fn run(args: ConfigArgs) -> anyhow::Result<()> {
    let config = Config::from_preset(args.preset);

    match args.output {
        Some(path) => {
            save_config(&path, &config)?;
            println!(
                "{} Wrote {} preset to {}",
                "✓".green().bold(),
                args.preset,
                path.display()
            );
        }
        None => print!("{}", to_toml(&config)?),
    }
    Ok(())
}
