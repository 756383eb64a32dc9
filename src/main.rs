use clap::Parser;
use colored::*;
use marker_harvest::cli::{Cli, Commands};
use marker_harvest::HarvestError;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // MARKER_HARVEST_LOG wins; -v raises the default to debug
    let default_level = if cli.verbose > 0 { "debug" } else { "info" };
    let log_level =
        std::env::var("MARKER_HARVEST_LOG").unwrap_or_else(|_| default_level.to_string());

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);

        let exit_code = match e.downcast_ref::<HarvestError>() {
            Some(HarvestError::Config(_)) => 2,
            Some(HarvestError::Io(_)) => 3,
            Some(HarvestError::Parse(_)) | Some(HarvestError::Xml(_)) => 4,
            Some(HarvestError::Transport { .. }) | Some(HarvestError::Http(_)) => 5,
            _ => 1,
        };
        process::exit(exit_code);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Fetch(args) => marker_harvest::cli::commands::fetch::run(args),
        Commands::Classify(args) => marker_harvest::cli::commands::classify::run(args),
        Commands::Config(args) => marker_harvest::cli::commands::config::run(args),
    }
}
