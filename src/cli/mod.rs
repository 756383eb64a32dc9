pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "marker-harvest",
    version,
    about = "Harvest marker-gene records from NCBI into a spreadsheet",
    long_about = "marker-harvest queries NCBI nucleotide records through E-utilities, detects \
                  COI/18S/28S/ITS markers, filters records to a coastal region, separates \
                  environmental (eDNA) samples from individual specimens and writes an XLSX workbook."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (can be repeated)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search, fetch and classify records, then write the workbook
    Fetch(commands::fetch::FetchArgs),

    /// Classify previously saved efetch XML files without touching the network
    Classify(commands::classify::ClassifyArgs),

    /// Print or write a preset configuration as TOML
    Config(commands::config::ConfigArgs),
}
