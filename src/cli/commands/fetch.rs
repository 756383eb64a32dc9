use crate::cli::commands::{print_summary, RunOptions};
use crate::core::pipeline::Harvester;
use crate::download::EntrezClient;
use crate::report::write_report;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Args, Debug)]
pub struct FetchArgs {
    #[command(flatten)]
    pub options: RunOptions,

    /// Contact e-mail sent with every request
    #[arg(short, long, env = "NCBI_EMAIL")]
    pub email: Option<String>,

    /// Search term (repeatable); replaces the configured terms
    #[arg(short = 't', long = "term", value_name = "QUERY")]
    pub terms: Vec<String>,

    /// Maximum number of record IDs across all terms
    #[arg(short = 'n', long)]
    pub max_records: Option<usize>,

    /// Target database (nucleotide or nuccore)
    #[arg(long)]
    pub database: Option<String>,

    /// Save the raw XML of the first N efetch batches
    #[arg(long, value_name = "N")]
    pub dump_xml: Option<usize>,
}

pub fn run(args: FetchArgs) -> anyhow::Result<()> {
    let mut config = args.options.resolve()?;

    if let Some(email) = args.email {
        config.entrez.email = email;
    }
    if !args.terms.is_empty() {
        config.search.terms = args.terms;
    }
    if let Some(max) = args.max_records {
        config.search.max_records = max;
    }
    if let Some(db) = args.database {
        config.entrez.database = db;
    }
    if let Some(n) = args.dump_xml {
        config.diagnostics.write_debug_xml = n > 0;
        config.diagnostics.debug_xml_limit = n;
    }
    config.validate()?;

    tracing::info!(
        "region filter={}, eDNA split={}, database={}",
        config.region.enabled,
        config.edna.enabled,
        config.entrez.database
    );

    let client = EntrezClient::new(&config.entrez)?;
    let mut harvester = Harvester::new(client, config);

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );
    pb.set_message("searching...");

    let outcome = harvester.run(|batch, total, rows| {
        pb.set_length(total as u64);
        pb.set_position(batch as u64);
        pb.set_message(format!("{} rows", rows));
    })?;
    pb.finish_and_clear();

    let config = harvester.config();
    write_report(&config.output.path, &outcome, config)?;
    print_summary(&outcome, config);
    Ok(())
}
