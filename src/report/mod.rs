pub mod xlsx;

use crate::core::config::Config;
use crate::core::pipeline::HarvestOutcome;
use crate::core::row::{NormalizedRow, FIELDS};
use std::path::Path;

pub const NOTES_SHEET: &str = "Metadata_Notes";

/// One named table of string rows
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    /// Header row followed by one row per record
    pub fn from_rows(name: impl Into<String>, rows: &[NormalizedRow]) -> Self {
        let mut sheet = Self::new(name);
        sheet.rows.push(FIELDS.iter().map(|f| f.to_string()).collect());
        sheet.rows.extend(rows.iter().map(NormalizedRow::to_cells));
        sheet
    }

    pub fn push_line(&mut self, line: impl Into<String>) {
        self.rows.push(vec![line.into()]);
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "ON"
    } else {
        "OFF"
    }
}

/// Free-text provenance rows describing how the dataset was produced
pub fn notes_sheet(outcome: &HarvestOutcome, config: &Config, generated: &str) -> Sheet {
    let mut notes = Sheet::new(NOTES_SHEET);
    let region = &config.region;

    notes.push_line("Notes");
    notes.push_line(format!(
        "Dataset compiled via NCBI E-utilities ({} database)",
        config.entrez.database
    ));
    let bounds = if region.use_latlon_box {
        format!(
            "lat {}..{}, lon {}..{}",
            region.bounds.lat_min, region.bounds.lat_max, region.bounds.lon_min, region.bounds.lon_max
        )
    } else {
        "off".to_string()
    };
    notes.push_line(format!(
        "Region filter: {}; lat/lon box={}",
        on_off(region.enabled),
        bounds
    ));
    notes.push_line(format!("eDNA split: {}", on_off(config.edna.enabled)));
    for term in config.search.terms.iter().filter(|t| !t.trim().is_empty()) {
        notes.push_line(format!("Search term: {}", term));
    }
    if outcome.unique_ids > 0 {
        notes.push_line(format!("Unique IDs searched: {}", outcome.unique_ids));
    }
    notes.push_line(format!(
        "Final counts: Individuals={}; eDNA={}; parsed records={}; failed batches={}",
        outcome.individuals.len(),
        outcome.edna.len(),
        outcome.diagnostics.records,
        outcome.failed_batches
    ));
    notes.push_line(format!("Columns: {}", FIELDS.join(", ")));
    notes.push_line(format!("Generated UTC: {}", generated));
    notes
}

/// The three sheets in workbook order: Individuals, eDNA, notes.
pub fn build_sheets(outcome: &HarvestOutcome, config: &Config) -> Vec<Sheet> {
    let generated = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string();
    let prefix = &config.output.sheet_prefix;

    vec![
        Sheet::from_rows(format!("{}_Individuals", prefix), &outcome.individuals),
        Sheet::from_rows(format!("{}_eDNA", prefix), &outcome.edna),
        notes_sheet(outcome, config, &generated),
    ]
}

/// Build and write the workbook for `outcome`.
pub fn write_report<P: AsRef<Path>>(path: P, outcome: &HarvestOutcome, config: &Config) -> crate::Result<()> {
    let sheets = build_sheets(outcome, config);
    xlsx::write_xlsx(path.as_ref(), &sheets, &config.entrez.tool)?;
    tracing::info!("Saved: {}", path.as_ref().display());
    Ok(())
}
