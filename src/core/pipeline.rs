//! Batch-by-batch harvesting: search, fetch, classify, aggregate.

use crate::bio::record::{parse_batch, RawSequenceRecord};
use crate::core::classifier::{BatchDiagnostics, Classifier, RoutedBatch};
use crate::core::config::Config;
use crate::core::population::annotate_population;
use crate::core::row::NormalizedRow;
use crate::download::entrez::{fetch_params, search_ids, Endpoint, EutilsTransport};
use crate::{HarvestError, Result};
use std::collections::HashSet;
use std::path::PathBuf;

/// Everything a run produced, in discovery order
#[derive(Debug, Clone, Default)]
pub struct HarvestOutcome {
    pub individuals: Vec<NormalizedRow>,
    pub edna: Vec<NormalizedRow>,
    pub diagnostics: BatchDiagnostics,
    pub unique_ids: usize,
    pub batches: usize,
    /// Batches whose body was an error payload or unparseable
    pub failed_batches: usize,
}

impl HarvestOutcome {
    pub fn total_rows(&self) -> usize {
        self.individuals.len() + self.edna.len()
    }

    fn absorb(&mut self, routed: RoutedBatch) {
        self.individuals.extend(routed.individuals);
        self.edna.extend(routed.edna);
        self.diagnostics.merge(&routed.diagnostics);
    }
}

/// Turn an efetch body into records; malformed bodies degrade to zero records.
pub fn records_from_body(raw: &[u8], batch_index: usize) -> Option<Vec<RawSequenceRecord>> {
    match parse_batch(raw) {
        Ok(batch) => {
            match batch.schema {
                Some(schema) => {
                    tracing::info!(
                        "batch {}: format={}, nodes={}",
                        batch_index,
                        schema,
                        batch.records.len()
                    );
                }
                None => tracing::warn!(
                    "batch {}: no INSDSeq/GBSeq nodes. First bytes: {}",
                    batch_index,
                    snippet(raw)
                ),
            }
            Some(batch.records)
        }
        Err(HarvestError::Service(message)) => {
            tracing::warn!("batch {}: NCBI ERROR -> {}", batch_index, message);
            None
        }
        Err(e) => {
            tracing::warn!(
                "batch {}: {}. First bytes: {}",
                batch_index,
                e,
                snippet(raw)
            );
            None
        }
    }
}

fn snippet(raw: &[u8]) -> String {
    let end = raw.len().min(240);
    String::from_utf8_lossy(&raw[..end]).replace('\n', " ")
}

/// Sequential harvester over any [`EutilsTransport`].
pub struct Harvester<T: EutilsTransport> {
    transport: T,
    config: Config,
    classifier: Classifier,
}

impl<T: EutilsTransport> Harvester<T> {
    pub fn new(transport: T, config: Config) -> Self {
        let classifier = Classifier::new(&config);
        Self {
            transport,
            config,
            classifier,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run every search term, de-duplicate IDs in discovery order and cap the
    /// merged list at `search.max_records`.
    pub fn collect_ids(&mut self) -> Result<Vec<String>> {
        let terms: Vec<String> = self
            .config
            .search
            .terms
            .iter()
            .filter(|t| !t.trim().is_empty())
            .cloned()
            .collect();

        let mut seen = HashSet::new();
        let mut all_ids = Vec::new();

        for (idx, term) in terms.iter().enumerate() {
            tracing::info!("[search {}/{}] {}", idx + 1, terms.len(), term);
            let ids = search_ids(
                &mut self.transport,
                &self.config.entrez.database,
                term,
                &self.config.search,
                &self.config.diagnostics,
            )?;
            tracing::info!("  -> got {} IDs from esearch", ids.len());

            for id in ids {
                if seen.insert(id.clone()) {
                    all_ids.push(id);
                }
            }
        }

        all_ids.truncate(self.config.search.max_records);
        tracing::info!("Total unique IDs: {}", all_ids.len());
        Ok(all_ids)
    }

    /// Fetch one ID batch and route its records. Transport failures propagate;
    /// malformed bodies yield an empty batch.
    pub fn fetch_batch(&mut self, ids: &[String], batch_index: usize) -> Result<Option<RoutedBatch>> {
        let params = fetch_params(&self.config.entrez.database, ids);
        let raw = self.transport.execute(Endpoint::Fetch, &params)?;

        if let Some(path) = self.debug_dump_path(batch_index) {
            std::fs::write(&path, &raw)?;
            tracing::info!("wrote {} ({} bytes)", path.display(), raw.len());
        }

        Ok(records_from_body(&raw, batch_index).map(|records| self.route(&records)))
    }

    fn debug_dump_path(&self, batch_index: usize) -> Option<PathBuf> {
        let diag = &self.config.diagnostics;
        (diag.write_debug_xml && batch_index <= diag.debug_xml_limit)
            .then(|| diag.debug_dir.join(format!("debug_efetch_batch{}.xml", batch_index)))
    }

    pub fn route(&self, records: &[RawSequenceRecord]) -> RoutedBatch {
        let routed = self.classifier.route(records);
        tracing::info!(
            "kept (after region) -> individuals={}, eDNA={}",
            routed.individuals.len(),
            routed.edna.len()
        );
        routed
    }

    /// Full run. `on_batch` is called after each batch with
    /// `(batch number, total batches, rows so far)`.
    pub fn run<F>(&mut self, mut on_batch: F) -> Result<HarvestOutcome>
    where
        F: FnMut(usize, usize, usize),
    {
        let ids = self.collect_ids()?;
        let mut outcome = HarvestOutcome {
            unique_ids: ids.len(),
            ..Default::default()
        };
        if ids.is_empty() {
            tracing::info!("No IDs found.");
            return Ok(outcome);
        }

        let chunk = self.config.search.fetch_batch_size.max(1);
        let total_batches = ids.len().div_ceil(chunk);

        for (i, batch) in ids.chunks(chunk).enumerate() {
            let batch_index = i + 1;
            tracing::info!(
                "Fetching batch {}/{} ({} IDs)",
                batch_index,
                total_batches,
                batch.len()
            );
            match self.fetch_batch(batch, batch_index)? {
                Some(routed) => outcome.absorb(routed),
                None => outcome.failed_batches += 1,
            }
            outcome.batches += 1;
            tracing::info!("  cumulative rows so far: {}", outcome.total_rows());
            on_batch(batch_index, total_batches, outcome.total_rows());
        }

        self.finish(&mut outcome);
        Ok(outcome)
    }

    /// Post-pass over the accumulated rows
    pub fn finish(&self, outcome: &mut HarvestOutcome) {
        finish_outcome(&self.config, outcome);
    }
}

/// Population annotation plus the final count log line.
pub fn finish_outcome(config: &Config, outcome: &mut HarvestOutcome) {
    if config.population.enabled {
        annotate_population(&mut outcome.individuals, config.population.round_decimals);
    }
    tracing::info!(
        "Final counts | Individuals: {} | eDNA: {}",
        outcome.individuals.len(),
        outcome.edna.len()
    );
}

/// Offline variant of [`Harvester::run`] over efetch bodies already on disk.
pub fn classify_bodies(config: &Config, bodies: &[Vec<u8>]) -> HarvestOutcome {
    let classifier = Classifier::new(config);
    let mut outcome = HarvestOutcome::default();

    for (i, raw) in bodies.iter().enumerate() {
        match records_from_body(raw, i + 1) {
            Some(records) => outcome.absorb(classifier.route(&records)),
            None => outcome.failed_batches += 1,
        }
        outcome.batches += 1;
    }

    finish_outcome(config, &mut outcome);
    outcome
}
