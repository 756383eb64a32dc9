//! eDNA/individual classification, region routing and row building.

use crate::bio::citation::first_reference_doi;
use crate::bio::coords::parse_lat_lon;
use crate::bio::markers::MarkerFlags;
use crate::bio::record::RawSequenceRecord;
use crate::bio::region::{MatchReason, RegionDecision, RegionMatcher};
use crate::core::config::{Config, EdnaConfig};
use crate::core::row::{DataType, NormalizedRow};

/// Characters of the definition kept in a drop sample
const DROP_DEFINITION_CHARS: usize = 80;

/// What made a record look like an environmental sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdnaEvidence {
    Qualifier,
    Keyword,
}

/// eDNA detector built from [`EdnaConfig`]
#[derive(Debug, Clone)]
pub struct EdnaDetector {
    keywords: Vec<String>,
    marker_qualifiers: Vec<String>,
}

impl EdnaDetector {
    pub fn new(config: &EdnaConfig) -> Self {
        Self {
            keywords: config.keywords.iter().map(|k| k.to_lowercase()).collect(),
            marker_qualifiers: config
                .marker_qualifiers
                .iter()
                .map(|q| q.to_lowercase())
                .collect(),
        }
    }

    pub fn detect(&self, record: &RawSequenceRecord, feature_text: &str) -> Option<EdnaEvidence> {
        if self
            .marker_qualifiers
            .iter()
            .any(|q| record.qualifier_names.contains(q))
        {
            return Some(EdnaEvidence::Qualifier);
        }

        let blob = format!(
            " {} {} {} ",
            record.locality, record.definition, feature_text
        )
        .to_lowercase();
        self.keywords
            .iter()
            .any(|k| !k.is_empty() && blob.contains(k.as_str()))
            .then_some(EdnaEvidence::Keyword)
    }
}

/// Region reason tallies for one batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReasonCounts {
    pub text: usize,
    pub latlon: usize,
    pub pacific: usize,
    pub disabled: usize,
    pub none: usize,
}

impl ReasonCounts {
    pub fn record(&mut self, reason: MatchReason) {
        match reason {
            MatchReason::Text => self.text += 1,
            MatchReason::LatLon => self.latlon += 1,
            MatchReason::Pacific => self.pacific += 1,
            MatchReason::Disabled => self.disabled += 1,
            MatchReason::None => self.none += 1,
        }
    }

    pub fn merge(&mut self, other: &ReasonCounts) {
        self.text += other.text;
        self.latlon += other.latlon;
        self.pacific += other.pacific;
        self.disabled += other.disabled;
        self.none += other.none;
    }
}

/// A dropped record kept for the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropSample {
    pub accession: String,
    pub locality: String,
    pub definition: String,
    pub edna: bool,
}

impl std::fmt::Display for DropSample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = if self.edna { "drop(eDNA)" } else { "drop" };
        let accession = if self.accession.is_empty() {
            "?"
        } else {
            &self.accession
        };
        write!(
            f,
            "{}: {} | loc='{}' | def='{}'",
            tag, accession, self.locality, self.definition
        )
    }
}

/// Observability counters; not part of the output data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchDiagnostics {
    /// Records parsed from the response, before any filtering
    pub records: usize,
    pub reasons: ReasonCounts,
    pub dropped: usize,
    pub samples: Vec<DropSample>,
}

impl BatchDiagnostics {
    /// Sum counters and keep every batch's drop samples.
    pub fn merge(&mut self, other: &BatchDiagnostics) {
        self.records += other.records;
        self.reasons.merge(&other.reasons);
        self.dropped += other.dropped;
        self.samples.extend(other.samples.iter().cloned());
    }
}

/// Rows kept from one batch, split by data type
#[derive(Debug, Clone, Default)]
pub struct RoutedBatch {
    pub individuals: Vec<NormalizedRow>,
    pub edna: Vec<NormalizedRow>,
    pub diagnostics: BatchDiagnostics,
}

pub struct Classifier {
    region: RegionMatcher,
    edna: EdnaDetector,
    edna_enabled: bool,
    edna_relaxed: bool,
    show_drops: usize,
}

impl Classifier {
    pub fn new(config: &Config) -> Self {
        Self {
            region: RegionMatcher::new(&config.region),
            edna: EdnaDetector::new(&config.edna),
            edna_enabled: config.edna.enabled,
            edna_relaxed: config.edna.relaxed_region,
            show_drops: config.diagnostics.show_drops,
        }
    }

    /// Classify, filter and convert records, preserving input order.
    pub fn route(&self, records: &[RawSequenceRecord]) -> RoutedBatch {
        let mut batch = RoutedBatch::default();
        batch.diagnostics.records = records.len();
        let region_on = self.region.is_enabled();

        for record in records {
            let feature_text = record.feature_text();
            let decision = self.region.decide(
                &record.locality,
                &record.definition,
                &feature_text,
                &record.lat_lon_raw,
            );
            batch.diagnostics.reasons.record(decision.reason);

            let is_edna = self.edna_enabled && self.classify_edna(record, &feature_text);

            if !self.keep(is_edna, region_on, decision) {
                batch.diagnostics.dropped += 1;
                if batch.diagnostics.samples.len() < self.show_drops {
                    batch.diagnostics.samples.push(DropSample {
                        accession: record.accession.clone(),
                        locality: record.locality.clone(),
                        definition: record
                            .definition
                            .chars()
                            .take(DROP_DEFINITION_CHARS)
                            .collect(),
                        edna: is_edna,
                    });
                }
                continue;
            }

            let data_type = if is_edna {
                DataType::Edna
            } else {
                DataType::Individual
            };
            let row = build_row(record, &feature_text, data_type);

            match data_type {
                DataType::Edna => batch.edna.push(row),
                DataType::Individual => batch.individuals.push(row),
            }
        }

        if region_on {
            let r = &batch.diagnostics.reasons;
            tracing::info!(
                "region reasons this batch: text={}, latlon={}, pacific={}",
                r.text,
                r.latlon,
                r.pacific
            );
            tracing::info!("region drops in this batch: {}", batch.diagnostics.dropped);
            for sample in &batch.diagnostics.samples {
                tracing::info!("{}", sample);
            }
        }

        batch
    }

    fn classify_edna(&self, record: &RawSequenceRecord, feature_text: &str) -> bool {
        match self.edna.detect(record, feature_text) {
            Some(evidence) => {
                tracing::debug!("{} classified as eDNA ({:?})", record.accession, evidence);
                true
            }
            None => false,
        }
    }

    fn keep(&self, is_edna: bool, region_on: bool, decision: RegionDecision) -> bool {
        if !region_on || decision.matched {
            return true;
        }
        is_edna && self.edna_relaxed
    }
}

/// Build the output row for a record that passed routing.
pub fn build_row(record: &RawSequenceRecord, feature_text: &str, data_type: DataType) -> NormalizedRow {
    let markers = MarkerFlags::detect(&record.definition, feature_text);
    if markers.is_empty() {
        tracing::debug!("{}: no marker keywords", record.accession);
    } else {
        tracing::debug!("{}: markers {:?}", record.accession, markers.detected());
    }
    let (latitude, longitude) = parse_lat_lon(&record.lat_lon_raw);

    NormalizedRow {
        species_id: record.organism.clone(),
        latitude,
        longitude,
        locality: record.locality.clone(),
        depth: record.depth.clone(),
        collection_date: record.collection_date.clone(),
        citation_doi: first_reference_doi(&record.references),
        ..NormalizedRow::with_markers(&record.accession, markers, data_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn record(accession: &str, definition: &str, locality: &str, lat_lon: &str) -> RawSequenceRecord {
        RawSequenceRecord {
            accession: accession.to_string(),
            organism: "Echiniscoides sigismundi".to_string(),
            definition: definition.to_string(),
            locality: locality.to_string(),
            lat_lon_raw: lat_lon.to_string(),
            ..Default::default()
        }
    }

    fn edna_record(accession: &str) -> RawSequenceRecord {
        RawSequenceRecord {
            accession: accession.to_string(),
            organism: "Tardigrada environmental sample".to_string(),
            definition: "Uncultured eukaryote 18S rRNA gene".to_string(),
            qualifier_names: BTreeSet::from(["environmental_sample".to_string()]),
            ..Default::default()
        }
    }

    #[test]
    fn test_out_of_region_individual_is_dropped() {
        let classifier = Classifier::new(&Config::region_aware());
        let batch = classifier.route(&[
            record("A1", "COI gene", "Japan: Hokkaido", "43 N 141 E"),
            record("A2", "COI gene", "USA: Oregon: Coos Bay", ""),
        ]);

        assert_eq!(batch.individuals.len(), 1);
        assert_eq!(batch.individuals[0].coi, "A2");
        assert_eq!(batch.diagnostics.dropped, 1);
        assert_eq!(batch.diagnostics.reasons.text, 1);
        assert_eq!(batch.diagnostics.reasons.none, 1);
        assert_eq!(batch.diagnostics.samples[0].accession, "A1");
        assert!(!batch.diagnostics.samples[0].edna);
    }

    #[test]
    fn test_relaxed_edna_survives_region_miss() {
        let classifier = Classifier::new(&Config::region_aware());
        let batch = classifier.route(&[edna_record("E1")]);
        assert_eq!(batch.edna.len(), 1);
        assert_eq!(batch.edna[0].data_type, DataType::Edna);
        assert_eq!(batch.edna[0].ssu_18s, "E1");
    }

    #[test]
    fn test_strict_edna_is_dropped_outside_region() {
        let mut config = Config::region_aware();
        config.edna.relaxed_region = false;
        let batch = Classifier::new(&config).route(&[edna_record("E1")]);

        assert!(batch.edna.is_empty());
        assert_eq!(batch.diagnostics.dropped, 1);
        assert!(batch.diagnostics.samples[0].edna);
        assert!(batch.diagnostics.samples[0].to_string().starts_with("drop(eDNA): E1"));
    }

    #[test]
    fn test_edna_disabled_routes_as_individual() {
        let mut config = Config::region_aware();
        config.edna.enabled = false;
        config.region.enabled = false;
        let batch = Classifier::new(&config).route(&[edna_record("E1")]);

        assert!(batch.edna.is_empty());
        assert_eq!(batch.individuals.len(), 1);
        assert_eq!(batch.individuals[0].data_type, DataType::Individual);
        assert_eq!(batch.diagnostics.reasons.disabled, 1);
    }

    #[test]
    fn test_edna_disabled_applies_individual_region_rule() {
        let mut config = Config::region_aware();
        config.edna.enabled = false;
        let batch = Classifier::new(&config).route(&[edna_record("E1")]);
        assert!(batch.individuals.is_empty());
        assert!(batch.edna.is_empty());
        assert_eq!(batch.diagnostics.dropped, 1);
    }

    #[test]
    fn test_keyword_classifies_edna() {
        let detector = EdnaDetector::new(&Config::region_aware().edna);
        let rec = record("K1", "Metabarcoding of marine sediment", "", "");
        assert_eq!(detector.detect(&rec, ""), Some(EdnaEvidence::Keyword));
        assert_eq!(detector.detect(&record("K2", "COI gene", "", ""), ""), None);
    }

    #[test]
    fn test_drop_samples_are_bounded_and_truncated() {
        let mut config = Config::region_aware();
        config.diagnostics.show_drops = 2;
        let long_def = "x".repeat(200);
        let records: Vec<_> = (0..5)
            .map(|i| record(&format!("D{i}"), &long_def, "Norway", ""))
            .collect();

        let batch = Classifier::new(&config).route(&records);
        assert_eq!(batch.diagnostics.dropped, 5);
        assert_eq!(batch.diagnostics.samples.len(), 2);
        assert_eq!(batch.diagnostics.samples[0].definition.len(), 80);
    }

    #[test]
    fn test_row_fields_are_populated() {
        let mut rec = record("MN1.1", "18S rRNA and ITS2", "USA: California", "36.5 N 121.9 W");
        rec.depth = "10 m".to_string();
        rec.collection_date = "2020-01-02".to_string();

        let row = build_row(&rec, "", DataType::Individual);
        assert_eq!(row.species_id, "Echiniscoides sigismundi");
        assert_eq!((row.latitude.as_str(), row.longitude.as_str()), ("36.5", "-121.9"));
        assert_eq!(row.ssu_18s, "MN1.1");
        assert_eq!(row.its2, "MN1.1");
        assert_eq!(row.coi, "");
        assert_eq!(row.depth, "10 m");
        assert_eq!(row.population_representation, "");
    }
}
