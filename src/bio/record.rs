/// Sequence record normalization for INSDSeq and GBSeq XML
use crate::bio::citation::ReferenceNote;
use crate::bio::xml::{child_text, children_at, descendants};
use crate::HarvestError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Qualifier names that carry the raw coordinate string
const LAT_LON_QUALIFIERS: [&str; 4] = ["lat_lon", "lat-lon", "lat-long", "latlong"];

/// Qualifiers whose values become free-text feature notes
const NOTE_QUALIFIERS: [&str; 4] = ["gene", "product", "isolation_source", "note"];

/// One sequence record reduced to the fields classification needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSequenceRecord {
    pub accession: String,
    pub organism: String,
    pub definition: String,
    pub locality: String,
    pub lat_lon_raw: String,
    pub depth: String,
    pub collection_date: String,
    pub feature_notes: Vec<String>,
    /// Lower-cased qualifier names seen on `source` features
    pub qualifier_names: BTreeSet<String>,
    pub references: Vec<ReferenceNote>,
}

impl RawSequenceRecord {
    /// Feature notes joined with single spaces
    pub fn feature_text(&self) -> String {
        self.feature_notes.join(" ")
    }
}

/// Element names for one sequence-record vocabulary
#[derive(Debug)]
pub struct SchemaVocabulary {
    pub record: &'static str,
    pub accession_version: &'static str,
    pub primary_accession: &'static str,
    pub organism: &'static str,
    pub definition: &'static str,
    pub features: &'static str,
    pub feature_key: &'static str,
    pub qualifiers: &'static str,
    pub qualifier_name: &'static str,
    pub qualifier_value: &'static str,
    pub references: &'static str,
}

static INSD_VOCABULARY: SchemaVocabulary = SchemaVocabulary {
    record: "INSDSeq",
    accession_version: "INSDSeq_accession-version",
    primary_accession: "INSDSeq_primary-accession",
    organism: "INSDSeq_organism",
    definition: "INSDSeq_definition",
    features: "INSDSeq_feature-table/INSDFeature",
    feature_key: "INSDFeature_key",
    qualifiers: "INSDFeature_quals/INSDQualifier",
    qualifier_name: "INSDQualifier_name",
    qualifier_value: "INSDQualifier_value",
    references: "INSDSeq_references/INSDReference",
};

static GBSEQ_VOCABULARY: SchemaVocabulary = SchemaVocabulary {
    record: "GBSeq",
    accession_version: "GBSeq_accession-version",
    primary_accession: "GBSeq_primary-accession",
    organism: "GBSeq_organism",
    definition: "GBSeq_definition",
    features: "GBSeq_feature-table/GBFeature",
    feature_key: "GBFeature_key",
    qualifiers: "GBFeature_quals/GBQualifier",
    qualifier_name: "GBQualifier_name",
    qualifier_value: "GBQualifier_value",
    references: "GBSeq_references/GBReference",
};

/// The two equivalent record vocabularies efetch may return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeqSchema {
    Insd,
    GbSeq,
}

impl SeqSchema {
    /// Detection order: INSDSeq wins when both are present
    pub const PREFERENCE: [SeqSchema; 2] = [SeqSchema::Insd, SeqSchema::GbSeq];

    pub fn vocabulary(&self) -> &'static SchemaVocabulary {
        match self {
            SeqSchema::Insd => &INSD_VOCABULARY,
            SeqSchema::GbSeq => &GBSEQ_VOCABULARY,
        }
    }

    /// Normalize one record node of this vocabulary.
    pub fn normalize(&self, node: roxmltree::Node<'_, '_>) -> RawSequenceRecord {
        let vocab = self.vocabulary();

        let accession = Some(child_text(node, vocab.accession_version))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| child_text(node, vocab.primary_accession));

        let mut record = RawSequenceRecord {
            accession: accession.to_string(),
            organism: child_text(node, vocab.organism).to_string(),
            definition: child_text(node, vocab.definition).to_string(),
            ..Default::default()
        };

        for feature in children_at(node, vocab.features) {
            let is_source = child_text(feature, vocab.feature_key) == "source";

            for qualifier in children_at(feature, vocab.qualifiers) {
                let name = child_text(qualifier, vocab.qualifier_name).to_lowercase();
                let value = child_text(qualifier, vocab.qualifier_value);

                if is_source {
                    match name.as_str() {
                        "country" => record.locality = value.to_string(),
                        "depth" => record.depth = value.to_string(),
                        "collection_date" => record.collection_date = value.to_string(),
                        n if LAT_LON_QUALIFIERS.contains(&n) => {
                            record.lat_lon_raw = value.to_string()
                        }
                        _ => {}
                    }
                }

                if NOTE_QUALIFIERS.contains(&name.as_str()) && !value.is_empty() {
                    record.feature_notes.push(value.to_string());
                }

                if is_source {
                    record.qualifier_names.insert(name);
                }
            }
        }

        record.references = children_at(node, vocab.references)
            .into_iter()
            .map(ReferenceNote::from_node)
            .collect();

        record
    }
}

impl std::fmt::Display for SeqSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.vocabulary().record)
    }
}

/// Records recovered from one efetch response
#[derive(Debug, Clone, Default)]
pub struct ParsedBatch {
    /// `None` when neither record vocabulary was present
    pub schema: Option<SeqSchema>,
    pub records: Vec<RawSequenceRecord>,
}

/// Parse a raw efetch body into normalized records.
///
/// Service error payloads are reported as [`HarvestError::Service`]; bodies that
/// are not valid XML as [`HarvestError::Xml`] or [`HarvestError::Parse`]. A
/// well-formed document without any record nodes yields an empty batch.
pub fn parse_batch(raw: &[u8]) -> Result<ParsedBatch, HarvestError> {
    let text = std::str::from_utf8(raw)
        .map_err(|e| HarvestError::Parse(format!("efetch body is not UTF-8: {}", e)))?;

    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..roxmltree::ParsingOptions::default()
    };

    if text.contains("<eFetchResult>") && text.contains("<ERROR>") {
        let message = roxmltree::Document::parse_with_options(text, options)
            .map(|doc| {
                descendants(doc.root_element(), "ERROR")
                    .next()
                    .and_then(|n| n.text())
                    .unwrap_or("")
                    .trim()
                    .to_string()
            })
            .unwrap_or_else(|_| "(unparseable error XML)".to_string());
        return Err(HarvestError::Service(message));
    }

    let doc = roxmltree::Document::parse_with_options(text, options)?;
    let root = doc.root_element();

    for schema in SeqSchema::PREFERENCE {
        let nodes: Vec<_> = descendants(root, schema.vocabulary().record).collect();
        if !nodes.is_empty() {
            let records = nodes.into_iter().map(|n| schema.normalize(n)).collect();
            return Ok(ParsedBatch {
                schema: Some(schema),
                records,
            });
        }
    }

    Ok(ParsedBatch::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    const INSD_RECORD: &str = r#"<?xml version="1.0"?>
<!DOCTYPE INSDSet PUBLIC "-//NCBI//INSD INSDSeq/EN" "https://www.ncbi.nlm.nih.gov/dtd/INSD_INSDSeq.dtd">
<INSDSet>
  <INSDSeq>
    <INSDSeq_primary-accession>MN123456</INSDSeq_primary-accession>
    <INSDSeq_accession-version>MN123456.1</INSDSeq_accession-version>
    <INSDSeq_definition>Echiniscoides sp. COI gene, partial cds</INSDSeq_definition>
    <INSDSeq_organism>Echiniscoides sp.</INSDSeq_organism>
    <INSDSeq_references>
      <INSDReference>
        <INSDReference_journal>Zootaxa 10.1234/first.1</INSDReference_journal>
      </INSDReference>
      <INSDReference>
        <INSDReference_journal>Submitted 10.1234/second.2</INSDReference_journal>
      </INSDReference>
    </INSDSeq_references>
    <INSDSeq_feature-table>
      <INSDFeature>
        <INSDFeature_key>source</INSDFeature_key>
        <INSDFeature_quals>
          <INSDQualifier><INSDQualifier_name>organism</INSDQualifier_name><INSDQualifier_value>Echiniscoides sp.</INSDQualifier_value></INSDQualifier>
          <INSDQualifier><INSDQualifier_name>country</INSDQualifier_name><INSDQualifier_value>USA: California: Monterey Bay</INSDQualifier_value></INSDQualifier>
          <INSDQualifier><INSDQualifier_name>Lat_Lon</INSDQualifier_name><INSDQualifier_value>36.5 N 121.9 W</INSDQualifier_value></INSDQualifier>
          <INSDQualifier><INSDQualifier_name>collection_date</INSDQualifier_name><INSDQualifier_value>2019-06-01</INSDQualifier_value></INSDQualifier>
          <INSDQualifier><INSDQualifier_name>depth</INSDQualifier_name><INSDQualifier_value>2 m</INSDQualifier_value></INSDQualifier>
          <INSDQualifier><INSDQualifier_name>isolation_source</INSDQualifier_name><INSDQualifier_value>intertidal barnacles</INSDQualifier_value></INSDQualifier>
        </INSDFeature_quals>
      </INSDFeature>
      <INSDFeature>
        <INSDFeature_key>CDS</INSDFeature_key>
        <INSDFeature_quals>
          <INSDQualifier><INSDQualifier_name>product</INSDQualifier_name><INSDQualifier_value>cytochrome c oxidase subunit I</INSDQualifier_value></INSDQualifier>
          <INSDQualifier><INSDQualifier_name>country</INSDQualifier_name><INSDQualifier_value>ignored outside source</INSDQualifier_value></INSDQualifier>
        </INSDFeature_quals>
      </INSDFeature>
    </INSDSeq_feature-table>
  </INSDSeq>
</INSDSet>"#;

    #[test]
    fn test_insd_normalization() {
        let batch = parse_batch(INSD_RECORD.as_bytes()).unwrap();
        assert_eq!(batch.schema, Some(SeqSchema::Insd));
        assert_eq!(batch.records.len(), 1);

        let rec = &batch.records[0];
        assert_eq!(rec.accession, "MN123456.1");
        assert_eq!(rec.organism, "Echiniscoides sp.");
        assert_eq!(rec.locality, "USA: California: Monterey Bay");
        assert_eq!(rec.lat_lon_raw, "36.5 N 121.9 W");
        assert_eq!(rec.collection_date, "2019-06-01");
        assert_eq!(rec.depth, "2 m");
        assert_eq!(
            rec.feature_notes,
            vec!["intertidal barnacles", "cytochrome c oxidase subunit I"]
        );
        assert!(rec.qualifier_names.contains("lat_lon"));
        assert!(rec.qualifier_names.contains("country"));
        assert!(!rec.qualifier_names.contains("product"));
        assert_eq!(rec.references.len(), 2);
    }

    #[test]
    fn test_gbseq_primary_accession_fallback() {
        let xml = "<GBSet><GBSeq>\
            <GBSeq_primary-accession>OQ000001</GBSeq_primary-accession>\
            <GBSeq_organism>Tardigrada environmental sample</GBSeq_organism>\
            <GBSeq_feature-table><GBFeature>\
              <GBFeature_key>source</GBFeature_key>\
              <GBFeature_quals>\
                <GBQualifier><GBQualifier_name>environmental_sample</GBQualifier_name></GBQualifier>\
              </GBFeature_quals>\
            </GBFeature></GBSeq_feature-table>\
          </GBSeq></GBSet>";
        let batch = parse_batch(xml.as_bytes()).unwrap();
        assert_eq!(batch.schema, Some(SeqSchema::GbSeq));

        let rec = &batch.records[0];
        assert_eq!(rec.accession, "OQ000001");
        assert!(rec.qualifier_names.contains("environmental_sample"));
        assert!(rec.feature_notes.is_empty());
        assert_eq!(rec.locality, "");
    }

    #[test]
    fn test_insd_preferred_over_gbseq() {
        let xml = "<Mixed>\
            <GBSeq><GBSeq_primary-accession>GB1</GBSeq_primary-accession></GBSeq>\
            <INSDSeq><INSDSeq_primary-accession>IN1</INSDSeq_primary-accession></INSDSeq>\
          </Mixed>";
        let batch = parse_batch(xml.as_bytes()).unwrap();
        assert_eq!(batch.schema, Some(SeqSchema::Insd));
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].accession, "IN1");
    }

    #[test]
    fn test_no_recognized_nodes() {
        let batch = parse_batch(b"<Other><Thing/></Other>").unwrap();
        assert!(batch.schema.is_none());
        assert!(batch.records.is_empty());
    }

    #[test]
    fn test_service_error_payload() {
        let raw = b"<eFetchResult><ERROR>Cannot retrieve query</ERROR></eFetchResult>";
        match parse_batch(raw) {
            Err(HarvestError::Service(msg)) => assert_eq!(msg, "Cannot retrieve query"),
            other => panic!("expected service error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_xml() {
        assert!(matches!(
            parse_batch(b"<INSDSet><INSDSeq>"),
            Err(HarvestError::Xml(_))
        ));
        assert!(matches!(
            parse_batch(&[0xff, 0xfe, 0x00]),
            Err(HarvestError::Parse(_))
        ));
    }
}
