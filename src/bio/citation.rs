/// Citation DOI discovery for sequence references
use crate::bio::xml::{child, child_text, children};
use once_cell::sync::Lazy;
use regex::Regex;
use roxmltree::Node;
use serde::{Deserialize, Serialize};

static DOI_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)10\.[0-9]{4,9}/[^\s"<>]+"#).expect("doi pattern"));

/// Element names of one reference vocabulary
struct ReferenceVocabulary {
    xref_list: &'static str,
    xref: &'static str,
    dbname: &'static str,
    id: &'static str,
    free_text: [&'static str; 3],
}

const INSD_REFERENCE: ReferenceVocabulary = ReferenceVocabulary {
    xref_list: "INSDReference_xref",
    xref: "INSDXref",
    dbname: "INSDXref_dbname",
    id: "INSDXref_id",
    free_text: [
        "INSDReference_title",
        "INSDReference_journal",
        "INSDReference_remark",
    ],
};

const GBSEQ_REFERENCE: ReferenceVocabulary = ReferenceVocabulary {
    xref_list: "GBReference_xref",
    xref: "GBXref",
    dbname: "GBXref_dbname",
    id: "GBXref_id",
    free_text: ["GBReference_title", "GBReference_journal", "GBReference_remark"],
};

/// Lookup order: INSD names first, then GBSeq names
const VOCABULARIES: [&ReferenceVocabulary; 2] = [&INSD_REFERENCE, &GBSEQ_REFERENCE];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossRef {
    pub dbname: String,
    pub id: String,
}

/// Owned view of one reference node, independent of the source vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceNote {
    /// Structured cross-references in lookup order
    pub xrefs: Vec<CrossRef>,
    /// Non-empty title/journal/remark values in lookup order
    pub free_text: Vec<String>,
}

impl ReferenceNote {
    /// Collect cross-references and free text under either vocabulary.
    pub fn from_node(node: Node<'_, '_>) -> Self {
        let mut note = ReferenceNote::default();

        for vocab in VOCABULARIES {
            if let Some(list) = child(node, vocab.xref_list) {
                for xref in children(list, vocab.xref) {
                    note.xrefs.push(CrossRef {
                        dbname: child_text(xref, vocab.dbname).to_string(),
                        id: child_text(xref, vocab.id).to_string(),
                    });
                }
            }
        }

        for vocab in VOCABULARIES {
            for tag in vocab.free_text {
                let text = child_text(node, tag);
                if !text.is_empty() {
                    note.free_text.push(text.to_string());
                }
            }
        }

        note
    }
}

/// Find a DOI for a reference, or an empty string.
///
/// A `doi` cross-reference always wins over DOI-looking strings in the
/// title, journal or remark.
pub fn extract_doi(reference: &ReferenceNote) -> String {
    let structured = reference
        .xrefs
        .iter()
        .find(|x| x.dbname.to_lowercase() == "doi" && !x.id.is_empty());
    if let Some(xref) = structured {
        return xref.id.trim().to_string();
    }

    let blob = reference.free_text.join(" ");
    DOI_PATTERN
        .find(&blob)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// DOI for a record: only the first reference is consulted.
pub fn first_reference_doi(references: &[ReferenceNote]) -> String {
    references.first().map(extract_doi).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note_from(xml: &str) -> ReferenceNote {
        let doc = roxmltree::Document::parse(xml).unwrap();
        ReferenceNote::from_node(doc.root_element())
    }

    #[test]
    fn test_structured_xref_wins_over_free_text() {
        let note = note_from(
            "<INSDReference>\
               <INSDReference_title>See 10.9999/other.1</INSDReference_title>\
               <INSDReference_xref><INSDXref>\
                 <INSDXref_dbname>DOI</INSDXref_dbname>\
                 <INSDXref_id> 10.1111/zsc.12345 </INSDXref_id>\
               </INSDXref></INSDReference_xref>\
             </INSDReference>",
        );
        assert_eq!(extract_doi(&note), "10.1111/zsc.12345");
    }

    #[test]
    fn test_gbseq_xref() {
        let note = note_from(
            "<GBReference><GBReference_xref><GBXref>\
               <GBXref_dbname>doi</GBXref_dbname><GBXref_id>10.3897/zookeys.1</GBXref_id>\
             </GBXref></GBReference_xref></GBReference>",
        );
        assert_eq!(extract_doi(&note), "10.3897/zookeys.1");
    }

    #[test]
    fn test_free_text_fallback() {
        let note = note_from(
            "<GBReference>\
               <GBReference_journal>Zootaxa 10.1234/abcd.5 (2020)</GBReference_journal>\
             </GBReference>",
        );
        assert_eq!(extract_doi(&note), "10.1234/abcd.5");
    }

    #[test]
    fn test_non_doi_xref_falls_through() {
        let note = note_from(
            "<INSDReference>\
               <INSDReference_xref><INSDXref>\
                 <INSDXref_dbname>pubmed</INSDXref_dbname><INSDXref_id>123</INSDXref_id>\
               </INSDXref></INSDReference_xref>\
               <INSDReference_remark>doi:10.5555/ABC-9\"x</INSDReference_remark>\
             </INSDReference>",
        );
        assert_eq!(extract_doi(&note), "10.5555/ABC-9");
    }

    #[test]
    fn test_nothing_found() {
        let note = note_from("<INSDReference><INSDReference_title>Unpublished</INSDReference_title></INSDReference>");
        assert_eq!(extract_doi(&note), "");
    }

    #[test]
    fn test_only_first_reference_is_used() {
        let refs = vec![
            ReferenceNote::default(),
            ReferenceNote {
                xrefs: vec![CrossRef {
                    dbname: "doi".into(),
                    id: "10.1000/later".into(),
                }],
                free_text: vec![],
            },
        ];
        assert_eq!(first_reference_doi(&refs), "");
        assert_eq!(first_reference_doi(&[]), "");
    }
}
