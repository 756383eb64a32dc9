mod common;

use common::{fixture, test_config};
use marker_harvest::core::pipeline::classify_bodies;
use marker_harvest::report::write_report;
use std::fs::File;
use std::io::Read;

fn read_part(archive: &mut zip::ZipArchive<File>, name: &str) -> String {
    let mut part = archive.by_name(name).expect("part present");
    let mut text = String::new();
    part.read_to_string(&mut text).unwrap();
    text
}

#[test]
fn test_workbook_parts_and_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tardigrades.xlsx");
    let config = test_config();

    let outcome = classify_bodies(&config, &[fixture("monterey_insd.xml")]);
    write_report(&path, &outcome, &config).unwrap();

    let mut archive = zip::ZipArchive::new(File::open(&path).unwrap()).unwrap();
    for name in [
        "[Content_Types].xml",
        "_rels/.rels",
        "xl/workbook.xml",
        "xl/_rels/workbook.xml.rels",
        "xl/styles.xml",
        "docProps/core.xml",
        "docProps/app.xml",
        "xl/worksheets/sheet1.xml",
        "xl/worksheets/sheet2.xml",
        "xl/worksheets/sheet3.xml",
    ] {
        assert!(archive.by_name(name).is_ok(), "missing {}", name);
    }

    let workbook = read_part(&mut archive, "xl/workbook.xml");
    assert!(workbook.contains(r#"name="Marine_Tardigrades_Individuals""#));
    assert!(workbook.contains(r#"name="Marine_Tardigrades_eDNA""#));
    assert!(workbook.contains(r#"name="Metadata_Notes""#));

    let individuals = read_part(&mut archive, "xl/worksheets/sheet1.xml");
    assert!(individuals.contains(r#"<c r="N1" t="inlineStr"><is><t xml:space="preserve">Citation_DOI</t></is></c>"#));
    assert!(individuals.contains(r#"<c r="B2" t="inlineStr"><is><t xml:space="preserve">OQ123456.1</t></is></c>"#));
    // 18S is empty for this record and must not produce a cell
    assert!(!individuals.contains(r#"r="C2""#));

    let edna = read_part(&mut archive, "xl/worksheets/sheet2.xml");
    assert!(edna.contains(">eDNA<"));
    assert_eq!(edna.matches("<row ").count(), 2);

    let notes = read_part(&mut archive, "xl/worksheets/sheet3.xml");
    assert!(notes.contains("Region filter: ON"));
    assert!(notes.contains("Final counts: Individuals=1; eDNA=1; parsed records=2; failed batches=0"));

    let core = read_part(&mut archive, "docProps/core.xml");
    assert!(core.contains("<dc:creator>marker_harvest</dc:creator>"));
}

#[test]
fn test_empty_outcome_still_writes_headers() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.xlsx");
    let config = test_config();

    let outcome = classify_bodies(&config, &[]);
    write_report(&path, &outcome, &config).unwrap();

    let mut archive = zip::ZipArchive::new(File::open(&path).unwrap()).unwrap();
    let individuals = read_part(&mut archive, "xl/worksheets/sheet1.xml");
    assert_eq!(individuals.matches("<row ").count(), 1);
    assert!(individuals.contains("Species_ID"));
}
