//! End-to-end extraction tests.

use std::fs;
use std::path::PathBuf;

use surpi::formats::count_table;
use surpi::{
    DataTable, DuplicateFeaturePolicy, ExtractConfig, OutputFormat, Parser, SampleSheet,
    SampleSheetFormat, Surpi, SurpiConfig, SurpiError,
};
use tempfile::TempDir;

fn data_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

fn load_counts() -> DataTable {
    let (table, _) = Parser::new()
        .parse_file(data_path("surpi_output.counttable"))
        .expect("Failed to read count table");
    table
}

const FEATURE_IDS: [&str; 16] = [
    "Dill cryptic virus 1__Partitiviridae",
    "Escherichia phage FEC14_Cba120virus_Ackermannviridae",
    "Dickeya phage phiDP10.3_Limestonevirus_Ackermannviridae",
    "Dickeya phage phiDP23.1_Limestonevirus_Ackermannviridae",
    "Salmonella virus SJ2_Vi1virus_Ackermannviridae",
    "Klebsiella phage May__Ackermannviridae",
    "Escherichia virus FI_Allolevivirus_Leviviridae",
    "Escherichia virus Qbeta_Allolevivirus_Leviviridae",
    "Enterobacteria phage C-1 INW-2012_Levivirus_Leviviridae",
    "Enterobacteria phage Hgal1_Levivirus_Leviviridae",
    "Escherichia virus BZ13_Levivirus_Leviviridae",
    "Escherichia virus MS2_Levivirus_Leviviridae",
    "Acinetobacter phage AP205__Leviviridae",
    "Pseudomonas phage PP7__Leviviridae",
    "Pseudomonas phage PRR1__Leviviridae",
    "*__Microviridae",
];

const TAXA: [&str; 16] = [
    "f__Partitiviridae; s__Dill cryptic virus 1;",
    "f__Ackermannviridae; g__Cba120virus; s__Escherichia phage FEC14;",
    "f__Ackermannviridae; g__Limestonevirus; s__Dickeya phage phiDP10.3;",
    "f__Ackermannviridae; g__Limestonevirus; s__Dickeya phage phiDP23.1;",
    "f__Ackermannviridae; g__Vi1virus; s__Salmonella virus SJ2;",
    "f__Ackermannviridae; s__Klebsiella phage May;",
    "f__Leviviridae; g__Allolevivirus; s__Escherichia virus FI;",
    "f__Leviviridae; g__Allolevivirus; s__Escherichia virus Qbeta;",
    "f__Leviviridae; g__Levivirus; s__Enterobacteria phage C-1 INW-2012;",
    "f__Leviviridae; g__Levivirus; s__Enterobacteria phage Hgal1;",
    "f__Leviviridae; g__Levivirus; s__Escherichia virus BZ13;",
    "f__Leviviridae; g__Levivirus; s__Escherichia virus MS2;",
    "f__Leviviridae; s__Acinetobacter phage AP205;",
    "f__Leviviridae; s__Pseudomonas phage PP7;",
    "f__Leviviridae; s__Pseudomonas phage PRR1;",
    "f__Microviridae; s__*;",
];

/// Expected counts per feature across sample_1..sample_10.
const EXPECTED_BY_FEATURE: [[u64; 10]; 16] = [
    [0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    [1, 0, 0, 0, 5, 0, 0, 0, 0, 0],
    [1, 0, 0, 0, 1, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 0, 0, 1, 0, 0, 0],
    [0, 0, 1, 1, 0, 0, 1, 0, 0, 0],
    [0, 0, 0, 0, 1, 0, 0, 0, 0, 0],
    [1, 0, 0, 0, 5, 3, 0, 0, 0, 1],
    [0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
    [0, 0, 0, 0, 1, 1, 0, 0, 0, 0],
    [2, 8, 0, 0, 10, 6, 0, 0, 0, 3],
    [0, 0, 0, 0, 1, 0, 0, 0, 1, 0],
    [7, 3, 0, 0, 10, 3, 0, 0, 11, 0],
    [0, 0, 0, 0, 4, 0, 0, 0, 0, 0],
    [2, 0, 0, 0, 3, 0, 0, 0, 1, 0],
    [0, 0, 0, 0, 0, 0, 0, 0, 0, 0],
];

/// sample_1..sample_32; the first ten barcodes are the count table's columns.
fn numbered_sheet() -> SampleSheet {
    let (sheet, _) = surpi::formats::sample_sheet::parse_file(
        data_path("surpi_sample_info.tsv"),
        SampleSheetFormat::Flat,
        Default::default(),
    )
    .expect("Failed to read flat sample sheet");
    sheet
}

// =============================================================================
// Worked fixture
// =============================================================================

#[test]
fn test_extract_worked_fixture() {
    let sheet = numbered_sheet();
    assert_eq!(sheet.len(), 32);

    let (table, taxonomy) = surpi::extract(&load_counts(), &sheet).expect("Extraction failed");

    let expected_samples: Vec<String> = (1..=10).map(|i| format!("sample_{}", i)).collect();
    assert_eq!(table.sample_ids, expected_samples);
    assert_eq!(table.feature_ids, FEATURE_IDS);
    assert_eq!(table.counts.len(), 10);

    for (f, feature) in FEATURE_IDS.iter().enumerate() {
        assert_eq!(
            table.column(feature).unwrap(),
            EXPECTED_BY_FEATURE[f],
            "counts differ for {}",
            feature
        );
    }

    assert_eq!(
        table.row("sample_5").unwrap(),
        [0u64, 0, 5, 1, 0, 0, 1, 5, 0, 1, 10, 1, 10, 4, 3, 0]
    );

    assert_eq!(taxonomy.len(), 16);
    for (feature, taxon) in FEATURE_IDS.iter().zip(TAXA) {
        assert_eq!(taxonomy.get(feature), Some(taxon));
    }
}

#[test]
fn test_extract_sectioned_sheet() {
    let (sheet, _) = surpi::formats::sample_sheet::parse_file(
        data_path("surpi_sample_info.csv"),
        SampleSheetFormat::Sectioned,
        Default::default(),
    )
    .expect("Failed to read sectioned sample sheet");

    let (table, _) = surpi::extract(&load_counts(), &sheet).expect("Extraction failed");

    // Rows follow the count table's barcode column order
    assert_eq!(
        table.sample_ids,
        vec![
            "sample-R-E2", // AACCCGCC+GAGGATTT
            "sample-R-D1", // AATCGTCA+AGTTAAAG
            "sample-D-C1", // ACTATGAT+TTCGATAG
            "sample-D-A2", // AGTACAAG+CCCATTGC
            "sample-R-A1", // AGTAGTAA+TACTGATA
            "sample-R-A2", // AGTCCCGG+GCAGAAGT
            "sample-D-A1", // AGTCTGCT+TCCAGGCT
            "sample-D-E2", // AGTGCGGA+CCGTTGTC
            "sample-R-H2", // CATCTACT+TTCCGTTG
            "sample-R-C1", // CATTCGGA+GATGGAAA
        ]
    );
    assert_eq!(
        table.row("sample-R-A1").unwrap(),
        [0u64, 0, 5, 1, 0, 0, 1, 5, 0, 1, 10, 1, 10, 4, 3, 0]
    );
}

// =============================================================================
// Failure Tests
// =============================================================================

#[test]
fn test_unmatched_barcode_is_named() {
    let mut sheet = numbered_sheet();
    sheet.rows.retain(|r| r.barcode != "AGTCTGCT+TCCAGGCT");

    let err = surpi::extract(&load_counts(), &sheet).unwrap_err();

    match err {
        SurpiError::Reconciliation { barcodes } => {
            assert_eq!(barcodes, vec!["AGTCTGCT+TCCAGGCT"]);
        }
        other => panic!("expected reconciliation error, got {other}"),
    }
}

#[test]
fn test_duplicated_sheet_barcode_fails_join() {
    let mut sheet = numbered_sheet();
    let mut extra = sheet.rows[4].clone();
    extra.sample_name = "sample_5_rerun".to_string();
    sheet.rows.push(extra);

    let err = surpi::extract(&load_counts(), &sheet).unwrap_err();

    match err {
        SurpiError::JoinCardinality { barcode, matches } => {
            assert_eq!(barcode, "AGTAGTAA+TACTGATA");
            assert_eq!(matches, vec!["sample_5", "sample_5_rerun"]);
        }
        other => panic!("expected join error, got {other}"),
    }
}

#[test]
fn test_single_row_count_table() {
    let table = Parser::new()
        .parse_str("species\tgenus\tfamily\ttag\tAA+CC\nEscherichia virus MS2\t\tLeviviridae\thost-bacteria;\t9\n")
        .unwrap();
    count_table::validate(&table, Default::default()).unwrap();

    let sheet = SampleSheet::from_pairs([("only", "AA+CC")]);
    let (features, taxonomy) = surpi::extract(&table, &sheet).unwrap();

    assert_eq!(features.get("only", "Escherichia virus MS2__Leviviridae"), Some(9));
    assert_eq!(
        taxonomy.get("Escherichia virus MS2__Leviviridae"),
        Some("f__Leviviridae; s__Escherichia virus MS2;")
    );
}

// =============================================================================
// Pipeline Tests
// =============================================================================

#[test]
fn test_pipeline_writes_outputs() {
    let surpi = Surpi::with_config(SurpiConfig {
        sheet_format: SampleSheetFormat::Flat,
        ..Default::default()
    });
    let result = surpi
        .extract(
            data_path("surpi_output.counttable"),
            data_path("surpi_sample_info.tsv"),
        )
        .expect("Extraction failed");

    assert_eq!(result.report.sample_count, 10);
    assert_eq!(result.report.feature_count, 16);
    assert_eq!(result.report.unused_sheet_rows, 22);
    assert!(result.report.count_table.hash.starts_with("sha256:"));

    let dir = TempDir::new().unwrap();
    let saved = result.save(dir.path(), OutputFormat::Tsv, true).unwrap();

    let features = fs::read_to_string(&saved.feature_table).unwrap();
    let lines: Vec<&str> = features.lines().collect();
    assert_eq!(lines.len(), 11);
    assert!(lines[0].starts_with("sample_id\tDill cryptic virus 1__Partitiviridae\t"));
    assert!(lines[5].starts_with("sample_5\t0\t0\t5\t1\t"));

    let taxonomy = fs::read_to_string(&saved.taxonomy).unwrap();
    assert_eq!(taxonomy.lines().count(), 17);
    assert!(taxonomy.contains("*__Microviridae\tf__Microviridae; s__*;"));

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(saved.report.unwrap()).unwrap()).unwrap();
    assert_eq!(report["sheet_format"], "flat");
    assert_eq!(report["count_table"]["file"], "surpi_output.counttable");
}

#[cfg(target_os = "linux")]
#[test]
fn test_pipeline_save_reports_full_disk() {
    use std::os::unix::fs::symlink;

    let flat = Surpi::with_config(SurpiConfig {
        sheet_format: SampleSheetFormat::Flat,
        ..Default::default()
    });
    let result = flat
        .extract(
            data_path("surpi_output.counttable"),
            data_path("surpi_sample_info.tsv"),
        )
        .unwrap();

    let dir = TempDir::new().unwrap();
    let report_path = dir.path().join("extraction-report.json");
    symlink("/dev/full", &report_path).unwrap();
    match result.save(dir.path(), OutputFormat::Tsv, true) {
        Err(SurpiError::Io { path, .. }) => assert_eq!(path, report_path),
        other => panic!("expected io error for the report, got {:?}", other.map(|s| s.report)),
    }

    let dir = TempDir::new().unwrap();
    symlink("/dev/full", dir.path().join("taxonomy.json")).unwrap();
    assert!(result.save(dir.path(), OutputFormat::Json, false).is_err());
}

#[test]
fn test_pipeline_rejects_invalid_count_table() {
    let err = Surpi::new()
        .extract(
            data_path("surpi_missing_cols.counttable"),
            data_path("surpi_sample_info.csv"),
        )
        .unwrap_err();

    assert!(matches!(err, SurpiError::Format { .. }));
    assert!(err.to_string().contains("Expected "));
}

#[test]
fn test_pipeline_merge_policy_is_applied() {
    let dir = TempDir::new().unwrap();
    let counts = dir.path().join("dup.counttable");
    fs::write(
        &counts,
        "species\tgenus\tfamily\ttag\tAA+CC\n\
         MS2\t\tLeviviridae\tx\t1\n\
         MS2\t\tLeviviridae\tx\t2\n",
    )
    .unwrap();
    let sheet = dir.path().join("sheet.tsv");
    fs::write(&sheet, "sample\tbarcode\ns1\tAA+CC\n").unwrap();

    let strict = Surpi::with_config(SurpiConfig {
        sheet_format: SampleSheetFormat::Flat,
        ..Default::default()
    });
    assert!(matches!(
        strict.extract(&counts, &sheet),
        Err(SurpiError::DuplicateFeatures { .. })
    ));

    let merging = Surpi::with_config(SurpiConfig {
        sheet_format: SampleSheetFormat::Flat,
        extract: ExtractConfig {
            duplicate_features: DuplicateFeaturePolicy::Merge,
        },
        ..Default::default()
    });
    let result = merging.extract(&counts, &sheet).unwrap();
    assert_eq!(result.feature_table.get("s1", "MS2__Leviviridae"), Some(3));
}
