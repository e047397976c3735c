//! Sequencing-run sample sheets.
//!
//! Two layouts are read:
//!
//! - **Sectioned**: an INI-like file of bracket-tagged sections (`[Header]`,
//!   `[Reads]`, `[Data]`, ...). Only the comma-delimited `[Data]` section is
//!   tabular; it must carry `Sample_Name`, `index` and `index2`, and the
//!   barcode is derived as `index+index2`.
//! - **Flat**: a single tab-delimited table with `sample` and `barcode`
//!   columns.
//!
//! Either way the result is a [`SampleSheet`] whose table carries a
//! `barcode` column.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SurpiError};
use crate::input::{DataTable, Parser, ParserConfig, RawSource, SourceMetadata};
use crate::validation::{
    DefectKind, FilledColumns, FormatDefect, HasRows, RequiredColumns, ValidationMode,
    ValidationPipeline,
};

pub const SAMPLE_NAME_KEY: &str = "Sample_Name";
pub const INDEX_1_KEY: &str = "index";
pub const INDEX_2_KEY: &str = "index2";
pub const FLAT_SAMPLE_KEY: &str = "sample";
pub const BARCODE_KEY: &str = "barcode";

/// Line prefix opening the tabular section.
pub const DATA_SECTION: &str = "[Data]";

const CONTEXT: &str = "sample sheet";

/// Which sample sheet layout to read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleSheetFormat {
    /// Bracket-sectioned file with a comma-delimited `[Data]` section.
    #[default]
    Sectioned,
    /// Tab-delimited table with `sample` and `barcode` columns.
    Flat,
}

impl SampleSheetFormat {
    /// Name recorded in source metadata.
    pub fn label(&self) -> &'static str {
        match self {
            SampleSheetFormat::Sectioned => "sectioned-csv",
            SampleSheetFormat::Flat => "tsv",
        }
    }

    fn sample_column(&self) -> &'static str {
        match self {
            SampleSheetFormat::Sectioned => SAMPLE_NAME_KEY,
            SampleSheetFormat::Flat => FLAT_SAMPLE_KEY,
        }
    }

    /// The validation pipeline for tables of this layout.
    pub fn pipeline(&self, mode: ValidationMode) -> ValidationPipeline {
        let (names, barcode_parts): (&'static [&'static str], &'static [&'static str]) = match self {
            SampleSheetFormat::Sectioned => (
                &[SAMPLE_NAME_KEY, INDEX_1_KEY, INDEX_2_KEY],
                &[INDEX_1_KEY, INDEX_2_KEY],
            ),
            SampleSheetFormat::Flat => (&[FLAT_SAMPLE_KEY, BARCODE_KEY], &[BARCODE_KEY]),
        };

        // A barcode built from an empty index could never match
        ValidationPipeline::new(CONTEXT)
            .with_check(RequiredColumns { names })
            .with_check(FilledColumns {
                names: barcode_parts,
            })
            .with_check(HasRows)
            .with_mode(mode)
    }
}

impl FromStr for SampleSheetFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sectioned" | "sectioned-csv" | "csv" => Ok(SampleSheetFormat::Sectioned),
            "flat" | "tsv" => Ok(SampleSheetFormat::Flat),
            _ => Err(format!(
                "Unknown sample sheet format: {}. Use sectioned or flat.",
                s
            )),
        }
    }
}

impl fmt::Display for SampleSheetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleSheetFormat::Sectioned => write!(f, "sectioned"),
            SampleSheetFormat::Flat => write!(f, "flat"),
        }
    }
}

/// One sample in a sequencing run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleSheetRow {
    pub sample_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index2: Option<String>,
    pub barcode: String,
}

/// A parsed sample sheet.
#[derive(Debug, Clone)]
pub struct SampleSheet {
    /// The data table, with a guaranteed `barcode` column.
    pub table: DataTable,
    /// One entry per table row, in file order.
    pub rows: Vec<SampleSheetRow>,
    pub format: SampleSheetFormat,
}

impl SampleSheet {
    /// Build a sample sheet from (sample name, barcode) pairs.
    pub fn from_pairs<N, B>(pairs: impl IntoIterator<Item = (N, B)>) -> Self
    where
        N: Into<String>,
        B: Into<String>,
    {
        let rows: Vec<SampleSheetRow> = pairs
            .into_iter()
            .map(|(name, barcode)| SampleSheetRow {
                sample_name: name.into(),
                index1: None,
                index2: None,
                barcode: barcode.into(),
            })
            .collect();

        let table = DataTable::new(
            vec![FLAT_SAMPLE_KEY.to_string(), BARCODE_KEY.to_string()],
            rows.iter()
                .map(|r| vec![r.sample_name.clone(), r.barcode.clone()])
                .collect(),
        );

        Self {
            table,
            rows,
            format: SampleSheetFormat::Flat,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Where the section scanner currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionState {
    OutsideData,
    InsideData,
}

/// What to do with a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineAction {
    /// Not part of the data table.
    Skip,
    /// A header or data row of the data table.
    Keep,
    /// The data section has ended.
    Stop,
}

/// Classify one line given the scanner state, returning the next state.
///
/// `[Data]` opens the data section; inside it, the next `[`-prefixed line
/// closes it. Comma-prefixed and blank lines inside the section are
/// placeholder rows and are skipped.
pub fn classify_line(state: SectionState, line: &str) -> (SectionState, LineAction) {
    match state {
        SectionState::OutsideData => {
            if line.starts_with(DATA_SECTION) {
                (SectionState::InsideData, LineAction::Skip)
            } else {
                (SectionState::OutsideData, LineAction::Skip)
            }
        }
        SectionState::InsideData => {
            if line.starts_with('[') {
                (SectionState::OutsideData, LineAction::Stop)
            } else if line.starts_with(',') || line.trim().is_empty() {
                (SectionState::InsideData, LineAction::Skip)
            } else {
                (SectionState::InsideData, LineAction::Keep)
            }
        }
    }
}

/// Collect the lines of the `[Data]` section (header first).
///
/// Fails if the text never opens a `[Data]` section. A section that opens
/// but holds no lines yields an empty vector; the table validators decide
/// what that means.
pub fn extract_data_section(text: &str) -> Result<Vec<&str>> {
    let mut state = SectionState::OutsideData;
    let mut found = false;
    let mut lines = Vec::new();

    for line in text.lines() {
        let (next, action) = classify_line(state, line);
        if next == SectionState::InsideData {
            found = true;
        }
        state = next;

        match action {
            LineAction::Keep => lines.push(line),
            LineAction::Skip => {}
            LineAction::Stop => break,
        }
    }

    if !found {
        return Err(SurpiError::format(
            CONTEXT,
            FormatDefect::new(
                DefectKind::MissingSection,
                format!("section starting with '{}'", DATA_SECTION),
                "no such section",
            ),
        ));
    }

    Ok(lines)
}

/// Parse sample sheet text in the given layout.
pub fn parse_str(text: &str, format: SampleSheetFormat, mode: ValidationMode) -> Result<SampleSheet> {
    let table = match format {
        SampleSheetFormat::Sectioned => {
            let lines = extract_data_section(text)?;
            if lines.is_empty() {
                return Err(SurpiError::format(
                    CONTEXT,
                    FormatDefect::new(
                        DefectKind::NoRows,
                        format!("a header and at least one row in the '{}' section", DATA_SECTION),
                        "an empty section",
                    ),
                ));
            }
            Parser::with_config(ParserConfig::csv()).parse_str(&lines.join("\n"))?
        }
        SampleSheetFormat::Flat => Parser::with_config(ParserConfig::tsv()).parse_str(text)?,
    };

    from_table(table, format, mode)
}

/// Validate a data table in the given layout and normalize its barcodes.
pub fn from_table(
    mut table: DataTable,
    format: SampleSheetFormat,
    mode: ValidationMode,
) -> Result<SampleSheet> {
    format.pipeline(mode).run(&table)?;

    let rows = match format {
        SampleSheetFormat::Sectioned => {
            let index1 = column(&table, INDEX_1_KEY);
            let index2 = column(&table, INDEX_2_KEY);
            let barcodes: Vec<String> = index1
                .iter()
                .zip(&index2)
                .map(|(i1, i2)| derive_barcode(i1, i2))
                .collect();

            let rows = column(&table, SAMPLE_NAME_KEY)
                .into_iter()
                .zip(index1)
                .zip(index2)
                .zip(barcodes.iter().cloned())
                .map(|(((sample_name, i1), i2), barcode)| SampleSheetRow {
                    sample_name,
                    index1: Some(i1),
                    index2: Some(i2),
                    barcode,
                })
                .collect();

            table.set_column(BARCODE_KEY, barcodes);
            rows
        }
        SampleSheetFormat::Flat => column(&table, format.sample_column())
            .into_iter()
            .zip(column(&table, BARCODE_KEY))
            .map(|(sample_name, barcode)| SampleSheetRow {
                sample_name,
                index1: None,
                index2: None,
                barcode,
            })
            .collect(),
    };

    Ok(SampleSheet {
        table,
        rows,
        format,
    })
}

/// Read a sample sheet file in the given layout.
pub fn parse_file(
    path: impl AsRef<Path>,
    format: SampleSheetFormat,
    mode: ValidationMode,
) -> Result<(SampleSheet, SourceMetadata)> {
    let path = path.as_ref();
    let raw = RawSource::read(path)?;
    let sheet = parse_str(raw.text(path)?, format, mode)?;
    let metadata = raw.metadata(path, format.label(), &sheet.table);

    log::debug!(
        "Loaded {} sample sheet {} ({} samples)",
        format,
        path.display(),
        sheet.len()
    );
    Ok((sheet, metadata))
}

/// Composite barcode of a dual-indexed sample.
pub fn derive_barcode(index1: &str, index2: &str) -> String {
    format!("{}+{}", index1, index2)
}

fn column(table: &DataTable, name: &str) -> Vec<String> {
    table
        .column_by_name(name)
        .unwrap_or_default()
        .into_iter()
        .map(str::to_string)
        .collect()
}
