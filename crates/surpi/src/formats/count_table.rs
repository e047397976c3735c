//! SURPI count tables.
//!
//! A count table is a tab-delimited file with one row per classified taxon
//! and one column per sequencing barcode:
//!
//! ```text
//! species  genus  family  tag  AACCCGCC+GAGGATTT  AATCGTCA+AGTTAAAG ...
//! ```
//!
//! Validation is purely structural. Count cells are only inspected when
//! [`records`] turns rows into [`CountRecord`]s.

use std::path::Path;

use serde::Serialize;

use crate::error::{Result, SurpiError};
use crate::input::{DataTable, Parser, ParserConfig, SourceMetadata};
use crate::validation::{HasRows, LeadingColumns, ValidationMode, ValidationPipeline};

pub const SPECIES_KEY: &str = "species";
pub const GENUS_KEY: &str = "genus";
pub const FAMILY_KEY: &str = "family";
pub const TAG_KEY: &str = "tag";

/// The fixed columns every count table starts with, in order.
pub const LEADING_COLUMNS: [&str; 4] = [SPECIES_KEY, GENUS_KEY, FAMILY_KEY, TAG_KEY];

/// One classified taxon and its per-barcode counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountRecord {
    /// Empty when the cell holds a missing value.
    pub species: String,
    pub genus: Option<String>,
    pub family: Option<String>,
    pub tag: String,
    /// Counts aligned with [`barcodes`] of the table the record came from.
    pub counts: Vec<u64>,
}

/// The validation pipeline for count tables.
pub fn pipeline(mode: ValidationMode) -> ValidationPipeline {
    ValidationPipeline::new("count table")
        .with_check(LeadingColumns {
            expected: &LEADING_COLUMNS,
            min_columns: LEADING_COLUMNS.len() + 1,
            trailing: "at least one sample",
        })
        .with_check(HasRows)
        .with_mode(mode)
}

/// Check that a table is usable as a count table.
pub fn validate(table: &DataTable, mode: ValidationMode) -> Result<()> {
    pipeline(mode).run(table)
}

/// Read a tab-delimited count table file and validate it.
pub fn load(path: impl AsRef<Path>, mode: ValidationMode) -> Result<(DataTable, SourceMetadata)> {
    let path = path.as_ref();
    let (table, metadata) = Parser::with_config(ParserConfig::tsv()).parse_file(path)?;
    validate(&table, mode)?;

    log::debug!(
        "Loaded count table {} ({} taxa, {} barcodes)",
        path.display(),
        table.row_count(),
        barcodes(&table).len()
    );
    Ok((table, metadata))
}

/// The barcode column headers of a validated count table.
pub fn barcodes(table: &DataTable) -> &[String] {
    table.headers.get(LEADING_COLUMNS.len()..).unwrap_or(&[])
}

/// Convert the rows of a validated count table into records.
pub fn records(table: &DataTable) -> Result<Vec<CountRecord>> {
    let n_leading = LEADING_COLUMNS.len();

    table
        .rows
        .iter()
        .enumerate()
        .map(|(row_idx, row)| {
            let cell = |i: usize| row.get(i).map(String::as_str).unwrap_or("");
            let optional = |i: usize| {
                let value = cell(i);
                (!DataTable::is_null_value(value)).then(|| value.to_string())
            };

            let counts = (n_leading..table.column_count())
                .map(|col| parse_count(cell(col), row_idx, col))
                .collect::<Result<Vec<u64>>>()?;

            Ok(CountRecord {
                species: optional(0).unwrap_or_default(),
                genus: optional(1),
                family: optional(2),
                tag: cell(3).to_string(),
                counts,
            })
        })
        .collect()
}

/// Parse a count cell. Integral floats such as `3.0` are accepted because
/// some exporters write counts that way.
fn parse_count(value: &str, row: usize, column: usize) -> Result<u64> {
    let trimmed = value.trim();
    if let Ok(n) = trimmed.parse::<u64>() {
        return Ok(n);
    }

    match trimmed.parse::<f64>() {
        Ok(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(f as u64),
        _ => Err(SurpiError::Parse {
            row: row + 1,
            column: column + 1,
            message: format!("expected a non-negative integer count, found '{}'", value),
        }),
    }
}
