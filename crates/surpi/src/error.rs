//! Error types for the surpi library.

use std::path::PathBuf;
use thiserror::Error;

use crate::validation::FormatDefect;

/// Main error type for surpi operations.
#[derive(Debug, Error)]
pub enum SurpiError {
    /// Error reading or accessing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Structural violation of an input table.
    #[error("Invalid {context}: {}", join_defects(.defects))]
    Format {
        context: String,
        defects: Vec<FormatDefect>,
    },

    /// Count table barcodes that no sample sheet row claimed.
    #[error(
        "The following barcodes were not linked to sample identifiers in the sample sheet: {}",
        .barcodes.join(", ")
    )]
    Reconciliation { barcodes: Vec<String> },

    /// A barcode matched more than one row on either side of the join.
    #[error("Barcode '{barcode}' is not one-to-one: matched {}", .matches.join(", "))]
    JoinCardinality {
        barcode: String,
        matches: Vec<String>,
    },

    /// Two barcodes resolved to the same sample name.
    #[error("Sample identifiers linked to more than one barcode: {}", .sample_ids.join(", "))]
    DuplicateSampleIds { sample_ids: Vec<String> },

    /// Two count table rows produced the same feature identifier.
    #[error("Feature identifiers are not unique: {}", .feature_ids.join(", "))]
    DuplicateFeatures { feature_ids: Vec<String> },

    /// A row of a matrix does not have the width of the others.
    #[error("Row {row} has {found} values, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// Error parsing a cell value.
    #[error("Parse error at row {row}, column {column}: {message}")]
    Parse {
        row: usize,
        column: usize,
        message: String,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SurpiError {
    /// Build a format error from a single defect.
    pub fn format(context: impl Into<String>, defect: FormatDefect) -> Self {
        SurpiError::Format {
            context: context.into(),
            defects: vec![defect],
        }
    }

    /// Map an IO error onto the path it came from.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SurpiError::Io {
            path: path.into(),
            source,
        }
    }
}

fn join_defects(defects: &[FormatDefect]) -> String {
    defects
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for surpi operations.
pub type Result<T> = std::result::Result<T, SurpiError>;
