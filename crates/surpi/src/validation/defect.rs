//! Structural defects found in input tables.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of structural defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefectKind {
    /// Leading columns are missing, renamed, or out of order.
    LeadingColumns,
    /// A required column is absent.
    MissingColumns,
    /// A required column has empty or missing-value cells.
    MissingValues,
    /// The table has a header but no data rows.
    NoRows,
    /// A sectioned file has no `[Data]` section.
    MissingSection,
}

impl DefectKind {
    /// Get a human-readable label for the defect kind.
    pub fn label(&self) -> &'static str {
        match self {
            DefectKind::LeadingColumns => "Leading Columns",
            DefectKind::MissingColumns => "Missing Columns",
            DefectKind::MissingValues => "Missing Values",
            DefectKind::NoRows => "No Rows",
            DefectKind::MissingSection => "Missing Section",
        }
    }
}

/// One structural violation, with the expected and the observed shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatDefect {
    pub kind: DefectKind,
    pub expected: String,
    pub observed: String,
}

impl FormatDefect {
    pub fn new(kind: DefectKind, expected: impl Into<String>, observed: impl Into<String>) -> Self {
        Self {
            kind,
            expected: expected.into(),
            observed: observed.into(),
        }
    }
}

impl fmt::Display for FormatDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expected {}, but got {}", self.expected, self.observed)
    }
}

/// Render column names the way defect messages quote them.
pub fn quote_columns<S: AsRef<str>>(columns: &[S]) -> String {
    let quoted: Vec<String> = columns
        .iter()
        .map(|c| format!("'{}'", c.as_ref()))
        .collect();
    format!("[{}]", quoted.join(", "))
}
