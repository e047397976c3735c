//! Structural checks and the pipeline that runs them.

use crate::error::{Result, SurpiError};
use crate::input::DataTable;

use super::defect::{quote_columns, DefectKind, FormatDefect};

/// Trait for structural table checks.
pub trait TableCheck {
    /// Run the check and return the defect it found, if any.
    fn check(&self, table: &DataTable) -> Option<FormatDefect>;
}

/// Checks that the first columns are exactly the given names, in order,
/// and that at least `min_columns` columns exist.
pub struct LeadingColumns {
    pub expected: &'static [&'static str],
    pub min_columns: usize,
    /// Wording for the columns that must follow the fixed ones.
    pub trailing: &'static str,
}

impl TableCheck for LeadingColumns {
    fn check(&self, table: &DataTable) -> Option<FormatDefect> {
        let in_order = self
            .expected
            .iter()
            .enumerate()
            .all(|(i, name)| table.headers.get(i).map(String::as_str) == Some(*name));

        if table.column_count() >= self.min_columns && in_order {
            return None;
        }

        Some(FormatDefect::new(
            DefectKind::LeadingColumns,
            format!(
                "columns {} in that order, and {}",
                quote_columns(self.expected),
                self.trailing
            ),
            quote_columns(&table.headers),
        ))
    }
}

/// Checks that every named column is present anywhere in the header.
pub struct RequiredColumns {
    pub names: &'static [&'static str],
}

impl TableCheck for RequiredColumns {
    fn check(&self, table: &DataTable) -> Option<FormatDefect> {
        let missing: Vec<&str> = self
            .names
            .iter()
            .copied()
            .filter(|name| !table.has_column(name))
            .collect();

        if missing.is_empty() {
            return None;
        }

        Some(FormatDefect::new(
            DefectKind::MissingColumns,
            format!(
                "at least {} columns (missing {})",
                quote_columns(self.names),
                quote_columns(&missing)
            ),
            quote_columns(&table.headers),
        ))
    }
}

/// Checks that the named columns hold a value in every row. Columns that
/// are absent are left to [`RequiredColumns`].
pub struct FilledColumns {
    pub names: &'static [&'static str],
}

impl TableCheck for FilledColumns {
    fn check(&self, table: &DataTable) -> Option<FormatDefect> {
        let mut gaps = Vec::new();
        for name in self.names {
            let Some(values) = table.column_by_name(name) else {
                continue;
            };
            let rows: Vec<String> = values
                .iter()
                .enumerate()
                .filter(|(_, v)| DataTable::is_null_value(v))
                .map(|(i, _)| (i + 1).to_string())
                .collect();
            if !rows.is_empty() {
                gaps.push(format!("'{}' empty in rows [{}]", name, rows.join(", ")));
            }
        }

        if gaps.is_empty() {
            return None;
        }

        Some(FormatDefect::new(
            DefectKind::MissingValues,
            format!("a value in every row of {}", quote_columns(self.names)),
            gaps.join(", "),
        ))
    }
}

/// Checks that the table has at least one data row.
pub struct HasRows;

impl TableCheck for HasRows {
    fn check(&self, table: &DataTable) -> Option<FormatDefect> {
        if table.row_count() > 0 {
            None
        } else {
            Some(FormatDefect::new(
                DefectKind::NoRows,
                "at least one row",
                "none",
            ))
        }
    }
}

/// How a pipeline reacts to the first defect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValidationMode {
    /// Stop at the first defect.
    #[default]
    FailFast,
    /// Run every check and report all defects together.
    CollectAll,
}

/// An ordered list of checks run against one kind of table.
pub struct ValidationPipeline {
    context: &'static str,
    checks: Vec<Box<dyn TableCheck>>,
    mode: ValidationMode,
}

impl ValidationPipeline {
    /// Create an empty pipeline; `context` names the table in error messages.
    pub fn new(context: &'static str) -> Self {
        Self {
            context,
            checks: Vec::new(),
            mode: ValidationMode::default(),
        }
    }

    /// Append a check.
    pub fn with_check(mut self, check: impl TableCheck + 'static) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    /// Set the validation mode.
    pub fn with_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Run all checks and collect the defects found.
    pub fn defects(&self, table: &DataTable) -> Vec<FormatDefect> {
        let mut defects = Vec::new();

        for check in &self.checks {
            if let Some(defect) = check.check(table) {
                log::debug!("{} check failed: {}", self.context, defect);
                defects.push(defect);
                if self.mode == ValidationMode::FailFast {
                    break;
                }
            }
        }

        defects
    }

    /// Run all checks, failing with a format error if any defect is found.
    pub fn run(&self, table: &DataTable) -> Result<()> {
        let defects = self.defects(table);
        if defects.is_empty() {
            Ok(())
        } else {
            Err(SurpiError::Format {
                context: self.context.to_string(),
                defects,
            })
        }
    }
}
