//! Structural validation of input tables.

mod checks;
mod defect;

pub use checks::{
    FilledColumns, HasRows, LeadingColumns, RequiredColumns, TableCheck, ValidationMode,
    ValidationPipeline,
};
pub use defect::{quote_columns, DefectKind, FormatDefect};
