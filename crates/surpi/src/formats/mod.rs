//! Readers and structural validators for the two SURPI input files.

pub mod count_table;
pub mod sample_sheet;

pub use count_table::CountRecord;
pub use sample_sheet::{SampleSheet, SampleSheetFormat, SampleSheetRow};
