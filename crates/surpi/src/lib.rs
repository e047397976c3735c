//! Surpi: turn SURPI+ count tables into feature and taxonomy tables.
//!
//! SURPI+ reports one row per classified taxon and one count column per
//! sequencing barcode. This crate validates that count table and the run's
//! sample sheet, then joins them into a sample-by-feature count matrix keyed
//! by sample name and a feature-to-taxonomy lookup.
//!
//! # Core Principles
//!
//! - **Structural validation first**: malformed inputs fail with the
//!   expected and the observed shape
//! - **No silent loss**: every count table barcode must link to exactly one
//!   sample, or the extraction fails
//! - **Non-destructive**: inputs are never modified
//!
//! # Example
//!
//! ```no_run
//! use surpi::{OutputFormat, Surpi};
//!
//! let surpi = Surpi::new();
//! let result = surpi
//!     .extract("surpi_output.counttable", "SampleSheet.csv")
//!     .unwrap();
//!
//! println!("Samples: {}", result.feature_table.sample_count());
//! println!("Features: {}", result.taxonomy.len());
//! result.save("out", OutputFormat::Tsv, true).unwrap();
//! ```

pub mod error;
pub mod extract;
pub mod formats;
pub mod input;
pub mod output;
pub mod reshape;
pub mod validation;

mod pipeline;

pub use crate::pipeline::{ExtractionReport, ExtractionResult, SavedOutputs, Surpi, SurpiConfig};
pub use error::{Result, SurpiError};
pub use extract::{
    extract, DuplicateFeaturePolicy, ExtractConfig, Extractor, FeatureTable, TaxonomyEntry,
    TaxonomyTable,
};
pub use formats::{CountRecord, SampleSheet, SampleSheetFormat, SampleSheetRow};
pub use input::{DataTable, Parser, ParserConfig, SourceMetadata};
pub use output::OutputFormat;
pub use validation::{DefectKind, FormatDefect, ValidationMode};
