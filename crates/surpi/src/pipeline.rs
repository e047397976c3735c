//! Main Surpi struct and public API.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Result, SurpiError};
use crate::extract::{ExtractConfig, Extractor, FeatureTable, TaxonomyTable};
use crate::formats::{count_table, sample_sheet, SampleSheet, SampleSheetFormat};
use crate::input::{DataTable, SourceMetadata};
use crate::output::{self, OutputFormat};
use crate::validation::ValidationMode;

/// Base name of the written feature table.
pub const FEATURE_TABLE_STEM: &str = "feature-table";
/// Base name of the written taxonomy table.
pub const TAXONOMY_STEM: &str = "taxonomy";
/// File name of the extraction report.
pub const REPORT_FILE: &str = "extraction-report.json";

/// Configuration for a Surpi run.
#[derive(Debug, Clone, Default)]
pub struct SurpiConfig {
    /// Layout of the sample sheet.
    pub sheet_format: SampleSheetFormat,
    /// Whether validation stops at the first defect.
    pub validation_mode: ValidationMode,
    /// Extraction configuration.
    pub extract: ExtractConfig,
}

/// Result of extracting a count table against a sample sheet.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    pub feature_table: FeatureTable,
    pub taxonomy: TaxonomyTable,
    pub report: ExtractionReport,
}

/// Provenance and shape of an extraction.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    /// Metadata about the count table file.
    pub count_table: SourceMetadata,
    /// Metadata about the sample sheet file.
    pub sample_sheet: SourceMetadata,
    pub sheet_format: SampleSheetFormat,
    /// Samples in the feature table.
    pub sample_count: usize,
    /// Features in the feature table.
    pub feature_count: usize,
    /// Sample sheet rows with no barcode in the count table.
    pub unused_sheet_rows: usize,
    pub extracted_at: DateTime<Utc>,
}

/// Paths written by [`ExtractionResult::save`].
#[derive(Debug, Clone)]
pub struct SavedOutputs {
    pub feature_table: PathBuf,
    pub taxonomy: PathBuf,
    pub report: Option<PathBuf>,
}

impl ExtractionResult {
    /// Write both tables (and optionally the report) into `dir`.
    pub fn save(&self, dir: impl AsRef<Path>, format: OutputFormat, with_report: bool) -> Result<SavedOutputs> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| SurpiError::io(dir, e))?;

        let feature_path = dir.join(format!("{}.{}", FEATURE_TABLE_STEM, format.extension()));
        let mut out = output::create_file(&feature_path)?;
        output::write_feature_table(&self.feature_table, &mut out, format)?;
        out.flush().map_err(|e| SurpiError::io(&feature_path, e))?;

        let taxonomy_path = dir.join(format!("{}.{}", TAXONOMY_STEM, format.extension()));
        let mut out = output::create_file(&taxonomy_path)?;
        output::write_taxonomy(&self.taxonomy, &mut out, format)?;
        out.flush().map_err(|e| SurpiError::io(&taxonomy_path, e))?;

        let report = if with_report {
            let path = dir.join(REPORT_FILE);
            let mut out = output::create_file(&path)?;
            serde_json::to_writer_pretty(&mut out, &self.report)?;
            out.flush().map_err(|e| SurpiError::io(&path, e))?;
            Some(path)
        } else {
            None
        };

        log::info!("Wrote extraction outputs to {}", dir.display());
        Ok(SavedOutputs {
            feature_table: feature_path,
            taxonomy: taxonomy_path,
            report,
        })
    }
}

/// Loads, validates and extracts SURPI outputs.
pub struct Surpi {
    config: SurpiConfig,
    extractor: Extractor,
}

impl Surpi {
    /// Create a new Surpi instance with default configuration.
    pub fn new() -> Self {
        Self::with_config(SurpiConfig::default())
    }

    /// Create a Surpi instance with custom configuration.
    pub fn with_config(config: SurpiConfig) -> Self {
        let extractor = Extractor::with_config(config.extract.clone());
        Self { config, extractor }
    }

    /// Get the configuration.
    pub fn config(&self) -> &SurpiConfig {
        &self.config
    }

    /// Load and validate a count table file.
    pub fn load_count_table(&self, path: impl AsRef<Path>) -> Result<(DataTable, SourceMetadata)> {
        count_table::load(path, self.config.validation_mode)
    }

    /// Load and validate a sample sheet file.
    pub fn load_sample_sheet(&self, path: impl AsRef<Path>) -> Result<(SampleSheet, SourceMetadata)> {
        sample_sheet::parse_file(path, self.config.sheet_format, self.config.validation_mode)
    }

    /// Load both files and extract the feature and taxonomy tables.
    pub fn extract(
        &self,
        count_table_path: impl AsRef<Path>,
        sample_sheet_path: impl AsRef<Path>,
    ) -> Result<ExtractionResult> {
        let (counts, count_source) = self.load_count_table(count_table_path)?;
        let (sheet, sheet_source) = self.load_sample_sheet(sample_sheet_path)?;

        let (feature_table, taxonomy) = self.extractor.extract(&counts, &sheet)?;

        let report = ExtractionReport {
            count_table: count_source,
            sample_sheet: sheet_source,
            sheet_format: sheet.format,
            sample_count: feature_table.sample_count(),
            feature_count: feature_table.feature_count(),
            unused_sheet_rows: sheet.len().saturating_sub(feature_table.sample_count()),
            extracted_at: Utc::now(),
        };

        Ok(ExtractionResult {
            feature_table,
            taxonomy,
            report,
        })
    }
}

impl Default for Surpi {
    fn default() -> Self {
        Self::new()
    }
}
