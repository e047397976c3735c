//! Writers for extracted feature and taxonomy tables.

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SurpiError};
use crate::extract::{FeatureTable, TaxonomyTable, FEATURE_ID_KEY, SAMPLE_ID_KEY, TAXON_KEY};

/// Output file format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Tsv,
    Csv,
    Json,
}

impl OutputFormat {
    /// File extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Tsv => "tsv",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }

    fn delimiter(&self) -> u8 {
        match self {
            OutputFormat::Csv => b',',
            _ => b'\t',
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tsv" => Ok(OutputFormat::Tsv),
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use tsv, csv, or json.", s)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

// JSON layouts. Field and map order follow the tables.

#[derive(Serialize)]
struct FeatureTableDoc<'a> {
    index: &'static str,
    features: &'a [String],
    rows: Vec<FeatureRowDoc<'a>>,
}

#[derive(Serialize)]
struct FeatureRowDoc<'a> {
    sample_id: &'a str,
    counts: IndexMap<&'a str, u64>,
}

#[derive(Serialize)]
struct TaxonomyDoc<'a> {
    index: &'static str,
    column: &'static str,
    rows: IndexMap<&'a str, &'a str>,
}

/// Write a feature table: one row per sample, one column per feature.
pub fn write_feature_table<W: Write>(table: &FeatureTable, mut writer: W, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let doc = FeatureTableDoc {
                index: SAMPLE_ID_KEY,
                features: &table.feature_ids,
                rows: table
                    .rows()
                    .map(|(sample_id, counts)| FeatureRowDoc { sample_id, counts })
                    .collect(),
            };
            serde_json::to_writer_pretty(&mut writer, &doc)?;
            writer.flush().map_err(serde_json::Error::io)?;
        }
        OutputFormat::Tsv | OutputFormat::Csv => {
            let mut out = csv::WriterBuilder::new()
                .delimiter(format.delimiter())
                .from_writer(writer);

            let mut header = vec![SAMPLE_ID_KEY];
            header.extend(table.feature_ids.iter().map(String::as_str));
            out.write_record(&header)?;

            for (sample, counts) in table.sample_ids.iter().zip(&table.counts) {
                let mut record = vec![sample.clone()];
                record.extend(counts.iter().map(u64::to_string));
                out.write_record(&record)?;
            }
            out.flush().map_err(csv::Error::from)?;
        }
    }
    Ok(())
}

/// Write a taxonomy table: one row per feature.
pub fn write_taxonomy<W: Write>(taxonomy: &TaxonomyTable, mut writer: W, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let doc = TaxonomyDoc {
                index: FEATURE_ID_KEY,
                column: TAXON_KEY,
                rows: taxonomy
                    .entries
                    .iter()
                    .map(|e| (e.feature_id.as_str(), e.taxon.as_str()))
                    .collect(),
            };
            serde_json::to_writer_pretty(&mut writer, &doc)?;
            writer.flush().map_err(serde_json::Error::io)?;
        }
        OutputFormat::Tsv | OutputFormat::Csv => {
            let mut out = csv::WriterBuilder::new()
                .delimiter(format.delimiter())
                .from_writer(writer);

            out.write_record([FEATURE_ID_KEY, TAXON_KEY])?;
            for entry in &taxonomy.entries {
                out.write_record([entry.feature_id.as_str(), entry.taxon.as_str()])?;
            }
            out.flush().map_err(csv::Error::from)?;
        }
    }
    Ok(())
}

/// Create a buffered file for writing.
pub fn create_file(path: impl AsRef<Path>) -> Result<BufWriter<File>> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| SurpiError::io(path, e))?;
    Ok(BufWriter::new(file))
}
