//! Delimited-text loading into [`DataTable`]s.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use sha2::{Digest, Sha256};

use super::source::{DataTable, SourceMetadata};
use crate::error::{Result, SurpiError};

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Field delimiter.
    pub delimiter: u8,
    /// Quote character.
    pub quote: u8,
}

impl ParserConfig {
    /// Tab-delimited configuration.
    pub fn tsv() -> Self {
        Self::default()
    }

    /// Comma-delimited configuration.
    pub fn csv() -> Self {
        Self {
            delimiter: b',',
            ..Self::default()
        }
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: b'\t',
            quote: b'"',
        }
    }
}

/// Raw contents of an input file along with its provenance fields.
#[derive(Debug, Clone)]
pub struct RawSource {
    pub contents: Vec<u8>,
    pub hash: String,
    pub size_bytes: u64,
}

impl RawSource {
    /// Read a file fully and hash its contents.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let mut file = File::open(path).map_err(|e| SurpiError::io(path, e))?;
        let size_bytes = file.metadata().map_err(|e| SurpiError::io(path, e))?.len();

        let mut contents = Vec::new();
        file.read_to_end(&mut contents)
            .map_err(|e| SurpiError::io(path, e))?;

        let mut hasher = Sha256::new();
        hasher.update(&contents);
        let hash = format!("sha256:{:x}", hasher.finalize());

        Ok(Self {
            contents,
            hash,
            size_bytes,
        })
    }

    /// Decode the contents as UTF-8 text.
    pub fn text(&self, path: impl AsRef<Path>) -> Result<&str> {
        std::str::from_utf8(&self.contents).map_err(|e| {
            SurpiError::io(
                path.as_ref(),
                std::io::Error::new(std::io::ErrorKind::InvalidData, e),
            )
        })
    }

    /// Build source metadata for this file once its table shape is known.
    pub fn metadata(
        &self,
        path: impl AsRef<Path>,
        format: &str,
        table: &DataTable,
    ) -> SourceMetadata {
        SourceMetadata::new(
            path.as_ref().to_path_buf(),
            self.hash.clone(),
            self.size_bytes,
            format,
            table.row_count(),
            table.column_count(),
        )
    }
}

/// Parses delimited tabular data with a header row.
///
/// Header-only and empty inputs produce empty tables rather than errors;
/// deciding whether a table is usable is left to the format validators.
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a new tab-delimited parser.
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
        }
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse a file and return the data table and metadata.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<(DataTable, SourceMetadata)> {
        let path = path.as_ref();
        let raw = RawSource::read(path)?;
        let table = self.parse_bytes(&raw.contents)?;

        let format = match self.config.delimiter {
            b'\t' => "tsv",
            b',' => "csv",
            _ => "delimited",
        };
        let metadata = raw.metadata(path, format, &table);

        Ok((table, metadata))
    }

    /// Parse an in-memory string.
    pub fn parse_str(&self, text: &str) -> Result<DataTable> {
        self.parse_bytes(text.as_bytes())
    }

    /// Parse bytes directly.
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<DataTable> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.config.delimiter)
            .has_headers(true)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();
        let expected_cols = headers.len();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let mut row: Vec<String> = record.iter().map(|s| s.to_string()).collect();

            // Ragged rows are squared up against the header
            row.resize(expected_cols, String::new());

            rows.push(row);
        }

        Ok(DataTable::new(headers, rows))
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}
