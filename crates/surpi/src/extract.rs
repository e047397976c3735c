//! Extraction of feature and taxonomy tables from a count table and a
//! sample sheet.
//!
//! The count table is keyed by taxon (rows) and barcode (columns). The
//! extraction re-keys it by a synthesized feature identifier, transposes it
//! so barcodes become rows, and joins barcodes to sample names one-to-one.
//! Every count table barcode must end up linked to a sample; nothing is
//! dropped silently.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SurpiError};
use crate::formats::count_table::{self, CountRecord};
use crate::formats::SampleSheet;
use crate::input::DataTable;
use crate::reshape::transpose;

/// Index name of the feature table.
pub const SAMPLE_ID_KEY: &str = "sample_id";
/// Index name of the taxonomy table.
pub const FEATURE_ID_KEY: &str = "feature_id";
/// The taxonomy table's single column.
pub const TAXON_KEY: &str = "taxon_string";

/// Sample-by-feature count matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureTable {
    /// Row keys, in count table barcode order.
    pub sample_ids: Vec<String>,
    /// Column keys, in count table row order.
    pub feature_ids: Vec<String>,
    /// `counts[sample][feature]`.
    pub counts: Vec<Vec<u64>>,
}

impl FeatureTable {
    pub fn sample_count(&self) -> usize {
        self.sample_ids.len()
    }

    pub fn feature_count(&self) -> usize {
        self.feature_ids.len()
    }

    /// Counts for one sample across all features.
    pub fn row(&self, sample_id: &str) -> Option<&[u64]> {
        let index = self.sample_ids.iter().position(|s| s == sample_id)?;
        Some(&self.counts[index])
    }

    /// Counts for one feature across all samples.
    pub fn column(&self, feature_id: &str) -> Option<Vec<u64>> {
        let index = self.feature_ids.iter().position(|f| f == feature_id)?;
        Some(self.counts.iter().map(|row| row[index]).collect())
    }

    /// Count of one feature in one sample.
    pub fn get(&self, sample_id: &str, feature_id: &str) -> Option<u64> {
        let col = self.feature_ids.iter().position(|f| f == feature_id)?;
        self.row(sample_id).map(|row| row[col])
    }

    /// Rows as ordered feature → count maps, keyed by sample id.
    pub fn rows(&self) -> impl Iterator<Item = (&str, IndexMap<&str, u64>)> {
        self.sample_ids.iter().zip(&self.counts).map(|(sample, counts)| {
            let row = self
                .feature_ids
                .iter()
                .map(String::as_str)
                .zip(counts.iter().copied())
                .collect();
            (sample.as_str(), row)
        })
    }
}

/// One feature and its hierarchical label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxonomyEntry {
    pub feature_id: String,
    pub taxon: String,
}

/// Feature-to-taxonomy lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaxonomyTable {
    pub entries: Vec<TaxonomyEntry>,
}

impl TaxonomyTable {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Taxon string for a feature.
    pub fn get(&self, feature_id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.feature_id == feature_id)
            .map(|e| e.taxon.as_str())
    }
}

/// What to do when two count table rows share a feature identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateFeaturePolicy {
    /// Fail, listing every colliding identifier.
    #[default]
    Reject,
    /// Sum the colliding rows into the first one.
    Merge,
}

/// Extraction configuration.
#[derive(Debug, Clone, Default)]
pub struct ExtractConfig {
    pub duplicate_features: DuplicateFeaturePolicy,
}

/// Build the rank-prefixed taxon label of a record.
///
/// Levels run family, genus, species; absent levels are left out along
/// with their marker. Each present level is terminated by `"; "` and the
/// result is trimmed, so the label ends in `;`.
pub fn taxon_string(record: &CountRecord) -> String {
    let species = (!record.species.is_empty()).then_some(record.species.as_str());
    let levels = [
        ("f__", record.family.as_deref()),
        ("g__", record.genus.as_deref()),
        ("s__", species),
    ];

    let mut label = String::new();
    for (marker, name) in levels {
        if let Some(name) = name {
            label.push_str(marker);
            label.push_str(name);
            label.push_str("; ");
        }
    }
    label.trim().to_string()
}

/// Synthesize the feature identifier `species_genus_family`; absent levels
/// contribute empty strings.
pub fn feature_id(record: &CountRecord) -> String {
    format!(
        "{}_{}_{}",
        record.species,
        record.genus.as_deref().unwrap_or(""),
        record.family.as_deref().unwrap_or("")
    )
}

/// Extract with the default configuration.
pub fn extract(count_table: &DataTable, sample_sheet: &SampleSheet) -> Result<(FeatureTable, TaxonomyTable)> {
    Extractor::new().extract(count_table, sample_sheet)
}

/// Turns a count table and a sample sheet into a feature table and a
/// taxonomy table.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    config: ExtractConfig,
}

/// Features after identifier synthesis, with duplicates resolved.
struct Features {
    taxonomy: TaxonomyTable,
    /// `counts[feature][barcode]`.
    counts: Vec<Vec<u64>>,
}

impl Extractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ExtractConfig) -> Self {
        Self { config }
    }

    /// Extract from a validated count table.
    pub fn extract(
        &self,
        count_table: &DataTable,
        sample_sheet: &SampleSheet,
    ) -> Result<(FeatureTable, TaxonomyTable)> {
        let records = count_table::records(count_table)?;
        self.extract_records(count_table::barcodes(count_table), &records, sample_sheet)
    }

    /// Extract from count records whose counts align with `barcodes`.
    ///
    /// A record with more or fewer counts than there are barcodes fails with
    /// [`SurpiError::RaggedRow`] naming its 1-based position.
    pub fn extract_records(
        &self,
        barcodes: &[String],
        records: &[CountRecord],
        sample_sheet: &SampleSheet,
    ) -> Result<(FeatureTable, TaxonomyTable)> {
        // Every record needs one count per barcode
        if let Some((i, record)) = records
            .iter()
            .enumerate()
            .find(|(_, r)| r.counts.len() != barcodes.len())
        {
            return Err(SurpiError::RaggedRow {
                row: i + 1,
                expected: barcodes.len(),
                found: record.counts.len(),
            });
        }

        let features = self.build_features(records)?;
        log::debug!(
            "Built {} features from {} count records",
            features.taxonomy.len(),
            records.len()
        );

        // Barcodes become rows
        let by_barcode = transpose(&features.counts)?;
        let feature_barcodes: Vec<&str> = barcodes.iter().map(String::as_str).collect();

        let joined = join_samples(&feature_barcodes, by_barcode, sample_sheet)?;
        reconcile(&feature_barcodes, &joined)?;

        let duplicates = duplicated(joined.iter().map(|j| j.sample_name));
        if !duplicates.is_empty() {
            return Err(SurpiError::DuplicateSampleIds {
                sample_ids: duplicates,
            });
        }

        let feature_ids: Vec<String> = features
            .taxonomy
            .entries
            .iter()
            .map(|e| e.feature_id.clone())
            .collect();
        let (sample_ids, counts): (Vec<String>, Vec<Vec<u64>>) = joined
            .into_iter()
            .map(|j| (j.sample_name.to_string(), j.counts))
            .unzip();

        let table = FeatureTable {
            sample_ids,
            feature_ids,
            counts,
        };
        log::info!(
            "Extracted {} samples x {} features",
            table.sample_count(),
            table.feature_count()
        );

        Ok((table, features.taxonomy))
    }

    fn build_features(&self, records: &[CountRecord]) -> Result<Features> {
        let mut positions: IndexMap<String, usize> = IndexMap::new();
        let mut taxonomy = TaxonomyTable::default();
        let mut counts: Vec<Vec<u64>> = Vec::new();
        let mut collisions: Vec<String> = Vec::new();

        for record in records {
            let id = feature_id(record);

            if let Some(&existing) = positions.get(&id) {
                if !collisions.contains(&id) {
                    collisions.push(id.clone());
                }
                for (total, n) in counts[existing].iter_mut().zip(&record.counts) {
                    *total += n;
                }
                continue;
            }

            positions.insert(id.clone(), counts.len());
            taxonomy.entries.push(TaxonomyEntry {
                taxon: taxon_string(record),
                feature_id: id,
            });
            counts.push(record.counts.clone());
        }

        if !collisions.is_empty() {
            match self.config.duplicate_features {
                DuplicateFeaturePolicy::Reject => {
                    return Err(SurpiError::DuplicateFeatures {
                        feature_ids: collisions,
                    });
                }
                DuplicateFeaturePolicy::Merge => {
                    log::warn!(
                        "Merged counts of rows sharing feature identifiers: {}",
                        collisions.join(", ")
                    );
                }
            }
        }

        Ok(Features { taxonomy, counts })
    }
}

/// A barcode row that found its sample.
struct JoinedRow<'a> {
    barcode: &'a str,
    sample_name: &'a str,
    counts: Vec<u64>,
}

/// Inner join of barcode rows against the sample sheet, one-to-one on both
/// sides. Barcodes without a sheet row are left out here and caught by
/// [`reconcile`].
fn join_samples<'a>(
    barcodes: &[&'a str],
    rows: Vec<Vec<u64>>,
    sample_sheet: &'a SampleSheet,
) -> Result<Vec<JoinedRow<'a>>> {
    let mut columns: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, barcode) in barcodes.iter().enumerate() {
        columns.entry(*barcode).or_default().push(i);
    }
    // Report left-side duplicates in column order
    for barcode in barcodes {
        if columns[barcode].len() > 1 {
            return Err(SurpiError::JoinCardinality {
                barcode: barcode.to_string(),
                matches: columns[barcode]
                    .iter()
                    .map(|i| format!("count table column {}", i + count_table::LEADING_COLUMNS.len() + 1))
                    .collect(),
            });
        }
    }

    let mut samples: HashMap<&str, Vec<&str>> = HashMap::new();
    for row in &sample_sheet.rows {
        samples
            .entry(row.barcode.as_str())
            .or_default()
            .push(row.sample_name.as_str());
    }

    // A table with no features has no barcode rows to carry counts
    let rows = if rows.is_empty() {
        vec![Vec::new(); barcodes.len()]
    } else {
        rows
    };

    let mut joined = Vec::with_capacity(barcodes.len());
    for (&barcode, counts) in barcodes.iter().zip(rows) {
        match samples.get(barcode).map(Vec::as_slice) {
            None | Some([]) => {}
            Some(&[sample_name]) => joined.push(JoinedRow {
                barcode,
                sample_name,
                counts,
            }),
            Some(names) => {
                return Err(SurpiError::JoinCardinality {
                    barcode: barcode.to_string(),
                    matches: names.iter().map(|n| n.to_string()).collect(),
                });
            }
        }
    }

    log::debug!(
        "Joined {} of {} barcodes to sample names",
        joined.len(),
        barcodes.len()
    );
    Ok(joined)
}

/// Fail if any count table barcode did not survive the join.
fn reconcile(feature_barcodes: &[&str], joined: &[JoinedRow<'_>]) -> Result<()> {
    let identified: HashSet<&str> = joined.iter().map(|j| j.barcode).collect();
    let unmatched: Vec<String> = feature_barcodes
        .iter()
        .filter(|b| !identified.contains(*b))
        .map(|b| b.to_string())
        .collect();

    if unmatched.is_empty() {
        Ok(())
    } else {
        Err(SurpiError::Reconciliation { barcodes: unmatched })
    }
}

/// Values occurring more than once, in first-seen order.
fn duplicated<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut dups: Vec<String> = Vec::new();
    for value in values {
        if !seen.insert(value) && !dups.iter().any(|d| d == value) {
            dups.push(value.to_string());
        }
    }
    dups
}
