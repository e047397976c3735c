//! Row/column reshaping of count matrices.

use crate::error::{Result, SurpiError};

/// Transpose a row-major matrix.
///
/// Every row must have the width of the first; a ragged row fails with
/// [`SurpiError::RaggedRow`] (1-based). The result has one row per input
/// column. An empty matrix transposes to an empty matrix.
pub fn transpose<T: Clone>(matrix: &[Vec<T>]) -> Result<Vec<Vec<T>>> {
    let width = matrix.first().map_or(0, Vec::len);
    if let Some((i, row)) = matrix.iter().enumerate().find(|(_, row)| row.len() != width) {
        return Err(SurpiError::RaggedRow {
            row: i + 1,
            expected: width,
            found: row.len(),
        });
    }

    Ok((0..width)
        .map(|col| matrix.iter().map(|row| row[col].clone()).collect())
        .collect())
}
