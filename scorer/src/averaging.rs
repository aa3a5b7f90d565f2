//! Elementwise mean of an ensemble's value tables.

use crate::error::{Result, ScoreError};
use crate::types::ValueTable;

/// Cell-by-cell arithmetic mean of `tables`.
///
/// Every table must share the first table's dimension; an empty set is an error.
pub fn average_tables(tables: &[ValueTable]) -> Result<ValueTable> {
    let first = tables.first().ok_or(ScoreError::EmptyTableSet)?;
    let dim = first.dim();
    for (index, t) in tables.iter().enumerate() {
        if t.dim() != dim {
            return Err(ScoreError::TableShape {
                index,
                expected: dim,
                found: t.dim(),
            });
        }
    }

    let n = tables.len() as f64;
    let mut out = ValueTable::zeros(dim);
    for row in 0..dim {
        for col in 0..dim {
            let sum: f64 = tables.iter().map(|t| t.get(row, col)).sum();
            out.set(row, col, sum / n);
        }
    }
    Ok(out)
}
