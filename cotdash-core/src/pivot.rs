//! Pivot of flat reference rows into a 2-D hierarchical identifier grid.
//!
//! Row keys and column keys are tuples of dimension values. Both axes hold
//! only combinations actually observed in the input, sorted lexicographically
//! so the rendered order is stable across runs.

use crate::domain::{Identifier, ReferenceRow};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PivotError {
    #[error("ambiguous cell {key}: reference rows {first} and {second} both map to it")]
    AmbiguousCell {
        key: PivotKey,
        first: usize,
        second: usize,
    },

    #[error("reference row {row} has no value for dimension '{field}'")]
    MissingField { field: String, row: usize },
}

/// Row-axis key: one value per row dimension.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowKey(pub Vec<String>);

/// Column-axis key: one value per column dimension.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColKey(pub Vec<String>);

impl RowKey {
    pub fn values(&self) -> &[String] {
        &self.0
    }
}

impl ColKey {
    pub fn values(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.0.join(", "))
    }
}

impl fmt::Display for ColKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.0.join(", "))
    }
}

/// Address of one pivot cell.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PivotKey {
    pub row: RowKey,
    pub col: ColKey,
}

impl fmt::Display for PivotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {}", self.row, self.col)
    }
}

/// Pivoted identifier grid.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PivotTable {
    row_dims: Vec<String>,
    col_dims: Vec<String>,
    row_keys: Vec<RowKey>,
    col_keys: Vec<ColKey>,
    cells: BTreeMap<PivotKey, Identifier>,
}

impl PivotTable {
    pub fn row_dims(&self) -> &[String] {
        &self.row_dims
    }

    pub fn col_dims(&self) -> &[String] {
        &self.col_dims
    }

    /// Observed row keys, sorted.
    pub fn row_keys(&self) -> &[RowKey] {
        &self.row_keys
    }

    /// Observed column keys, sorted.
    pub fn col_keys(&self) -> &[ColKey] {
        &self.col_keys
    }

    pub fn get(&self, row: &RowKey, col: &ColKey) -> Option<&Identifier> {
        // BTreeMap lookup needs an owned key
        self.cells.get(&PivotKey {
            row: row.clone(),
            col: col.clone(),
        })
    }

    /// Occupied cells in key order.
    pub fn occupied(&self) -> impl Iterator<Item = (&PivotKey, &Identifier)> {
        self.cells.iter()
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.len()
    }

    /// Column keys with at least one occupied cell, in sorted order.
    pub fn occupied_col_keys(&self) -> Vec<&ColKey> {
        let occupied: BTreeSet<&ColKey> = self.cells.keys().map(|k| &k.col).collect();
        self.col_keys.iter().filter(|c| occupied.contains(c)).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.row_keys.is_empty()
    }
}

/// Pivot `rows` on `row_dims` × `col_dims`.
///
/// Fails with [`PivotError::AmbiguousCell`] if two rows land on the same key;
/// duplicates are a data-integrity problem and are never overwritten.
pub fn pivot<'a, I>(rows: I, row_dims: &[&str], col_dims: &[&str]) -> Result<PivotTable, PivotError>
where
    I: IntoIterator<Item = &'a ReferenceRow>,
{
    let mut row_keys = BTreeSet::new();
    let mut col_keys = BTreeSet::new();
    let mut seen: BTreeMap<PivotKey, usize> = BTreeMap::new();
    let mut cells = BTreeMap::new();

    for (i, row) in rows.into_iter().enumerate() {
        let key = PivotKey {
            row: RowKey(dim_values(row, row_dims, i)?),
            col: ColKey(dim_values(row, col_dims, i)?),
        };

        if let Some(&first) = seen.get(&key) {
            return Err(PivotError::AmbiguousCell {
                key,
                first,
                second: i,
            });
        }
        seen.insert(key.clone(), i);

        row_keys.insert(key.row.clone());
        col_keys.insert(key.col.clone());
        if let Some(id) = &row.identifier {
            cells.insert(key, id.clone());
        }
    }

    Ok(PivotTable {
        row_dims: row_dims.iter().map(|s| s.to_string()).collect(),
        col_dims: col_dims.iter().map(|s| s.to_string()).collect(),
        row_keys: row_keys.into_iter().collect(),
        col_keys: col_keys.into_iter().collect(),
        cells,
    })
}

fn dim_values(row: &ReferenceRow, dims: &[&str], index: usize) -> Result<Vec<String>, PivotError> {
    dims.iter()
        .map(|dim| {
            row.get(dim)
                .map(str::to_string)
                .ok_or_else(|| PivotError::MissingField {
                    field: dim.to_string(),
                    row: index,
                })
        })
        .collect()
}
