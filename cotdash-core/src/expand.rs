//! Inner expansion: every pivot cell fans out into its horizon sub-columns.
//!
//! The expanded column axis is the ordered product of the occupied original
//! column keys and the horizon labels, so each original column becomes a
//! contiguous block of horizon columns in fixed order. Resolving a cell's
//! identifier to its summary is the only expensive step; it runs once per
//! occupied cell, optionally on a bounded rayon pool, and results are written
//! back by pivot key so completion order never affects the table.

use crate::domain::Identifier;
use crate::format::{format_number, PLACEHOLDER};
use crate::pivot::{ColKey, PivotKey, PivotTable, RowKey};
use crate::summary::{Horizon, HorizonSummary};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::convert::Infallible;
use thiserror::Error;

/// Name of the extra column level introduced by the expansion.
pub const HORIZON_LEVEL: &str = "Time";

/// Value of one expanded cell before formatting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Number(f64),
    /// The identifier resolved, but this horizon has no data.
    Unavailable,
    /// No identifier at this (row, column) position.
    Empty,
}

impl CellValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn format(&self, decimals: usize) -> String {
        match self {
            CellValue::Number(v) => format_number(*v, decimals),
            CellValue::Unavailable | CellValue::Empty => PLACEHOLDER.to_string(),
        }
    }
}

/// One expanded column: original column key plus horizon.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExpandedColumn {
    pub key: ColKey,
    pub horizon: Horizon,
}

/// Pivot table with the column axis extended by the horizon level.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedTable<V> {
    row_dims: Vec<String>,
    col_dims: Vec<String>,
    row_keys: Vec<RowKey>,
    columns: Vec<ExpandedColumn>,
    /// Row-major, `row_keys.len()` rows of `columns.len()` values.
    cells: Vec<Vec<V>>,
}

impl<V> ExpandedTable<V> {
    pub fn row_dims(&self) -> &[String] {
        &self.row_dims
    }

    pub fn col_dims(&self) -> &[String] {
        &self.col_dims
    }

    pub fn row_keys(&self) -> &[RowKey] {
        &self.row_keys
    }

    pub fn columns(&self) -> &[ExpandedColumn] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<V>] {
        &self.cells
    }

    pub fn row_count(&self) -> usize {
        self.row_keys.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn get(&self, row: usize, column: usize) -> Option<&V> {
        self.cells.get(row).and_then(|r| r.get(column))
    }

    /// Lookup by (row key, original column key, horizon).
    pub fn cell(&self, row: &RowKey, col: &ColKey, horizon: Horizon) -> Option<&V> {
        let r = self.row_keys.iter().position(|k| k == row)?;
        let c = self
            .columns
            .iter()
            .position(|c| &c.key == col && c.horizon == horizon)?;
        self.get(r, c)
    }

    /// Names of the column levels, outermost first, ending with the horizon level.
    pub fn level_names(&self) -> Vec<String> {
        let mut names = self.col_dims.clone();
        names.push(HORIZON_LEVEL.to_string());
        names
    }

    /// Column labels per level (outermost first), in column order.
    pub fn column_levels(&self) -> Vec<Vec<String>> {
        let mut levels: Vec<Vec<String>> = (0..self.col_dims.len())
            .map(|level| {
                self.columns
                    .iter()
                    .map(|c| c.key.values().get(level).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();
        levels.push(
            self.columns
                .iter()
                .map(|c| c.horizon.label().to_string())
                .collect(),
        );
        levels
    }

    /// Apply `f` to every cell, keeping the axes.
    pub fn map<U>(&self, mut f: impl FnMut(&V) -> U) -> ExpandedTable<U> {
        ExpandedTable {
            row_dims: self.row_dims.clone(),
            col_dims: self.col_dims.clone(),
            row_keys: self.row_keys.clone(),
            columns: self.columns.clone(),
            cells: self
                .cells
                .iter()
                .map(|row| row.iter().map(&mut f).collect())
                .collect(),
        }
    }
}

impl ExpandedTable<CellValue> {
    /// Formatting pass: numbers rounded for display, gaps as `--`.
    pub fn format(&self, decimals: usize) -> ExpandedTable<String> {
        self.map(|v| v.format(decimals))
    }
}

#[derive(Debug, Error)]
pub enum ExpandError {
    #[error("failed to build resolve worker pool: {0}")]
    ThreadPool(String),
}

/// Runs the inner expansion, sequentially or on a bounded worker pool.
pub struct CellExpander {
    pool: Option<rayon::ThreadPool>,
}

impl CellExpander {
    /// Resolve cells one after another on the calling thread.
    pub fn sequential() -> Self {
        Self { pool: None }
    }

    /// Resolve cells on a dedicated pool of `threads` workers.
    /// `threads <= 1` falls back to sequential.
    pub fn with_threads(threads: usize) -> Result<Self, ExpandError> {
        if threads <= 1 {
            return Ok(Self::sequential());
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("cotdash-resolve-{i}"))
            .build()
            .map_err(|e| ExpandError::ThreadPool(e.to_string()))?;
        Ok(Self { pool: Some(pool) })
    }

    pub fn threads(&self) -> usize {
        self.pool.as_ref().map_or(1, |p| p.current_num_threads())
    }

    /// Expand with an infallible resolver.
    pub fn expand<F>(&self, pivot: &PivotTable, horizons: &[Horizon], resolve: F) -> ExpandedTable<CellValue>
    where
        F: Fn(&Identifier) -> HorizonSummary + Sync,
    {
        match self.try_expand(pivot, horizons, |id| Ok::<_, Infallible>(resolve(id))) {
            Ok(table) => table,
            Err(never) => match never {},
        }
    }

    /// Expand with a fallible resolver.
    ///
    /// Every occupied cell is resolved; if any fail, the error of the first
    /// failing cell in pivot-key order is returned.
    pub fn try_expand<F, E>(
        &self,
        pivot: &PivotTable,
        horizons: &[Horizon],
        resolve: F,
    ) -> Result<ExpandedTable<CellValue>, E>
    where
        F: Fn(&Identifier) -> Result<HorizonSummary, E> + Sync,
        E: Send,
    {
        let occupied: Vec<(&PivotKey, &Identifier)> = pivot.occupied().collect();
        let resolved: Vec<(&PivotKey, Result<HorizonSummary, E>)> = match &self.pool {
            Some(pool) => pool.install(|| {
                occupied
                    .par_iter()
                    .map(|&(key, id)| (key, resolve(id)))
                    .collect()
            }),
            None => occupied.iter().map(|&(key, id)| (key, resolve(id))).collect(),
        };

        tracing::debug!(
            cells = occupied.len(),
            threads = self.threads(),
            "resolved pivot cells"
        );

        // Keyed write-back; occupied() is in key order, so the first error
        // seen is the first in key order.
        let mut summaries: BTreeMap<(&RowKey, &ColKey), HorizonSummary> = BTreeMap::new();
        for (key, result) in resolved {
            summaries.insert((&key.row, &key.col), result?);
        }

        let columns: Vec<ExpandedColumn> = pivot
            .occupied_col_keys()
            .into_iter()
            .flat_map(|key| {
                horizons.iter().map(move |&horizon| ExpandedColumn {
                    key: key.clone(),
                    horizon,
                })
            })
            .collect();

        let cells = pivot
            .row_keys()
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|column| match summaries.get(&(row, &column.key)) {
                        Some(summary) => match summary.value(column.horizon) {
                            Some(v) => CellValue::Number(v),
                            None => CellValue::Unavailable,
                        },
                        None => CellValue::Empty,
                    })
                    .collect()
            })
            .collect();

        Ok(ExpandedTable {
            row_dims: pivot.row_dims().to_vec(),
            col_dims: pivot.col_dims().to_vec(),
            row_keys: pivot.row_keys().to_vec(),
            columns,
            cells,
        })
    }
}

impl Default for CellExpander {
    fn default() -> Self {
        Self::sequential()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ReferenceRow;
    use crate::pivot::pivot;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn row(id: Option<&str>, trader: &str, dir: &str, asset: &str) -> ReferenceRow {
        ReferenceRow::new(id.map(Identifier::from))
            .with("TraderType", trader)
            .with("Direction", dir)
            .with("AssetType", asset)
            .with("Metric", "OI")
    }

    fn table() -> PivotTable {
        let rows = vec![
            row(Some("A"), "Commercial", "Long", "Future"),
            row(Some("B"), "Commercial", "Short", "Future"),
            row(Some("C"), "Commercial", "Long", "Option"),
            row(None, "Commercial", "Short", "Swap"),
        ];
        pivot(&rows, &["TraderType", "Direction"], &["AssetType", "Metric"]).unwrap()
    }

    fn stub(id: &Identifier) -> HorizonSummary {
        match id.as_str() {
            "A" => HorizonSummary::from_values([Some(10.0), Some(1.0), Some(2.0), Some(3.0)]),
            "C" => HorizonSummary::from_values([Some(5.0), None, None, None]),
            _ => HorizonSummary::unavailable(),
        }
    }

    #[test]
    fn columns_are_occupied_keys_times_horizons() {
        let expanded = CellExpander::sequential().expand(&table(), &Horizon::ALL, stub);

        // Swap has no identifier anywhere, so only Future and Option appear
        assert_eq!(expanded.column_count(), 8);
        let levels = expanded.column_levels();
        assert_eq!(levels[0][..4], ["Future", "Future", "Future", "Future"]);
        assert_eq!(levels[0][4..], ["Option", "Option", "Option", "Option"]);
        assert_eq!(levels[2][..4], ["Last", "Δ1wk", "Δ4wk", "Δ1yr"]);
        assert_eq!(levels[2][4..], ["Last", "Δ1wk", "Δ4wk", "Δ1yr"]);
        assert_eq!(expanded.level_names(), vec!["AssetType", "Metric", "Time"]);
    }

    #[test]
    fn cells_hold_summary_entries_or_gaps() {
        let expanded = CellExpander::sequential().expand(&table(), &Horizon::ALL, stub);
        let long = &expanded.rows()[0];
        assert_eq!(long[0], CellValue::Number(10.0));
        assert_eq!(long[3], CellValue::Number(3.0));
        assert_eq!(long[5], CellValue::Unavailable);

        let short = &expanded.rows()[1];
        assert_eq!(short[0], CellValue::Unavailable);
        // (Commercial, Short) has no Option identifier
        assert_eq!(short[4], CellValue::Empty);
    }

    #[test]
    fn resolve_runs_once_per_occupied_cell() {
        let calls = AtomicUsize::new(0);
        CellExpander::sequential().expand(&table(), &Horizon::ALL, |id| {
            calls.fetch_add(1, Ordering::SeqCst);
            stub(id)
        });
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn pooled_expansion_matches_sequential() {
        let pooled = CellExpander::with_threads(4).unwrap();
        assert_eq!(pooled.threads(), 4);
        let a = pooled.expand(&table(), &Horizon::ALL, stub);
        let b = CellExpander::sequential().expand(&table(), &Horizon::ALL, stub);
        assert_eq!(a, b);
    }

    #[test]
    fn try_expand_reports_first_failure_in_key_order() {
        let result = CellExpander::with_threads(2).unwrap().try_expand(
            &table(),
            &Horizon::ALL,
            |id| match id.as_str() {
                "A" => Ok(stub(id)),
                other => Err(other.to_string()),
            },
        );
        // key order: (Commercial,Long)x(Future) = A, (Commercial,Long)x(Option) = C, ...
        assert_eq!(result.unwrap_err(), "C");
    }

    #[test]
    fn format_pass_renders_placeholders() {
        let expanded = CellExpander::sequential().expand(&table(), &Horizon::ALL, stub);
        let formatted = expanded.format(2);
        assert_eq!(formatted.rows()[0][..4], ["10", "1", "2", "3"]);
        assert_eq!(formatted.rows()[1][4], "--");
    }

    #[test]
    fn cell_lookup_by_keys() {
        let expanded = CellExpander::sequential().expand(&table(), &Horizon::ALL, stub);
        let row = RowKey(vec!["Commercial".into(), "Long".into()]);
        let col = ColKey(vec!["Future".into(), "OI".into()]);
        assert_eq!(
            expanded.cell(&row, &col, Horizon::OneYear),
            Some(&CellValue::Number(3.0))
        );
    }
}
