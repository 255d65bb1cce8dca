//! Drill-down: the full history behind one clicked report cell.
//!
//! The clicked cell fixes every dimension except the series dimension
//! (usually Direction). All reference rows matching the fixed dimensions
//! contribute one line each, outer-joined on date. When both Long and Short
//! lines exist, a Nett line (Long - Short) is inserted third.

use crate::config::LayoutConfig;
use crate::report::ReportError;
use cotdash_core::data::{align_series, AlignedSeries, DataError};
use cotdash_core::{pivot, CellDescriptor, Identifier, ReferenceRow, TimeSeries};
use std::sync::Arc;

const LONG: &str = "Long";
const SHORT: &str = "Short";
const NETT: &str = "Nett";

/// Aligned series for one clicked cell.
#[derive(Debug, Clone, PartialEq)]
pub struct DrillDown {
    /// `"{trader type} / {asset type or activity}"`.
    pub title: String,
    /// Name of the plotted quantity (the metric).
    pub value_axis: String,
    pub series: AlignedSeries,
}

/// Build the drill-down for `descriptor` from the selected reference rows.
///
/// Returns `Ok(None)` when no row (or no loadable series) matches the cell.
pub fn drill_down<F>(
    rows: &[&ReferenceRow],
    layout: &LayoutConfig,
    descriptor: &CellDescriptor,
    load: F,
) -> Result<Option<DrillDown>, ReportError>
where
    F: Fn(&Identifier) -> Result<Arc<TimeSeries>, DataError>,
{
    let (row_key, col_key, _) = descriptor.value_coords().ok_or(ReportError::NotAValueCell)?;

    let fixed_rows: Vec<(&str, &str)> = layout
        .row_dims
        .iter()
        .zip(row_key.values())
        .filter(|(dim, _)| **dim != layout.series_dim)
        .map(|(dim, value)| (dim.as_str(), value.as_str()))
        .collect();
    let fixed_cols = layout
        .col_dims
        .iter()
        .zip(col_key.values())
        .map(|(dim, value)| (dim.as_str(), value.as_str()));
    let plot_index: Vec<(&str, &str)> = fixed_rows.iter().copied().chain(fixed_cols).collect();

    let matching: Vec<&ReferenceRow> = rows
        .iter()
        .copied()
        .filter(|r| r.identifier.is_some() && r.get(&layout.series_dim).is_some())
        .filter(|r| plot_index.iter().all(|(dim, value)| r.get(dim) == Some(*value)))
        .collect();
    if matching.is_empty() {
        tracing::info!(cell = %descriptor.to_key(), "no series behind clicked cell");
        return Ok(None);
    }

    // one line per series-dim value; duplicates are ambiguous like in the report pivot
    let lines = pivot(matching, &[layout.series_dim.as_str()], &[])?;

    let mut loaded: Vec<(String, Arc<TimeSeries>)> = Vec::new();
    for (key, identifier) in lines.occupied() {
        let label = key.row.values().first().cloned().unwrap_or_default();
        match load(identifier) {
            Ok(series) => loaded.push((label, series)),
            Err(e) if e.is_fatal() => return Err(ReportError::MalformedSeries(e)),
            Err(e) => tracing::warn!(%identifier, error = %e, "skipping unavailable drill-down series"),
        }
    }
    if loaded.is_empty() {
        return Ok(None);
    }

    let refs: Vec<(String, &TimeSeries)> = loaded.iter().map(|(l, s)| (l.clone(), s.as_ref())).collect();
    let mut series = align_series(&refs);
    series.insert_difference(2, NETT, LONG, SHORT);

    let row_label = fixed_rows.first().map(|(_, v)| *v).unwrap_or_default();
    let col_label = col_key.values().first().map(String::as_str).unwrap_or_default();
    let title = if row_label.is_empty() {
        col_label.to_string()
    } else {
        format!("{row_label} / {col_label}")
    };

    Ok(Some(DrillDown {
        title,
        value_axis: col_key.values().last().cloned().unwrap_or_default(),
        series,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_layouts;
    use chrono::NaiveDate;
    use cotdash_core::render::{ColumnDescriptor, RowDescriptor};
    use cotdash_core::{ColKey, Horizon, RowKey, SeriesPoint};

    fn row(id: &str, trader: &str, direction: &str, asset: &str) -> ReferenceRow {
        ReferenceRow::new(Some(Identifier::from(id)))
            .with("TraderType", trader)
            .with("Direction", direction)
            .with("AssetType", asset)
            .with("Metric", "Open interest")
    }

    fn rows() -> Vec<ReferenceRow> {
        vec![
            row("MM-L", "Managed Money", "Long", "Future"),
            row("MM-S", "Managed Money", "Short", "Future"),
            row("MM-SP", "Managed Money", "Spread", "Future"),
            row("MM-L-O", "Managed Money", "Long", "Option"),
            row("PR-L", "Producer", "Long", "Future"),
        ]
    }

    fn value_cell(trader: &str, direction: &str, asset: &str) -> CellDescriptor {
        CellDescriptor {
            row: RowDescriptor {
                index: 0,
                key: RowKey(vec![trader.into(), direction.into()]),
            },
            column: ColumnDescriptor::Value {
                position: 2,
                key: ColKey(vec![asset.into(), "Open interest".into()]),
                horizon: Horizon::Last,
            },
        }
    }

    fn load(id: &Identifier) -> Result<Arc<TimeSeries>, DataError> {
        let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        let base = match id.as_str() {
            "MM-L" => 100.0,
            "MM-S" => 40.0,
            "MM-SP" => 5.0,
            _ => return Err(DataError::unavailable(id, "not in stub")),
        };
        Ok(Arc::new(
            TimeSeries::new(vec![SeriesPoint::new(d(2), base), SeriesPoint::new(d(9), base + 1.0)]).unwrap(),
        ))
    }

    #[test]
    fn gathers_every_direction_and_inserts_nett_third() {
        let rows = rows();
        let refs: Vec<&ReferenceRow> = rows.iter().collect();
        let layout = &default_layouts()[0];

        // clicking the Short cell still plots every direction of the group
        let dd = drill_down(&refs, layout, &value_cell("Managed Money", "Short", "Future"), load)
            .unwrap()
            .unwrap();

        assert_eq!(dd.title, "Managed Money / Future");
        assert_eq!(dd.value_axis, "Open interest");
        let labels: Vec<_> = dd.series.columns.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Long", "Short", "Nett", "Spread"]);
        assert_eq!(dd.series.column("Nett").unwrap().values, vec![Some(60.0), Some(60.0)]);
    }

    #[test]
    fn index_cells_are_rejected() {
        let rows = rows();
        let refs: Vec<&ReferenceRow> = rows.iter().collect();
        let mut cell = value_cell("Managed Money", "Long", "Future");
        cell.column = ColumnDescriptor::Index { position: 0, level: 0 };

        let err = drill_down(&refs, &default_layouts()[0], &cell, load).unwrap_err();
        assert!(matches!(err, ReportError::NotAValueCell));
    }

    #[test]
    fn unloadable_or_missing_series_give_nothing_to_plot() {
        let rows = rows();
        let refs: Vec<&ReferenceRow> = rows.iter().collect();
        let layout = &default_layouts()[0];

        // only PR-L matches, and the stub cannot load it
        let dd = drill_down(&refs, layout, &value_cell("Producer", "Long", "Future"), load).unwrap();
        assert!(dd.is_none());

        let dd = drill_down(&refs, layout, &value_cell("Swap", "Long", "Future"), load).unwrap();
        assert!(dd.is_none());
    }

    #[test]
    fn single_direction_has_no_nett() {
        let rows = vec![row("MM-L", "Managed Money", "Long", "Future")];
        let refs: Vec<&ReferenceRow> = rows.iter().collect();
        let dd = drill_down(&refs, &default_layouts()[0], &value_cell("Managed Money", "Long", "Future"), load)
            .unwrap()
            .unwrap();
        assert_eq!(dd.series.columns.len(), 1);
        assert!(dd.series.column("Nett").is_none());
    }
}
