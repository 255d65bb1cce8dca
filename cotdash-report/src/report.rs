//! Report builds: selection -> layout -> pivot -> expand -> format -> render.
//!
//! Data problems for individual cells are downgraded to unavailable
//! summaries (and logged) so the rest of the grid still renders. Only a
//! malformed series aborts the build.

use crate::config::{DashboardConfig, LayoutConfig};
use crate::drill_down::{drill_down, DrillDown};
use crate::layout::resolve_layout;
use cotdash_core::data::{DataError, SeriesStore};
use cotdash_core::expand::ExpandError;
use cotdash_core::render::DescriptorError;
use cotdash_core::{
    pivot, render, summarize_latest, CellDescriptor, CellExpander, CellValue, ExpandedTable, Horizon, HorizonSummary,
    Identifier, PivotError, PivotTable, ReferenceData, RenderOptions, RenderedGrid, ReportSelection,
};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("pivot failed: {0}")]
    Pivot(#[from] PivotError),

    #[error("aborting report: {0}")]
    MalformedSeries(DataError),

    #[error("no layout configured for regulation '{regulation}' and report type '{}'", report_type.as_deref().unwrap_or("<none>"))]
    NoLayout {
        regulation: String,
        report_type: Option<String>,
    },

    #[error("clicked cell is an index cell, not a value cell")]
    NotAValueCell,

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error(transparent)]
    Expand(#[from] ExpandError),
}

/// One built report.
#[derive(Debug)]
pub struct Report {
    pub selection: ReportSelection,
    pub layout: LayoutConfig,
    pub pivot: PivotTable,
    pub expanded: ExpandedTable<CellValue>,
    pub grid: RenderedGrid,
    /// Cells shown as unavailable, with the reason.
    pub downgraded: Vec<(Identifier, DataError)>,
    pub elapsed: Duration,
}

impl Report {
    /// True when the selection matched no reference rows.
    pub fn is_empty(&self) -> bool {
        self.pivot.is_empty()
    }
}

/// Shared state behind every report: reference table, series store, resolve
/// pool and layouts.
pub struct Dashboard {
    reference: Arc<ReferenceData>,
    store: Arc<SeriesStore>,
    expander: CellExpander,
    layouts: Vec<LayoutConfig>,
    decimals: usize,
}

impl Dashboard {
    pub fn new(reference: Arc<ReferenceData>, store: Arc<SeriesStore>, config: &DashboardConfig) -> Result<Self, ReportError> {
        Ok(Self {
            reference,
            store,
            expander: CellExpander::with_threads(config.worker_threads)?,
            layouts: config.layouts.clone(),
            decimals: config.decimals,
        })
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    pub fn store(&self) -> &SeriesStore {
        &self.store
    }

    pub fn layout_for(&self, selection: &ReportSelection) -> Result<&LayoutConfig, ReportError> {
        resolve_layout(&self.layouts, &selection.regulation, selection.report_type.as_deref()).ok_or_else(|| {
            ReportError::NoLayout {
                regulation: selection.regulation.clone(),
                report_type: selection.report_type.clone(),
            }
        })
    }

    /// Identifiers referenced by a selection, sorted and deduplicated.
    pub fn identifiers(&self, selection: &ReportSelection) -> Vec<Identifier> {
        let mut ids: Vec<Identifier> = self
            .reference
            .select(selection)
            .into_iter()
            .filter_map(|r| r.identifier.clone())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }

    pub fn build_report(&self, selection: &ReportSelection, options: &RenderOptions) -> Result<Report, ReportError> {
        let started = Instant::now();
        let layout = self.layout_for(selection)?.clone();

        let rows = self.reference.select(selection);
        if rows.is_empty() {
            tracing::info!(
                product = %selection.product,
                regulation = %selection.regulation,
                source = %selection.source,
                "selection matched no reference rows"
            );
        }
        let table = pivot(rows, &layout.row_dims(), &layout.col_dims())?;

        let downgraded = Mutex::new(Vec::new());
        let expanded = self.expander.try_expand(&table, &Horizon::ALL, |id| {
            self.resolve(id, &downgraded)
        })?;
        let mut downgraded = downgraded.into_inner().unwrap_or_else(|p| p.into_inner());
        downgraded.sort_by(|a, b| a.0.cmp(&b.0));

        let grid = render(&expanded.format(self.decimals), options);
        let elapsed = started.elapsed();

        tracing::info!(
            rows = grid.body.len(),
            columns = grid.width,
            cells = table.occupied_count(),
            downgraded = downgraded.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "built report"
        );

        Ok(Report {
            selection: selection.clone(),
            layout,
            pivot: table,
            expanded,
            grid,
            downgraded,
            elapsed,
        })
    }

    /// Aligned series behind a clicked value cell.
    pub fn drill_down(&self, selection: &ReportSelection, descriptor: &CellDescriptor) -> Result<Option<DrillDown>, ReportError> {
        let layout = self.layout_for(selection)?;
        let rows = self.reference.select(selection);
        drill_down(&rows, layout, descriptor, |id| self.store.get(id))
    }

    /// Same as [`Dashboard::drill_down`], from a descriptor key string.
    pub fn drill_down_key(&self, selection: &ReportSelection, key: &str) -> Result<Option<DrillDown>, ReportError> {
        let descriptor = CellDescriptor::parse(key)?;
        self.drill_down(selection, &descriptor)
    }

    fn resolve(&self, id: &Identifier, downgraded: &Mutex<Vec<(Identifier, DataError)>>) -> Result<HorizonSummary, ReportError> {
        match self.store.get(id) {
            Ok(series) => Ok(summarize_latest(&series)),
            Err(e) if e.is_fatal() => Err(ReportError::MalformedSeries(e)),
            Err(e) => {
                tracing::warn!(identifier = %id, error = %e, "series unavailable, showing --");
                downgraded
                    .lock()
                    .unwrap_or_else(|p| p.into_inner())
                    .push((id.clone(), e));
                Ok(HorizonSummary::unavailable())
            }
        }
    }
}
