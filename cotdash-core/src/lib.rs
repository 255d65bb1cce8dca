//! COTDash Core: series store, horizon summaries, pivot, inner expansion, rendering.
//!
//! This crate contains the engine behind the positioning dashboard:
//! - Domain types (identifiers, validated time series, reference rows)
//! - Series store with file-backed cache and coalesced remote fetches
//! - Horizon summarizer (latest level plus 1wk / 4wk / 1yr deltas)
//! - Pivot of reference rows into a hierarchical identifier grid
//! - Inner expansion of every pivot cell into its horizon sub-columns
//! - Span-merged header layout and per-cell drill-down coordinates

pub mod data;
pub mod domain;
pub mod expand;
pub mod format;
pub mod pivot;
pub mod render;
pub mod summary;

pub use domain::{Identifier, ReferenceData, ReferenceRow, ReportSelection, SeriesPoint, TimeSeries};
pub use expand::{CellExpander, CellValue, ExpandedColumn, ExpandedTable};
pub use pivot::{pivot, ColKey, PivotError, PivotKey, PivotTable, RowKey};
pub use render::{render, CellDescriptor, ColumnDescriptor, HeaderSpan, RenderOptions, RenderedGrid};
pub use summary::{summarize, summarize_latest, Horizon, HorizonEntry, HorizonSummary};
