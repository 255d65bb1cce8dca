//! Reference table: which identifier reports which positioning figure.
//!
//! The table is loaded once at process start and then shared read-only
//! (`Arc<ReferenceData>`) with every report build and resolve worker. Nothing
//! in here mutates it after construction.

use super::ids::Identifier;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Well-known reference column names.
pub mod fields {
    pub const TICKER: &str = "Ticker";
    pub const PRODUCT: &str = "Product";
    pub const REGULATION: &str = "Regulation";
    pub const REPORT_TYPE: &str = "ReportType";
    pub const SOURCE: &str = "Source";
    pub const UNDERLYING: &str = "Underlying";
    pub const TRADER_TYPE: &str = "TraderType";
    pub const DIRECTION: &str = "Direction";
    pub const ASSET_TYPE: &str = "AssetType";
    pub const ACTIVITY: &str = "Activity";
    pub const METRIC: &str = "Metric";
}

#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("read reference file: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse reference CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("reference CSV has no '{column}' column")]
    MissingColumn { column: String },
}

/// One reference row: categorical fields plus the identifier holding the data.
///
/// Blank CSV cells are stored as absent fields. A row without an identifier
/// still contributes its dimension values to the pivot key space.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReferenceRow {
    pub fields: BTreeMap<String, String>,
    pub identifier: Option<Identifier>,
}

impl ReferenceRow {
    pub fn new(identifier: Option<Identifier>) -> Self {
        Self {
            fields: BTreeMap::new(),
            identifier,
        }
    }

    /// Builder-style field setter.
    pub fn with(mut self, field: &str, value: &str) -> Self {
        self.fields.insert(field.to_string(), value.to_string());
        self
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(|s| s.as_str())
    }

    fn matches(&self, field: &str, value: &str) -> bool {
        self.get(field) == Some(value)
    }
}

/// External query choosing one report out of the reference table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSelection {
    pub product: String,
    pub regulation: String,
    /// `None` when the regulation publishes a single report type.
    pub report_type: Option<String>,
    pub source: String,
}

/// Product entry for the selection cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductOption {
    pub product: String,
    pub underlyings: Vec<String>,
}

impl ProductOption {
    /// Display label: `"US Crude WTI Future (CL/CO)"`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.product, self.underlyings.join("/"))
    }
}

/// Immutable reference table.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    rows: Vec<ReferenceRow>,
}

impl ReferenceData {
    pub fn new(rows: Vec<ReferenceRow>) -> Self {
        Self { rows }
    }

    /// Load from a CSV file whose `ticker_column` holds the identifier.
    pub fn from_csv_path(path: &Path, ticker_column: &str) -> Result<Self, ReferenceError> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file, ticker_column)
    }

    /// Parse CSV from any reader. Every column other than `ticker_column`
    /// becomes a categorical field.
    pub fn from_csv_reader<R: Read>(reader: R, ticker_column: &str) -> Result<Self, ReferenceError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let ticker_idx = headers
            .iter()
            .position(|h| h == ticker_column)
            .ok_or_else(|| ReferenceError::MissingColumn {
                column: ticker_column.to_string(),
            })?;

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let mut row = ReferenceRow::default();
            for (i, value) in record.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                if i == ticker_idx {
                    row.identifier = Some(Identifier::new(value));
                } else if let Some(name) = headers.get(i) {
                    row.fields.insert(name.to_string(), value.to_string());
                }
            }
            rows.push(row);
        }

        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[ReferenceRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows belonging to one report.
    pub fn select(&self, selection: &ReportSelection) -> Vec<&ReferenceRow> {
        self.rows
            .iter()
            .filter(|r| {
                r.matches(fields::PRODUCT, &selection.product)
                    && r.matches(fields::REGULATION, &selection.regulation)
                    && r.matches(fields::SOURCE, &selection.source)
                    && selection
                        .report_type
                        .as_deref()
                        .map_or(true, |rt| r.matches(fields::REPORT_TYPE, rt))
            })
            .collect()
    }

    // ── Selection cascade ───────────────────────────────────────────

    /// Products sorted by name, each with its distinct underlyings.
    pub fn products(&self) -> Vec<ProductOption> {
        let mut by_product: BTreeMap<&str, Vec<String>> = BTreeMap::new();
        for row in &self.rows {
            let Some(product) = row.get(fields::PRODUCT) else {
                continue;
            };
            let underlyings = by_product.entry(product).or_default();
            if let Some(u) = row.get(fields::UNDERLYING) {
                if !underlyings.iter().any(|x| x == u) {
                    underlyings.push(u.to_string());
                }
            }
        }
        by_product
            .into_iter()
            .map(|(product, underlyings)| ProductOption {
                product: product.to_string(),
                underlyings,
            })
            .collect()
    }

    /// Regulations reporting a product, in first-seen order.
    pub fn regulations(&self, product: &str) -> Vec<String> {
        distinct(
            self.rows
                .iter()
                .filter(|r| r.matches(fields::PRODUCT, product))
                .filter_map(|r| r.get(fields::REGULATION)),
        )
    }

    /// Report types for a product under a regulation. Empty when the
    /// regulation has no report-type split.
    pub fn report_types(&self, product: &str, regulation: &str) -> Vec<String> {
        distinct(
            self.rows
                .iter()
                .filter(|r| r.matches(fields::PRODUCT, product) && r.matches(fields::REGULATION, regulation))
                .filter_map(|r| r.get(fields::REPORT_TYPE)),
        )
    }

    /// Reporting sources (exchanges) for a product / regulation / report type.
    pub fn sources(&self, product: &str, regulation: &str, report_type: Option<&str>) -> Vec<String> {
        distinct(
            self.rows
                .iter()
                .filter(|r| r.matches(fields::PRODUCT, product) && r.matches(fields::REGULATION, regulation))
                .filter(|r| report_type.map_or(true, |rt| r.matches(fields::REPORT_TYPE, rt)))
                .filter_map(|r| r.get(fields::SOURCE)),
        )
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}
