//! Presentation grid: span-merged header rows plus body cells that carry
//! their own drill-down coordinates.

use super::spans::{header_spans, HeaderSpan};
use crate::expand::ExpandedTable;
use crate::pivot::{ColKey, RowKey};
use crate::summary::Horizon;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("malformed cell descriptor: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Renderer switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Prepend one column per row dimension holding the row key values.
    pub index: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { index: true }
    }
}

/// Row half of a cell coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowDescriptor {
    pub index: usize,
    pub key: RowKey,
}

/// Column half of a cell coordinate. `position` is the grid column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnDescriptor {
    Index { position: usize, level: usize },
    Value { position: usize, key: ColKey, horizon: Horizon },
}

impl ColumnDescriptor {
    pub fn position(&self) -> usize {
        match self {
            ColumnDescriptor::Index { position, .. } | ColumnDescriptor::Value { position, .. } => *position,
        }
    }
}

/// Coordinate of one body cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellDescriptor {
    pub row: RowDescriptor,
    pub column: ColumnDescriptor,
}

impl CellDescriptor {
    /// Stable string form, used as the HTML `id` and on the command line.
    pub fn to_key(&self) -> String {
        // only strings, integers and unit variants: serialisation cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn parse(key: &str) -> Result<Self, DescriptorError> {
        Ok(serde_json::from_str(key)?)
    }

    /// `(row key, original column key, horizon)` for value cells.
    pub fn value_coords(&self) -> Option<(&RowKey, &ColKey, Horizon)> {
        match &self.column {
            ColumnDescriptor::Value { key, horizon, .. } => Some((&self.row.key, key, *horizon)),
            ColumnDescriptor::Index { .. } => None,
        }
    }

    pub fn is_index(&self) -> bool {
        matches!(self.column, ColumnDescriptor::Index { .. })
    }
}

/// One header level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderRow {
    /// Column dimension name (or the horizon level name).
    pub level: String,
    pub spans: Vec<HeaderSpan>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyCell {
    pub text: String,
    pub coord: CellDescriptor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BodyRow {
    pub key: RowKey,
    pub cells: Vec<BodyCell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RenderedGrid {
    /// Number of leading index columns (0 without index).
    pub index_columns: usize,
    /// Total grid columns, index columns included.
    pub width: usize,
    pub headers: Vec<HeaderRow>,
    pub body: Vec<BodyRow>,
}

impl RenderedGrid {
    pub fn cell(&self, row: usize, column: usize) -> Option<&BodyCell> {
        self.body.get(row).and_then(|r| r.cells.get(column))
    }

    /// Locate a body cell by its string key.
    pub fn find(&self, key: &str) -> Option<&BodyCell> {
        let descriptor = CellDescriptor::parse(key).ok()?;
        let cell = self.cell(descriptor.row.index, descriptor.column.position())?;
        (cell.coord == descriptor).then_some(cell)
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Lay out a formatted expanded table.
pub fn render(table: &ExpandedTable<String>, options: &RenderOptions) -> RenderedGrid {
    let index_columns = if options.index { table.row_dims().len() } else { 0 };
    let level_names = table.level_names();
    let value_spans = header_spans(&table.column_levels());

    let headers = level_names
        .into_iter()
        .zip(value_spans)
        .enumerate()
        .map(|(level, (name, spans))| {
            // index columns sit left of the value block and never merge with it
            let mut row: Vec<HeaderSpan> = (0..index_columns)
                .map(|i| HeaderSpan {
                    start: i,
                    span: 1,
                    label: if level == 0 {
                        table.row_dims()[i].clone()
                    } else {
                        String::new()
                    },
                })
                .collect();
            row.extend(spans.into_iter().map(|s| HeaderSpan {
                start: s.start + index_columns,
                ..s
            }));
            HeaderRow { level: name, spans: row }
        })
        .collect();

    let body = table
        .row_keys()
        .iter()
        .zip(table.rows())
        .enumerate()
        .map(|(r, (key, values))| {
            let row = RowDescriptor {
                index: r,
                key: key.clone(),
            };
            let index_cells = (0..index_columns).map(|level| BodyCell {
                text: key.values().get(level).cloned().unwrap_or_default(),
                coord: CellDescriptor {
                    row: row.clone(),
                    column: ColumnDescriptor::Index {
                        position: level,
                        level,
                    },
                },
            });
            let value_cells = table
                .columns()
                .iter()
                .zip(values)
                .enumerate()
                .map(|(c, (column, text))| BodyCell {
                    text: text.clone(),
                    coord: CellDescriptor {
                        row: row.clone(),
                        column: ColumnDescriptor::Value {
                            position: index_columns + c,
                            key: column.key.clone(),
                            horizon: column.horizon,
                        },
                    },
                });
            BodyRow {
                key: key.clone(),
                cells: index_cells.chain(value_cells).collect(),
            }
        })
        .collect();

    RenderedGrid {
        index_columns,
        width: index_columns + table.column_count(),
        headers,
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_key_round_trips() {
        let d = CellDescriptor {
            row: RowDescriptor {
                index: 3,
                key: RowKey(vec!["Managed Money".into(), "Long".into()]),
            },
            column: ColumnDescriptor::Value {
                position: 6,
                key: ColKey(vec!["Future".into(), "Open interest".into()]),
                horizon: Horizon::FourWeeks,
            },
        };
        let key = d.to_key();
        assert!(key.contains("\"kind\":\"value\""));
        let parsed = CellDescriptor::parse(&key).unwrap();
        assert_eq!(parsed, d);
        let (row, col, h) = parsed.value_coords().unwrap();
        assert_eq!(row.values()[1], "Long");
        assert_eq!(col.values()[0], "Future");
        assert_eq!(h, Horizon::FourWeeks);
    }

    #[test]
    fn index_descriptor_has_no_value_coords() {
        let d = CellDescriptor {
            row: RowDescriptor {
                index: 0,
                key: RowKey(vec!["Swap".into()]),
            },
            column: ColumnDescriptor::Index { position: 0, level: 0 },
        };
        assert!(d.is_index());
        assert!(d.value_coords().is_none());
        assert_eq!(CellDescriptor::parse(&d.to_key()).unwrap(), d);
    }

    #[test]
    fn garbage_key_is_rejected() {
        assert!(CellDescriptor::parse("not a descriptor").is_err());
        assert!(CellDescriptor::parse("{\"row\":1}").is_err());
    }
}
