//! Fixed-width terminal table.

use super::grid::RenderedGrid;

const SEP: &str = " | ";

/// Render as aligned text. Merged headers are centred over their span;
/// index cells are left-aligned and values right-aligned.
pub fn to_text(grid: &RenderedGrid) -> String {
    let widths = column_widths(grid);
    let mut out = String::new();

    for header in &grid.headers {
        let cells: Vec<String> = header
            .spans
            .iter()
            .map(|s| {
                let width = span_width(&widths, s.start, s.span);
                format!("{:^width$}", s.label)
            })
            .collect();
        push_line(&mut out, &cells.join(SEP));
    }

    if !grid.headers.is_empty() {
        let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
        push_line(&mut out, &rule.join("-+-"));
    }

    for row in &grid.body {
        let cells: Vec<String> = row
            .cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| {
                if cell.coord.is_index() {
                    format!("{:<width$}", cell.text)
                } else {
                    format!("{:>width$}", cell.text)
                }
            })
            .collect();
        push_line(&mut out, &cells.join(SEP));
    }
    out
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line.trim_end());
    out.push('\n');
}

fn text_width(s: &str) -> usize {
    s.chars().count()
}

fn span_width(widths: &[usize], start: usize, span: usize) -> usize {
    let cols = &widths[start.min(widths.len())..(start + span).min(widths.len())];
    cols.iter().sum::<usize>() + SEP.len() * cols.len().saturating_sub(1)
}

/// Widest single cell per column, then widened so every merged header fits.
fn column_widths(grid: &RenderedGrid) -> Vec<usize> {
    let mut widths = vec![1usize; grid.width];

    for row in &grid.body {
        for (w, cell) in widths.iter_mut().zip(&row.cells) {
            *w = (*w).max(text_width(&cell.text));
        }
    }

    // narrow spans first so wider ones see the final inner widths
    let mut spans: Vec<_> = grid.headers.iter().flat_map(|h| &h.spans).collect();
    spans.sort_by_key(|s| s.span);
    for s in spans {
        if s.span == 0 || s.end() > widths.len() {
            continue;
        }
        let need = text_width(&s.label);
        let have = span_width(&widths, s.start, s.span);
        if need > have {
            widths[s.end() - 1] += need - have;
        }
    }
    widths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::grid::{BodyCell, BodyRow, CellDescriptor, ColumnDescriptor, HeaderRow, RowDescriptor};
    use crate::render::HeaderSpan;
    use crate::{ColKey, Horizon, RowKey};

    fn value_cell(text: &str, position: usize) -> BodyCell {
        BodyCell {
            text: text.into(),
            coord: CellDescriptor {
                row: RowDescriptor {
                    index: 0,
                    key: RowKey(vec!["Long".into()]),
                },
                column: ColumnDescriptor::Value {
                    position,
                    key: ColKey(vec!["Future".into()]),
                    horizon: Horizon::ALL[position],
                },
            },
        }
    }

    #[test]
    fn merged_header_is_widened_to_fit() {
        let grid = RenderedGrid {
            index_columns: 0,
            width: 2,
            headers: vec![HeaderRow {
                level: "AssetType".into(),
                spans: vec![HeaderSpan {
                    start: 0,
                    span: 2,
                    label: "A very long asset type".into(),
                }],
            }],
            body: vec![BodyRow {
                key: RowKey(vec!["Long".into()]),
                cells: vec![value_cell("1", 0), value_cell("2", 1)],
            }],
        };
        let text = to_text(&grid);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "A very long asset type");
        // separator rule spans the same width as the header
        assert_eq!(lines[1].chars().count(), 22);
        assert!(lines[2].ends_with('2'));
    }
}
