//! HTML table emitter.

use super::grid::RenderedGrid;

/// HTML table with merged header cells. Every body cell's `id` is its
/// descriptor key, so a click handler can recover the coordinates.
pub fn to_html(grid: &RenderedGrid) -> String {
    let mut out = String::from("<table class=\"cotdash\">\n<thead>\n");

    for header in &grid.headers {
        out.push_str("<tr>");
        for span in &header.spans {
            if span.span > 1 {
                out.push_str(&format!("<th colspan=\"{}\">{}</th>", span.span, escape(&span.label)));
            } else {
                out.push_str(&format!("<th>{}</th>", escape(&span.label)));
            }
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</thead>\n<tbody>\n");

    for row in &grid.body {
        out.push_str("<tr>");
        for cell in &row.cells {
            let class = if cell.coord.is_index() { "index" } else { "value" };
            out.push_str(&format!(
                "<td class=\"{class}\" id=\"{}\">{}</td>",
                escape(&cell.coord.to_key()),
                escape(&cell.text)
            ));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n");
    out
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
