//! Table renderer: expanded table -> presentation grid -> HTML / text.

pub mod grid;
pub mod html;
pub mod spans;
pub mod text;

pub use grid::{
    render, BodyCell, BodyRow, CellDescriptor, ColumnDescriptor, DescriptorError, HeaderRow, RenderOptions,
    RenderedGrid, RowDescriptor,
};
pub use html::to_html;
pub use spans::{header_spans, run_length_spans, HeaderSpan};
pub use text::to_text;
