//! Domain types: instrument identifiers, validated time series, reference rows.

pub mod ids;
pub mod reference;
pub mod series;

pub use ids::Identifier;
pub use reference::{ProductOption, ReferenceData, ReferenceError, ReferenceRow, ReportSelection};
pub use series::{SeriesError, SeriesPoint, TimeSeries};
