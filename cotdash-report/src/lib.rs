//! COTDash Report: configuration, layouts, report builds, drill-down.
//!
//! This crate builds on `cotdash-core` to provide:
//! - TOML dashboard configuration with the standard CFTC / MiFID layouts
//! - Layout resolution per regulation and report type
//! - Report builds that downgrade missing data to `--` cells
//! - Drill-down of a clicked cell into its aligned history

pub mod config;
pub mod drill_down;
pub mod layout;
pub mod report;

pub use config::{default_layouts, ConfigError, DashboardConfig, FetchConfig, LayoutConfig, MAX_FETCH_RETRIES};
pub use drill_down::{drill_down, DrillDown};
pub use layout::resolve_layout;
pub use report::{Dashboard, Report, ReportError};
