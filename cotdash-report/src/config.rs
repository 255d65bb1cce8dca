//! Dashboard configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) gives a
//! working setup with the standard CFTC and MiFID layouts.

use chrono::NaiveDate;
use cotdash_core::data::HttpFetcherOptions;
use cotdash_core::domain::reference::fields;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Upper bound on `[fetch] max_retries`.
pub const MAX_FETCH_RETRIES: u32 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    /// Reference CSV mapping identifiers to their dimensions.
    pub reference_path: PathBuf,
    /// Column of the reference CSV holding the identifier.
    pub ticker_column: String,
    /// Directory of the per-identifier series cache.
    pub cache_dir: PathBuf,
    /// Resolve workers used while expanding a report.
    pub worker_threads: usize,
    /// Decimal digits shown in report cells.
    pub decimals: usize,
    pub fetch: FetchConfig,
    pub layouts: Vec<LayoutConfig>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            reference_path: PathBuf::from("reference.csv"),
            ticker_column: fields::TICKER.to_string(),
            cache_dir: PathBuf::from("cache"),
            worker_threads: std::thread::available_parallelism()
                .map(|n| n.get().min(8))
                .unwrap_or(4),
            decimals: cotdash_core::format::DEFAULT_DECIMALS,
            fetch: FetchConfig::default(),
            layouts: default_layouts(),
        }
    }
}

impl DashboardConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ticker_column.is_empty() {
            return Err(ConfigError::Invalid("ticker_column must not be empty".into()));
        }
        if self.decimals > 12 {
            return Err(ConfigError::Invalid(format!("decimals {} is more than 12", self.decimals)));
        }
        if self.fetch.max_retries > MAX_FETCH_RETRIES {
            return Err(ConfigError::Invalid(format!(
                "fetch.max_retries {} is more than {MAX_FETCH_RETRIES}",
                self.fetch.max_retries
            )));
        }
        if self.fetch.start_date > self.fetch.end_date {
            return Err(ConfigError::Invalid(format!(
                "fetch.start_date {} is after fetch.end_date {}",
                self.fetch.start_date, self.fetch.end_date
            )));
        }
        for layout in &self.layouts {
            layout.validate()?;
        }
        Ok(())
    }
}

/// Settings for the HTTP time-series endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FetchConfig {
    pub base_url: String,
    pub ticker_suffix: String,
    pub field: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        let options = HttpFetcherOptions::default();
        Self {
            base_url: options.base_url,
            ticker_suffix: options.ticker_suffix,
            field: options.field,
            start_date: options.start_date,
            end_date: options.end_date,
            timeout_secs: options.timeout.as_secs(),
            max_retries: options.max_retries,
            retry_delay_ms: options.retry_delay.as_millis() as u64,
        }
    }
}

impl FetchConfig {
    pub fn to_options(&self) -> HttpFetcherOptions {
        HttpFetcherOptions {
            base_url: self.base_url.clone(),
            ticker_suffix: self.ticker_suffix.clone(),
            field: self.field.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            timeout: Duration::from_secs(self.timeout_secs),
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }
}

/// Pivot layout for one regulation (and optionally one report type).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LayoutConfig {
    pub regulation: String,
    /// `None` matches every report type of the regulation.
    #[serde(default)]
    pub report_type: Option<String>,
    pub row_dims: Vec<String>,
    pub col_dims: Vec<String>,
    /// Row dimension whose values become separate lines in a drill-down.
    #[serde(default = "default_series_dim")]
    pub series_dim: String,
}

fn default_series_dim() -> String {
    fields::DIRECTION.to_string()
}

impl LayoutConfig {
    pub fn new(regulation: &str, report_type: Option<&str>, row_dims: &[&str], col_dims: &[&str]) -> Self {
        Self {
            regulation: regulation.to_string(),
            report_type: report_type.map(str::to_string),
            row_dims: row_dims.iter().map(|s| s.to_string()).collect(),
            col_dims: col_dims.iter().map(|s| s.to_string()).collect(),
            series_dim: default_series_dim(),
        }
    }

    pub fn row_dims(&self) -> Vec<&str> {
        self.row_dims.iter().map(String::as_str).collect()
    }

    pub fn col_dims(&self) -> Vec<&str> {
        self.col_dims.iter().map(String::as_str).collect()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.row_dims.is_empty() || self.col_dims.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "layout for '{}' needs at least one row and one column dimension",
                self.regulation
            )));
        }
        if !self.row_dims.contains(&self.series_dim) {
            return Err(ConfigError::Invalid(format!(
                "layout for '{}': series_dim '{}' is not a row dimension",
                self.regulation, self.series_dim
            )));
        }
        Ok(())
    }
}

/// CFTC disaggregated and legacy reports split by asset type; MiFID reports
/// split by activity.
pub fn default_layouts() -> Vec<LayoutConfig> {
    let rows = [fields::TRADER_TYPE, fields::DIRECTION];
    vec![
        LayoutConfig::new("CFTC", Some("All Disaggregated"), &rows, &[fields::ASSET_TYPE, fields::METRIC]),
        LayoutConfig::new("CFTC", Some("All Legacy"), &rows, &[fields::ASSET_TYPE, fields::METRIC]),
        LayoutConfig::new("MiFID", None, &rows, &[fields::ACTIVITY, fields::METRIC]),
    ]
}
