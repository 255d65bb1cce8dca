//! Series fetcher trait and structured error types.
//!
//! The SeriesFetcher trait abstracts over where a positioning series comes
//! from (the HTTP time-series endpoint, a synthetic generator, a test stub) so
//! the store can sit above it without knowing the source.

use crate::domain::{Identifier, SeriesError, SeriesPoint};
use thiserror::Error;

/// Structured error types for series lookups.
///
/// `Clone` because one coalesced fetch hands its outcome to every waiter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("no data for '{identifier}': {reason}")]
    DataUnavailable { identifier: Identifier, reason: String },

    #[error("malformed series for '{identifier}': {detail}")]
    MalformedSeries { identifier: Identifier, detail: String },

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("cache error: {0}")]
    CacheError(String),

    #[error("data error: {0}")]
    Other(String),
}

impl DataError {
    pub fn unavailable(identifier: &Identifier, reason: impl Into<String>) -> Self {
        DataError::DataUnavailable {
            identifier: identifier.clone(),
            reason: reason.into(),
        }
    }

    pub fn malformed(identifier: &Identifier, err: SeriesError) -> Self {
        DataError::MalformedSeries {
            identifier: identifier.clone(),
            detail: err.to_string(),
        }
    }

    /// Only malformed series abort a report; everything else degrades to
    /// an unavailable cell.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DataError::MalformedSeries { .. })
    }
}

/// Remote (or simulated) source of raw series points.
///
/// Implementations return points in whatever order the source produced; the
/// store validates them. Fetchers don't know about the cache.
pub trait SeriesFetcher: Send + Sync {
    /// Human-readable name, recorded in the cache metadata.
    fn name(&self) -> &str;

    fn fetch(&self, identifier: &Identifier) -> Result<Vec<SeriesPoint>, DataError>;
}

/// Progress callback for multi-identifier cache warming.
pub trait FetchProgress: Send + Sync {
    fn on_start(&self, identifier: &Identifier, index: usize, total: usize);

    fn on_complete(&self, identifier: &Identifier, index: usize, total: usize, result: &Result<usize, DataError>);

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Progress reporter that prints to stdout.
pub struct StdoutProgress;

impl FetchProgress for StdoutProgress {
    fn on_start(&self, identifier: &Identifier, index: usize, total: usize) {
        println!("[{}/{}] Loading {identifier}...", index + 1, total);
    }

    fn on_complete(&self, identifier: &Identifier, _index: usize, _total: usize, result: &Result<usize, DataError>) {
        match result {
            Ok(points) => println!("  OK: {identifier} ({points} points)"),
            Err(e) => println!("  FAIL: {identifier}: {e}"),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        println!("\nFetch complete: {succeeded}/{total} succeeded, {failed} failed");
    }
}

/// Progress reporter that only emits tracing events.
pub struct TracingProgress;

impl FetchProgress for TracingProgress {
    fn on_start(&self, identifier: &Identifier, index: usize, total: usize) {
        tracing::debug!(%identifier, index, total, "warming series");
    }

    fn on_complete(&self, identifier: &Identifier, _index: usize, _total: usize, result: &Result<usize, DataError>) {
        match result {
            Ok(points) => tracing::debug!(%identifier, points, "series ready"),
            Err(e) => tracing::warn!(%identifier, error = %e, "series unavailable"),
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        tracing::info!(succeeded, failed, total, "cache warm complete");
    }
}
