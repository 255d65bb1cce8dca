//! Series data: fetchers, file cache, coalescing store, alignment.

pub mod align;
pub mod cache;
pub mod http;
pub mod provider;
pub mod store;
pub mod synthetic;
pub mod warm;

pub use align::{align_series, AlignedColumn, AlignedSeries};
pub use cache::{CacheMeta, CacheStatus, SeriesCache};
pub use http::{HttpFetcher, HttpFetcherOptions};
pub use provider::{DataError, FetchProgress, SeriesFetcher, StdoutProgress, TracingProgress};
pub use store::SeriesStore;
pub use synthetic::SyntheticFetcher;
pub use warm::{warm_cache, WarmSummary};
