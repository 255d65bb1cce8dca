//! Series store: memory -> file cache -> fetcher, with per-identifier
//! fetch coalescing.
//!
//! Every identifier gets one `OnceLock` slot. Concurrent callers for the same
//! identifier block on that slot while exactly one of them loads it, then all
//! see the same outcome. A failed load removes the slot again so the next call
//! retries; a successful one stays for the life of the store.

use super::cache::SeriesCache;
use super::provider::{DataError, SeriesFetcher};
use crate::domain::{Identifier, TimeSeries};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::time::Instant;

type Slot = Arc<OnceLock<Result<Arc<TimeSeries>, DataError>>>;

pub struct SeriesStore {
    cache: Option<SeriesCache>,
    fetcher: Option<Arc<dyn SeriesFetcher>>,
    memory: Mutex<HashMap<Identifier, Slot>>,
}

impl SeriesStore {
    pub fn new(cache: Option<SeriesCache>, fetcher: Option<Arc<dyn SeriesFetcher>>) -> Self {
        Self {
            cache,
            fetcher,
            memory: Mutex::new(HashMap::new()),
        }
    }

    /// Cache-only store: anything not on disk is unavailable.
    pub fn offline(cache: SeriesCache) -> Self {
        Self::new(Some(cache), None)
    }

    pub fn cache(&self) -> Option<&SeriesCache> {
        self.cache.as_ref()
    }

    pub fn fetcher_name(&self) -> Option<&str> {
        self.fetcher.as_deref().map(|f| f.name())
    }

    /// Series for `identifier`, loading it at most once per process.
    pub fn get(&self, identifier: &Identifier) -> Result<Arc<TimeSeries>, DataError> {
        let slot = self.lock().entry(identifier.clone()).or_default().clone();
        let outcome = slot.get_or_init(|| self.load(identifier)).clone();

        if outcome.is_err() {
            let mut memory = self.lock();
            // a retry may already have replaced the slot
            if memory.get(identifier).is_some_and(|s| Arc::ptr_eq(s, &slot)) {
                memory.remove(identifier);
            }
        }
        outcome
    }

    /// Whether a loaded series is held in memory.
    pub fn is_loaded(&self, identifier: &Identifier) -> bool {
        self.lock()
            .get(identifier)
            .and_then(|slot| slot.get())
            .is_some_and(|outcome| outcome.is_ok())
    }

    /// Drop every in-memory series. The file cache is untouched.
    pub fn forget_all(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Identifier, Slot>> {
        self.memory.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn load(&self, identifier: &Identifier) -> Result<Arc<TimeSeries>, DataError> {
        if let Some(cache) = &self.cache {
            match cache.load(identifier) {
                Ok(Some(points)) => {
                    tracing::debug!(%identifier, points = points.len(), "read series from cache");
                    let series = TimeSeries::new(points).map_err(|e| DataError::malformed(identifier, e))?;
                    return Ok(Arc::new(series));
                }
                Ok(None) => tracing::debug!(%identifier, "cache miss"),
                Err(e) if self.fetcher.is_some() => {
                    tracing::warn!(%identifier, error = %e, "unreadable cache file, refetching");
                }
                Err(e) => return Err(e),
            }
        }

        let Some(fetcher) = &self.fetcher else {
            return Err(DataError::unavailable(identifier, "not cached and no fetcher configured"));
        };

        let started = Instant::now();
        let points = fetcher.fetch(identifier)?;
        if points.is_empty() {
            return Err(DataError::unavailable(identifier, "fetcher returned no observations"));
        }
        let series = TimeSeries::new(points).map_err(|e| DataError::malformed(identifier, e))?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.write(identifier, series.points(), fetcher.name()) {
                tracing::warn!(%identifier, error = %e, "failed to persist fetched series");
            }
        }

        tracing::info!(
            %identifier,
            source = fetcher.name(),
            points = series.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "loaded series"
        );
        Ok(Arc::new(series))
    }
}
