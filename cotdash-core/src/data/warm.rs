//! Cache warming: load a batch of identifiers through the store with
//! progress reporting.

use super::provider::{DataError, FetchProgress};
use super::store::SeriesStore;
use crate::domain::Identifier;

/// Summary of a batch load.
#[derive(Debug)]
pub struct WarmSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub errors: Vec<(Identifier, DataError)>,
}

impl WarmSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}

/// Load every identifier, one after another. Failures are collected, not
/// propagated, so one missing series never stops the batch.
pub fn warm_cache(store: &SeriesStore, identifiers: &[Identifier], progress: &dyn FetchProgress) -> WarmSummary {
    let total = identifiers.len();
    let mut succeeded = 0;
    let mut errors = Vec::new();

    for (i, identifier) in identifiers.iter().enumerate() {
        progress.on_start(identifier, i, total);
        let result = store.get(identifier).map(|s| s.len());
        progress.on_complete(identifier, i, total, &result);

        match result {
            Ok(_) => succeeded += 1,
            Err(e) => errors.push((identifier.clone(), e)),
        }
    }

    let failed = errors.len();
    progress.on_batch_complete(succeeded, failed, total);

    WarmSummary {
        total,
        succeeded,
        failed,
        errors,
    }
}
