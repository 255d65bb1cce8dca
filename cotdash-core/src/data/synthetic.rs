//! Deterministic synthetic positioning series for offline and demo runs.
//!
//! Each identifier seeds its own generator from its BLAKE3 hash, so the same
//! identifier always produces the same weekly random walk.

use super::provider::{DataError, SeriesFetcher};
use crate::domain::{Identifier, SeriesPoint};
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Weekly random walk ending at a fixed report date.
#[derive(Debug, Clone)]
pub struct SyntheticFetcher {
    end: NaiveDate,
    weeks: usize,
}

impl SyntheticFetcher {
    pub fn new(end: NaiveDate, weeks: usize) -> Self {
        Self { end, weeks }
    }

    pub fn generate(&self, identifier: &Identifier) -> Vec<SeriesPoint> {
        let mut rng = StdRng::from_seed(*blake3::hash(identifier.as_str().as_bytes()).as_bytes());
        let mut level: f64 = rng.gen_range(5_000.0..250_000.0);

        let start = self.end - Duration::weeks(self.weeks.saturating_sub(1) as i64);
        (0..self.weeks)
            .map(|i| {
                if i > 0 {
                    let step: f64 = rng.gen_range(-0.06..0.06);
                    level = (level * (1.0 + step)).max(0.0);
                }
                SeriesPoint::new(start + Duration::weeks(i as i64), level.round())
            })
            .collect()
    }
}

impl Default for SyntheticFetcher {
    fn default() -> Self {
        // COT positions are as of Tuesday
        let end = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_default();
        Self::new(end, 260)
    }
}

impl SeriesFetcher for SyntheticFetcher {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, identifier: &Identifier) -> Result<Vec<SeriesPoint>, DataError> {
        Ok(self.generate(identifier))
    }
}
