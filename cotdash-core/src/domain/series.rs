//! Validated, immutable dated series for one instrument.
//!
//! A `TimeSeries` can only be built through [`TimeSeries::new`], which rejects
//! duplicate or out-of-order dates. Once built it is never mutated; a cache
//! refresh builds a new one.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One observation: the value reported for a date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl SeriesPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("duplicate date {date} at position {index}")]
    DuplicateDate { date: NaiveDate, index: usize },

    #[error("date {date} at position {index} is earlier than the previous date {previous}")]
    OutOfOrder {
        date: NaiveDate,
        previous: NaiveDate,
        index: usize,
    },
}

/// Ordered sequence of (date, value) pairs with strictly increasing dates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    points: Vec<SeriesPoint>,
}

impl TimeSeries {
    /// Build a series, checking that dates are strictly increasing.
    pub fn new(points: Vec<SeriesPoint>) -> Result<Self, SeriesError> {
        for (i, pair) in points.windows(2).enumerate() {
            let (prev, cur) = (pair[0].date, pair[1].date);
            if cur == prev {
                return Err(SeriesError::DuplicateDate {
                    date: cur,
                    index: i + 1,
                });
            }
            if cur < prev {
                return Err(SeriesError::OutOfOrder {
                    date: cur,
                    previous: prev,
                    index: i + 1,
                });
            }
        }
        Ok(Self { points })
    }

    pub fn empty() -> Self {
        Self { points: Vec::new() }
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&SeriesPoint> {
        self.points.first()
    }

    /// Most recent observation.
    pub fn last(&self) -> Option<&SeriesPoint> {
        self.points.last()
    }

    pub fn max_date(&self) -> Option<NaiveDate> {
        self.last().map(|p| p.date)
    }

    /// Exact lookup.
    pub fn value_at(&self, date: NaiveDate) -> Option<f64> {
        self.points
            .binary_search_by_key(&date, |p| p.date)
            .ok()
            .map(|i| self.points[i].value)
    }

    /// Point whose date is nearest to `target` by absolute day distance.
    ///
    /// Equal distances resolve to the earlier date. `None` only for an empty
    /// series; there is no maximum tolerance.
    pub fn nearest(&self, target: NaiveDate) -> Option<&SeriesPoint> {
        let idx = self.points.partition_point(|p| p.date < target);
        let before = idx.checked_sub(1).and_then(|i| self.points.get(i));
        let after = self.points.get(idx);

        match (before, after) {
            (None, None) => None,
            (Some(b), None) => Some(b),
            (None, Some(a)) => Some(a),
            (Some(b), Some(a)) => {
                let d_before = (target - b.date).num_days();
                let d_after = (a.date - target).num_days();
                if d_after < d_before {
                    Some(a)
                } else {
                    Some(b)
                }
            }
        }
    }
}
