//! Horizon summarizer: the 4-point digest shown in every report cell.
//!
//! For a series the summary holds the latest level and, for each look-back
//! horizon, the change between the nearest historical observation and the
//! latest one. Missing history is an explicit `None`, never a panic.

use crate::domain::TimeSeries;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Look-back horizon, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Horizon {
    Last,
    OneWeek,
    FourWeeks,
    OneYear,
}

impl Horizon {
    /// All horizons in their fixed display order.
    pub const ALL: [Horizon; 4] = [
        Horizon::Last,
        Horizon::OneWeek,
        Horizon::FourWeeks,
        Horizon::OneYear,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Horizon::Last => "Last",
            Horizon::OneWeek => "Δ1wk",
            Horizon::FourWeeks => "Δ4wk",
            Horizon::OneYear => "Δ1yr",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|h| h.label() == label)
    }

    /// Look-back in calendar days; `None` for the latest level.
    pub fn days(self) -> Option<i64> {
        match self {
            Horizon::Last => None,
            Horizon::OneWeek => Some(7),
            Horizon::FourWeeks => Some(28),
            Horizon::OneYear => Some(365),
        }
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One summary entry. `date` is the observation actually used, not the
/// requested target; `value` is `None` when unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizonEntry {
    pub horizon: Horizon,
    pub date: Option<NaiveDate>,
    pub value: Option<f64>,
}

impl HorizonEntry {
    pub fn unavailable(horizon: Horizon) -> Self {
        Self {
            horizon,
            date: None,
            value: None,
        }
    }
}

/// Exactly four entries, in [`Horizon::ALL`] order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HorizonSummary {
    entries: [HorizonEntry; 4],
}

impl HorizonSummary {
    /// All four entries unavailable (rendered as `--`).
    pub fn unavailable() -> Self {
        Self {
            entries: Horizon::ALL.map(HorizonEntry::unavailable),
        }
    }

    /// Build from values given in horizon order (undated).
    pub fn from_values(values: [Option<f64>; 4]) -> Self {
        let mut entries = Horizon::ALL.map(HorizonEntry::unavailable);
        for (entry, value) in entries.iter_mut().zip(values) {
            entry.value = value;
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[HorizonEntry; 4] {
        &self.entries
    }

    pub fn get(&self, horizon: Horizon) -> &HorizonEntry {
        // entries are stored in Horizon::ALL order, which is the enum order
        &self.entries[horizon as usize]
    }

    pub fn value(&self, horizon: Horizon) -> Option<f64> {
        self.get(horizon).value
    }

    pub fn is_unavailable(&self) -> bool {
        self.entries.iter().all(|e| e.value.is_none())
    }
}

/// Summarize `series` relative to `as_of`.
///
/// Each horizon target is `as_of - days`, resolved to the nearest observation
/// (ties to the earlier date). Deltas are `value(nearest) - value(last)`.
pub fn summarize(series: &TimeSeries, as_of: NaiveDate) -> HorizonSummary {
    let Some(last) = series.last() else {
        return HorizonSummary::unavailable();
    };

    let entries = Horizon::ALL.map(|horizon| match horizon.days() {
        None => HorizonEntry {
            horizon,
            date: Some(last.date),
            value: Some(last.value),
        },
        Some(days) => match series.nearest(as_of - Duration::days(days)) {
            Some(point) => HorizonEntry {
                horizon,
                date: Some(point.date),
                value: Some(point.value - last.value),
            },
            None => HorizonEntry::unavailable(horizon),
        },
    });

    HorizonSummary { entries }
}

/// Summary as of the series' own latest observation.
pub fn summarize_latest(series: &TimeSeries) -> HorizonSummary {
    match series.max_date() {
        Some(as_of) => summarize(series, as_of),
        None => HorizonSummary::unavailable(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SeriesPoint;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn weekly(start: NaiveDate, values: &[f64]) -> TimeSeries {
        TimeSeries::new(
            values
                .iter()
                .enumerate()
                .map(|(i, &v)| SeriesPoint::new(start + Duration::days(7 * i as i64), v))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn labels_are_fixed() {
        let labels: Vec<_> = Horizon::ALL.iter().map(|h| h.label()).collect();
        assert_eq!(labels, vec!["Last", "Δ1wk", "Δ4wk", "Δ1yr"]);
        assert_eq!(Horizon::from_label("Δ4wk"), Some(Horizon::FourWeeks));
        assert_eq!(Horizon::from_label("Δ2wk"), None);
    }

    #[test]
    fn empty_series_is_unavailable() {
        let s = summarize(&TimeSeries::empty(), d(2024, 1, 1));
        assert!(s.is_unavailable());
        assert_eq!(s.get(Horizon::Last).date, None);
    }

    #[test]
    fn weekly_series_deltas() {
        // 60 weekly points: 0, 1, 2, ... so value(nearest) - value(last) = -weeks back
        let values: Vec<f64> = (0..60).map(|i| i as f64).collect();
        let s = weekly(d(2023, 1, 3), &values);
        let summary = summarize_latest(&s);

        assert_eq!(summary.value(Horizon::Last), Some(59.0));
        assert_eq!(summary.value(Horizon::OneWeek), Some(-1.0));
        assert_eq!(summary.value(Horizon::FourWeeks), Some(-4.0));
        // 365 days = 52 weeks + 1 day -> nearest is exactly 52 weeks back
        assert_eq!(summary.value(Horizon::OneYear), Some(-52.0));
    }

    #[test]
    fn entries_carry_the_nearest_date_found() {
        let s = weekly(d(2024, 1, 2), &[5.0, 6.0, 7.0]);
        let summary = summarize_latest(&s);
        assert_eq!(summary.get(Horizon::Last).date, Some(d(2024, 1, 16)));
        assert_eq!(summary.get(Horizon::OneWeek).date, Some(d(2024, 1, 9)));
        // 28 days back is before the first point: clamps to it
        assert_eq!(summary.get(Horizon::FourWeeks).date, Some(d(2024, 1, 2)));
        assert_eq!(summary.value(Horizon::FourWeeks), Some(-2.0));
    }

    #[test]
    fn single_point_has_zero_deltas() {
        let s = weekly(d(2024, 3, 5), &[42.5]);
        let summary = summarize(&s, d(2024, 3, 5));
        assert_eq!(summary.value(Horizon::Last), Some(42.5));
        for h in &Horizon::ALL[1..] {
            assert_eq!(summary.value(*h), Some(0.0));
        }
    }

    #[test]
    fn as_of_moves_the_targets() {
        let s = weekly(d(2024, 1, 2), &[1.0, 2.0, 3.0, 4.0, 5.0]);
        // as_of 2024-01-23 -> 1wk target 2024-01-16 (value 3.0); last is 5.0
        let summary = summarize(&s, d(2024, 1, 23));
        assert_eq!(summary.value(Horizon::OneWeek), Some(-2.0));
    }

    #[test]
    fn from_values_keeps_order() {
        let s = HorizonSummary::from_values([Some(10.0), Some(1.0), None, Some(3.0)]);
        assert_eq!(s.value(Horizon::Last), Some(10.0));
        assert_eq!(s.value(Horizon::FourWeeks), None);
        assert!(!s.is_unavailable());
    }
}
