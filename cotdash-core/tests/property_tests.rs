//! Property tests for summary, pivot and header-span invariants.
//!
//! Uses proptest to verify:
//! 1. Last equals the latest value; deltas are value(nearest) - value(last)
//! 2. Deltas of a single-point series are exactly zero
//! 3. Nearest-date ties resolve to the earlier date
//! 4. Expanded column count is 4 x occupied column keys
//! 5. Header spans tile every level and never cross a coarser break

use chrono::{Duration, NaiveDate};
use cotdash_core::render::header_spans;
use cotdash_core::{pivot, summarize, summarize_latest, CellExpander, Horizon, HorizonSummary};
use cotdash_core::{Identifier, ReferenceRow, SeriesPoint, TimeSeries};
use proptest::prelude::*;
use std::collections::BTreeSet;

// ── Strategies (proptest) ────────────────────────────────────────────

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2015, 1, 6).unwrap()
}

/// Strictly increasing dates built from positive gaps.
fn arb_series() -> impl Strategy<Value = TimeSeries> {
    prop::collection::vec((1i64..20, -1.0e6..1.0e6_f64), 1..120).prop_map(|steps| {
        let mut date = base_date();
        let points = steps
            .into_iter()
            .map(|(gap, value)| {
                date += Duration::days(gap);
                SeriesPoint::new(date, value)
            })
            .collect();
        TimeSeries::new(points).unwrap()
    })
}

fn arb_labels() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(prop::sample::select(vec!["A", "B", "C"]), 0..30)
        .prop_map(|v| v.into_iter().map(String::from).collect())
}

// ── 1-3. Summarizer ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn last_is_latest_and_deltas_use_the_nearest_point(series in arb_series()) {
        let summary = summarize_latest(&series);
        let last = *series.last().unwrap();
        prop_assert_eq!(summary.value(Horizon::Last), Some(last.value));
        prop_assert_eq!(summary.get(Horizon::Last).date, Some(last.date));

        for h in &Horizon::ALL[1..] {
            let entry = summary.get(*h);
            let date = entry.date.unwrap();
            let expected = series.value_at(date).unwrap() - last.value;
            prop_assert_eq!(entry.value, Some(expected));

            // no observation is strictly closer to the target
            let target = last.date - Duration::days(h.days().unwrap());
            let best = (date - target).num_days().abs();
            for p in series.points() {
                prop_assert!((p.date - target).num_days().abs() >= best);
            }
        }
    }

    #[test]
    fn single_point_deltas_are_zero(value in -1.0e9..1.0e9_f64, offset in 0i64..4000) {
        let date = base_date() + Duration::days(offset);
        let series = TimeSeries::new(vec![SeriesPoint::new(date, value)]).unwrap();
        let summary = summarize(&series, date);
        prop_assert_eq!(summary.value(Horizon::Last), Some(value));
        for h in &Horizon::ALL[1..] {
            prop_assert_eq!(summary.value(*h), Some(0.0));
        }
    }

    #[test]
    fn equidistant_neighbours_resolve_to_the_earlier(half_gap in 1i64..100, v1 in -100.0..100.0_f64, v2 in -100.0..100.0_f64) {
        let early = base_date();
        let late = early + Duration::days(2 * half_gap);
        let series = TimeSeries::new(vec![SeriesPoint::new(early, v1), SeriesPoint::new(late, v2)]).unwrap();
        let target = early + Duration::days(half_gap);
        prop_assert_eq!(series.nearest(target).unwrap().date, early);
    }
}

// ── 4. Expansion shape ───────────────────────────────────────────────

proptest! {
    #[test]
    fn column_count_is_four_per_occupied_key(cells in prop::collection::btree_map((0u8..4, 0u8..5), any::<bool>(), 0..20)) {
        let rows: Vec<ReferenceRow> = cells
            .iter()
            .map(|((r, c), has_id)| {
                ReferenceRow::new(has_id.then(|| Identifier::new(format!("{r}-{c}"))))
                    .with("Row", &r.to_string())
                    .with("Col", &c.to_string())
            })
            .collect();
        let table = pivot(&rows, &["Row"], &["Col"]).unwrap();
        let expanded = CellExpander::sequential().expand(&table, &Horizon::ALL, |_| HorizonSummary::unavailable());

        let occupied: BTreeSet<u8> = cells.iter().filter(|(_, id)| **id).map(|((_, c), _)| *c).collect();
        prop_assert_eq!(expanded.column_count(), 4 * occupied.len());
        for (i, column) in expanded.columns().iter().enumerate() {
            prop_assert_eq!(column.horizon, Horizon::ALL[i % 4]);
        }
    }
}

// ── 5. Header spans ──────────────────────────────────────────────────

proptest! {
    #[test]
    fn spans_tile_levels_and_respect_coarser_breaks(outer in arb_labels(), inner_seed in arb_labels()) {
        let width = outer.len();
        let inner: Vec<String> = (0..width)
            .map(|i| inner_seed.get(i).cloned().unwrap_or_else(|| "Z".into()))
            .collect();
        let spans = header_spans(&[outer.clone(), inner]);

        for level in &spans {
            let mut next = 0;
            for s in level {
                prop_assert_eq!(s.start, next);
                prop_assert!(s.span > 0);
                next = s.end();
            }
            prop_assert_eq!(next, width);
        }

        let outer_breaks: BTreeSet<usize> = spans[0].iter().map(|s| s.start).collect();
        let inner_breaks: BTreeSet<usize> = spans[1].iter().map(|s| s.start).collect();
        prop_assert!(outer_breaks.is_subset(&inner_breaks));
        // adjacent outer spans always differ in label
        for pair in spans[0].windows(2) {
            prop_assert_ne!(&pair[0].label, &pair[1].label);
        }
    }
}
