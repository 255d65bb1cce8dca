//! Criterion benchmarks for the report hot path.
//!
//! Benchmarks:
//! 1. Pivot of a full-size reference selection
//! 2. Inner expansion, sequential vs pooled resolve
//! 3. Format + render + HTML emit

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use cotdash_core::render::to_html;
use cotdash_core::{pivot, render, summarize_latest, CellExpander, Horizon, HorizonSummary, Identifier, ReferenceRow, RenderOptions};
use cotdash_core::data::SyntheticFetcher;
use std::collections::HashMap;

// ── Helpers ──────────────────────────────────────────────────────────

const TRADERS: [&str; 6] = ["Producer", "Swap", "Managed Money", "Other", "Nonreportable", "Commercial"];
const DIRECTIONS: [&str; 3] = ["Long", "Short", "Spread"];
const ASSETS: [&str; 3] = ["Future", "Option", "Combined"];
const METRICS: [&str; 3] = ["Open interest", "Number of traders", "Percent of OI"];

fn reference_rows() -> Vec<ReferenceRow> {
    let mut rows = Vec::new();
    for t in TRADERS {
        for d in DIRECTIONS {
            for a in ASSETS {
                for m in METRICS {
                    rows.push(
                        ReferenceRow::new(Some(Identifier::new(format!("{t}|{d}|{a}|{m}"))))
                            .with("TraderType", t)
                            .with("Direction", d)
                            .with("AssetType", a)
                            .with("Metric", m),
                    );
                }
            }
        }
    }
    rows
}

fn summaries(rows: &[ReferenceRow]) -> HashMap<Identifier, HorizonSummary> {
    let fetcher = SyntheticFetcher::default();
    rows.iter()
        .filter_map(|r| r.identifier.clone())
        .map(|id| {
            let series = cotdash_core::TimeSeries::new(fetcher.generate(&id)).unwrap_or_default();
            let summary = summarize_latest(&series);
            (id, summary)
        })
        .collect()
}

// ── Benchmarks ───────────────────────────────────────────────────────

fn bench_pivot(c: &mut Criterion) {
    let rows = reference_rows();
    c.bench_function("pivot_162_rows", |b| {
        b.iter(|| pivot(black_box(&rows), &["TraderType", "Direction"], &["AssetType", "Metric"]).unwrap())
    });
}

fn bench_expand(c: &mut Criterion) {
    let rows = reference_rows();
    let table = pivot(&rows, &["TraderType", "Direction"], &["AssetType", "Metric"]).unwrap();
    let lookup = summaries(&rows);
    let resolve = |id: &Identifier| lookup.get(id).copied().unwrap_or_else(HorizonSummary::unavailable);

    let mut group = c.benchmark_group("expand");
    for threads in [1usize, 4] {
        let expander = CellExpander::with_threads(threads).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, _| {
            b.iter(|| expander.expand(black_box(&table), &Horizon::ALL, resolve))
        });
    }
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let rows = reference_rows();
    let table = pivot(&rows, &["TraderType", "Direction"], &["AssetType", "Metric"]).unwrap();
    let lookup = summaries(&rows);
    let expanded = CellExpander::sequential().expand(&table, &Horizon::ALL, |id| {
        lookup.get(id).copied().unwrap_or_else(HorizonSummary::unavailable)
    });

    c.bench_function("format_render_html", |b| {
        b.iter(|| {
            let grid = render(&black_box(&expanded).format(2), &RenderOptions::default());
            to_html(&grid)
        })
    });
}

criterion_group!(benches, bench_pivot, bench_expand, bench_render);
criterion_main!(benches);
