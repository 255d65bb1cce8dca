//! Span-merged header layout.
//!
//! Each header level is run-length encoded over adjacent equal labels. A
//! finer level may only merge inside the runs of every coarser level above
//! it: the break set of level `L` is the union of the run starts of levels
//! `0..=L`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One merged header cell: `span` columns starting at `start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderSpan {
    pub start: usize,
    pub span: usize,
    pub label: String,
}

impl HeaderSpan {
    pub fn end(&self) -> usize {
        self.start + self.span
    }
}

/// Run-length encode one level: `[A,A,B,B,B] -> [(0,2,A),(2,3,B)]`.
///
/// Only adjacent labels merge; `[A,B,A]` stays three spans.
pub fn run_length_spans<S: AsRef<str>>(labels: &[S]) -> Vec<HeaderSpan> {
    let starts = run_starts(labels);
    spans_between(labels, &starts)
}

/// Lay out every level, outermost first, with coarser breaks inherited.
///
/// All levels must have the same length; a shorter level is laid out over
/// its own length only.
pub fn header_spans<S: AsRef<str>>(levels: &[Vec<S>]) -> Vec<Vec<HeaderSpan>> {
    let mut breaks = BTreeSet::new();
    levels
        .iter()
        .map(|labels| {
            breaks.extend(run_starts(labels));
            let level_breaks: BTreeSet<usize> =
                breaks.iter().copied().filter(|&b| b < labels.len()).collect();
            spans_between(labels, &level_breaks)
        })
        .collect()
}

fn run_starts<S: AsRef<str>>(labels: &[S]) -> BTreeSet<usize> {
    let mut starts = BTreeSet::new();
    let mut previous: Option<&str> = None;
    for (i, label) in labels.iter().enumerate() {
        let label = label.as_ref();
        if previous != Some(label) {
            starts.insert(i);
        }
        previous = Some(label);
    }
    starts
}

/// Cut `labels` at every break; each span takes the label at its start.
fn spans_between<S: AsRef<str>>(labels: &[S], breaks: &BTreeSet<usize>) -> Vec<HeaderSpan> {
    let mut out = Vec::with_capacity(breaks.len());
    let mut iter = breaks.iter().copied().peekable();
    while let Some(start) = iter.next() {
        let end = iter.peek().copied().unwrap_or(labels.len());
        out.push(HeaderSpan {
            start,
            span: end - start,
            label: labels[start].as_ref().to_string(),
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triples(spans: &[HeaderSpan]) -> Vec<(usize, usize, &str)> {
        spans.iter().map(|s| (s.start, s.span, s.label.as_str())).collect()
    }

    #[test]
    fn merges_adjacent_runs() {
        let spans = run_length_spans(&["A", "A", "B", "B", "B"]);
        assert_eq!(triples(&spans), vec![(0, 2, "A"), (2, 3, "B")]);
    }

    #[test]
    fn non_adjacent_equal_labels_stay_apart() {
        let spans = run_length_spans(&["A", "B", "A"]);
        assert_eq!(triples(&spans), vec![(0, 1, "A"), (1, 1, "B"), (2, 1, "A")]);
    }

    #[test]
    fn empty_level_has_no_spans() {
        let spans = run_length_spans::<&str>(&[]);
        assert!(spans.is_empty());
    }

    #[test]
    fn finer_level_never_crosses_a_coarser_boundary() {
        let levels = vec![
            vec!["Future", "Future", "Option", "Option"],
            vec!["OI", "OI", "OI", "OI"],
            vec!["Last", "Δ1wk", "Last", "Δ1wk"],
        ];
        let spans = header_spans(&levels);
        assert_eq!(triples(&spans[0]), vec![(0, 2, "Future"), (2, 2, "Option")]);
        // OI runs across all four columns but is split at the AssetType break
        assert_eq!(triples(&spans[1]), vec![(0, 2, "OI"), (2, 2, "OI")]);
        assert_eq!(spans[2].len(), 4);
    }

    #[test]
    fn spans_tile_each_level() {
        let levels = vec![vec!["A", "A", "B"], vec!["x", "y", "y"]];
        for level in header_spans(&levels) {
            let total: usize = level.iter().map(|s| s.span).sum();
            assert_eq!(total, 3);
            for pair in level.windows(2) {
                assert_eq!(pair[0].end(), pair[1].start);
            }
        }
    }
}
