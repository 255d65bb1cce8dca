//! Multi-series time alignment.
//!
//! Given several labelled series, align them on the union of their dates.
//! A series with no observation on a date gets `None` there (no fill).

use crate::domain::TimeSeries;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// One aligned column.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedColumn {
    pub label: String,
    /// Same length as [`AlignedSeries::dates`].
    pub values: Vec<Option<f64>>,
}

/// Labelled series on a common date axis.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlignedSeries {
    /// The common date axis (sorted ascending).
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<AlignedColumn>,
}

impl AlignedSeries {
    pub fn column(&self, label: &str) -> Option<&AlignedColumn> {
        self.columns.iter().find(|c| c.label == label)
    }

    /// Insert a derived column computed row-wise from two existing ones.
    /// The result is `None` wherever either input is missing. Returns false
    /// when either input column is absent.
    pub fn insert_difference(&mut self, at: usize, label: &str, minuend: &str, subtrahend: &str) -> bool {
        let (Some(a), Some(b)) = (self.column(minuend), self.column(subtrahend)) else {
            return false;
        };
        let values = a
            .values
            .iter()
            .zip(&b.values)
            .map(|(a, b)| Some((*a)? - (*b)?))
            .collect();
        let at = at.min(self.columns.len());
        self.columns.insert(
            at,
            AlignedColumn {
                label: label.to_string(),
                values,
            },
        );
        true
    }

    /// CSV with a `date` column followed by one column per series.
    /// Missing values are empty fields.
    pub fn to_csv(&self) -> Result<String, csv::Error> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        let mut header = vec!["date".to_string()];
        header.extend(self.columns.iter().map(|c| c.label.clone()));
        wtr.write_record(&header)?;

        for (i, date) in self.dates.iter().enumerate() {
            let mut record = vec![date.format("%Y-%m-%d").to_string()];
            record.extend(
                self.columns
                    .iter()
                    .map(|c| c.values[i].map(|v| v.to_string()).unwrap_or_default()),
            );
            wtr.write_record(&record)?;
        }

        let bytes = wtr.into_inner().map_err(|e| csv::Error::from(e.into_error()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Align labelled series on the union of their dates, keeping input order.
pub fn align_series(series: &[(String, &TimeSeries)]) -> AlignedSeries {
    let dates: Vec<NaiveDate> = series
        .iter()
        .flat_map(|(_, s)| s.points().iter().map(|p| p.date))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let columns = series
        .iter()
        .map(|(label, s)| AlignedColumn {
            label: label.clone(),
            values: dates.iter().map(|d| s.value_at(*d)).collect(),
        })
        .collect();

    AlignedSeries { dates, columns }
}
