use itertools::{Itertools, MinMaxResult};
use serde::Serialize;

use crate::{error::Warning, table::Table};

pub const DEFAULT_HISTOGRAM_BINS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Counts rows per distinct value of `column`, most frequent first and ties
/// broken by value. Missing cells are skipped and do not count towards the
/// percentages.
pub fn value_counts(table: &Table, column: &str) -> Vec<ValueCount> {
    let Some(idx) = table.column_index(column) else {
        Warning::missing_column(column).emit();
        return Vec::new();
    };
    let counts = table
        .column(idx)
        .flatten()
        .map(|value| value.as_display())
        .counts();
    let total = counts.values().sum::<usize>();
    counts
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
        .map(|(value, count)| ValueCount {
            value,
            count,
            percent: (count as f64 / total as f64) * 100.0,
        })
        .collect()
}

/// Splits the numeric values of `column` into `bins` equal-width bins over
/// `[min, max]`. Every bin is half-open except the last, which includes
/// `max`. A column without numeric values yields no bins.
pub fn histogram(table: &Table, column: &str, bins: usize) -> Vec<HistogramBin> {
    let Some(idx) = table.column_index(column) else {
        Warning::missing_column(column).emit();
        return Vec::new();
    };
    let values = table.numbers(idx);
    if bins == 0 {
        return Vec::new();
    }
    let (min, max) = match values.iter().copied().minmax_by(f64::total_cmp) {
        MinMaxResult::NoElements => return Vec::new(),
        MinMaxResult::OneElement(value) => (value, value),
        MinMaxResult::MinMax(min, max) => (min, max),
    };
    if min == max {
        return vec![HistogramBin {
            lower: min,
            upper: max,
            count: values.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for value in &values {
        let slot = (((value - min) / width).floor() as usize).min(bins - 1);
        counts[slot] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(slot, count)| HistogramBin {
            lower: min + width * slot as f64,
            upper: if slot + 1 == bins {
                max
            } else {
                min + width * (slot + 1) as f64
            },
            count,
        })
        .collect()
}
