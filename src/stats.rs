//! Summary statistics for numeric columns, optionally split by a grouping
//! column. These are the numbers behind a box plot: quartiles, extremes,
//! mean and sample standard deviation.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
    data::{GroupKey, Value, format_number},
    error::Warning,
    table::Table,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    /// Group value, or `None` for a whole-column summary.
    pub group: Option<String>,
    pub count: usize,
    pub min: Option<f64>,
    pub q1: Option<f64>,
    pub median: Option<f64>,
    pub q3: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
}

impl ColumnSummary {
    pub const HEADERS: [&'static str; 9] =
        ["group", "count", "min", "q1", "median", "q3", "max", "mean", "std_dev"];

    pub fn render_row(&self) -> Vec<String> {
        let metric = |m: Option<f64>| m.map(format_metric).unwrap_or_default();
        vec![
            self.group.clone().unwrap_or_default(),
            self.count.to_string(),
            metric(self.min),
            metric(self.q1),
            metric(self.median),
            metric(self.q3),
            metric(self.max),
            metric(self.mean),
            metric(self.std_dev),
        ]
    }
}

#[derive(Debug, Default)]
struct ColumnStats {
    values: Vec<f64>,
    sum: f64,
    sum_squares: f64,
}

impl ColumnStats {
    fn add_value(&mut self, value: f64) {
        self.sum += value;
        self.sum_squares += value * value;
        self.values.push(value);
    }

    fn count(&self) -> usize {
        self.values.len()
    }

    fn mean(&self) -> Option<f64> {
        (self.count() > 0).then(|| self.sum / self.count() as f64)
    }

    fn std_dev(&self) -> Option<f64> {
        let count = self.count();
        if count < 2 {
            return None;
        }
        let mean = self.mean()?;
        let variance = (self.sum_squares - count as f64 * mean * mean) / (count as f64 - 1.0);
        Some(variance.max(0.0).sqrt())
    }

    fn summarize(mut self, group: Option<String>) -> ColumnSummary {
        self.values.sort_by(f64::total_cmp);
        let sorted = &self.values;
        ColumnSummary {
            group,
            count: sorted.len(),
            min: sorted.first().copied(),
            q1: quantile(sorted, 0.25),
            median: quantile(sorted, 0.5),
            q3: quantile(sorted, 0.75),
            max: sorted.last().copied(),
            mean: self.mean(),
            std_dev: self.std_dev(),
        }
    }
}

/// Linear interpolation between closest ranks over sorted input.
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let position = q * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let weight = position - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

pub fn summarize(table: &Table, column: &str) -> Option<ColumnSummary> {
    let Some(idx) = table.column_index(column) else {
        Warning::missing_column(column).emit();
        return None;
    };
    let mut stats = ColumnStats::default();
    table.numbers(idx).into_iter().for_each(|v| stats.add_value(v));
    Some(stats.summarize(None))
}

/// One summary per distinct value of `group`, in sorted group order. Rows
/// with a missing group value are skipped.
pub fn summarize_by(table: &Table, group: &str, column: &str) -> Vec<ColumnSummary> {
    let (Some(group_idx), Some(value_idx)) = (table.column_index(group), table.column_index(column))
    else {
        for name in [group, column] {
            if !table.has_column(name) {
                Warning::missing_column(name).emit();
            }
        }
        return Vec::new();
    };
    let mut groups: BTreeMap<GroupKey, ColumnStats> = BTreeMap::new();
    for row in table.rows() {
        let Some(key) = row[group_idx].clone() else {
            continue;
        };
        let stats = groups.entry(GroupKey(key)).or_default();
        if let Some(value) = row[value_idx].as_ref().and_then(Value::as_number) {
            stats.add_value(value);
        }
    }
    groups
        .into_iter()
        .map(|(key, stats)| stats.summarize(Some(key.to_string())))
        .collect()
}

fn format_metric(value: f64) -> String {
    if value.fract() == 0.0 {
        format_number(value)
    } else {
        format!("{value:.2}")
    }
}
