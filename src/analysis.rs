//! Parameterized PISA queries over a loaded score table.
//!
//! Every query works on the renamed PISA columns (`location`, `subject`,
//! `time_period`, `value`, `indicator`). A query whose columns are absent
//! logs a [`Warning`] and returns an empty result.
//!
//! Rankings sort descending with a stable sort, so rows with equal values
//! keep their table order.

use std::collections::BTreeMap;

use log::debug;
use serde::Serialize;

use crate::{
    data::{GroupKey, Value},
    error::Warning,
    filter::{FilterSelection, apply_filters, validate_selection},
    join::{KeyedValues, inner_join},
    kpi::mean,
    table::Table,
};

pub const LOCATION: &str = "location";
pub const SUBJECT: &str = "subject";
pub const TIME_PERIOD: &str = "time_period";
pub const VALUE: &str = "value";
pub const INDICATOR: &str = "indicator";

/// Parameters used when a caller does not override them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisDefaults {
    pub n: usize,
    pub indicator: String,
    pub subject: String,
    pub year: String,
    pub start_year: String,
    pub end_year: String,
    pub boys: String,
    pub girls: String,
    /// Subject code covering all students rather than a gender split.
    pub aggregate_subject: String,
}

impl Default for AnalysisDefaults {
    fn default() -> Self {
        Self {
            n: 10,
            indicator: "PISAMATH".to_string(),
            subject: "TOT".to_string(),
            year: "2018".to_string(),
            start_year: "2006".to_string(),
            end_year: "2018".to_string(),
            boys: "BOY".to_string(),
            girls: "GIRL".to_string(),
            aggregate_subject: "TOT".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankEntry {
    pub location: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMean {
    pub keys: Vec<GroupKey>,
    /// `None` when every value in the group is missing.
    pub mean: Option<f64>,
    pub count: usize,
}

/// The `n` highest scoring locations for one (indicator, subject, year).
pub fn top_n(table: &Table, n: usize, indicator: &str, subject: &str, year: &str) -> Vec<RankEntry> {
    let slice = keyed_slice(
        table,
        &[(INDICATOR, indicator), (SUBJECT, subject), (TIME_PERIOD, year)],
    );
    let mut ranking = slice
        .into_iter()
        .map(|(location, value)| RankEntry { location, value })
        .collect::<Vec<_>>();
    sort_descending(&mut ranking);
    ranking.truncate(n);
    ranking
}

/// Score change between two years per location (`end − start`), largest
/// improvement first. Locations missing from either year are left out.
pub fn most_improved(
    table: &Table,
    indicator: &str,
    subject: &str,
    start_year: &str,
    end_year: &str,
) -> Vec<RankEntry> {
    let start = keyed_slice(
        table,
        &[(INDICATOR, indicator), (SUBJECT, subject), (TIME_PERIOD, start_year)],
    );
    let end = keyed_slice(
        table,
        &[(INDICATOR, indicator), (SUBJECT, subject), (TIME_PERIOD, end_year)],
    );
    ranked_deltas(&start, &end, |before, after| after - before)
}

/// Boys minus girls per location for one (indicator, year); positive means
/// boys scored higher.
pub fn gender_gap(table: &Table, indicator: &str, year: &str) -> Vec<RankEntry> {
    let defaults = AnalysisDefaults::default();
    gender_gap_with(table, indicator, year, &defaults.boys, &defaults.girls)
}

pub fn gender_gap_with(
    table: &Table,
    indicator: &str,
    year: &str,
    boys: &str,
    girls: &str,
) -> Vec<RankEntry> {
    let boys = keyed_slice(
        table,
        &[(INDICATOR, indicator), (SUBJECT, boys), (TIME_PERIOD, year)],
    );
    let girls = keyed_slice(
        table,
        &[(INDICATOR, indicator), (SUBJECT, girls), (TIME_PERIOD, year)],
    );
    ranked_deltas(&boys, &girls, |boys, girls| boys - girls)
}

/// Mean score per (year, indicator) over the all-students rows.
pub fn global_avg_by_year(table: &Table) -> Vec<GroupMean> {
    global_avg_by_year_for(table, &AnalysisDefaults::default().aggregate_subject)
}

pub fn global_avg_by_year_for(table: &Table, aggregate_subject: &str) -> Vec<GroupMean> {
    let aggregate = aggregate_rows(table, aggregate_subject);
    group_means(&aggregate, &[TIME_PERIOD, INDICATOR], VALUE)
}

/// Mean score per indicator across all years over the all-students rows.
pub fn avg_by_indicator(table: &Table) -> Vec<GroupMean> {
    avg_by_indicator_for(table, &AnalysisDefaults::default().aggregate_subject)
}

pub fn avg_by_indicator_for(table: &Table, aggregate_subject: &str) -> Vec<GroupMean> {
    let aggregate = aggregate_rows(table, aggregate_subject);
    group_means(&aggregate, &[INDICATOR], VALUE)
}

/// Mean score per location over every row of `table`, highest first.
pub fn avg_by_location(table: &Table) -> Vec<RankEntry> {
    let mut ranking = group_means(table, &[LOCATION], VALUE)
        .into_iter()
        .filter_map(|group| {
            let mean = group.mean?;
            let location = group.keys.first()?.to_string();
            Some(RankEntry {
                location,
                value: mean,
            })
        })
        .collect::<Vec<_>>();
    sort_descending(&mut ranking);
    ranking
}

/// Mean score per (location, year, indicator) for the selected locations.
/// At least one location must be selected.
pub fn trends_by_location(table: &Table, locations: &[String]) -> Result<Vec<GroupMean>, Warning> {
    validate_selection("location(s)", locations, 1, None)?;
    let selection = FilterSelection::new().with(LOCATION, locations.iter().cloned());
    let selected = apply_filters(table, &selection);
    Ok(group_means(&selected, &[LOCATION, TIME_PERIOD, INDICATOR], VALUE))
}

/// Groups rows by `keys` and averages the numeric values of `value`.
///
/// Groups come back sorted by key. Rows with a missing key are dropped;
/// missing values are ignored in the mean.
pub fn group_means(table: &Table, keys: &[&str], value: &str) -> Vec<GroupMean> {
    let Some(value_idx) = resolve(table, value) else {
        return Vec::new();
    };
    let Some(key_idx) = keys
        .iter()
        .map(|key| resolve(table, key))
        .collect::<Option<Vec<_>>>()
    else {
        return Vec::new();
    };

    let mut groups: BTreeMap<Vec<GroupKey>, Vec<f64>> = BTreeMap::new();
    for row in table.rows() {
        let Some(group) = key_idx
            .iter()
            .map(|idx| row[*idx].clone().map(GroupKey))
            .collect::<Option<Vec<_>>>()
        else {
            continue;
        };
        let values = groups.entry(group).or_default();
        if let Some(number) = row[value_idx].as_ref().and_then(Value::as_number) {
            values.push(number);
        }
    }
    debug!("Grouped {} row(s) into {} group(s) by {keys:?}", table.len(), groups.len());
    groups
        .into_iter()
        .map(|(keys, values)| GroupMean {
            keys,
            mean: mean(&values),
            count: values.len(),
        })
        .collect()
}

fn aggregate_rows(table: &Table, aggregate_subject: &str) -> Table {
    match table.column_index(SUBJECT) {
        Some(idx) => table.retain_rows(|row| {
            row[idx]
                .as_ref()
                .is_some_and(|cell| cell.matches_token(aggregate_subject))
        }),
        None => {
            Warning::missing_column(SUBJECT).emit();
            table.empty_like()
        }
    }
}

/// `(location, value)` for the rows matching every `(column, token)`
/// criterion, skipping rows without a location or numeric value.
fn keyed_slice(table: &Table, criteria: &[(&str, &str)]) -> KeyedValues {
    let (Some(location_idx), Some(value_idx)) = (resolve(table, LOCATION), resolve(table, VALUE))
    else {
        return Vec::new();
    };
    let Some(criteria) = criteria
        .iter()
        .map(|(column, token)| resolve(table, column).map(|idx| (idx, *token)))
        .collect::<Option<Vec<_>>>()
    else {
        return Vec::new();
    };

    table
        .rows()
        .iter()
        .filter(|row| {
            criteria.iter().all(|(idx, token)| {
                row[*idx]
                    .as_ref()
                    .is_some_and(|cell| cell.matches_token(token))
            })
        })
        .filter_map(|row| {
            let location = row[location_idx].as_ref()?.as_display();
            let value = row[value_idx].as_ref()?.as_number()?;
            Some((location, value))
        })
        .collect()
}

fn ranked_deltas<F>(left: &KeyedValues, right: &KeyedValues, delta: F) -> Vec<RankEntry>
where
    F: Fn(f64, f64) -> f64,
{
    let mut ranking = inner_join(left, right)
        .into_iter()
        .map(|pair| RankEntry {
            value: delta(pair.left, pair.right),
            location: pair.key,
        })
        .collect::<Vec<_>>();
    sort_descending(&mut ranking);
    ranking
}

fn sort_descending(ranking: &mut [RankEntry]) {
    ranking.sort_by(|a, b| b.value.total_cmp(&a.value));
}

fn resolve(table: &Table, column: &str) -> Option<usize> {
    let idx = table.column_index(column);
    if idx.is_none() {
        Warning::missing_column(column).emit();
    }
    idx
}
