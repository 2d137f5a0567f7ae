use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Result, anyhow};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{
    data::GroupKey,
    error::Warning,
    table::Table,
};

/// Selected values per dimension. An empty set for a dimension means the
/// dimension is not filtered; it never means "match nothing".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSelection {
    dimensions: BTreeMap<String, BTreeSet<String>>,
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `values` to the selected set of `dimension`.
    pub fn with<I, S>(mut self, dimension: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select(dimension, values);
        self
    }

    pub fn select<I, S>(&mut self, dimension: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dimensions
            .entry(dimension.to_string())
            .or_default()
            .extend(values.into_iter().map(Into::into));
    }

    pub fn get(&self, dimension: &str) -> Option<&BTreeSet<String>> {
        self.dimensions.get(dimension)
    }

    /// Dimensions that actually restrict rows.
    pub fn active(&self) -> impl Iterator<Item = (&String, &BTreeSet<String>)> {
        self.dimensions.iter().filter(|(_, values)| !values.is_empty())
    }

    pub fn is_unfiltered(&self) -> bool {
        self.active().next().is_none()
    }

    /// Parses selection expressions of the form `dimension=a,b,c`.
    /// `dimension=` selects nothing, which leaves the dimension unfiltered.
    pub fn parse(expressions: &[String]) -> Result<Self> {
        let mut selection = Self::new();
        for expression in expressions {
            let (dimension, values) = parse_selection(expression)?;
            selection.select(&dimension, values);
        }
        Ok(selection)
    }
}

fn parse_selection(expression: &str) -> Result<(String, Vec<String>)> {
    let trimmed = expression.trim();
    let Some((left, right)) = trimmed.split_once('=') else {
        return Err(anyhow!(
            "Selection '{trimmed}' must have the form dimension=value[,value...]"
        ));
    };
    let dimension = left.trim();
    if dimension.is_empty() {
        return Err(anyhow!("Selection '{trimmed}' is missing a dimension name"));
    }
    let values = right
        .split(',')
        .map(|v| unquote(v.trim()))
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    Ok((dimension.to_string(), values))
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if value.len() >= 2
        && ((bytes[0] == b'"' && bytes[value.len() - 1] == b'"')
            || (bytes[0] == b'\'' && bytes[value.len() - 1] == b'\''))
    {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

/// Keeps the rows matching every active dimension of `selection`.
///
/// A row matches a dimension when its cell, compared by display text, is in
/// the selected set. Missing cells never match. A dimension whose column is
/// absent from the table cannot be satisfied, so the result is empty.
pub fn apply_filters(table: &Table, selection: &FilterSelection) -> Table {
    let mut criteria = Vec::new();
    for (dimension, values) in selection.active() {
        match table.column_index(dimension) {
            Some(idx) => criteria.push((idx, values)),
            None => {
                Warning::missing_column(dimension.as_str()).emit();
                return table.empty_like();
            }
        }
    }
    if criteria.is_empty() {
        return table.clone();
    }

    let filtered = table.retain_rows(|row| {
        criteria.iter().all(|(idx, values)| {
            row.get(*idx)
                .and_then(|cell| cell.as_ref())
                .is_some_and(|cell| values.iter().any(|token| cell.matches_token(token)))
        })
    });
    debug!(
        "Filtered {} row(s) down to {} across {} dimension(s)",
        table.len(),
        filtered.len(),
        criteria.len()
    );
    filtered
}

/// Checks a selection size the way the dashboard sidebar does: too few or
/// too many values is reported back as a warning, not an error.
pub fn validate_selection(
    dimension: &str,
    values: &[String],
    min: usize,
    max: Option<usize>,
) -> Result<(), Warning> {
    if values.len() < min {
        return Err(Warning::EmptySelection {
            dimension: dimension.to_string(),
            min,
        }
        .emit());
    }
    if let Some(max) = max
        && values.len() > max
    {
        return Err(Warning::TooManySelected {
            dimension: dimension.to_string(),
            max,
        }
        .emit());
    }
    Ok(())
}

/// Sorted distinct non-missing values of a column, as offered to users when
/// building a selection. Empty when the column is absent.
pub fn distinct_values(table: &Table, column: &str) -> Vec<String> {
    let Some(idx) = table.column_index(column) else {
        return Vec::new();
    };
    table
        .column(idx)
        .flatten()
        .map(|value| GroupKey(value.clone()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|key| key.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Value;

    fn table() -> Table {
        let row = |loc: &str, subject: &str, year: &str| {
            vec![
                Some(Value::Text(loc.into())),
                Some(Value::Text(subject.into())),
                Some(Value::Text(year.into())),
            ]
        };
        Table::new(
            vec!["location".into(), "subject".into(), "time_period".into()],
            vec![
                row("SWE", "TOT", "2015"),
                row("SWE", "BOY", "2018"),
                row("FIN", "TOT", "2018"),
                vec![None, Some(Value::Text("TOT".into())), None],
            ],
        )
    }

    #[test]
    fn parse_accepts_lists_and_quotes() {
        let selection = FilterSelection::parse(&[
            "location=SWE, FIN".to_string(),
            "subject='TOT'".to_string(),
            "time_period=".to_string(),
        ])
        .unwrap();
        assert_eq!(selection.get("location").unwrap().len(), 2);
        assert!(selection.get("subject").unwrap().contains("TOT"));
        assert!(selection.get("time_period").unwrap().is_empty());
        assert_eq!(selection.active().count(), 2);
    }

    #[test]
    fn parse_rejects_missing_equals() {
        assert!(FilterSelection::parse(&["location".to_string()]).is_err());
        assert!(FilterSelection::parse(&["=SWE".to_string()]).is_err());
    }

    #[test]
    fn empty_sets_pass_through() {
        let selection = FilterSelection::new().with("location", Vec::<String>::new());
        assert_eq!(apply_filters(&table(), &selection), table());
    }

    #[test]
    fn dimensions_intersect_and_values_union() {
        let selection = FilterSelection::new()
            .with("location", ["SWE", "FIN"])
            .with("time_period", ["2018"]);
        let filtered = apply_filters(&table(), &selection);
        assert_eq!(filtered.len(), 2);
        assert!(
            filtered
                .column(2)
                .all(|cell| cell == Some(&Value::Text("2018".into())))
        );
    }

    #[test]
    fn missing_cells_never_match() {
        let selection = FilterSelection::new().with("subject", ["TOT"]);
        assert_eq!(apply_filters(&table(), &selection).len(), 3);
        let selection = FilterSelection::new().with("location", ["SWE", "FIN"]);
        assert_eq!(apply_filters(&table(), &selection).len(), 3);
    }

    #[test]
    fn unknown_dimension_yields_empty_table() {
        let selection = FilterSelection::new().with("gender", ["F"]);
        let filtered = apply_filters(&table(), &selection);
        assert!(filtered.is_empty());
        assert_eq!(filtered.headers(), table().headers());
    }

    #[test]
    fn validate_selection_enforces_bounds() {
        let none: Vec<String> = Vec::new();
        assert_eq!(
            validate_selection("locations", &none, 1, None),
            Err(Warning::EmptySelection {
                dimension: "locations".into(),
                min: 1
            })
        );
        let three = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        assert!(validate_selection("locations", &three, 1, Some(3)).is_ok());
        assert!(matches!(
            validate_selection("locations", &three, 1, Some(2)),
            Err(Warning::TooManySelected { max: 2, .. })
        ));
    }

    #[test]
    fn distinct_values_are_sorted_and_skip_missing() {
        assert_eq!(distinct_values(&table(), "location"), vec!["FIN", "SWE"]);
        assert_eq!(distinct_values(&table(), "time_period"), vec!["2015", "2018"]);
        assert!(distinct_values(&table(), "indicator").is_empty());
    }
}
