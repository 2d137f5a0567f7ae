//! KPI engine: scalar aggregates over a loaded [`Table`].
//!
//! KPIs are recomputed from the table on every call. A KPI whose column
//! cannot be resolved degrades to its default (`0`) instead of failing the
//! whole computation; [`Kpis::degraded`] lists which ones did.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};

use crate::{
    columns::ColumnSpec,
    data::{Value, parse_number},
    error::Warning,
    table::Table,
};

pub const DEFAULT_KPI_VALUE: f64 = 0.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reduction", rename_all = "snake_case")]
pub enum Reduction {
    /// Number of rows; ignores column resolution.
    Count,
    /// Mean of the non-missing numeric values, rounded to `precision` decimals.
    Mean { precision: u32 },
    /// Number of distinct non-missing values.
    Distinct,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KpiSpec {
    pub name: String,
    #[serde(flatten)]
    pub reduction: Reduction,
    #[serde(default)]
    pub column: Option<ColumnSpec>,
}

impl KpiSpec {
    pub fn count(name: &str) -> Self {
        Self {
            name: name.to_string(),
            reduction: Reduction::Count,
            column: None,
        }
    }

    pub fn mean(name: &str, column: ColumnSpec, precision: u32) -> Self {
        Self {
            name: name.to_string(),
            reduction: Reduction::Mean { precision },
            column: Some(column),
        }
    }

    pub fn distinct(name: &str, column: ColumnSpec) -> Self {
        Self {
            name: name.to_string(),
            reduction: Reduction::Distinct,
            column: Some(column),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpi {
    pub name: String,
    pub value: f64,
    /// Column the value was computed from, when one was needed and found.
    pub column: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Kpis {
    values: Vec<Kpi>,
    degraded: Vec<String>,
}

impl Kpis {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.iter().find(|k| k.name == name).map(|k| k.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Kpi> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Names of KPIs that fell back to the default value.
    pub fn degraded(&self) -> &[String] {
        &self.degraded
    }

    pub fn to_map(&self) -> BTreeMap<String, f64> {
        self.values
            .iter()
            .map(|k| (k.name.clone(), k.value))
            .collect()
    }
}

pub fn employee_kpis() -> Vec<KpiSpec> {
    vec![
        KpiSpec::count("total_employees"),
        KpiSpec::mean(
            "average_age",
            ColumnSpec::new("Age", ["Age", "age"]).numeric().required(),
            1,
        ),
        KpiSpec::mean(
            "average_salary",
            ColumnSpec::new("Salary_SEK", ["Salary", "salary", "Salary_SEK"])
                .numeric()
                .required(),
            2,
        ),
    ]
}

pub fn pisa_kpis() -> Vec<KpiSpec> {
    vec![
        KpiSpec::count("total_records"),
        KpiSpec::distinct("locations", ColumnSpec::new("location", ["location"]).required()),
        KpiSpec::distinct("subjects", ColumnSpec::new("indicator", ["indicator"]).required()),
        KpiSpec::distinct(
            "time_periods",
            ColumnSpec::new("time_period", ["time_period"]).required(),
        ),
    ]
}

pub fn compute_kpis(table: &Table, specs: &[KpiSpec]) -> Kpis {
    let mut kpis = Kpis::default();
    for spec in specs {
        let (value, column) = match (&spec.reduction, &spec.column) {
            (Reduction::Count, _) => (table.len() as f64, None),
            (_, None) => {
                kpis.degraded.push(spec.name.clone());
                (DEFAULT_KPI_VALUE, None)
            }
            (reduction, Some(column_spec)) => match column_spec.resolve(table.headers()) {
                Some((idx, name)) => (
                    reduce(table, idx, *reduction, column_spec.numeric),
                    Some(name.to_string()),
                ),
                None => {
                    if column_spec.required {
                        Warning::missing_column(column_spec.name.as_str()).emit();
                    } else {
                        debug!("Optional column '{}' not found", column_spec.name);
                    }
                    kpis.degraded.push(spec.name.clone());
                    (DEFAULT_KPI_VALUE, None)
                }
            },
        };
        debug!("KPI {} = {value} (column {column:?})", spec.name);
        kpis.values.push(Kpi {
            name: spec.name.clone(),
            value,
            column,
        });
    }
    kpis
}

fn reduce(table: &Table, column: usize, reduction: Reduction, coerce: bool) -> f64 {
    match reduction {
        Reduction::Count => table.len() as f64,
        Reduction::Mean { precision } => mean(&numeric_values(table, column, coerce))
            .map(|m| round_to(m, precision))
            .unwrap_or(DEFAULT_KPI_VALUE),
        Reduction::Distinct => table
            .column(column)
            .flatten()
            .map(|value| value.as_display())
            .collect::<BTreeSet<_>>()
            .len() as f64,
    }
}

/// Numeric cells of `column`. With `coerce`, text cells are parsed as well;
/// an alias can resolve to a header the loader never converted.
fn numeric_values(table: &Table, column: usize, coerce: bool) -> Vec<f64> {
    table
        .column(column)
        .flatten()
        .filter_map(|value| match value {
            Value::Text(raw) if coerce => parse_number(raw),
            other => other.as_number(),
        })
        .collect()
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Rounds half away from zero to `precision` decimals.
pub fn round_to(value: f64, precision: u32) -> f64 {
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}
