use std::{cmp::Ordering, fmt};

use serde::Serialize;

/// A single loaded cell. Missing cells are represented as `None` at the
/// row level (`Option<Value>`).
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    Number(f64),
    Text(String),
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) if !n.is_nan() => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Number(_) => None,
        }
    }

    pub fn as_display(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Number(n) => format_number(*n),
        }
    }

    /// Compares the cell against a selection token by display text, so
    /// `Number(2018.0)` matches `"2018"`.
    pub fn matches_token(&self, token: &str) -> bool {
        match self {
            Value::Text(s) => s == token,
            Value::Number(n) => {
                format_number(*n) == token
                    || token.trim().parse::<f64>().is_ok_and(|parsed| parsed == *n)
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        return String::new();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

/// Coerces a raw cell into a number. Empty and unparsable input yields
/// `None`; the caller decides whether the failure is worth reporting.
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| !n.is_nan())
}

pub fn parse_cell(raw: &str, numeric: bool) -> Option<Value> {
    if numeric {
        parse_number(raw).map(Value::Number)
    } else if raw.is_empty() {
        None
    } else {
        Some(Value::Text(raw.to_string()))
    }
}

/// Ordered wrapper used for group keys. Numbers sort before text, and text
/// that looks numeric sorts numerically so `"2009"` < `"2012"` < `"10000"`.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct GroupKey(pub Value);

impl GroupKey {
    fn numeric_view(&self) -> Option<f64> {
        match &self.0 {
            Value::Number(n) => Some(*n),
            Value::Text(s) => parse_number(s),
        }
    }
}

impl PartialEq for GroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for GroupKey {}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric_view(), other.numeric_view()) {
            (Some(a), Some(b)) => a
                .total_cmp(&b)
                .then_with(|| self.0.as_display().cmp(&other.0.as_display())),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.as_display().cmp(&other.0.as_display()),
        }
    }
}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
