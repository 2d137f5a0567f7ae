//! In-memory table model and aligned text rendering.
//!
//! [`Table`] is what the loader produces and what every filter, KPI and
//! analysis function consumes. It is a plain row store: ordered headers plus
//! rows of optional [`Value`] cells aligned with those headers.

use std::borrow::Cow;
use std::fmt::Write as _;

use serde::Serialize;

use crate::data::Value;

pub type Row = Vec<Option<Value>>;

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    /// Builds a table, padding short rows with missing cells and dropping
    /// cells beyond the header width.
    pub fn new(headers: Vec<String>, rows: Vec<Row>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, None);
                row
            })
            .collect();
        Self { headers, rows }
    }

    pub fn empty_like(&self) -> Self {
        Self {
            headers: self.headers.clone(),
            rows: Vec::new(),
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(column)).and_then(|c| c.as_ref())
    }

    /// Iterates the cells of one column in row order.
    pub fn column(&self, index: usize) -> impl Iterator<Item = Option<&Value>> + '_ {
        self.rows.iter().map(move |row| row.get(index).and_then(|c| c.as_ref()))
    }

    /// Non-missing numeric values of a column, in row order.
    pub fn numbers(&self, index: usize) -> Vec<f64> {
        self.column(index)
            .filter_map(|cell| cell.and_then(Value::as_number))
            .collect()
    }

    /// Keeps the rows for which `keep` returns true, preserving order.
    pub fn retain_rows<F>(&self, mut keep: F) -> Self
    where
        F: FnMut(&Row) -> bool,
    {
        Self {
            headers: self.headers.clone(),
            rows: self.rows.iter().filter(|row| keep(row)).cloned().collect(),
        }
    }

    pub fn head(&self, count: usize) -> Self {
        Self {
            headers: self.headers.clone(),
            rows: self.rows.iter().take(count).cloned().collect(),
        }
    }

    /// Display strings for every cell; missing cells render empty.
    pub fn display_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.as_ref().map(Value::as_display).unwrap_or_default())
                    .collect()
            })
            .collect()
    }

    pub fn render(&self) -> String {
        render_table(&self.headers, &self.display_rows())
    }
}

pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let column_count = headers.len();
    let mut widths = headers.iter().map(|h| display_width(h)).collect::<Vec<_>>();
    let mut numeric = vec![true; column_count];

    for row in rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(display_width(cell));
            if !cell.is_empty() && cell.trim().parse::<f64>().is_err() {
                numeric[idx] = false;
            }
        }
    }
    if rows.is_empty() {
        numeric.iter_mut().for_each(|flag| *flag = false);
    }

    for width in &mut widths {
        *width = (*width).max(3);
    }

    let mut output = String::new();
    let text_only = vec![false; column_count];
    let _ = writeln!(output, "{}", format_row(headers, &widths, &text_only));

    let separator = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let _ = writeln!(output, "{}", format_row(&separator, &widths, &text_only));

    for row in rows {
        let _ = writeln!(output, "{}", format_row(row, &widths, &numeric));
    }

    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

// Numeric columns are right-aligned, everything else left-aligned.
fn format_row(values: &[String], widths: &[usize], right_align: &[bool]) -> String {
    let cells = values
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(idx, (value, width))| {
            let sanitized = sanitize_cell(value);
            let padding = " ".repeat(width.saturating_sub(display_width(&sanitized)));
            if right_align.get(idx).copied().unwrap_or(false) {
                format!("{padding}{sanitized}")
            } else {
                format!("{sanitized}{padding}")
            }
        })
        .collect::<Vec<_>>();
    cells.join("  ").trim_end().to_string()
}

fn display_width(value: &str) -> usize {
    let mut width = 0usize;
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' {
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            width += 1;
        }
    }
    width
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Option<Value> {
        Some(Value::Text(s.to_string()))
    }

    #[test]
    fn new_pads_and_truncates_rows_to_header_width() {
        let table = Table::new(
            vec!["a".into(), "b".into()],
            vec![vec![text("x")], vec![text("1"), text("2"), text("3")]],
        );
        assert_eq!(table.rows()[0], vec![text("x"), None]);
        assert_eq!(table.rows()[1], vec![text("1"), text("2")]);
    }

    #[test]
    fn numbers_skip_missing_and_text_cells() {
        let table = Table::new(
            vec!["v".into()],
            vec![
                vec![Some(Value::Number(1.5))],
                vec![None],
                vec![text("oops")],
                vec![Some(Value::Number(2.5))],
            ],
        );
        assert_eq!(table.numbers(0), vec![1.5, 2.5]);
    }

    #[test]
    fn render_right_aligns_numeric_columns() {
        let headers = vec!["location".to_string(), "value".to_string()];
        let rows = vec![
            vec!["FIN".to_string(), "110".to_string()],
            vec!["USA".to_string(), "95".to_string()],
        ];
        let rendered = render_table(&headers, &rows);
        let lines = rendered.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "location  value");
        assert_eq!(lines[1], "--------  -----");
        assert_eq!(lines[2], "FIN         110");
        assert_eq!(lines[3], "USA          95");
    }

    #[test]
    fn render_replaces_control_characters() {
        let headers = vec!["note".to_string()];
        let rows = vec![vec!["line1\nline2\tvalue".to_string()]];
        let rendered = render_table(&headers, &rows);
        assert_eq!(rendered.lines().nth(2), Some("line1 line2 value"));
    }
}
