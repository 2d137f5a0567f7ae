//! CSV loading with column renaming and numeric coercion.
//!
//! One [`LoaderConfig`] replaces the per-dashboard loader copies: it carries
//! the rename map, the number of leading rows to skip, the columns to coerce
//! to numbers and the columns the dashboard expects to find.
//!
//! Loading never fails because of data quality. Missing expected columns and
//! cells that do not parse as numbers are reported as [`Warning`]s and the
//! table is returned with whatever could be read. Only a missing or
//! unreadable file is fatal.

use std::{
    collections::{BTreeMap, HashMap},
    path::Path,
};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    data::{Value, parse_cell},
    error::{LoadError, Warning},
    io_utils,
    table::{Row, Table},
};

/// Number of banner rows preceding the header in the employee export format.
pub const EMPLOYEE_EXPORT_SKIP_ROWS: usize = 5;

pub const PISA_COLUMNS: [&str; 5] = ["location", "subject", "time_period", "value", "indicator"];

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoaderConfig {
    /// Exact (case-sensitive) source header → logical name.
    #[serde(default)]
    pub rename: BTreeMap<String, String>,
    /// Leading CSV records dropped before the header row. Counts records, not
    /// raw lines: the reader ignores blank lines, so only non-empty banner
    /// lines count.
    #[serde(default)]
    pub skip_rows: usize,
    /// Logical column names coerced to numbers after renaming.
    #[serde(default)]
    pub numeric: Vec<String>,
    /// Logical column names the dashboard expects; absence is a warning.
    #[serde(default)]
    pub expected: Vec<String>,
    #[serde(default, with = "delimiter_serde")]
    pub delimiter: Option<u8>,
    #[serde(default)]
    pub encoding: Option<String>,
}

impl LoaderConfig {
    pub fn pisa() -> Self {
        let rename = [
            ("LOCATION", "location"),
            ("SUBJECT", "subject"),
            ("TIME", "time_period"),
            ("VALUE", "value"),
            ("INDICATOR", "indicator"),
        ]
        .into_iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect();
        Self {
            rename,
            numeric: vec!["value".to_string()],
            expected: PISA_COLUMNS.iter().map(|c| c.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn employee() -> Self {
        Self {
            numeric: vec!["Age".to_string(), "Salary_SEK".to_string()],
            expected: vec![
                "Department".to_string(),
                "Age".to_string(),
                "Salary_SEK".to_string(),
            ],
            ..Self::default()
        }
    }

    pub fn employee_export() -> Self {
        Self {
            skip_rows: EMPLOYEE_EXPORT_SKIP_ROWS,
            ..Self::employee()
        }
    }

    pub fn with_skip_rows(mut self, skip_rows: usize) -> Self {
        self.skip_rows = skip_rows;
        self
    }

    pub fn with_delimiter(mut self, delimiter: Option<u8>) -> Self {
        if delimiter.is_some() {
            self.delimiter = delimiter;
        }
        self
    }

    pub fn with_encoding(mut self, encoding: Option<String>) -> Self {
        if encoding.is_some() {
            self.encoding = encoding;
        }
        self
    }

    fn renamed(&self, header: &str) -> String {
        self.rename
            .get(header)
            .cloned()
            .unwrap_or_else(|| header.to_string())
    }
}

/// Reads `path` into a [`Table`], logging any warnings.
pub fn load(path: &Path, config: &LoaderConfig) -> Result<Table, LoadError> {
    load_with_warnings(path, config).map(|(table, _)| table)
}

pub fn load_with_warnings(
    path: &Path,
    config: &LoaderConfig,
) -> Result<(Table, Vec<Warning>), LoadError> {
    io_utils::ensure_parent_dir(path)?;
    let delimiter = io_utils::resolve_input_delimiter(path, config.delimiter);
    let encoding = io_utils::resolve_encoding(config.encoding.as_deref())?;
    info!(
        "Loading '{}' (delimiter '{}', encoding {}, skipping {} row(s))",
        path.display(),
        crate::printable_delimiter(delimiter),
        encoding.name(),
        config.skip_rows
    );
    let mut reader = io_utils::open_csv_reader(path, delimiter)?;

    let mut headers: Option<Vec<String>> = None;
    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for (record_idx, record) in reader.byte_records().enumerate() {
        let record = record.map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        if record_idx < config.skip_rows {
            continue;
        }
        let decoded =
            io_utils::decode_record(&record, encoding).ok_or_else(|| LoadError::Decode {
                path: path.to_path_buf(),
                row: record_idx + 1,
                encoding: encoding.name(),
            })?;
        match headers {
            None => headers = Some(decoded.iter().map(|h| config.renamed(h)).collect()),
            Some(_) => raw_rows.push(decoded),
        }
    }
    let headers = headers.unwrap_or_default();
    debug!("Headers after rename: {headers:?}");

    let mut warnings = config
        .expected
        .iter()
        .filter(|column| !headers.contains(column))
        .map(|column| Warning::missing_column(column.as_str()).emit())
        .collect::<Vec<_>>();

    let numeric = headers
        .iter()
        .map(|h| config.numeric.contains(h))
        .collect::<Vec<_>>();
    let mut unparsed: HashMap<usize, usize> = HashMap::new();
    let rows = raw_rows
        .into_iter()
        .map(|raw| coerce_row(raw, &numeric, &mut unparsed))
        .collect::<Vec<Row>>();

    for (idx, header) in headers.iter().enumerate() {
        if let Some(count) = unparsed.get(&idx) {
            warnings.push(
                Warning::UnparsedValues {
                    column: header.clone(),
                    count: *count,
                }
                .emit(),
            );
        }
    }

    let table = Table::new(headers, rows);
    info!(
        "Loaded {} row(s) across {} column(s) from {:?}",
        table.len(),
        table.headers().len(),
        path
    );
    Ok((table, warnings))
}

fn coerce_row(raw: Vec<String>, numeric: &[bool], unparsed: &mut HashMap<usize, usize>) -> Row {
    numeric
        .iter()
        .enumerate()
        .map(|(idx, is_numeric)| {
            let cell = raw.get(idx).map(String::as_str).unwrap_or("");
            let value = parse_cell(cell, *is_numeric);
            if *is_numeric && value.is_none() && !cell.trim().is_empty() {
                debug!("Column {idx}: '{cell}' is not numeric, treating as missing");
                *unparsed.entry(idx).or_insert(0) += 1;
            }
            value
        })
        .collect()
}

/// Number of rows holding a numeric value in `column`.
pub fn numeric_count(table: &Table, column: &str) -> usize {
    table
        .column_index(column)
        .map(|idx| {
            table
                .column(idx)
                .filter(|c| matches!(c, Some(Value::Number(_))))
                .count()
        })
        .unwrap_or(0)
}

mod delimiter_serde {
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(value: &Option<u8>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(byte) => serializer.serialize_some(&(*byte as char).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u8>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        raw.map(|value| crate::cli::parse_delimiter(&value).map_err(de::Error::custom))
            .transpose()
    }
}
