//! Error and warning taxonomy.
//!
//! Structural failures while loading a file are fatal and surface as
//! [`LoadError`]. Everything that only affects part of a result (a column that
//! did not resolve, cells that failed numeric coercion, an empty selection)
//! is a [`Warning`]: it is logged, handed back to the caller where useful, and
//! never aborts the pipeline.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("input file {0:?} does not exist")]
    FileNotFound(PathBuf),
    #[error("reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing CSV from {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("failed to decode {path:?} row {row} as {encoding}")]
    Decode {
        path: PathBuf,
        row: usize,
        encoding: &'static str,
    },
    #[error("unknown encoding '{0}'")]
    UnknownEncoding(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    #[error("missing expected column '{column}'")]
    MissingColumn { column: String },
    #[error("{count} value(s) in column '{column}' could not be parsed as numbers")]
    UnparsedValues { column: String, count: usize },
    #[error("please select at least {min} {dimension}")]
    EmptySelection { dimension: String, min: usize },
    #[error("please select at most {max} {dimension}")]
    TooManySelected { dimension: String, max: usize },
}

impl Warning {
    pub fn missing_column(column: impl Into<String>) -> Self {
        Warning::MissingColumn {
            column: column.into(),
        }
    }

    /// Logs the warning through the `log` facade and returns it.
    pub fn emit(self) -> Self {
        log::warn!("{self}");
        self
    }
}
