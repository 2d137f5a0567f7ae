#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

pub const PISA_FIXTURE: &str = "pisa_sample.csv";
pub const EMPLOYEE_FIXTURE: &str = "employees.csv";
pub const EMPLOYEE_EXPORT_FIXTURE: &str = "employees_export.csv";

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Writes a raw PISA export with the given `(location, indicator,
    /// subject, year, value)` rows.
    pub fn write_pisa(&self, name: &str, rows: &[(&str, &str, &str, &str, &str)]) -> PathBuf {
        let mut contents = String::from("LOCATION,INDICATOR,SUBJECT,TIME,VALUE\n");
        for (location, indicator, subject, year, value) in rows {
            contents.push_str(&format!("{location},{indicator},{subject},{year},{value}\n"));
        }
        self.write(name, &contents)
    }
}
