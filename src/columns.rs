//! Column specifications and alias-based column resolution.
//!
//! Source files drift in how they name the same logical column (`Age`,
//! `age`, `Employee Age`). A [`ColumnSpec`] lists the acceptable aliases and
//! [`find_column`] resolves them against a header row.
//!
//! Resolution is a case-insensitive substring match and the first match
//! wins, which is ambiguous: the alias `Age` also matches `Average Age`.
//! Callers that care should order columns or aliases accordingly.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub numeric: bool,
    #[serde(default)]
    pub required: bool,
}

impl ColumnSpec {
    pub fn new<I, S>(name: &str, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.to_string(),
            aliases: aliases.into_iter().map(Into::into).collect(),
            numeric: false,
            required: false,
        }
    }

    pub fn numeric(mut self) -> Self {
        self.numeric = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Aliases to try, falling back to the logical name when none are given.
    pub fn candidates(&self) -> Vec<&str> {
        if self.aliases.is_empty() {
            vec![self.name.as_str()]
        } else {
            self.aliases.iter().map(String::as_str).collect()
        }
    }

    pub fn resolve<'a>(&self, headers: &'a [String]) -> Option<(usize, &'a str)> {
        find_column(headers, &self.candidates())
    }
}

/// Returns the index and name of the first header containing one of the
/// aliases (case-insensitive). Aliases are tried in order.
pub fn find_column<'a, S: AsRef<str>>(
    headers: &'a [String],
    aliases: &[S],
) -> Option<(usize, &'a str)> {
    let lowered = headers
        .iter()
        .map(|h| h.to_lowercase())
        .collect::<Vec<_>>();
    aliases.iter().find_map(|alias| {
        let needle = alias.as_ref().to_lowercase();
        lowered
            .iter()
            .position(|header| header.contains(&needle))
            .map(|idx| (idx, headers[idx].as_str()))
    })
}
