//! YAML dashboard definitions.
//!
//! A configuration file describes a dashboard that the built-in profiles do
//! not cover: how to load the file and which KPIs to compute.
//!
//! ```yaml
//! loader:
//!   rename: { LOCATION: location, VALUE: value }
//!   numeric: [value]
//!   expected: [location, value]
//! kpis:
//!   - name: total_records
//!     reduction: count
//!   - name: average_value
//!     reduction: mean
//!     precision: 1
//!     column: { name: value, aliases: [value] }
//! ```

use std::{fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{dashboard::Dashboard, kpi::KpiSpec, loader::LoaderConfig};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DashboardConfig {
    #[serde(default)]
    pub loader: LoaderConfig,
    #[serde(default)]
    pub kpis: Vec<KpiSpec>,
}

impl DashboardConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let reader = BufReader::new(file);
        serde_yaml::from_reader(reader).with_context(|| format!("Parsing config YAML {path:?}"))
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self> {
        serde_yaml::from_str(contents).context("Parsing config YAML")
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Serializing config YAML")
    }

    pub fn into_dashboard(self) -> Dashboard {
        Dashboard::new(self.loader, self.kpis)
    }
}

impl From<&Dashboard> for DashboardConfig {
    fn from(dashboard: &Dashboard) -> Self {
        Self {
            loader: dashboard.loader.clone(),
            kpis: dashboard.kpis.clone(),
        }
    }
}
