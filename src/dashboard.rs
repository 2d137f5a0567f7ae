//! Request/response pipeline tying the loader, KPI engine and filter engine
//! together.
//!
//! A [`Dashboard`] holds configuration only. Each call to
//! [`Dashboard::render`] reloads the file, recomputes the KPIs over the full
//! table and applies the selection, so nothing is cached between requests.

use std::path::Path;

use log::info;
use serde::Serialize;

use crate::{
    error::{LoadError, Warning},
    filter::{FilterSelection, apply_filters},
    kpi::{KpiSpec, Kpis, compute_kpis, employee_kpis, pisa_kpis},
    loader::{LoaderConfig, load_with_warnings},
    table::Table,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub loader: LoaderConfig,
    pub kpis: Vec<KpiSpec>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    /// Every loaded row; KPIs are computed over this table.
    pub table: Table,
    /// Rows left after applying the selection.
    pub filtered: Table,
    pub kpis: Kpis,
    pub warnings: Vec<Warning>,
}

impl Dashboard {
    pub fn new(loader: LoaderConfig, kpis: Vec<KpiSpec>) -> Self {
        Self { loader, kpis }
    }

    pub fn employee() -> Self {
        Self::new(LoaderConfig::employee(), employee_kpis())
    }

    pub fn employee_export() -> Self {
        Self::new(LoaderConfig::employee_export(), employee_kpis())
    }

    pub fn pisa() -> Self {
        Self::new(LoaderConfig::pisa(), pisa_kpis())
    }

    pub fn load(&self, path: &Path) -> Result<(Table, Vec<Warning>), LoadError> {
        load_with_warnings(path, &self.loader)
    }

    pub fn render(&self, path: &Path, selection: &FilterSelection) -> Result<DashboardView, LoadError> {
        let (table, mut warnings) = self.load(path)?;
        let kpis = compute_kpis(&table, &self.kpis);
        let degraded_columns = kpis
            .degraded()
            .iter()
            .filter_map(|name| self.kpis.iter().find(|spec| &spec.name == name))
            .filter_map(|spec| spec.column.as_ref())
            .map(|column| column.name.clone())
            .collect::<Vec<_>>();
        let filtered = apply_filters(&table, selection);
        let unknown_dimensions = selection
            .active()
            .map(|(dimension, _)| dimension)
            .filter(|dimension| !table.has_column(dimension))
            .cloned()
            .collect::<Vec<_>>();
        for column in degraded_columns.into_iter().chain(unknown_dimensions) {
            let warning = Warning::missing_column(column);
            if !warnings.contains(&warning) {
                warnings.push(warning);
            }
        }
        info!(
            "Rendered dashboard: {} of {} row(s) selected, {} KPI(s), {} warning(s)",
            filtered.len(),
            table.len(),
            kpis.len(),
            warnings.len()
        );
        Ok(DashboardView {
            table,
            filtered,
            kpis,
            warnings,
        })
    }
}
