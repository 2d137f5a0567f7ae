pub mod analysis;
pub mod cli;
pub mod columns;
pub mod commands;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod filter;
pub mod frequency;
pub mod io_utils;
pub mod join;
pub mod kpi;
pub mod loader;
pub mod preview;
pub mod stats;
pub mod table;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use crate::cli::{Cli, Commands};

pub use crate::{
    dashboard::{Dashboard, DashboardView},
    data::Value,
    error::{LoadError, Warning},
    filter::{FilterSelection, apply_filters},
    kpi::{KpiSpec, Kpis, compute_kpis},
    loader::{LoaderConfig, load},
    table::Table,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("kpi_board", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Preview(args) => preview::execute(&args),
        Commands::Kpis(args) => commands::kpis(&args),
        Commands::Filter(args) => commands::filter(&args),
        Commands::Top(args) => commands::top(&args),
        Commands::Improved(args) => commands::improved(&args),
        Commands::Gap(args) => commands::gap(&args),
        Commands::ByYear(args) => commands::by_year(&args),
        Commands::ByIndicator(args) => commands::by_indicator(&args),
        Commands::ByLocation(args) => commands::by_location(&args),
        Commands::Trends(args) => commands::trends(&args),
        Commands::Counts(args) => commands::counts(&args),
        Commands::Histogram(args) => commands::histogram(&args),
        Commands::Summary(args) => commands::summary(&args),
        Commands::ShowConfig(args) => commands::show_config(&args),
    }
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
