//! Command handlers: resolve the dashboard, load and filter the input, run
//! one query and print the result in the requested format.

use std::fs;

use anyhow::{Context, Result, anyhow};
use log::{info, warn};
use serde::Serialize;

use crate::{
    analysis::{self, AnalysisDefaults, GroupMean, RankEntry},
    cli::{
        CountsArgs, FilterArgs, GapArgs, GroupArgs, HistogramArgs, ImprovedArgs, KpisArgs,
        OutputFormat, Profile, ShowConfigArgs, SourceArgs, SummaryArgs, TopArgs, TrendsArgs,
    },
    config::DashboardConfig,
    dashboard::{Dashboard, DashboardView},
    data::format_number,
    filter::FilterSelection,
    frequency, io_utils,
    kpi::round_to,
    stats::{self, ColumnSummary},
    table,
};

pub fn resolve_dashboard(source: &SourceArgs) -> Result<Dashboard> {
    let mut dashboard = match &source.config {
        Some(path) => DashboardConfig::load(path)
            .with_context(|| format!("Loading dashboard config from {path:?}"))?
            .into_dashboard(),
        None => profile_dashboard(source.profile),
    };
    let mut loader = dashboard
        .loader
        .with_delimiter(source.delimiter)
        .with_encoding(source.input_encoding.clone());
    if let Some(skip_rows) = source.skip_rows {
        loader = loader.with_skip_rows(skip_rows);
    }
    dashboard.loader = loader;
    Ok(dashboard)
}

fn profile_dashboard(profile: Profile) -> Dashboard {
    match profile {
        Profile::Employee => Dashboard::employee(),
        Profile::EmployeeExport => Dashboard::employee_export(),
        Profile::Pisa => Dashboard::pisa(),
    }
}

/// Loads the input and applies `--select`.
pub fn load_view(source: &SourceArgs) -> Result<DashboardView> {
    let dashboard = resolve_dashboard(source)?;
    let selection = FilterSelection::parse(&source.select)?;
    dashboard
        .render(&source.input, &selection)
        .with_context(|| format!("Loading {:?}", source.input))
}

pub fn kpis(args: &KpisArgs) -> Result<()> {
    let view = load_view(&args.source)?;
    let rows = view
        .kpis
        .iter()
        .map(|kpi| vec![kpi.name.clone(), format_number(kpi.value)])
        .collect::<Vec<_>>();
    emit(args.output.format, &["kpi", "value"], &rows, &view.kpis.to_map())?;
    for name in view.kpis.degraded() {
        warn!("KPI '{name}' fell back to its default value");
    }
    info!("Computed {} KPI(s) over {} row(s)", view.kpis.len(), view.table.len());
    Ok(())
}

pub fn filter(args: &FilterArgs) -> Result<()> {
    let view = load_view(&args.source)?;
    let output = match args.limit {
        Some(limit) => view.filtered.head(limit),
        None => view.filtered,
    };
    if args.table && args.output.is_none() {
        print!("{}", output.render());
    } else {
        let delimiter = args
            .output
            .as_deref()
            .map(|path| io_utils::resolve_input_delimiter(path, None))
            .unwrap_or(io_utils::DEFAULT_CSV_DELIMITER);
        let mut writer = io_utils::open_csv_writer(args.output.as_deref(), delimiter)?;
        writer
            .write_record(output.headers())
            .context("Writing headers")?;
        for row in output.display_rows() {
            writer.write_record(&row).context("Writing row")?;
        }
        writer.flush().context("Flushing output")?;
    }
    info!("Selected {} of {} row(s)", output.len(), view.table.len());
    Ok(())
}

pub fn top(args: &TopArgs) -> Result<()> {
    let view = load_view(&args.source)?;
    let defaults = AnalysisDefaults::default();
    let ranking = analysis::top_n(
        &view.filtered,
        args.n.unwrap_or(defaults.n),
        args.indicator.as_deref().unwrap_or(&defaults.indicator),
        args.subject.as_deref().unwrap_or(&defaults.subject),
        args.year.as_deref().unwrap_or(&defaults.year),
    );
    emit_ranking(args.output.format, "value", &ranking)
}

pub fn improved(args: &ImprovedArgs) -> Result<()> {
    let view = load_view(&args.source)?;
    let defaults = AnalysisDefaults::default();
    let ranking = analysis::most_improved(
        &view.filtered,
        args.indicator.as_deref().unwrap_or(&defaults.indicator),
        args.subject.as_deref().unwrap_or(&defaults.subject),
        args.start_year.as_deref().unwrap_or(&defaults.start_year),
        args.end_year.as_deref().unwrap_or(&defaults.end_year),
    );
    emit_ranking(args.output.format, "improvement", &ranking)
}

pub fn gap(args: &GapArgs) -> Result<()> {
    let view = load_view(&args.source)?;
    let defaults = AnalysisDefaults::default();
    let ranking = analysis::gender_gap_with(
        &view.filtered,
        args.indicator.as_deref().unwrap_or(&defaults.indicator),
        args.year.as_deref().unwrap_or(&defaults.year),
        args.boys.as_deref().unwrap_or(&defaults.boys),
        args.girls.as_deref().unwrap_or(&defaults.girls),
    );
    emit_ranking(args.output.format, "gap", &ranking)
}

pub fn by_year(args: &GroupArgs) -> Result<()> {
    let view = load_view(&args.source)?;
    let groups = analysis::global_avg_by_year_for(&view.filtered, &aggregate_subject(args));
    emit_groups(args.output.format, &["time_period", "indicator"], &groups)
}

pub fn by_indicator(args: &GroupArgs) -> Result<()> {
    let view = load_view(&args.source)?;
    let groups = analysis::avg_by_indicator_for(&view.filtered, &aggregate_subject(args));
    emit_groups(args.output.format, &["indicator"], &groups)
}

pub fn by_location(args: &GroupArgs) -> Result<()> {
    let view = load_view(&args.source)?;
    let ranking = analysis::avg_by_location(&view.filtered);
    emit_ranking(args.output.format, "mean", &ranking)
}

pub fn trends(args: &TrendsArgs) -> Result<()> {
    let view = load_view(&args.source)?;
    match analysis::trends_by_location(&view.filtered, &args.locations) {
        Ok(groups) => emit_groups(
            args.output.format,
            &["location", "time_period", "indicator"],
            &groups,
        ),
        Err(warning) => {
            // Already logged; the user gets the message and nothing else.
            eprintln!("{warning}");
            Ok(())
        }
    }
}

pub fn counts(args: &CountsArgs) -> Result<()> {
    let view = load_view(&args.source)?;
    ensure_column(&view, &args.column)?;
    let mut counts = frequency::value_counts(&view.filtered, &args.column);
    if args.top > 0 {
        counts.truncate(args.top);
    }
    let rows = counts
        .iter()
        .map(|c| vec![c.value.clone(), c.count.to_string(), format!("{:.2}%", c.percent)])
        .collect::<Vec<_>>();
    emit(args.output.format, &[args.column.as_str(), "count", "percent"], &rows, &counts)
}

pub fn histogram(args: &HistogramArgs) -> Result<()> {
    let view = load_view(&args.source)?;
    ensure_column(&view, &args.column)?;
    let bins = frequency::histogram(&view.filtered, &args.column, args.bins);
    let rows = bins
        .iter()
        .map(|b| {
            vec![
                format_number(round_to(b.lower, 2)),
                format_number(round_to(b.upper, 2)),
                b.count.to_string(),
            ]
        })
        .collect::<Vec<_>>();
    emit(args.output.format, &["lower", "upper", "count"], &rows, &bins)
}

pub fn summary(args: &SummaryArgs) -> Result<()> {
    let view = load_view(&args.source)?;
    ensure_column(&view, &args.column)?;
    let summaries = match &args.by {
        Some(group) => {
            ensure_column(&view, group)?;
            stats::summarize_by(&view.filtered, group, &args.column)
        }
        None => stats::summarize(&view.filtered, &args.column)
            .into_iter()
            .collect(),
    };
    let rows = summaries
        .iter()
        .map(ColumnSummary::render_row)
        .collect::<Vec<_>>();
    emit(args.output.format, &ColumnSummary::HEADERS, &rows, &summaries)
}

/// Prints a built-in profile in the `--config` format, as a starting point
/// for a custom dashboard.
pub fn show_config(args: &ShowConfigArgs) -> Result<()> {
    let config = DashboardConfig::from(&profile_dashboard(args.profile));
    let yaml = config.to_yaml_string()?;
    match &args.output {
        Some(path) => {
            fs::write(path, &yaml).with_context(|| format!("Writing config to {path:?}"))?;
            info!("Wrote {:?} profile to {path:?}", args.profile);
        }
        None => print!("{yaml}"),
    }
    Ok(())
}

fn aggregate_subject(args: &GroupArgs) -> String {
    args.aggregate_subject
        .clone()
        .unwrap_or_else(|| AnalysisDefaults::default().aggregate_subject)
}

fn ensure_column(view: &DashboardView, column: &str) -> Result<()> {
    if view.table.has_column(column) {
        Ok(())
    } else {
        Err(anyhow!(
            "Column '{column}' not found; available columns: {}",
            view.table.headers().join(", ")
        ))
    }
}

fn emit_ranking(format: OutputFormat, metric: &str, ranking: &[RankEntry]) -> Result<()> {
    let rows = ranking
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            vec![
                (idx + 1).to_string(),
                entry.location.clone(),
                format_number(round_to(entry.value, 2)),
            ]
        })
        .collect::<Vec<_>>();
    emit(format, &["rank", "location", metric], &rows, &ranking)?;
    info!("Ranked {} location(s)", ranking.len());
    Ok(())
}

fn emit_groups(format: OutputFormat, keys: &[&str], groups: &[GroupMean]) -> Result<()> {
    let headers = keys
        .iter()
        .copied()
        .chain(["mean", "count"])
        .collect::<Vec<_>>();
    let rows = groups
        .iter()
        .map(|group| {
            let mut row = group.keys.iter().map(|k| k.to_string()).collect::<Vec<_>>();
            row.push(
                group
                    .mean
                    .map(|m| format_number(round_to(m, 2)))
                    .unwrap_or_default(),
            );
            row.push(group.count.to_string());
            row
        })
        .collect::<Vec<_>>();
    emit(format, &headers, &rows, &groups)?;
    info!("Computed {} group(s)", groups.len());
    Ok(())
}

fn emit<T: Serialize + ?Sized>(
    format: OutputFormat,
    headers: &[&str],
    rows: &[Vec<String>],
    value: &T,
) -> Result<()> {
    match format {
        OutputFormat::Table => {
            let headers = headers.iter().map(|h| h.to_string()).collect::<Vec<_>>();
            table::print_table(&headers, rows);
        }
        OutputFormat::Csv => {
            let mut writer = io_utils::open_csv_writer(None, io_utils::DEFAULT_CSV_DELIMITER)?;
            writer.write_record(headers).context("Writing headers")?;
            for row in rows {
                writer.write_record(row).context("Writing row")?;
            }
            writer.flush().context("Flushing output")?;
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value).context("Serializing JSON output")?;
            println!("{json}");
        }
    }
    Ok(())
}
