use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(author, version, about = "KPIs, filters and rankings for CSV dashboards", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the loaded columns and the first few rows
    Preview(PreviewArgs),
    /// Compute the dashboard KPIs
    Kpis(KpisArgs),
    /// Emit the rows matching a selection
    Filter(FilterArgs),
    /// Highest scoring locations for one indicator, subject and year
    Top(TopArgs),
    /// Locations ranked by score change between two years
    Improved(ImprovedArgs),
    /// Locations ranked by boys-minus-girls score gap
    Gap(GapArgs),
    /// Mean score per year and indicator over all students
    ByYear(GroupArgs),
    /// Mean score per indicator over all students and years
    ByIndicator(GroupArgs),
    /// Mean score per location, highest first
    ByLocation(GroupArgs),
    /// Mean score per location, year and indicator for selected locations
    Trends(TrendsArgs),
    /// Row counts per distinct value of a column
    Counts(CountsArgs),
    /// Equal-width histogram of a numeric column
    Histogram(HistogramArgs),
    /// Quartiles, mean and spread of a numeric column, optionally per group
    Summary(SummaryArgs),
    /// Print a built-in profile as a YAML dashboard definition
    ShowConfig(ShowConfigArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
#[value(rename_all = "kebab-case")]
pub enum Profile {
    Employee,
    EmployeeExport,
    Pisa,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

#[derive(Debug, Args)]
pub struct SourceArgs {
    /// Input CSV file
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Built-in dashboard profile driving renames, coercion and KPIs
    #[arg(long, value_enum, default_value = "pisa")]
    pub profile: Profile,
    /// YAML dashboard definition (overrides --profile)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Number of leading non-data rows to skip before the header
    #[arg(long = "skip-rows")]
    pub skip_rows: Option<usize>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Selections such as `location=SWE,FIN` applied before the command runs
    #[arg(long = "select", action = clap::ArgAction::Append)]
    pub select: Vec<String>,
}

#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Number of rows to display
    #[arg(long, default_value_t = 5)]
    pub rows: usize,
}

#[derive(Debug, Args)]
pub struct KpisArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args)]
pub struct FilterArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    /// Output CSV file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Limit number of rows emitted
    #[arg(long)]
    pub limit: Option<usize>,
    /// Render output as an aligned table instead of CSV
    #[arg(long = "table")]
    pub table: bool,
}

#[derive(Debug, Args)]
pub struct TopArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[command(flatten)]
    pub output: OutputArgs,
    /// Number of locations to return
    #[arg(short = 'n', long = "n")]
    pub n: Option<usize>,
    #[arg(long)]
    pub indicator: Option<String>,
    #[arg(long)]
    pub subject: Option<String>,
    #[arg(long)]
    pub year: Option<String>,
}

#[derive(Debug, Args)]
pub struct ImprovedArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[command(flatten)]
    pub output: OutputArgs,
    #[arg(long)]
    pub indicator: Option<String>,
    #[arg(long)]
    pub subject: Option<String>,
    #[arg(long = "start-year")]
    pub start_year: Option<String>,
    #[arg(long = "end-year")]
    pub end_year: Option<String>,
}

#[derive(Debug, Args)]
pub struct GapArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[command(flatten)]
    pub output: OutputArgs,
    #[arg(long)]
    pub indicator: Option<String>,
    #[arg(long)]
    pub year: Option<String>,
    /// Subject code of the first group
    #[arg(long)]
    pub boys: Option<String>,
    /// Subject code of the second group
    #[arg(long)]
    pub girls: Option<String>,
}

#[derive(Debug, Args)]
pub struct GroupArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[command(flatten)]
    pub output: OutputArgs,
    /// Subject code covering all students
    #[arg(long = "aggregate-subject")]
    pub aggregate_subject: Option<String>,
}

#[derive(Debug, Args)]
pub struct TrendsArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[command(flatten)]
    pub output: OutputArgs,
    /// Locations to include (at least one)
    #[arg(short = 'l', long = "location", value_delimiter = ',', action = clap::ArgAction::Append)]
    pub locations: Vec<String>,
}

#[derive(Debug, Args)]
pub struct CountsArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[command(flatten)]
    pub output: OutputArgs,
    /// Column to count values of
    #[arg(short = 'C', long = "column")]
    pub column: String,
    /// Maximum distinct values to display (0 = all)
    #[arg(long, default_value_t = 0)]
    pub top: usize,
}

#[derive(Debug, Args)]
pub struct HistogramArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[command(flatten)]
    pub output: OutputArgs,
    /// Numeric column to bin
    #[arg(short = 'C', long = "column")]
    pub column: String,
    #[arg(long, default_value_t = crate::frequency::DEFAULT_HISTOGRAM_BINS)]
    pub bins: usize,
}

#[derive(Debug, Args)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub source: SourceArgs,
    #[command(flatten)]
    pub output: OutputArgs,
    /// Numeric column to summarize
    #[arg(short = 'C', long = "column")]
    pub column: String,
    /// Optional grouping column
    #[arg(long = "by")]
    pub by: Option<String>,
}

#[derive(Debug, Args)]
pub struct ShowConfigArgs {
    /// Built-in dashboard profile to print
    #[arg(long, value_enum, default_value = "pisa")]
    pub profile: Profile,
    /// Write the YAML to a file instead of stdout
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
