use anyhow::Result;
use log::info;

use crate::{
    analysis::{INDICATOR, LOCATION, TIME_PERIOD},
    cli::PreviewArgs,
    commands::load_view,
    filter::distinct_values,
    loader::numeric_count,
    table,
};

pub fn execute(args: &PreviewArgs) -> Result<()> {
    let view = load_view(&args.source)?;
    let filtered = &view.filtered;

    let column_rows = filtered
        .headers()
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let present = filtered.column(idx).flatten().count();
            vec![
                (idx + 1).to_string(),
                name.clone(),
                present.to_string(),
                numeric_count(filtered, name).to_string(),
            ]
        })
        .collect::<Vec<_>>();
    let column_headers = ["#", "column", "non-empty", "numeric"].map(String::from);
    table::print_table(&column_headers, &column_rows);
    println!();

    print!("{}", filtered.head(args.rows).render());
    println!();

    let mut overview = vec![vec!["rows".to_string(), filtered.len().to_string()]];
    for column in [LOCATION, INDICATOR, TIME_PERIOD] {
        if filtered.has_column(column) {
            overview.push(vec![
                format!("distinct {column}"),
                distinct_values(filtered, column).len().to_string(),
            ]);
        }
    }
    table::print_table(&["statistic".to_string(), "value".to_string()], &overview);

    for warning in &view.warnings {
        eprintln!("warning: {warning}");
    }
    info!(
        "Displayed {} of {} row(s) from {:?}",
        filtered.len().min(args.rows),
        filtered.len(),
        args.source.input
    );
    Ok(())
}
