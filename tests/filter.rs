mod common;

use common::{PISA_FIXTURE, fixture_path};
use kpi_board::{
    FilterSelection, LoaderConfig, Table, Warning, apply_filters,
    filter::{distinct_values, validate_selection},
    load,
};

fn pisa() -> Table {
    load(&fixture_path(PISA_FIXTURE), &LoaderConfig::pisa()).expect("load pisa")
}

fn locations(table: &Table) -> Vec<String> {
    let idx = table.column_index("location").unwrap();
    table
        .column(idx)
        .map(|cell| cell.map(|v| v.as_display()).unwrap_or_default())
        .collect()
}

#[test]
fn empty_selection_passes_every_row_through() {
    let table = pisa();
    assert_eq!(apply_filters(&table, &FilterSelection::new()), table);

    let cleared = FilterSelection::parse(&["location=".to_string()]).expect("parse");
    assert!(cleared.is_unfiltered());
    assert_eq!(apply_filters(&table, &cleared), table);
}

#[test]
fn dimensions_combine_with_and_values_with_or() {
    let table = pisa();
    let selection = FilterSelection::new()
        .with("location", ["SWE", "FIN"])
        .with("subject", ["TOT"])
        .with("time_period", ["2018"]);
    let filtered = apply_filters(&table, &selection);

    assert_eq!(
        locations(&filtered),
        ["SWE", "FIN", "SWE", "FIN"].map(String::from)
    );
    let indicator = filtered.column_index("indicator").unwrap();
    let indicators = filtered
        .column(indicator)
        .map(|cell| cell.unwrap().as_display())
        .collect::<Vec<_>>();
    assert_eq!(indicators, ["PISAMATH", "PISAMATH", "PISAREAD", "PISAREAD"]);
}

#[test]
fn filtering_preserves_row_order_and_is_idempotent() {
    let table = pisa();
    let selection = FilterSelection::parse(&["location=POL,USA".to_string()]).expect("parse");
    let once = apply_filters(&table, &selection);
    let twice = apply_filters(&once, &selection);
    assert_eq!(once, twice);
    assert_eq!(
        locations(&once),
        ["USA", "POL", "USA", "POL", "USA", "USA", "POL", "POL"].map(String::from)
    );
}

#[test]
fn numeric_cells_match_textual_tokens() {
    let table = pisa();
    let selection = FilterSelection::new().with("value", ["110"]);
    let filtered = apply_filters(&table, &selection);
    assert_eq!(locations(&filtered), vec!["FIN".to_string()]);
}

#[test]
fn unknown_dimension_yields_an_empty_table() {
    let table = pisa();
    let selection = FilterSelection::new().with("region", ["EU"]);
    let filtered = apply_filters(&table, &selection);
    assert!(filtered.is_empty());
    assert_eq!(filtered.headers(), table.headers());
}

#[test]
fn parse_accepts_quoted_values_and_rejects_malformed_input() {
    let selection = FilterSelection::parse(&[
        "location = 'SWE', \"FIN\"".to_string(),
        "subject=BOY".to_string(),
    ])
    .expect("parse");
    let expected = FilterSelection::new()
        .with("location", ["SWE", "FIN"])
        .with("subject", ["BOY"]);
    assert_eq!(selection, expected);

    assert!(FilterSelection::parse(&["location".to_string()]).is_err());
    assert!(FilterSelection::parse(&["=SWE".to_string()]).is_err());
}

#[test]
fn distinct_values_sort_numerically() {
    let table = pisa();
    assert_eq!(distinct_values(&table, "time_period"), ["2006", "2018"]);
    assert_eq!(
        distinct_values(&table, "location"),
        ["DEU", "FIN", "ITA", "POL", "SWE", "USA"]
    );
    assert!(distinct_values(&table, "region").is_empty());
}

#[test]
fn selection_size_is_validated_softly() {
    let none: Vec<String> = Vec::new();
    assert_eq!(
        validate_selection("location(s)", &none, 1, None),
        Err(Warning::EmptySelection {
            dimension: "location(s)".into(),
            min: 1
        })
    );
    let many = ["SWE", "FIN", "USA"].map(String::from);
    assert_eq!(
        validate_selection("location(s)", &many, 1, Some(2)),
        Err(Warning::TooManySelected {
            dimension: "location(s)".into(),
            max: 2
        })
    );
    assert!(validate_selection("location(s)", &many[..2], 1, Some(2)).is_ok());
}
