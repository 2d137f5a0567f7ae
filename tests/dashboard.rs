mod common;

use common::{EMPLOYEE_EXPORT_FIXTURE, PISA_FIXTURE, TestWorkspace, fixture_path};
use kpi_board::{
    Dashboard, FilterSelection, LoadError, Warning, analysis::top_n, config::DashboardConfig,
};

#[test]
fn kpis_ignore_the_selection_while_rows_follow_it() {
    let dashboard = Dashboard::pisa();
    let selection = FilterSelection::new().with("location", ["FIN"]);
    let view = dashboard
        .render(&fixture_path(PISA_FIXTURE), &selection)
        .expect("render");

    assert_eq!(view.table.len(), 22);
    assert_eq!(view.filtered.len(), 5);
    assert_eq!(view.kpis.get("total_records"), Some(22.0));
    assert_eq!(view.kpis.get("locations"), Some(6.0));
    assert_eq!(
        view.warnings,
        vec![Warning::UnparsedValues {
            column: "value".into(),
            count: 1
        }]
    );
}

#[test]
fn rendering_twice_gives_the_same_view() {
    let dashboard = Dashboard::pisa();
    let selection = FilterSelection::new().with("time_period", ["2018"]);
    let path = fixture_path(PISA_FIXTURE);
    let first = dashboard.render(&path, &selection).expect("first");
    let second = dashboard.render(&path, &selection).expect("second");
    assert_eq!(first.filtered, second.filtered);
    assert_eq!(first.kpis, second.kpis);
}

#[test]
fn analysis_runs_on_the_filtered_rows() {
    let selection = FilterSelection::new().with("location", ["SWE", "USA"]);
    let view = Dashboard::pisa()
        .render(&fixture_path(PISA_FIXTURE), &selection)
        .expect("render");
    let top = top_n(&view.filtered, 10, "PISAMATH", "TOT", "2018");
    let locations = top.iter().map(|e| e.location.as_str()).collect::<Vec<_>>();
    assert_eq!(locations, ["USA", "SWE"]);
}

#[test]
fn unknown_dimension_and_missing_kpi_column_are_reported() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("staff.csv", "Name,Department,Age\nAnna,Sales,30\n");
    let selection = FilterSelection::new().with("Region", ["North"]);
    let view = Dashboard::employee().render(&path, &selection).expect("render");

    assert!(view.filtered.is_empty());
    assert_eq!(view.kpis.get("average_salary"), Some(0.0));
    assert!(view.warnings.contains(&Warning::missing_column("Salary_SEK")));
    assert!(view.warnings.contains(&Warning::missing_column("Region")));
    let salary_warnings = view
        .warnings
        .iter()
        .filter(|w| **w == Warning::missing_column("Salary_SEK"))
        .count();
    assert_eq!(salary_warnings, 1, "warnings are deduplicated");
}

#[test]
fn export_profile_reads_the_banner_file() {
    let view = Dashboard::employee_export()
        .render(&fixture_path(EMPLOYEE_EXPORT_FIXTURE), &FilterSelection::new())
        .expect("render");
    assert_eq!(view.kpis.get("total_employees"), Some(5.0));
    assert_eq!(view.kpis.get("average_salary"), Some(45600.1));
}

#[test]
fn missing_file_fails_the_render() {
    let workspace = TestWorkspace::new();
    let err = Dashboard::pisa()
        .render(&workspace.path().join("gone.csv"), &FilterSelection::new())
        .unwrap_err();
    assert!(matches!(err, LoadError::FileNotFound(_)));
}

#[test]
fn yaml_config_drives_a_custom_dashboard() {
    let workspace = TestWorkspace::new();
    let data = workspace.write(
        "scores.tsv",
        "country\tscore\tyear\nSWE\t502\t2018\nFIN\t507\t2018\nFIN\t\t2015\n",
    );
    let config = workspace.write(
        "scores.yaml",
        r#"
loader:
  rename: { country: location, score: value, year: time_period }
  numeric: [value]
  expected: [location, value, time_period]
kpis:
  - name: rows
    reduction: count
  - name: mean_score
    reduction: mean
    precision: 1
    column: { name: value, aliases: [value] }
  - name: countries
    reduction: distinct
    column: { name: location }
"#,
    );

    let dashboard = DashboardConfig::load(&config).expect("config").into_dashboard();
    let view = dashboard
        .render(&data, &FilterSelection::new())
        .expect("render");
    assert_eq!(view.kpis.get("rows"), Some(3.0));
    assert_eq!(view.kpis.get("mean_score"), Some(504.5));
    assert_eq!(view.kpis.get("countries"), Some(2.0));
    assert!(view.warnings.is_empty());
}
