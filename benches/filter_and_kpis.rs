use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use kpi_board::{
    Dashboard, FilterSelection, LoaderConfig, apply_filters, compute_kpis,
    analysis::{most_improved, top_n},
    kpi::pisa_kpis,
    load,
};
use tempfile::TempDir;

const LOCATIONS: [&str; 8] = ["SWE", "FIN", "USA", "DEU", "POL", "ITA", "NOR", "EST"];
const SUBJECTS: [&str; 3] = ["TOT", "BOY", "GIRL"];
const INDICATORS: [&str; 3] = ["PISAMATH", "PISAREAD", "PISASCIENCE"];

fn generate_scores(rows: usize) -> (TempDir, PathBuf) {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let csv_path = temp_dir.path().join("pisa.csv");
    let mut file = File::create(&csv_path).expect("create csv");
    writeln!(file, "LOCATION,INDICATOR,SUBJECT,MEASURE,FREQUENCY,TIME,VALUE,Flag Codes").expect("header");
    for i in 0..rows {
        let location = LOCATIONS[i % LOCATIONS.len()];
        let indicator = INDICATORS[(i / LOCATIONS.len()) % INDICATORS.len()];
        let subject = SUBJECTS[(i / 7) % SUBJECTS.len()];
        let year = 2000 + 3 * (i % 7);
        let value = 400 + (i * 37) % 200;
        writeln!(file, "{location},{indicator},{subject},MEANSCORE,A,{year},{value},").expect("row");
    }
    (temp_dir, csv_path)
}

fn bench_filter_and_kpis(c: &mut Criterion) {
    let (temp_dir, csv_path) = generate_scores(50_000);
    let table = load(&csv_path, &LoaderConfig::pisa()).expect("load");
    let specs = pisa_kpis();
    let selection = FilterSelection::new()
        .with("location", ["SWE", "FIN", "NOR"])
        .with("subject", ["TOT"]);
    let dashboard = Dashboard::pisa();

    let mut group = c.benchmark_group("dashboard");

    group.bench_function("load", |b| {
        b.iter(|| load(&csv_path, &LoaderConfig::pisa()).expect("load"));
    });

    group.bench_function("compute_kpis", |b| {
        b.iter(|| compute_kpis(&table, &specs));
    });

    group.bench_function("apply_filters", |b| {
        b.iter(|| apply_filters(&table, &selection));
    });

    group.bench_function("rankings", |b| {
        b.iter(|| {
            let top = top_n(&table, 10, "PISAMATH", "TOT", "2018");
            let improved = most_improved(&table, "PISAMATH", "TOT", "2006", "2018");
            (top, improved)
        });
    });

    group.bench_function("render", |b| {
        b.iter_batched(
            || selection.clone(),
            |selection| dashboard.render(&csv_path, &selection).expect("render"),
            BatchSize::SmallInput,
        );
    });

    drop(temp_dir);
    group.finish();
}

criterion_group!(benches, bench_filter_and_kpis);
criterion_main!(benches);
