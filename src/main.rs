fn main() {
    if let Err(err) = kpi_board::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
