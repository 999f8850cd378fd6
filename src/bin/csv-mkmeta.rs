fn main() {
    if let Err(err) = csv_metadata::run_mkmeta() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
