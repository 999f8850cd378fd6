fn main() {
    if let Err(err) = csv_metadata::run_meta2csvt() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
