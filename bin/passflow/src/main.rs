fn main() {
    if let Err(err) = passflow::cli::run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}
