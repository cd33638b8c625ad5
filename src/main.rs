fn main() {
    if let Err(e) = uturu::cli::main() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
