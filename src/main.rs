fn main() {
    if let Err(err) = sheetflow::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
