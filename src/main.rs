fn main() {
    if let Err(e) = labelprep::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
