fn main() {
    if let Err(e) = alkalinity_rs::adapters::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
