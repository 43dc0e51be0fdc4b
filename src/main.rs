fn main() {
    if let Err(err) = fishbone_layout::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
