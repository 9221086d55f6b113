fn main() {
    if let Err(error) = fleetcored::run() {
        eprintln!("fleetcored process failed: {:?}", error);
        std::process::exit(1);
    }
}
