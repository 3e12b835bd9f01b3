fn main() {
    if let Err(err) = chargenet_api::app::run() {
        eprintln!("application startup failed: {err}");
        std::process::exit(1);
    }
}
