//! Entry point for the `geostore` command-line tool.
#![forbid(unsafe_code)]

fn main() {
    env_logger::init();
    if let Err(err) = geostore_cli::run() {
        eprintln!("geostore: {err}");
        std::process::exit(1);
    }
}
