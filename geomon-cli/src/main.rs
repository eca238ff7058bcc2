//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    env_logger::init();
    if let Err(err) = geomon_cli::run() {
        eprintln!("geomon: {err}");
        std::process::exit(1);
    }
}
