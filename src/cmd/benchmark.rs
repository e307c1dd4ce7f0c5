use clap::Parser;
use iobench::bench::{self, Args};
use iobench::utils;

fn main() {
    let args = Args::parse();

    if let Err(e) = utils::init_tracing() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    std::process::exit(bench::run(args));
}
