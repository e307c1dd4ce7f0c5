use clap::Parser;
use iobench::mock::{self, Args};
use iobench::utils;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = utils::init_tracing() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    if let Err(e) = mock::run(args).await {
        tracing::error!("Mock server error: {:#}", e);
        std::process::exit(1);
    }
}
