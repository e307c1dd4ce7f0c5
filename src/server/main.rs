use crate::server::config::{self, Config};
use crate::server::{build_service, serve};
use crate::service::Flavor;
use crate::store::ProductStore;
use crate::utils;
use clap::Parser;
use std::sync::Arc;

/// Product server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Listen address (e.g., 0.0.0.0:8081), overrides the config file
    #[arg(short, long)]
    pub listen: Option<String>,

    /// Base URL of the downstream services, overrides the config file
    #[arg(long)]
    pub external_url: Option<String>,
}

pub fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut cfg = match &args.config {
        Some(path) => config::load(path)?,
        None => Config::default(),
    };
    if let Some(listen) = &args.listen {
        cfg.server.listen_addr = Some(listen.clone());
    }
    if let Some(url) = &args.external_url {
        cfg.external.base_url = url.clone();
    }
    Ok(cfg)
}

/// Entry point of the `<flavor>-server` binaries.
pub fn run(flavor: Flavor) -> anyhow::Result<()> {
    let args = Args::parse();

    if let Err(e) = utils::init_tracing() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cfg = load_config(&args)?;
    tracing::debug!("config: {:?}", cfg);

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if flavor == Flavor::Pooled {
        // the blocking pool is the request pool for this flavor
        builder.max_blocking_threads(cfg.execution.request_threads.max(1));
    }
    let runtime = builder.build()?;

    runtime.block_on(run_server(flavor, cfg))
}

async fn run_server(flavor: Flavor, cfg: Config) -> anyhow::Result<()> {
    let store = Arc::new(ProductStore::open(&cfg.database.path)?);
    let service = build_service(flavor, &cfg, store)?;

    let addr = cfg.listen_addr(flavor);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(
        "Starting {} server on {} (downstream: {})",
        flavor,
        addr,
        cfg.external.base_url
    );

    serve(listener, service, shutdown_signal()).await?;
    tracing::info!("{} server stopped", flavor);
    Ok(())
}

pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
}
