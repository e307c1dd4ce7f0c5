//! HTTP surface shared by the pooled, reactive and threaded product servers.

pub mod config;
pub mod handlers;
pub mod main;

use crate::external::{AsyncExternalClient, BlockingExternalClient};
use crate::pooled::PooledProductService;
use crate::reactive::ReactiveProductService;
use crate::service::{Flavor, ProductService};
use crate::store::ProductStore;
use crate::threaded::ThreadedProductService;
use axum::{
    Router,
    routing::{get, post},
};
use config::Config;
use std::future::Future;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub type SharedService = Arc<dyn ProductService>;

pub fn router(service: SharedService) -> Router {
    Router::new()
        .route(
            "/api/products",
            post(handlers::create_product).get(handlers::list_products),
        )
        .route("/api/products/aggregations", post(handlers::get_aggregations))
        .route("/api/products/:id", get(handlers::get_product))
        .route("/api/products/:id/aggregation", get(handlers::get_aggregation))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Wires the store and downstream client into the service for `flavor`.
pub fn build_service(
    flavor: Flavor,
    config: &Config,
    store: Arc<ProductStore>,
) -> anyhow::Result<SharedService> {
    let service: SharedService = match flavor {
        Flavor::Pooled => Arc::new(PooledProductService::new(
            store,
            BlockingExternalClient::new(&config.external),
            config.execution.fanout_threads,
        )?),
        Flavor::Reactive => Arc::new(ReactiveProductService::new(
            store,
            AsyncExternalClient::new(&config.external)?,
            config.execution.max_concurrency,
        )),
        Flavor::Threaded => Arc::new(ThreadedProductService::new(
            store,
            BlockingExternalClient::new(&config.external),
        )),
    };
    Ok(service)
}

/// Serves the product API on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: tokio::net::TcpListener,
    service: SharedService,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown)
        .await
}
