//! Simulated inventory, pricing and reviews services.
//!
//! Every data endpoint answers with random figures after a random delay drawn
//! from the configured latency window.

pub mod handlers;

use axum::{
    Router,
    routing::{get, post},
};
use clap::Parser;
use rand::Rng;
use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tower_http::trace::TraceLayer;

pub const DEFAULT_MIN_LATENCY_MS: u64 = 50;
pub const DEFAULT_MAX_LATENCY_MS: u64 = 150;

/// Mock downstream services
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:8090")]
    pub listen: String,

    /// Lower bound of the simulated latency in milliseconds
    #[arg(long, default_value_t = DEFAULT_MIN_LATENCY_MS)]
    pub min_latency_ms: u64,

    /// Upper bound of the simulated latency in milliseconds
    #[arg(long, default_value_t = DEFAULT_MAX_LATENCY_MS)]
    pub max_latency_ms: u64,
}

/// Latency window shared by all mock endpoints
#[derive(Debug, Clone)]
pub struct MockState {
    latency: Arc<RwLock<(u64, u64)>>,
}

impl MockState {
    pub fn new(min_ms: u64, max_ms: u64) -> Result<Self, String> {
        check_window(min_ms, max_ms)?;
        Ok(Self {
            latency: Arc::new(RwLock::new((min_ms, max_ms))),
        })
    }

    pub fn latency(&self) -> (u64, u64) {
        *self.latency.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_latency(&self, min_ms: u64, max_ms: u64) -> Result<(), String> {
        check_window(min_ms, max_ms)?;
        *self.latency.write().unwrap_or_else(|e| e.into_inner()) = (min_ms, max_ms);
        tracing::info!("mock latency set to {}ms - {}ms", min_ms, max_ms);
        Ok(())
    }

    /// Picks a delay uniformly from the current window.
    pub fn next_delay(&self) -> Duration {
        let (min, max) = self.latency();
        if min >= max {
            return Duration::from_millis(min);
        }
        Duration::from_millis(rand::rng().random_range(min..=max))
    }

    pub async fn simulate_latency(&self) {
        let delay = self.next_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            latency: Arc::new(RwLock::new((DEFAULT_MIN_LATENCY_MS, DEFAULT_MAX_LATENCY_MS))),
        }
    }
}

fn check_window(min_ms: u64, max_ms: u64) -> Result<(), String> {
    if min_ms > max_ms {
        return Err(format!(
            "min latency ({}ms) must not exceed max latency ({}ms)",
            min_ms, max_ms
        ));
    }
    Ok(())
}

pub fn router(state: MockState) -> Router {
    Router::new()
        .route("/api/inventory/:id", get(handlers::inventory))
        .route("/api/pricing/:id", get(handlers::pricing))
        .route("/api/reviews/:id", get(handlers::reviews))
        .route("/api/health", get(handlers::health))
        .route("/api/config/latency", post(handlers::set_latency))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(
    listener: tokio::net::TcpListener,
    state: MockState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Entry point of the `mock-server` binary.
pub async fn run(args: Args) -> anyhow::Result<()> {
    let state = MockState::new(args.min_latency_ms, args.max_latency_ms)
        .map_err(anyhow::Error::msg)?;

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    tracing::info!(
        "Mock services listening on {} (latency {}ms - {}ms)",
        args.listen,
        args.min_latency_ms,
        args.max_latency_ms
    );

    serve(listener, state, crate::server::main::shutdown_signal()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_inverted_window() {
        assert!(MockState::new(10, 5).is_err());
        let state = MockState::new(0, 0).unwrap();
        assert!(state.set_latency(20, 10).is_err());
        assert_eq!(state.latency(), (0, 0));
    }

    #[test]
    fn test_delay_within_window() {
        let state = MockState::default();
        state.set_latency(5, 9).unwrap();
        for _ in 0..100 {
            let delay = state.next_delay();
            assert!(delay >= Duration::from_millis(5) && delay <= Duration::from_millis(9));
        }

        state.set_latency(7, 7).unwrap();
        assert_eq!(state.next_delay(), Duration::from_millis(7));
    }

    #[test]
    fn test_default_args() {
        let args = Args::parse_from(["mock-server"]);
        assert_eq!(args.listen, "0.0.0.0:8090");
        assert_eq!(args.min_latency_ms, 50);
        assert_eq!(args.max_latency_ms, 150);
    }
}
