//! Clients for the downstream inventory, pricing and reviews services.
//!
//! The blocking client backs the thread-based flavors, the async client backs
//! the reactive flavor. Both hit the same three endpoints.

pub mod blocking;
pub mod nonblocking;

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub use blocking::BlockingExternalClient;
pub use nonblocking::AsyncExternalClient;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8090";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

impl Default for ExternalConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ExternalConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// One of the three downstream services
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Downstream {
    Inventory,
    Pricing,
    Reviews,
}

impl Downstream {
    pub fn name(&self) -> &'static str {
        match self {
            Downstream::Inventory => "inventory",
            Downstream::Pricing => "pricing",
            Downstream::Reviews => "reviews",
        }
    }

    pub fn url(&self, base_url: &str, product_id: i64) -> String {
        format!(
            "{}/api/{}/{}",
            base_url.trim_end_matches('/'),
            self.name(),
            product_id
        )
    }
}

#[derive(Debug, Error)]
pub enum ExternalError {
    #[error("{service} service returned status {code}")]
    Status { service: &'static str, code: u16 },

    #[error("{service} service unreachable: {message}")]
    Transport {
        service: &'static str,
        message: String,
    },

    #[error("{service} service sent a malformed body: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },
}
