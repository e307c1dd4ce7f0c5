//! The product service contract every execution flavor implements.

use crate::external::ExternalError;
use crate::model::{Product, ProductAggregation};
use crate::store::StoreError;
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// How a product service schedules its blocking and concurrent work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Flavor {
    /// Bounded request pool plus a fixed fan-out pool
    Pooled,
    /// Async runtime end to end
    Reactive,
    /// A fresh OS thread per request, scoped threads for fan-out
    Threaded,
}

impl Flavor {
    pub const ALL: [Flavor; 3] = [Flavor::Pooled, Flavor::Reactive, Flavor::Threaded];

    pub fn name(&self) -> &'static str {
        match self {
            Flavor::Pooled => "pooled",
            Flavor::Reactive => "reactive",
            Flavor::Threaded => "threaded",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            Flavor::Pooled => 8081,
            Flavor::Reactive => 8082,
            Flavor::Threaded => 8083,
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Product not found: {0}")]
    NotFound(i64),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error("failed to aggregate product data: {0}")]
    External(#[from] ExternalError),

    #[error("execution failed: {0}")]
    Execution(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[async_trait]
pub trait ProductService: Send + Sync {
    fn flavor(&self) -> Flavor;

    async fn save_product(&self, product: Product) -> ServiceResult<Product>;

    async fn get_product(&self, id: i64) -> ServiceResult<Product>;

    async fn get_all_products(&self) -> ServiceResult<Vec<Product>>;

    /// Merges the three downstream views of one product; the calls run concurrently.
    async fn get_product_aggregation(&self, product_id: i64) -> ServiceResult<ProductAggregation>;

    async fn get_product_aggregations(
        &self,
        product_ids: Vec<i64>,
    ) -> ServiceResult<Vec<ProductAggregation>>;
}
