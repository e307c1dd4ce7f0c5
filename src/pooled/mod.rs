//! Pooled flavor: blocking I/O on bounded thread pools.
//!
//! Each request body runs on the runtime's blocking pool, whose size is
//! capped at startup (see `server::main`). Aggregation fans the three
//! downstream calls out to a fixed [`WorkerPool`] and joins them.

pub mod pool;

use crate::external::BlockingExternalClient;
use crate::model::{Product, ProductAggregation};
use crate::service::{Flavor, ProductService, ServiceError, ServiceResult};
use crate::store::ProductStore;
use async_trait::async_trait;
use std::sync::Arc;

pub use pool::{PoolError, WorkerPool};

/// Fan-out pool size when none is configured: two threads per CPU.
pub fn default_fanout_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get() * 2)
        .unwrap_or(8)
}

pub struct PooledProductService {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<ProductStore>,
    client: BlockingExternalClient,
    fanout: WorkerPool,
}

impl PooledProductService {
    /// `fanout_threads == 0` picks [`default_fanout_threads`].
    pub fn new(
        store: Arc<ProductStore>,
        client: BlockingExternalClient,
        fanout_threads: usize,
    ) -> Result<Self, PoolError> {
        let size = if fanout_threads == 0 {
            default_fanout_threads()
        } else {
            fanout_threads
        };
        Ok(Self {
            inner: Arc::new(Inner {
                store,
                client,
                fanout: WorkerPool::new("fanout", size)?,
            }),
        })
    }

    async fn run_blocking<T, F>(&self, f: F) -> ServiceResult<T>
    where
        F: FnOnce(&Inner) -> ServiceResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let inner = self.inner.clone();
        tokio::task::spawn_blocking(move || f(&inner))
            .await
            .map_err(|e| ServiceError::Execution(e.to_string()))?
    }
}

impl Inner {
    fn aggregate(&self, product_id: i64) -> ServiceResult<ProductAggregation> {
        tracing::debug!("Aggregating data for product {} on the fan-out pool", product_id);

        let inventory = {
            let client = self.client.clone();
            self.fanout.submit(move || client.get_inventory(product_id))?
        };
        let pricing = {
            let client = self.client.clone();
            self.fanout.submit(move || client.get_pricing(product_id))?
        };
        let reviews = {
            let client = self.client.clone();
            self.fanout.submit(move || client.get_reviews(product_id))?
        };

        // wait for all three before looking at any outcome
        let inventory = inventory.join();
        let pricing = pricing.join();
        let reviews = reviews.join();

        Ok(ProductAggregation::assemble(
            product_id,
            inventory??,
            pricing??,
            reviews??,
        ))
    }
}

#[async_trait]
impl ProductService for PooledProductService {
    fn flavor(&self) -> Flavor {
        Flavor::Pooled
    }

    async fn save_product(&self, product: Product) -> ServiceResult<Product> {
        product.validate().map_err(ServiceError::InvalidInput)?;
        self.run_blocking(move |inner| Ok(inner.store.save(&product)?))
            .await
    }

    async fn get_product(&self, id: i64) -> ServiceResult<Product> {
        self.run_blocking(move |inner| inner.store.find_by_id(id)?.ok_or(ServiceError::NotFound(id)))
            .await
    }

    async fn get_all_products(&self) -> ServiceResult<Vec<Product>> {
        self.run_blocking(|inner| Ok(inner.store.find_all()?)).await
    }

    async fn get_product_aggregation(&self, product_id: i64) -> ServiceResult<ProductAggregation> {
        self.run_blocking(move |inner| inner.aggregate(product_id))
            .await
    }

    async fn get_product_aggregations(
        &self,
        product_ids: Vec<i64>,
    ) -> ServiceResult<Vec<ProductAggregation>> {
        // each id holds its own request-pool thread; nesting on the fan-out
        // pool could starve it
        let tasks = product_ids
            .into_iter()
            .map(|id| self.run_blocking(move |inner| inner.aggregate(id)));
        futures::future::try_join_all(tasks).await
    }
}
