//! Reactive flavor: everything is a future on the async runtime.
//!
//! Downstream calls never park a thread; aggregation zips the three calls and
//! fails fast. The embedded database driver is blocking, so store access is
//! moved to the blocking pool.

use crate::external::AsyncExternalClient;
use crate::model::{Product, ProductAggregation};
use crate::service::{Flavor, ProductService, ServiceError, ServiceResult};
use crate::store::{ProductStore, StoreError};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt, stream};
use std::sync::Arc;

pub const DEFAULT_MAX_CONCURRENCY: usize = 100;

pub struct ReactiveProductService {
    store: Arc<ProductStore>,
    client: AsyncExternalClient,
    max_concurrency: usize,
}

impl ReactiveProductService {
    pub fn new(store: Arc<ProductStore>, client: AsyncExternalClient, max_concurrency: usize) -> Self {
        Self {
            store,
            client,
            max_concurrency: max_concurrency.max(1),
        }
    }

    async fn with_store<T, F>(&self, f: F) -> ServiceResult<T>
    where
        F: FnOnce(&ProductStore) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.store.clone();
        let result = tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| ServiceError::Execution(e.to_string()))?;
        Ok(result?)
    }
}

#[async_trait]
impl ProductService for ReactiveProductService {
    fn flavor(&self) -> Flavor {
        Flavor::Reactive
    }

    async fn save_product(&self, product: Product) -> ServiceResult<Product> {
        product.validate().map_err(ServiceError::InvalidInput)?;
        self.with_store(move |store| store.save(&product)).await
    }

    async fn get_product(&self, id: i64) -> ServiceResult<Product> {
        self.with_store(move |store| store.find_by_id(id))
            .await?
            .ok_or(ServiceError::NotFound(id))
    }

    async fn get_all_products(&self) -> ServiceResult<Vec<Product>> {
        self.with_store(|store| store.find_all()).await
    }

    async fn get_product_aggregation(&self, product_id: i64) -> ServiceResult<ProductAggregation> {
        tracing::debug!("Aggregating data for product {} with joined futures", product_id);

        let (inventory, pricing, reviews) = tokio::try_join!(
            self.client.get_inventory(product_id),
            self.client.get_pricing(product_id),
            self.client.get_reviews(product_id),
        )?;

        Ok(ProductAggregation::assemble(product_id, inventory, pricing, reviews))
    }

    /// Results arrive in completion order, at most `max_concurrency` in flight.
    async fn get_product_aggregations(
        &self,
        product_ids: Vec<i64>,
    ) -> ServiceResult<Vec<ProductAggregation>> {
        stream::iter(product_ids)
            .map(|id| self.get_product_aggregation(id))
            .buffer_unordered(self.max_concurrency)
            .try_collect()
            .await
    }
}
