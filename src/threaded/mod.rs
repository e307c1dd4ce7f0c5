//! Threaded flavor: one dedicated OS thread per request.
//!
//! The request thread blocks freely. Aggregation is structured: the three
//! downstream calls run on scoped threads that are all joined before the
//! scope returns, and the first failure (inventory, pricing, reviews order)
//! fails the aggregation.

use crate::external::BlockingExternalClient;
use crate::model::{Product, ProductAggregation};
use crate::service::{Flavor, ProductService, ServiceError, ServiceResult};
use crate::store::ProductStore;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, Scope, ScopedJoinHandle};
use tokio::sync::oneshot;

pub struct ThreadedProductService {
    inner: Arc<Inner>,
    requests: AtomicU64,
}

struct Inner {
    store: Arc<ProductStore>,
    client: BlockingExternalClient,
}

impl ThreadedProductService {
    pub fn new(store: Arc<ProductStore>, client: BlockingExternalClient) -> Self {
        Self {
            inner: Arc::new(Inner { store, client }),
            requests: AtomicU64::new(0),
        }
    }

    /// Runs `f` on a freshly spawned thread and awaits its result.
    async fn on_request_thread<T, F>(&self, f: F) -> ServiceResult<T>
    where
        F: FnOnce(&Inner) -> ServiceResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let inner = self.inner.clone();
        let seq = self.requests.fetch_add(1, Ordering::Relaxed);

        thread::Builder::new()
            .name(format!("request-{}", seq))
            .spawn(move || {
                let _ = tx.send(f(&inner));
            })
            .map_err(|e| ServiceError::Execution(format!("failed to spawn request thread: {}", e)))?;

        rx.await
            .map_err(|_| ServiceError::Execution("request thread terminated".to_string()))?
    }
}

fn spawn_scoped<'scope, 'env, T, F>(
    scope: &'scope Scope<'scope, 'env>,
    name: &str,
    f: F,
) -> ServiceResult<ScopedJoinHandle<'scope, T>>
where
    F: FnOnce() -> T + Send + 'scope,
    T: Send + 'scope,
{
    thread::Builder::new()
        .name(name.to_string())
        .spawn_scoped(scope, f)
        .map_err(|e| ServiceError::Execution(format!("failed to spawn {} thread: {}", name, e)))
}

fn join_scoped<T>(handle: ScopedJoinHandle<'_, T>) -> ServiceResult<T> {
    handle
        .join()
        .map_err(|_| ServiceError::Execution("scoped task panicked".to_string()))
}

impl Inner {
    fn aggregate(&self, product_id: i64) -> ServiceResult<ProductAggregation> {
        tracing::debug!("Aggregating data for product {} on scoped threads", product_id);

        thread::scope(|scope| -> ServiceResult<ProductAggregation> {
            let inventory = spawn_scoped(scope, "inventory", || self.client.get_inventory(product_id))?;
            let pricing = spawn_scoped(scope, "pricing", || self.client.get_pricing(product_id))?;
            let reviews = spawn_scoped(scope, "reviews", || self.client.get_reviews(product_id))?;

            let inventory = join_scoped(inventory);
            let pricing = join_scoped(pricing);
            let reviews = join_scoped(reviews);

            Ok(ProductAggregation::assemble(
                product_id,
                inventory??,
                pricing??,
                reviews??,
            ))
        })
    }

    fn aggregate_all(&self, product_ids: &[i64]) -> ServiceResult<Vec<ProductAggregation>> {
        thread::scope(|scope| -> ServiceResult<Vec<ProductAggregation>> {
            let mut handles = Vec::with_capacity(product_ids.len());
            for id in product_ids {
                let id = *id;
                handles.push(spawn_scoped(scope, "aggregation", move || self.aggregate(id))?);
            }

            let outcomes: Vec<_> = handles.into_iter().map(join_scoped).collect();
            outcomes.into_iter().map(|outcome| outcome.and_then(|r| r)).collect()
        })
    }
}

#[async_trait]
impl ProductService for ThreadedProductService {
    fn flavor(&self) -> Flavor {
        Flavor::Threaded
    }

    async fn save_product(&self, product: Product) -> ServiceResult<Product> {
        product.validate().map_err(ServiceError::InvalidInput)?;
        self.on_request_thread(move |inner| Ok(inner.store.save(&product)?))
            .await
    }

    async fn get_product(&self, id: i64) -> ServiceResult<Product> {
        self.on_request_thread(move |inner| inner.store.find_by_id(id)?.ok_or(ServiceError::NotFound(id)))
            .await
    }

    async fn get_all_products(&self) -> ServiceResult<Vec<Product>> {
        self.on_request_thread(|inner| Ok(inner.store.find_all()?))
            .await
    }

    async fn get_product_aggregation(&self, product_id: i64) -> ServiceResult<ProductAggregation> {
        self.on_request_thread(move |inner| inner.aggregate(product_id))
            .await
    }

    async fn get_product_aggregations(
        &self,
        product_ids: Vec<i64>,
    ) -> ServiceResult<Vec<ProductAggregation>> {
        self.on_request_thread(move |inner| inner.aggregate_all(&product_ids))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::{ExternalConfig, ExternalError};

    fn unreachable_service() -> ThreadedProductService {
        // nothing listens on the discard port
        let config = ExternalConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_ms: 1000,
        };
        ThreadedProductService::new(
            Arc::new(ProductStore::in_memory().unwrap()),
            BlockingExternalClient::new(&config),
        )
    }

    #[tokio::test]
    async fn test_aggregation_reports_inventory_failure_first() {
        let service = unreachable_service();
        match service.get_product_aggregation(1).await {
            Err(ServiceError::External(ExternalError::Transport { service, .. })) => {
                assert_eq!(service, "inventory")
            }
            other => panic!("expected inventory transport error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_batch_fails_on_downstream_error() {
        let service = unreachable_service();
        let result = service.get_product_aggregations(vec![1, 2, 3]).await;
        assert!(matches!(result, Err(ServiceError::External(_))));
    }

    #[tokio::test]
    async fn test_request_runs_on_named_thread() {
        let service = unreachable_service();
        let name = service
            .on_request_thread(|_| Ok(thread::current().name().map(str::to_string)))
            .await
            .unwrap();
        assert_eq!(name.as_deref(), Some("request-0"));
    }

    #[tokio::test]
    async fn test_missing_product() {
        let service = unreachable_service();
        assert!(matches!(
            service.get_product(42).await,
            Err(ServiceError::NotFound(42))
        ));
    }
}
