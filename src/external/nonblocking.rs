use super::{Downstream, ExternalConfig, ExternalError};
use crate::model::{InventoryResponse, PricingResponse, ReviewsResponse};
use serde::de::DeserializeOwned;

/// Non-blocking downstream client; calls are futures driven by the runtime.
#[derive(Clone)]
pub struct AsyncExternalClient {
    client: reqwest::Client,
    base_url: String,
}

impl AsyncExternalClient {
    pub fn new(config: &ExternalConfig) -> Result<Self, ExternalError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ExternalError::Transport {
                service: "http-client",
                message: e.to_string(),
            })?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    pub async fn get_inventory(&self, product_id: i64) -> Result<InventoryResponse, ExternalError> {
        self.fetch(Downstream::Inventory, product_id).await
    }

    pub async fn get_pricing(&self, product_id: i64) -> Result<PricingResponse, ExternalError> {
        self.fetch(Downstream::Pricing, product_id).await
    }

    pub async fn get_reviews(&self, product_id: i64) -> Result<ReviewsResponse, ExternalError> {
        self.fetch(Downstream::Reviews, product_id).await
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        downstream: Downstream,
        product_id: i64,
    ) -> Result<T, ExternalError> {
        let service = downstream.name();
        tracing::debug!("Calling {} service for product {}", service, product_id);

        let response = self
            .client
            .get(downstream.url(&self.base_url, product_id))
            .send()
            .await
            .map_err(|e| ExternalError::Transport {
                service,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExternalError::Status {
                service,
                code: status.as_u16(),
            });
        }

        response.json::<T>().await.map_err(|e| ExternalError::Decode {
            service,
            message: e.to_string(),
        })
    }
}
