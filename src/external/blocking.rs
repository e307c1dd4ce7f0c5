use super::{Downstream, ExternalConfig, ExternalError};
use crate::model::{InventoryResponse, PricingResponse, ReviewsResponse};
use serde::de::DeserializeOwned;

/// Blocking downstream client; each call parks the calling thread until the
/// response arrives.
#[derive(Clone)]
pub struct BlockingExternalClient {
    agent: ureq::Agent,
    base_url: String,
}

impl BlockingExternalClient {
    pub fn new(config: &ExternalConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout())
            .build();
        Self {
            agent,
            base_url: config.base_url.clone(),
        }
    }

    pub fn get_inventory(&self, product_id: i64) -> Result<InventoryResponse, ExternalError> {
        self.fetch(Downstream::Inventory, product_id)
    }

    pub fn get_pricing(&self, product_id: i64) -> Result<PricingResponse, ExternalError> {
        self.fetch(Downstream::Pricing, product_id)
    }

    pub fn get_reviews(&self, product_id: i64) -> Result<ReviewsResponse, ExternalError> {
        self.fetch(Downstream::Reviews, product_id)
    }

    fn fetch<T: DeserializeOwned>(
        &self,
        downstream: Downstream,
        product_id: i64,
    ) -> Result<T, ExternalError> {
        let service = downstream.name();
        tracing::debug!(
            "Calling {} service for product {} on thread {:?}",
            service,
            product_id,
            std::thread::current().name()
        );

        let response = match self.agent.get(&downstream.url(&self.base_url, product_id)).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => {
                return Err(ExternalError::Status { service, code });
            }
            Err(e) => {
                return Err(ExternalError::Transport {
                    service,
                    message: e.to_string(),
                });
            }
        };

        let body = response
            .into_string()
            .map_err(|e| ExternalError::Transport {
                service,
                message: e.to_string(),
            })?;

        serde_json::from_str(&body).map_err(|e| ExternalError::Decode {
            service,
            message: e.to_string(),
        })
    }
}
