//! Blocking HTTP client for the product API under test

use crate::model::{Product, ProductAggregation};
use rand::Rng;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{url} returned status {code}")]
    Status { url: String, code: u16 },

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("malformed response from {url}: {message}")]
    Decode { url: String, message: String },
}

#[derive(Clone)]
pub struct BenchmarkClient {
    agent: ureq::Agent,
    base_url: String,
}

impl BenchmarkClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn create_product(&self, product: &Product) -> Result<Product, ClientError> {
        self.post("/api/products", product)
    }

    pub fn get_product(&self, id: i64) -> Result<Product, ClientError> {
        self.get(&format!("/api/products/{}", id))
    }

    pub fn get_aggregation(&self, product_id: i64) -> Result<ProductAggregation, ClientError> {
        self.get(&format!("/api/products/{}/aggregation", product_id))
    }

    pub fn get_aggregations(
        &self,
        product_ids: &[i64],
    ) -> Result<Vec<ProductAggregation>, ClientError> {
        self.post("/api/products/aggregations", &product_ids)
    }

    /// Creates `count` products named `Product 1..=count`.
    pub fn seed_products(&self, count: usize) -> Result<usize, ClientError> {
        tracing::info!("Seeding {} products into {}", count, self.base_url);
        for i in 1..=count {
            let price = 10.0 + rand::rng().random::<f64>() * 990.0;
            let product = Product::new(
                format!("Product {}", i),
                format!("Description for product {}", i),
                price,
            );
            self.create_product(&product)?;
        }
        tracing::info!("Seeding complete");
        Ok(count)
    }

    pub fn health_check(&self) -> bool {
        match self.agent.get(&self.url("/health")).call() {
            Ok(response) => (200..300).contains(&response.status()),
            Err(e) => {
                tracing::debug!("health check of {} failed: {}", self.base_url, e);
                false
            }
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let url = self.url(path);
        let result = self.agent.get(&url).call();
        read_json(url, result)
    }

    fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let url = self.url(path);
        let payload = serde_json::to_string(body).map_err(|e| ClientError::Decode {
            url: url.clone(),
            message: e.to_string(),
        })?;
        let result = self
            .agent
            .post(&url)
            .set("Content-Type", "application/json")
            .send_string(&payload);
        read_json(url, result)
    }
}

fn read_json<T: DeserializeOwned>(
    url: String,
    result: Result<ureq::Response, ureq::Error>,
) -> Result<T, ClientError> {
    let response = match result {
        Ok(response) => response,
        Err(ureq::Error::Status(code, _)) => return Err(ClientError::Status { url, code }),
        Err(e) => {
            return Err(ClientError::Transport {
                url,
                message: e.to_string(),
            });
        }
    };

    let body = match response.into_string() {
        Ok(body) => body,
        Err(e) => {
            return Err(ClientError::Transport {
                url,
                message: e.to_string(),
            });
        }
    };

    serde_json::from_str(&body).map_err(|e| ClientError::Decode {
        url,
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let client = BenchmarkClient::new("http://localhost:8081/", Duration::from_secs(1));
        assert_eq!(client.base_url(), "http://localhost:8081");
        assert_eq!(client.url("/health"), "http://localhost:8081/health");
    }

    #[test]
    fn test_unreachable_target() {
        // port 9 (discard) is closed on test machines
        let client = BenchmarkClient::new("http://127.0.0.1:9", Duration::from_millis(500));
        assert!(!client.health_check());
        match client.get_product(1) {
            Err(ClientError::Transport { url, .. }) => {
                assert_eq!(url, "http://127.0.0.1:9/api/products/1")
            }
            other => panic!("expected transport error, got {:?}", other.map(|p| p.id)),
        }
    }

    #[test]
    fn test_error_messages() {
        let err = ClientError::Status {
            url: "http://h/api/products/7".to_string(),
            code: 404,
        };
        assert_eq!(err.to_string(), "http://h/api/products/7 returned status 404");
    }
}
