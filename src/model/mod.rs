//! Data model shared by the product services, the mock downstream services
//! and the benchmark harness.
//!
//! Every type is serialized with camelCase field names so all binaries speak
//! the same JSON.

pub mod benchmark;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub use benchmark::BenchmarkResult;

/// A catalogue product as stored and exchanged over HTTP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

impl Product {
    pub fn new(name: impl Into<String>, description: impl Into<String>, price: f64) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: Some(description.into()),
            price: Some(price),
            created_at: None,
        }
    }

    /// Checks the fields a client is allowed to get wrong.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("product name must not be blank".to_string());
        }
        if let Some(price) = self.price {
            if !price.is_finite() || price < 0.0 {
                return Err(format!("invalid product price: {}", price));
            }
        }
        Ok(())
    }
}

/// Stock level reported by the inventory service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryResponse {
    pub product_id: i64,
    pub stock_count: i32,
    pub warehouse_location: String,
}

/// Current price reported by the pricing service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingResponse {
    pub product_id: i64,
    pub current_price: f64,
    pub discount_percent: f64,
}

/// Review summary reported by the reviews service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewsResponse {
    pub product_id: i64,
    pub average_rating: f64,
    pub review_count: i32,
}

/// The merged view of one product across the three downstream services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductAggregation {
    pub product_id: i64,

    pub stock_count: i32,
    pub warehouse_location: String,

    pub current_price: f64,
    pub discount_percent: f64,

    pub average_rating: f64,
    pub review_count: i32,
}

impl ProductAggregation {
    pub fn assemble(
        product_id: i64,
        inventory: InventoryResponse,
        pricing: PricingResponse,
        reviews: ReviewsResponse,
    ) -> Self {
        Self {
            product_id,
            stock_count: inventory.stock_count,
            warehouse_location: inventory.warehouse_location,
            current_price: pricing.current_price,
            discount_percent: pricing.discount_percent,
            average_rating: reviews.average_rating,
            review_count: reviews.review_count,
        }
    }
}
