use super::MockState;
use crate::model::{InventoryResponse, PricingResponse, ReviewsResponse};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rand::Rng;
use serde::Deserialize;

const WAREHOUSES: [&str; 5] = ["A", "B", "C", "D", "E"];

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

pub fn random_inventory(product_id: i64) -> InventoryResponse {
    let mut rng = rand::rng();
    InventoryResponse {
        product_id,
        stock_count: rng.random_range(0..1000),
        warehouse_location: format!("Warehouse-{}", WAREHOUSES[rng.random_range(0..WAREHOUSES.len())]),
    }
}

pub fn random_pricing(product_id: i64) -> PricingResponse {
    let mut rng = rand::rng();
    PricingResponse {
        product_id,
        current_price: round_to(10.0 + rng.random::<f64>() * 990.0, 2),
        discount_percent: round_to(rng.random::<f64>() * 30.0, 1),
    }
}

pub fn random_reviews(product_id: i64) -> ReviewsResponse {
    let mut rng = rand::rng();
    ReviewsResponse {
        product_id,
        average_rating: 1.0 + rng.random::<f64>() * 4.0,
        review_count: rng.random_range(0..5000),
    }
}

pub async fn inventory(
    State(state): State<MockState>,
    Path(id): Path<i64>,
) -> Json<InventoryResponse> {
    state.simulate_latency().await;
    Json(random_inventory(id))
}

pub async fn pricing(State(state): State<MockState>, Path(id): Path<i64>) -> Json<PricingResponse> {
    state.simulate_latency().await;
    Json(random_pricing(id))
}

pub async fn reviews(State(state): State<MockState>, Path(id): Path<i64>) -> Json<ReviewsResponse> {
    state.simulate_latency().await;
    Json(random_reviews(id))
}

pub async fn health() -> &'static str {
    "OK"
}

#[derive(Debug, Deserialize)]
pub struct LatencyParams {
    pub min: u64,
    pub max: u64,
}

pub async fn set_latency(
    State(state): State<MockState>,
    Query(params): Query<LatencyParams>,
) -> (StatusCode, String) {
    match state.set_latency(params.min, params.max) {
        Ok(()) => (
            StatusCode::OK,
            format!("Latency set to {}ms - {}ms", params.min, params.max),
        ),
        Err(e) => (StatusCode::BAD_REQUEST, e),
    }
}
