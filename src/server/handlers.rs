//! HTTP request handlers shared by every flavor

use super::SharedService;
use crate::model::{Product, ProductAggregation};
use crate::service::ServiceError;
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// A service failure rendered as a JSON error body
#[derive(Debug)]
pub struct ApiError(pub ServiceError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ServiceError::External(_) => StatusCode::BAD_GATEWAY,
            ServiceError::Storage(_) | ServiceError::Execution(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        ApiError(e)
    }
}

// malformed bodies and ids get the same JSON error shape as service failures
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(ServiceError::InvalidInput(rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError(ServiceError::InvalidInput(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self.0);
        } else {
            tracing::debug!("request rejected: {}", self.0);
        }
        let body = Json(serde_json::json!({
            "error": self.0.to_string(),
            "status": status.as_u16(),
        }));
        (status, body).into_response()
    }
}

pub async fn health(State(service): State<SharedService>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": format!("iobench-{}", service.flavor()),
    }))
}

pub async fn create_product(
    State(service): State<SharedService>,
    payload: Result<Json<Product>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let Json(product) = payload?;
    let saved = service.save_product(product).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

pub async fn get_product(
    State(service): State<SharedService>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Product>, ApiError> {
    let Path(id) = id?;
    Ok(Json(service.get_product(id).await?))
}

pub async fn list_products(
    State(service): State<SharedService>,
) -> Result<Json<Vec<Product>>, ApiError> {
    Ok(Json(service.get_all_products().await?))
}

pub async fn get_aggregation(
    State(service): State<SharedService>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ProductAggregation>, ApiError> {
    let Path(id) = id?;
    Ok(Json(service.get_product_aggregation(id).await?))
}

pub async fn get_aggregations(
    State(service): State<SharedService>,
    payload: Result<Json<Vec<i64>>, JsonRejection>,
) -> Result<Json<Vec<ProductAggregation>>, ApiError> {
    let Json(ids) = payload?;
    Ok(Json(service.get_product_aggregations(ids).await?))
}
