use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::Value;

use myshop_products::ProductType;
use myshop_core::ProductId;

use super::DashboardViewSet;
use crate::app::errors::{ApiError, ApiResult};
use crate::app::services::AppServices;

#[derive(Debug, Deserialize)]
pub struct CreateQuery {
    pub product_type: Option<String>,
}

fn parse_pk(raw: &str) -> ApiResult<ProductId> {
    Ok(raw.parse::<ProductId>()?)
}

pub async fn list(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(view_set): Extension<Arc<DashboardViewSet>>,
) -> ApiResult<Json<Value>> {
    Ok(Json(view_set.list(services.store()).await?))
}

/// The product type comes from `?product_type=`, or from a `product_type`
/// string in the body.
pub async fn create(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(view_set): Extension<Arc<DashboardViewSet>>,
    Query(query): Query<CreateQuery>,
    Json(body): Json<Value>,
) -> ApiResult<impl IntoResponse> {
    let product_type = query
        .product_type
        .or_else(|| body.get("product_type").and_then(Value::as_str).map(str::to_string))
        .ok_or(ApiError::MissingProductType)?;

    let created = view_set
        .create(services.store(), &product_type, &body)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn retrieve(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(view_set): Extension<Arc<DashboardViewSet>>,
    Path(pk): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_pk(&pk)?;
    Ok(Json(view_set.retrieve(services.store(), id).await?))
}

pub async fn update(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(view_set): Extension<Arc<DashboardViewSet>>,
    Path(pk): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let id = parse_pk(&pk)?;
    Ok(Json(view_set.update(services.store(), id, &body, false).await?))
}

pub async fn partial_update(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(view_set): Extension<Arc<DashboardViewSet>>,
    Path(pk): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let id = parse_pk(&pk)?;
    Ok(Json(view_set.update(services.store(), id, &body, true).await?))
}

pub async fn destroy(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(view_set): Extension<Arc<DashboardViewSet>>,
    Path(pk): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_pk(&pk)?;
    view_set.destroy(services.store(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn form(
    Extension(view_set): Extension<Arc<DashboardViewSet>>,
    Path(product_type): Path<String>,
) -> ApiResult<impl IntoResponse> {
    // Accept the bare model name too, e.g. `smartcard`.
    let identifier = ProductType::ALL
        .iter()
        .find(|t| t.model_name() == product_type)
        .map(|t| t.identifier().to_string())
        .unwrap_or(product_type);
    Ok(Json(view_set.form(&identifier)?))
}
