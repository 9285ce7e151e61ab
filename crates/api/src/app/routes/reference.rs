use std::sync::Arc;

use axum::{Json, extract::Extension};

use myshop_products::{Image, Manufacturer, OperatingSystem};

use crate::app::errors::ApiResult;
use crate::app::services::AppServices;

pub async fn manufacturers(
    Extension(services): Extension<Arc<AppServices>>,
) -> ApiResult<Json<Vec<Manufacturer>>> {
    Ok(Json(services.store().manufacturers().await?))
}

pub async fn operating_systems(
    Extension(services): Extension<Arc<AppServices>>,
) -> ApiResult<Json<Vec<OperatingSystem>>> {
    Ok(Json(services.store().operating_systems().await?))
}

pub async fn images(
    Extension(services): Extension<Arc<AppServices>>,
) -> ApiResult<Json<Vec<Image>>> {
    Ok(Json(services.store().images().await?))
}
