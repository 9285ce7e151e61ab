//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store selection and shared handler state
//! - `serializers/`: payload validation, persistence and JSON rendering per product type
//! - `dashboard/`: view-sets and the router that binds them to URL prefixes
//! - `routes/`: health and reference-data endpoints
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::config::AppConfig;

pub mod dashboard;
pub mod errors;
pub mod routes;
pub mod serializers;
pub mod services;

use dashboard::{DashboardRouter, ProductsDashboard};
use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    let services = Arc::new(services::build_services(config).await?);
    Ok(build_app_with_services(services))
}

/// Router over already-built services.
pub fn build_app_with_services(services: Arc<AppServices>) -> Router {
    let dashboard = DashboardRouter::new()
        .register("products", ProductsDashboard::view_set(services.summary_serializer()))
        .into_router()
        .merge(routes::router());

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/dashboard", dashboard)
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
