use std::sync::Arc;

use axum::{Extension, Router, routing::get};

use super::DashboardViewSet;
use super::handlers;

/// Binds view-sets to URL prefixes under the dashboard.
///
/// `register("products", ..)` exposes:
/// - `/products` (list, create)
/// - `/products/:pk` (retrieve, update, partial update, destroy)
/// - `/forms/products/:product_type` (form metadata)
#[derive(Default)]
pub struct DashboardRouter {
    registry: Vec<(String, Arc<DashboardViewSet>)>,
}

impl DashboardRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, prefix: impl Into<String>, view_set: DashboardViewSet) -> Self {
        let prefix = prefix.into().trim_matches('/').to_string();
        self.registry.push((prefix, Arc::new(view_set)));
        self
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.registry.iter().map(|(prefix, _)| prefix.as_str())
    }

    pub fn view_set(&self, prefix: &str) -> Option<&Arc<DashboardViewSet>> {
        self.registry
            .iter()
            .find(|(p, _)| p == prefix)
            .map(|(_, view_set)| view_set)
    }

    pub fn into_router(self) -> Router {
        self.registry
            .into_iter()
            .fold(Router::new(), |router, (prefix, view_set)| {
                let routes = Router::new()
                    .route(
                        &format!("/{prefix}"),
                        get(handlers::list).post(handlers::create),
                    )
                    .route(
                        &format!("/{prefix}/:pk"),
                        get(handlers::retrieve)
                            .put(handlers::update)
                            .patch(handlers::partial_update)
                            .delete(handlers::destroy),
                    )
                    .route(&format!("/forms/{prefix}/:product_type"), get(handlers::form))
                    .layer(Extension(view_set));
                router.merge(routes)
            })
    }
}
