use axum::{Router, routing::get};

pub mod reference;
pub mod system;

/// Read-only reference lists used to fill dashboard form choices.
pub fn router() -> Router {
    Router::new()
        .route("/manufacturers", get(reference::manufacturers))
        .route("/operating-systems", get(reference::operating_systems))
        .route("/images", get(reference::images))
}
