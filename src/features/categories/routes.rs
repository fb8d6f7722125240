use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::features::categories::handlers;
use crate::features::categories::services::CategoryService;

/// Public category routes (read-only)
pub fn public_routes(service: Arc<CategoryService>) -> Router {
    Router::new()
        .route("/api/v1/categories", get(handlers::list_categories))
        .route("/api/v1/categories/{id}", get(handlers::get_category))
        .with_state(service)
}

/// Protected category routes (require a bearer token)
pub fn protected_routes(service: Arc<CategoryService>) -> Router {
    Router::new()
        .route("/api/v1/categories", post(handlers::create_category))
        .route(
            "/api/v1/categories/{id}",
            put(handlers::update_category).delete(handlers::delete_category),
        )
        .with_state(service)
}
