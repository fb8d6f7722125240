use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::users::handlers;
use crate::features::users::services::UserService;

/// Profile routes (all require a bearer token)
pub fn protected_routes(service: Arc<UserService>) -> Router {
    Router::new()
        .route(
            "/api/v1/users/profile",
            get(handlers::get_profile).put(handlers::update_profile),
        )
        .route(
            "/api/v1/users/profile/image",
            post(handlers::add_profile_image).delete(handlers::remove_profile_image),
        )
        .with_state(service)
}
