use axum::{
    routing::{get, put},
    Router,
};
use std::sync::Arc;

use crate::features::notifications::handlers;
use crate::features::notifications::services::NotificationService;

/// Notification routes (all require a bearer token)
pub fn protected_routes(service: Arc<NotificationService>) -> Router {
    Router::new()
        .route("/api/v1/notifications", get(handlers::list_notifications))
        .route(
            "/api/v1/notifications/unread",
            get(handlers::list_unread_notifications),
        )
        .route(
            "/api/v1/notifications/read-all",
            put(handlers::mark_all_notifications_read),
        )
        .route(
            "/api/v1/notifications/{id}/read",
            put(handlers::mark_notification_read),
        )
        .route(
            "/api/v1/notifications/{id}",
            axum::routing::delete(handlers::delete_notification),
        )
        .with_state(service)
}
