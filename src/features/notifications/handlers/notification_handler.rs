use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::error::Result;
use crate::features::auth::model::CurrentUser;
use crate::features::notifications::dtos::NotificationDto;
use crate::features::notifications::services::NotificationService;
use crate::shared::types::{ApiResponse, Pagination, PaginationQuery};

/// List the current user's notifications
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Notifications retrieved", body = ApiResponse<Vec<NotificationDto>>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn list_notifications(
    user: CurrentUser,
    State(service): State<Arc<NotificationService>>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<NotificationDto>>>> {
    let (items, total) = service.list(user.id, &pagination, false).await?;
    Ok(Json(ApiResponse::success(
        Some(items),
        None,
        Some(Pagination::new(total, pagination.page(), pagination.limit())),
    )))
}

/// List the current user's unread notifications
#[utoipa::path(
    get,
    path = "/api/v1/notifications/unread",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Unread notifications retrieved", body = ApiResponse<Vec<NotificationDto>>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn list_unread_notifications(
    user: CurrentUser,
    State(service): State<Arc<NotificationService>>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Vec<NotificationDto>>>> {
    let (items, total) = service.list(user.id, &pagination, true).await?;
    Ok(Json(ApiResponse::success(
        Some(items),
        None,
        Some(Pagination::new(total, pagination.page(), pagination.limit())),
    )))
}

/// Mark a notification as read
#[utoipa::path(
    put,
    path = "/api/v1/notifications/{id}/read",
    params(("id" = Uuid, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Notification marked as read"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the recipient"),
        (status = 404, description = "Notification not found")
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn mark_notification_read(
    user: CurrentUser,
    State(service): State<Arc<NotificationService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.mark_read(id, user.id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Notification marked as read".to_string()),
        None,
    )))
}

/// Mark all notifications as read
#[utoipa::path(
    put,
    path = "/api/v1/notifications/read-all",
    responses(
        (status = 200, description = "All notifications marked as read"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn mark_all_notifications_read(
    user: CurrentUser,
    State(service): State<Arc<NotificationService>>,
) -> Result<Json<ApiResponse<()>>> {
    let updated = service.mark_all_read(user.id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some(format!("{} notifications marked as read", updated)),
        None,
    )))
}

/// Delete a notification
#[utoipa::path(
    delete,
    path = "/api/v1/notifications/{id}",
    params(("id" = Uuid, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Notification deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the recipient"),
        (status = 404, description = "Notification not found")
    ),
    tag = "notifications",
    security(("bearer_auth" = []))
)]
pub async fn delete_notification(
    user: CurrentUser,
    State(service): State<Arc<NotificationService>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(id, user.id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Notification deleted successfully".to_string()),
        None,
    )))
}
