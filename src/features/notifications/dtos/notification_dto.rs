use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::features::notifications::models::NotificationType;

/// Notification as returned to the client, with the incident title
/// resolved for display.
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDto {
    pub id: Uuid,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub message: String,
    pub incident_id: Uuid,
    pub incident_title: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}
