use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::notifications::dtos::NotificationDto;
use crate::shared::types::PaginationQuery;

/// Per-user notification inbox.
#[derive(Clone)]
pub struct NotificationService {
    pool: PgPool,
}

impl NotificationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Notifications for one user, newest first. `unread_only` narrows to
    /// the unread subset.
    pub async fn list(
        &self,
        user_id: Uuid,
        pagination: &PaginationQuery,
        unread_only: bool,
    ) -> Result<(Vec<NotificationDto>, i64)> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND ($2 = FALSE OR read = FALSE)",
        )
        .bind(user_id)
        .bind(unread_only)
        .fetch_one(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, NotificationDto>(
            r#"
            SELECT n.id, n.type, n.message, n.incident_id, i.title AS incident_title,
                   n.read, n.created_at
            FROM notifications n
            JOIN incidents i ON i.id = n.incident_id
            WHERE n.user_id = $1 AND ($2 = FALSE OR n.read = FALSE)
            ORDER BY n.created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(unread_only)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok((items, total))
    }

    /// Mark one notification as read. Only the recipient may do this.
    pub async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<()> {
        self.ensure_owned(id, user_id).await?;

        sqlx::query("UPDATE notifications SET read = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Mark every unread notification for the user as read. Returns the
    /// number of rows touched.
    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET read = TRUE, updated_at = NOW() WHERE user_id = $1 AND read = FALSE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete one notification. Only the recipient may do this.
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<()> {
        self.ensure_owned(id, user_id).await?;

        sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn ensure_owned(&self, id: Uuid, user_id: Uuid) -> Result<()> {
        let owner = sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;

        if owner != user_id {
            return Err(AppError::Forbidden(
                "Not authorized to access this notification".to_string(),
            ));
        }
        Ok(())
    }
}
