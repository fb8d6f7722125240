use std::sync::Arc;

use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::users::dtos::UpdateProfileDto;
use crate::features::users::models::User;
use crate::modules::storage::{direct_view_url, StorageClient};
use crate::shared::validation::sanitize_filename;

/// Profile reads and updates, including the profile image lifecycle.
#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
    storage: Arc<StorageClient>,
}

impl UserService {
    pub fn new(pool: PgPool, storage: Arc<StorageClient>) -> Self {
        Self { pool, storage }
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn update_profile(&self, user_id: Uuid, dto: UpdateProfileDto) -> Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                organization = COALESCE($4, organization),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&dto.first_name)
        .bind(&dto.last_name)
        .bind(&dto.organization)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Upload a new profile image, replacing any previous one.
    ///
    /// The previous blob is deleted best-effort after the row is updated;
    /// a stale blob is preferable to a profile pointing at a deleted image.
    pub async fn set_profile_image(
        &self,
        user_id: Uuid,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<User> {
        let current = self.get_profile(user_id).await?;

        let key = format!(
            "profiles/{}/{}-{}",
            user_id,
            Uuid::now_v7(),
            sanitize_filename(filename)
        );
        let url = direct_view_url(&self.storage.upload(&key, data, content_type).await?);

        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET image = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(user_id)
        .bind(&url)
        .fetch_one(&self.pool)
        .await?;

        if let Some(old_url) = current.image {
            if let Some(old_key) = self.storage.key_from_url(&old_url) {
                if let Err(e) = self.storage.delete(&old_key).await {
                    warn!(user_id = %user_id, "Failed to delete replaced profile image: {}", e);
                }
            }
        }

        Ok(user)
    }

    /// Remove the profile image, deleting the stored blob.
    pub async fn remove_profile_image(&self, user_id: Uuid) -> Result<User> {
        let current = self.get_profile(user_id).await?;

        let url = current
            .image
            .ok_or_else(|| AppError::NotFound("No profile image found".to_string()))?;

        if let Some(key) = self.storage.key_from_url(&url) {
            self.storage.delete(&key).await?;
        }

        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET image = NULL, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }
}
