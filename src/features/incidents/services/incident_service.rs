use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::auth::model::CurrentUser;
use crate::features::incidents::models::{GeoPoint, Incident, IncidentPriority, IncidentStatus};
use crate::features::incidents::services::{ImageService, UploadedImage};
use crate::features::notifications::models::{
    incident_updated_message, new_incident_message, NotificationType,
};

/// Validated fields for a new incident.
#[derive(Debug)]
pub struct NewIncident {
    pub title: String,
    pub description: String,
    pub category_id: Uuid,
    pub location: GeoPoint,
    pub priority: Option<IncidentPriority>,
}

/// Partial update; None leaves the column unchanged. `images` is set only
/// when the request carried replacement photos.
#[derive(Debug, Default)]
pub struct IncidentPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub location: Option<GeoPoint>,
    pub status: Option<IncidentStatus>,
    pub priority: Option<IncidentPriority>,
    pub assigned_to: Option<Uuid>,
}

/// Incident lifecycle: create, update, delete.
///
/// Every create and content update writes an outbox row in the same
/// transaction as the incident row; the notification dispatcher fans the
/// outbox out to per-user notifications afterwards.
#[derive(Clone)]
pub struct IncidentService {
    pool: PgPool,
    images: ImageService,
}

impl IncidentService {
    pub fn new(pool: PgPool, images: ImageService) -> Self {
        Self { pool, images }
    }

    pub async fn get(&self, id: Uuid) -> Result<Incident> {
        sqlx::query_as::<_, Incident>("SELECT * FROM incidents WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Incident not found".to_string()))
    }

    pub async fn create(
        &self,
        reporter: &CurrentUser,
        data: NewIncident,
        files: Vec<UploadedImage>,
    ) -> Result<Incident> {
        self.ensure_category_exists(data.category_id).await?;

        // The id is minted up front so photo keys can carry it before the
        // row exists.
        let id = Uuid::now_v7();
        let image_urls = self.images.store_batch(id, files).await?;

        let created = self
            .insert_with_event(id, reporter, &data, &image_urls)
            .await;

        match created {
            Ok(incident) => {
                info!(incident_id = %incident.id, reporter = %reporter.id, "Created incident");
                Ok(incident)
            }
            Err(e) => {
                // The row never landed; don't leak the blobs.
                self.images.rollback_uploads(&image_urls).await;
                Err(e)
            }
        }
    }

    async fn insert_with_event(
        &self,
        id: Uuid,
        reporter: &CurrentUser,
        data: &NewIncident,
        image_urls: &[String],
    ) -> Result<Incident> {
        let mut tx = self.pool.begin().await?;

        let incident = sqlx::query_as::<_, Incident>(
            r#"
            INSERT INTO incidents
                (id, title, description, category_id, location_lng, location_lat,
                 priority, images, user_id)
            VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, 'medium'::incident_priority), $8, $9)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.title.trim())
        .bind(data.description.trim())
        .bind(data.category_id)
        .bind(data.location.longitude())
        .bind(data.location.latitude())
        .bind(data.priority)
        .bind(image_urls)
        .bind(reporter.id)
        .fetch_one(&mut *tx)
        .await?;

        enqueue_event(
            &mut tx,
            incident.id,
            NotificationType::NewIncident,
            &new_incident_message(&incident.title),
            incident.revision,
        )
        .await?;

        tx.commit().await?;
        Ok(incident)
    }

    /// Update an incident the caller owns.
    ///
    /// When `files` is non-empty the photo set is replaced wholesale, as
    /// an all-or-nothing batch; otherwise the existing photos stay.
    pub async fn update(
        &self,
        id: Uuid,
        actor: &CurrentUser,
        patch: IncidentPatch,
        files: Vec<UploadedImage>,
    ) -> Result<Incident> {
        let existing = self.get(id).await?;
        if existing.user_id != actor.id {
            return Err(AppError::Forbidden(
                "Not authorized to update this incident".to_string(),
            ));
        }

        if let Some(category_id) = patch.category_id {
            self.ensure_category_exists(category_id).await?;
        }
        if let Some(assignee) = patch.assigned_to {
            self.ensure_user_exists(assignee).await?;
        }

        let replacement_urls = if files.is_empty() {
            None
        } else {
            Some(self.images.store_batch(id, files).await?)
        };

        let updated = self
            .update_with_event(id, &patch, replacement_urls.as_deref())
            .await;

        match updated {
            Ok(incident) => {
                if replacement_urls.is_some() {
                    // Old photos are unreferenced now; failures only leak blobs.
                    self.images.rollback_uploads(&existing.images).await;
                }
                info!(incident_id = %incident.id, revision = incident.revision, "Updated incident");
                Ok(incident)
            }
            Err(e) => {
                if let Some(urls) = replacement_urls {
                    self.images.rollback_uploads(&urls).await;
                }
                Err(e)
            }
        }
    }

    async fn update_with_event(
        &self,
        id: Uuid,
        patch: &IncidentPatch,
        replacement_urls: Option<&[String]>,
    ) -> Result<Incident> {
        let mut tx = self.pool.begin().await?;

        let incident = sqlx::query_as::<_, Incident>(
            r#"
            UPDATE incidents
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                category_id = COALESCE($4, category_id),
                location_lng = COALESCE($5, location_lng),
                location_lat = COALESCE($6, location_lat),
                status = COALESCE($7, status),
                priority = COALESCE($8, priority),
                assigned_to = COALESCE($9, assigned_to),
                images = COALESCE($10, images),
                revision = revision + 1,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(patch.title.as_deref().map(str::trim))
        .bind(patch.description.as_deref().map(str::trim))
        .bind(patch.category_id)
        .bind(patch.location.as_ref().map(|l| l.longitude()))
        .bind(patch.location.as_ref().map(|l| l.latitude()))
        .bind(patch.status)
        .bind(patch.priority)
        .bind(patch.assigned_to)
        .bind(replacement_urls)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Incident not found".to_string()))?;

        enqueue_event(
            &mut tx,
            incident.id,
            NotificationType::IncidentUpdated,
            &incident_updated_message(&incident.title),
            incident.revision,
        )
        .await?;

        tx.commit().await?;
        Ok(incident)
    }

    /// Delete an incident the caller owns, along with its stored photos.
    pub async fn delete(&self, id: Uuid, actor: &CurrentUser) -> Result<()> {
        let existing = self.get(id).await?;
        if existing.user_id != actor.id {
            return Err(AppError::Forbidden(
                "Not authorized to delete this incident".to_string(),
            ));
        }

        sqlx::query("DELETE FROM incidents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        // Row is gone; blob cleanup is best-effort.
        self.images.rollback_uploads(&existing.images).await;

        info!(incident_id = %id, "Deleted incident");
        Ok(())
    }

    async fn ensure_category_exists(&self, category_id: Uuid) -> Result<()> {
        let exists =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM categories WHERE id = $1")
                .bind(category_id)
                .fetch_one(&self.pool)
                .await?;
        if exists == 0 {
            return Err(AppError::Validation("Unknown category".to_string()));
        }
        Ok(())
    }

    async fn ensure_user_exists(&self, user_id: Uuid) -> Result<()> {
        let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        if exists == 0 {
            return Err(AppError::Validation("Unknown assignee".to_string()));
        }
        Ok(())
    }
}

/// Write an outbox row inside the caller's transaction. A duplicate
/// (incident, type, revision) means the same mutation was already queued;
/// that is logged and skipped rather than failing the mutation.
async fn enqueue_event(
    tx: &mut Transaction<'_, Postgres>,
    incident_id: Uuid,
    event_type: NotificationType,
    message: &str,
    revision: i32,
) -> Result<()> {
    let inserted = sqlx::query(
        r#"
        INSERT INTO incident_events (incident_id, event_type, message, revision)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (incident_id, event_type, revision) DO NOTHING
        "#,
    )
    .bind(incident_id)
    .bind(event_type)
    .bind(message)
    .bind(revision)
    .execute(&mut **tx)
    .await?;

    if inserted.rows_affected() == 0 {
        warn!(incident_id = %incident_id, revision, "Duplicate outbox event skipped");
    }
    Ok(())
}
